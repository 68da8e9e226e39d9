use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// URI scheme prefix under which the repository exposes objects as resources.
///
/// Query results and relationship documents refer to objects as
/// `info:fedora/<pid>`; [`Pid::from_uri`] and [`Pid::to_uri`] convert
/// between the two forms.
pub const RESOURCE_URI_PREFIX: &str = "info:fedora/";

/// Namespace-qualified persistent identifier of a digital object.
///
/// A `Pid` always has the form `namespace:local-id` with exactly one colon
/// and a non-empty half on each side. Identifiers are compared as plain
/// strings; the repository treats them as opaque once minted.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(String);

impl Pid {
    /// Parse and validate a `namespace:local-id` string.
    pub fn new(s: impl Into<String>) -> Result<Self, TypeError> {
        let s = s.into();
        let mut halves = s.splitn(2, ':');
        let namespace = halves.next().unwrap_or("");
        let local = halves.next().unwrap_or("");
        if namespace.is_empty() || local.is_empty() || local.contains(':') {
            return Err(TypeError::InvalidPid(s));
        }
        Ok(Self(s))
    }

    /// Join a namespace and a local identifier.
    pub fn from_parts(namespace: &str, local_id: &str) -> Result<Self, TypeError> {
        Self::new(format!("{namespace}:{local_id}"))
    }

    /// The namespace half of the identifier.
    pub fn namespace(&self) -> &str {
        self.0.split(':').next().unwrap_or("")
    }

    /// The local half of the identifier.
    pub fn local_id(&self) -> &str {
        self.0.splitn(2, ':').nth(1).unwrap_or("")
    }

    /// The identifier as a plain string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The resource URI form, `info:fedora/<pid>`.
    pub fn to_uri(&self) -> String {
        format!("{RESOURCE_URI_PREFIX}{}", self.0)
    }

    /// Parse a pid out of its resource URI form.
    ///
    /// Returns an error if the URI does not carry the reserved prefix or the
    /// remainder is not a valid pid.
    pub fn from_uri(uri: &str) -> Result<Self, TypeError> {
        match uri.strip_prefix(RESOURCE_URI_PREFIX) {
            Some(rest) => Self::new(rest),
            None => Err(TypeError::InvalidPid(uri.to_string())),
        }
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pid({})", self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Pid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Pid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_pid() {
        let pid = Pid::new("islandora:42").unwrap();
        assert_eq!(pid.namespace(), "islandora");
        assert_eq!(pid.local_id(), "42");
    }

    #[test]
    fn reject_missing_colon() {
        assert!(Pid::new("islandora").is_err());
    }

    #[test]
    fn reject_empty_halves() {
        assert!(Pid::new(":42").is_err());
        assert!(Pid::new("ns:").is_err());
        assert!(Pid::new(":").is_err());
    }

    #[test]
    fn reject_second_colon() {
        assert!(Pid::new("a:b:c").is_err());
    }

    #[test]
    fn from_parts_joins() {
        let pid = Pid::from_parts("test", "7").unwrap();
        assert_eq!(pid.as_str(), "test:7");
    }

    #[test]
    fn uri_roundtrip() {
        let pid = Pid::new("test:7").unwrap();
        assert_eq!(pid.to_uri(), "info:fedora/test:7");
        assert_eq!(Pid::from_uri("info:fedora/test:7").unwrap(), pid);
    }

    #[test]
    fn from_uri_rejects_bare_pid() {
        assert!(Pid::from_uri("test:7").is_err());
    }

    #[test]
    fn display_is_plain_string() {
        let pid = Pid::new("test:7").unwrap();
        assert_eq!(format!("{pid}"), "test:7");
    }

    #[test]
    fn serde_is_transparent() {
        let pid = Pid::new("test:7").unwrap();
        let json = serde_json::to_string(&pid).unwrap();
        assert_eq!(json, "\"test:7\"");
        let parsed: Pid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pid);
    }

    proptest::proptest! {
        #[test]
        fn parts_roundtrip(ns in "[a-zA-Z][a-zA-Z0-9.-]{0,15}", local in "[a-zA-Z0-9_.~-]{1,32}") {
            let pid = Pid::from_parts(&ns, &local).unwrap();
            proptest::prop_assert_eq!(pid.namespace(), ns.as_str());
            proptest::prop_assert_eq!(pid.local_id(), local.as_str());
            let reparsed = Pid::new(pid.as_str()).unwrap();
            proptest::prop_assert_eq!(reparsed, pid);
        }
    }
}
