use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Parsed server version, `major.minor`.
///
/// Patch levels and pre-release suffixes are ignored: capability decisions
/// only ever hinge on the generation boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        *self >= Self::new(major, minor)
    }
}

impl FromStr for ServerVersion {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let numeric: String = s
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let mut parts = numeric.split('.').filter(|p| !p.is_empty());
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| ApiError::Parse(format!("unparseable server version: {s}")))?;
        let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        Ok(Self { major, minor })
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Document dialect a server generation speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    /// Generation-3 servers: XML profile documents, POST-based writes.
    XmlV3,
    /// Generation-4 servers: JSON profile documents, PUT-based writes.
    JsonV4,
}

/// How the binding should pick its dialect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialectChoice {
    /// Detect from the server's reported version on first use.
    #[default]
    Auto,
    Fixed(Dialect),
}

/// What a server generation can do.
///
/// Derived from the version exactly once; call sites ask the capability,
/// never the number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// The multipart batch add-datastreams endpoint (atomic on the server).
    pub batch_datastream_add: bool,
    /// The RSS events feed.
    pub events_feed: bool,
    /// Per-datastream version history.
    pub datastream_history: bool,
    /// Field search with paged sessions on the objects listing.
    pub field_search: bool,
    /// The JCR-SQL2 query endpoint.
    pub sql2_query: bool,
    /// The namespace registry endpoints.
    pub namespace_registry: bool,
}

impl Capabilities {
    pub fn for_version(version: ServerVersion) -> Self {
        let modern = version.at_least(4, 0);
        Self {
            batch_datastream_add: modern,
            events_feed: modern,
            datastream_history: !modern,
            field_search: !modern,
            sql2_query: modern,
            namespace_registry: modern,
        }
    }
}

/// Version, capabilities, and dialect detected for one server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServerInfo {
    pub version: ServerVersion,
    pub capabilities: Capabilities,
    pub dialect: Dialect,
}

impl ServerInfo {
    pub fn for_version(version: ServerVersion) -> Self {
        let dialect = if version.at_least(4, 0) {
            Dialect::JsonV4
        } else {
            Dialect::XmlV3
        };
        Self {
            version,
            capabilities: Capabilities::for_version(version),
            dialect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_part_version() {
        let v: ServerVersion = "3.8.1".parse().unwrap();
        assert_eq!(v, ServerVersion::new(3, 8));
    }

    #[test]
    fn parses_prerelease_suffix() {
        let v: ServerVersion = "4.0.0-alpha-3".parse().unwrap();
        assert_eq!(v, ServerVersion::new(4, 0));
    }

    #[test]
    fn parses_bare_major() {
        let v: ServerVersion = "4".parse().unwrap();
        assert_eq!(v, ServerVersion::new(4, 0));
    }

    #[test]
    fn garbage_is_parse_error() {
        assert!("fedora".parse::<ServerVersion>().is_err());
    }

    #[test]
    fn ordering() {
        assert!(ServerVersion::new(3, 8) < ServerVersion::new(4, 0));
        assert!(ServerVersion::new(4, 1).at_least(4, 0));
        assert!(!ServerVersion::new(3, 9).at_least(4, 0));
    }

    #[test]
    fn legacy_capabilities() {
        let caps = Capabilities::for_version(ServerVersion::new(3, 8));
        assert!(!caps.batch_datastream_add);
        assert!(!caps.events_feed);
        assert!(caps.datastream_history);
        assert!(caps.field_search);
        assert!(!caps.sql2_query);
    }

    #[test]
    fn modern_capabilities() {
        let caps = Capabilities::for_version(ServerVersion::new(4, 2));
        assert!(caps.batch_datastream_add);
        assert!(caps.events_feed);
        assert!(!caps.datastream_history);
        assert!(caps.sql2_query);
        assert!(caps.namespace_registry);
    }

    #[test]
    fn dialect_follows_generation() {
        assert_eq!(
            ServerInfo::for_version(ServerVersion::new(3, 8)).dialect,
            Dialect::XmlV3
        );
        assert_eq!(
            ServerInfo::for_version(ServerVersion::new(4, 0)).dialect,
            Dialect::JsonV4
        );
    }
}
