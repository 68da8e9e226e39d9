use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Storage mode of a datastream's content.
///
/// The control group decides which content sources are legal: inline XML and
/// managed content carry a payload (bytes or a file), while redirect and
/// external datastreams carry only a URL that the repository records or
/// proxies. Attaching the wrong source kind is a caller error, checked both
/// in the facade and in the API binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ControlGroup {
    /// Inline XML stored in the object's own record (`X`).
    InlineXml,
    /// Managed binary content stored by the repository (`M`).
    #[default]
    Managed,
    /// Content the repository redirects to at dissemination time (`R`).
    Redirect,
    /// Externally referenced content fetched by the repository (`E`).
    External,
}

impl ControlGroup {
    /// The single-letter wire code (`X`, `M`, `R`, `E`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::InlineXml => "X",
            Self::Managed => "M",
            Self::Redirect => "R",
            Self::External => "E",
        }
    }

    /// Parse a wire code.
    pub fn from_code(code: &str) -> Result<Self, TypeError> {
        match code {
            "X" => Ok(Self::InlineXml),
            "M" => Ok(Self::Managed),
            "R" => Ok(Self::Redirect),
            "E" => Ok(Self::External),
            other => Err(TypeError::UnknownControlGroup(other.to_string())),
        }
    }

    /// Whether this group stores a payload (bytes or file) rather than a URL.
    pub fn accepts_inline_content(&self) -> bool {
        matches!(self, Self::InlineXml | Self::Managed)
    }

    /// Whether this group stores a location URL rather than a payload.
    pub fn requires_url(&self) -> bool {
        !self.accepts_inline_content()
    }
}

impl fmt::Display for ControlGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_roundtrip() {
        for group in [
            ControlGroup::InlineXml,
            ControlGroup::Managed,
            ControlGroup::Redirect,
            ControlGroup::External,
        ] {
            assert_eq!(ControlGroup::from_code(group.code()).unwrap(), group);
        }
    }

    #[test]
    fn unknown_code_is_error() {
        assert!(ControlGroup::from_code("Q").is_err());
    }

    #[test]
    fn content_legality_matrix() {
        assert!(ControlGroup::InlineXml.accepts_inline_content());
        assert!(ControlGroup::Managed.accepts_inline_content());
        assert!(ControlGroup::Redirect.requires_url());
        assert!(ControlGroup::External.requires_url());
    }

    #[test]
    fn default_is_managed() {
        assert_eq!(ControlGroup::default(), ControlGroup::Managed);
    }
}
