use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Checksum algorithm recorded against a datastream's content.
///
/// `Default` asks the server to use its configured algorithm; `Disabled`
/// turns checksumming off for the datastream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChecksumKind {
    #[default]
    Default,
    Disabled,
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl ChecksumKind {
    /// The wire string the REST interface expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Disabled => "DISABLED",
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Parse the wire string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        match s {
            "DEFAULT" => Ok(Self::Default),
            "DISABLED" => Ok(Self::Disabled),
            "MD5" => Ok(Self::Md5),
            "SHA-1" => Ok(Self::Sha1),
            "SHA-256" => Ok(Self::Sha256),
            "SHA-384" => Ok(Self::Sha384),
            "SHA-512" => Ok(Self::Sha512),
            other => Err(TypeError::UnknownChecksumKind(other.to_string())),
        }
    }
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_roundtrip() {
        for kind in [
            ChecksumKind::Default,
            ChecksumKind::Disabled,
            ChecksumKind::Md5,
            ChecksumKind::Sha1,
            ChecksumKind::Sha256,
            ChecksumKind::Sha384,
            ChecksumKind::Sha512,
        ] {
            assert_eq!(ChecksumKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_error() {
        let err = ChecksumKind::parse("CRC32").unwrap_err();
        assert!(matches!(err, TypeError::UnknownChecksumKind(_)));
    }
}
