use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Lifecycle state of an object or datastream.
///
/// Deleting through the facade sets the state to `Deleted`; the record stays
/// in the repository until it is purged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ObjectState {
    #[default]
    Active,
    Inactive,
    Deleted,
}

impl ObjectState {
    /// The single-letter wire code (`A`, `I`, `D`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Active => "A",
            Self::Inactive => "I",
            Self::Deleted => "D",
        }
    }

    /// Parse a wire code.
    pub fn from_code(code: &str) -> Result<Self, TypeError> {
        match code {
            "A" => Ok(Self::Active),
            "I" => Ok(Self::Inactive),
            "D" => Ok(Self::Deleted),
            other => Err(TypeError::UnknownState(other.to_string())),
        }
    }
}

impl fmt::Display for ObjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
