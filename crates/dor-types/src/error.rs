use thiserror::Error;

/// Errors produced by type parsing and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid persistent identifier: {0}")]
    InvalidPid(String),

    #[error("unknown object state code: {0}")]
    UnknownState(String),

    #[error("unknown control group code: {0}")]
    UnknownControlGroup(String),

    #[error("unknown checksum kind: {0}")]
    UnknownChecksumKind(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
