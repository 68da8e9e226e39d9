use thiserror::Error;

use dor_api::ApiError;
use dor_rels::RelsError;

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("bad argument: {0}")]
    BadArgument(String),

    #[error("datastream {0} is already attached")]
    DuplicateDatastream(String),

    #[error("relationship document error: {0}")]
    Rels(#[from] RelsError),

    #[error("facade lock poisoned")]
    LockPoisoned,
}

pub type ObjectResult<T> = Result<T, ObjectError>;
