use thiserror::Error;

use dor_http::HttpError;
use dor_types::TypeError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller supplied an invalid or missing option. Never worth
    /// retrying; the call site is wrong.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// The identifier does not exist on the remote side.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote call came back with a failure status.
    #[error("remote call failed with status {status}: {body}")]
    Remote { status: u16, body: String },

    /// The request never completed (connect failure, timeout, I/O).
    #[error("transport error: {0}")]
    Transport(HttpError),

    /// The response body did not match the endpoint's documented shape.
    #[error("unparseable response: {0}")]
    Parse(String),

    /// The operation needs a capability this server generation lacks.
    #[error("{operation} is not supported by server version {version}")]
    Unsupported { operation: String, version: String },

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl From<HttpError> for ApiError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Status { status, body } => Self::Remote { status, body },
            other => Self::Transport(other),
        }
    }
}

impl ApiError {
    /// Convert a 404 into [`ApiError::NotFound`] for the given identifier;
    /// used on the fetch paths where a missing id is a distinct condition.
    pub fn for_missing(err: HttpError, id: &str) -> Self {
        if err.is_not_found() {
            Self::NotFound(id.to_string())
        } else {
            Self::from(err)
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
