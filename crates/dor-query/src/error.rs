use thiserror::Error;

use dor_http::HttpError;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query failed with status {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(HttpError),

    #[error("unparseable result set: {0}")]
    Parse(String),
}

impl From<HttpError> for QueryError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Status { status, body } => Self::Remote { status, body },
            other => Self::Transport(other),
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
