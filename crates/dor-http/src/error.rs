use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("response body is not valid UTF-8")]
    NotUtf8,

    #[error("no scripted response for {0}")]
    NoScriptedResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HttpError {
    /// The HTTP status of a failed round trip, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the failure was a 404 from the remote side.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type HttpResult<T> = Result<T, HttpError>;
