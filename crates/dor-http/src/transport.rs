use async_trait::async_trait;

use crate::error::HttpResult;
use crate::request::Request;
use crate::response::Response;

/// One HTTP round trip against the remote repository.
///
/// Implementations perform exactly one request per call, surface any non-2xx
/// status as [`HttpError::Status`](crate::HttpError::Status), and never
/// retry: failure policy belongs to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> HttpResult<Response>;
}
