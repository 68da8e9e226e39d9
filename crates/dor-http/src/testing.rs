//! Scripted transport for exercising bindings and facades without a server.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{HttpError, HttpResult};
use crate::request::Request;
use crate::response::Response;
use crate::transport::Transport;

/// A [`Transport`] that replays a queue of canned responses and records
/// every request it receives.
///
/// Responses are consumed in FIFO order; a queued non-2xx status comes back
/// as the same [`HttpError::Status`] a live connection would produce. When a
/// request arrives and the queue is empty, the call fails with
/// [`HttpError::NoScriptedResponse`], so a test that under-scripts its
/// transport fails loudly instead of hanging on a default.
#[derive(Default)]
pub struct ReplayTransport {
    responses: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<Request>>,
}

impl ReplayTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a canned response.
    pub fn push(&self, response: Response) {
        self.responses
            .lock()
            .expect("replay queue lock")
            .push_back(response);
    }

    /// Queue a 200 response with the given content type and body.
    pub fn push_ok(&self, content_type: &str, body: impl Into<bytes::Bytes>) {
        self.push(Response::ok(content_type, body));
    }

    /// Queue an error status with an empty body.
    pub fn push_status(&self, status: u16) {
        self.push(Response::new(status, None, ""));
    }

    /// Every request executed so far, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().expect("replay request lock").clone()
    }

    /// Number of requests executed so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("replay request lock").len()
    }

    /// The nth request executed, panicking when out of range.
    pub fn request(&self, index: usize) -> Request {
        self.requests.lock().expect("replay request lock")[index].clone()
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn execute(&self, request: Request) -> HttpResult<Response> {
        let label = format!("{} {}", request.method().as_str(), request.path);
        let download_to = request.download_to.clone();
        self.requests
            .lock()
            .expect("replay request lock")
            .push(request);

        let response = self
            .responses
            .lock()
            .expect("replay queue lock")
            .pop_front()
            .ok_or(HttpError::NoScriptedResponse(label))?;

        if !response.is_success() {
            return Err(HttpError::Status {
                status: response.status,
                body: response.text().unwrap_or_default(),
            });
        }
        // Mirror the live connection: a download request lands the body on
        // disk and comes back empty.
        if let Some(path) = download_to {
            tokio::fs::write(&path, &response.body).await?;
            return Ok(Response::new(response.status, response.content_type, Vec::new()));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_and_records() {
        let transport = ReplayTransport::new();
        transport.push_ok("text/plain", "first");
        transport.push_ok("text/plain", "second");

        let a = transport.execute(Request::get("/a")).await.unwrap();
        let b = transport.execute(Request::get("/b")).await.unwrap();

        assert_eq!(a.text().unwrap(), "first");
        assert_eq!(b.text().unwrap(), "second");
        assert_eq!(transport.request_count(), 2);
        assert_eq!(transport.request(1).path, "/b");
    }

    #[tokio::test]
    async fn error_status_surfaces_as_status_error() {
        let transport = ReplayTransport::new();
        transport.push_status(404);
        let err = transport.execute(Request::get("/missing")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn empty_queue_fails_loudly() {
        let transport = ReplayTransport::new();
        let err = transport.execute(Request::get("/x")).await.unwrap_err();
        assert!(matches!(err, HttpError::NoScriptedResponse(_)));
    }

    #[tokio::test]
    async fn download_request_lands_body_on_disk() {
        let transport = ReplayTransport::new();
        transport.push_ok("application/pdf", &b"%PDF-1.4"[..]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.pdf");
        let response = transport
            .execute(Request::get("/content").download_to(&path))
            .await
            .unwrap();

        assert!(response.body.is_empty());
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
    }
}
