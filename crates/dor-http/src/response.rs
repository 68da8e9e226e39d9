use bytes::Bytes;

use crate::error::{HttpError, HttpResult};

/// A buffered HTTP response.
///
/// When the request asked for a streaming download the body is empty and the
/// payload is on disk instead.
#[derive(Clone, Debug)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl Response {
    /// Build a response from parts. Mostly useful for scripted transports.
    pub fn new(status: u16, content_type: Option<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    /// A 200 response with the given content type and body.
    pub fn ok(content_type: &str, body: impl Into<Bytes>) -> Self {
        Self::new(200, Some(content_type.to_string()), body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> HttpResult<String> {
        std::str::from_utf8(&self.body)
            .map(str::to_owned)
            .map_err(|_| HttpError::NotUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(Response::new(200, None, "").is_success());
        assert!(Response::new(204, None, "").is_success());
        assert!(!Response::new(404, None, "").is_success());
        assert!(!Response::new(500, None, "").is_success());
    }

    #[test]
    fn text_decodes_utf8() {
        let response = Response::ok("text/plain", "test:7");
        assert_eq!(response.text().unwrap(), "test:7");
    }

    #[test]
    fn text_rejects_invalid_utf8() {
        let response = Response::new(200, None, vec![0xff, 0xfe]);
        assert!(matches!(response.text(), Err(HttpError::NotUtf8)));
    }
}
