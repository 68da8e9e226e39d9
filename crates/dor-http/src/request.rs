use std::path::PathBuf;

/// HTTP methods the repository REST interface uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Body of an outgoing request.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Text {
        content: String,
        content_type: String,
    },
    Bytes {
        content: Vec<u8>,
        content_type: String,
    },
    /// Contents of a file on disk, read at send time.
    File {
        path: PathBuf,
        content_type: Option<String>,
    },
    Multipart(Vec<MultipartField>),
}

/// One field of a multipart form body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MultipartField {
    Text {
        name: String,
        value: String,
    },
    Bytes {
        name: String,
        content: Vec<u8>,
        content_type: Option<String>,
    },
    File {
        name: String,
        path: PathBuf,
        content_type: Option<String>,
    },
}

impl MultipartField {
    /// The form field name.
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::Bytes { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// One HTTP round trip against the repository.
///
/// Paths are relative to the connection's base URL. Query pairs are appended
/// in the order they were pushed; an option the caller never supplied is
/// simply never pushed, so it does not appear on the wire at all.
#[derive(Clone, Debug, Default)]
pub struct Request {
    pub method: Option<Method>,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    /// Stream the response body into this file instead of buffering it.
    pub download_to: Option<PathBuf>,
}

impl Request {
    fn with_method(method: Method, path: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::with_method(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::with_method(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::with_method(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::with_method(Method::Delete, path)
    }

    /// The request method, defaulting to GET when never set.
    pub fn method(&self) -> Method {
        self.method.unwrap_or(Method::Get)
    }

    /// Append a query pair.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query pair only when a value was supplied.
    pub fn query_opt(mut self, key: &str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Append a header.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Attach a body.
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Stream the response into a file instead of buffering it.
    pub fn download_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.download_to = Some(path.into());
        self
    }

    /// Look up the first query value for a key. Used by tests to assert on
    /// what was actually sent.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_opt_absent_is_omitted() {
        let request = Request::get("/objects")
            .query("format", "xml")
            .query_opt("label", None::<String>)
            .query_opt("namespace", Some("test"));
        assert_eq!(request.query.len(), 2);
        assert_eq!(request.query_value("namespace"), Some("test"));
        assert_eq!(request.query_value("label"), None);
    }

    #[test]
    fn method_defaults_to_get() {
        assert_eq!(Request::default().method(), Method::Get);
        assert_eq!(Request::delete("/objects/test:1").method(), Method::Delete);
    }

    #[test]
    fn multipart_field_names() {
        let field = MultipartField::Text {
            name: "DC".into(),
            value: "<dc/>".into(),
        };
        assert_eq!(field.name(), "DC");
    }
}
