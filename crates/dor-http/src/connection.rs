//! reqwest-backed [`Transport`] implementation.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::error::{HttpError, HttpResult};
use crate::request::{Method, MultipartField, Request, RequestBody};
use crate::response::Response;
use crate::transport::Transport;

/// A live HTTP connection to a repository.
///
/// Holds a connection pool and the configured credentials; cheap to share
/// behind an `Arc`. Each [`execute`](Transport::execute) call is one round
/// trip with no retries.
pub struct HttpConnection {
    config: ConnectionConfig,
    client: reqwest::Client,
}

impl HttpConnection {
    /// Build a connection from configuration.
    pub fn new(config: ConnectionConfig) -> HttpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { config, client })
    }

    fn url_for(&self, path: &str) -> HttpResult<reqwest::Url> {
        let joined = format!("{}{}", self.config.trimmed_base_url(), path);
        reqwest::Url::parse(&joined).map_err(|_| HttpError::InvalidUrl(joined))
    }

    async fn build_body(
        &self,
        builder: reqwest::RequestBuilder,
        body: RequestBody,
    ) -> HttpResult<reqwest::RequestBuilder> {
        let builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Text {
                content,
                content_type,
            } => builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(content),
            RequestBody::Bytes {
                content,
                content_type,
            } => builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(content),
            RequestBody::File { path, content_type } => {
                let content = tokio::fs::read(&path).await?;
                let builder = match content_type {
                    Some(ct) => builder.header(reqwest::header::CONTENT_TYPE, ct),
                    None => builder,
                };
                builder.body(content)
            }
            RequestBody::Multipart(fields) => {
                let mut form = reqwest::multipart::Form::new();
                for field in fields {
                    form = match field {
                        MultipartField::Text { name, value } => form.text(name, value),
                        MultipartField::Bytes {
                            name,
                            content,
                            content_type,
                        } => {
                            let mut part = reqwest::multipart::Part::bytes(content);
                            if let Some(ct) = content_type {
                                part = part.mime_str(&ct).map_err(HttpError::Transport)?;
                            }
                            form.part(name, part)
                        }
                        MultipartField::File {
                            name,
                            path,
                            content_type,
                        } => {
                            let file_name = path
                                .file_name()
                                .map(|n| n.to_string_lossy().into_owned())
                                .unwrap_or_else(|| name.clone());
                            let content = tokio::fs::read(&path).await?;
                            let mut part =
                                reqwest::multipart::Part::bytes(content).file_name(file_name);
                            if let Some(ct) = content_type {
                                part = part.mime_str(&ct).map_err(HttpError::Transport)?;
                            }
                            form.part(name, part)
                        }
                    };
                }
                builder.multipart(form)
            }
        };
        Ok(builder)
    }
}

#[async_trait]
impl Transport for HttpConnection {
    async fn execute(&self, request: Request) -> HttpResult<Response> {
        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let url = self.url_for(&request.path)?;
        debug!(method = method.as_str(), url = %url, "repository request");

        let mut builder = self.client.request(method, url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            builder = builder.basic_auth(user, Some(pass));
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = self.build_body(builder, request.body).await?;

        let mut response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::Status { status, body });
        }

        if let Some(path) = request.download_to {
            let mut file = tokio::fs::File::create(&path).await?;
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            return Ok(Response::new(status, content_type, Vec::new()));
        }

        let body = response.bytes().await?;
        Ok(Response {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_join_strips_double_slash() {
        let conn =
            HttpConnection::new(ConnectionConfig::new("http://localhost:8080/fedora/")).unwrap();
        let url = conn.url_for("/objects/test:1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/fedora/objects/test:1");
    }

    #[test]
    fn url_join_rejects_garbage() {
        let conn = HttpConnection::new(ConnectionConfig::new("not a url")).unwrap();
        assert!(matches!(
            conn.url_for("/objects"),
            Err(HttpError::InvalidUrl(_))
        ));
    }
}
