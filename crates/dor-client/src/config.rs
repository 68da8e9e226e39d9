use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use dor_api::DialectChoice;
use dor_http::ConnectionConfig;

use crate::error::{ClientError, ClientResult};

/// Client configuration: connection parameters plus repository-level
/// defaults. Loadable from a TOML file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(flatten)]
    pub connection: ConnectionConfig,
    /// Namespace new identifiers are minted in when the caller gives none.
    pub default_namespace: Option<String>,
    /// Dialect override; auto-detected from the server version by default.
    #[serde(default)]
    pub dialect: DialectChoice,
}

impl RepositoryConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            connection: ConnectionConfig::new(base_url),
            default_namespace: None,
            dialect: DialectChoice::default(),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.connection = self.connection.with_credentials(username, password);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connection = self.connection.with_timeout(timeout);
        self
    }

    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = Some(namespace.into());
        self
    }

    pub fn with_dialect(mut self, dialect: DialectChoice) -> Self {
        self.dialect = dialect;
        self
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> ClientResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ClientError::BadArgument(format!("cannot read config {}: {e}", path.display()))
        })?;
        toml::from_str(&raw).map_err(|e| {
            ClientError::BadArgument(format!("invalid config {}: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml() {
        let config: RepositoryConfig =
            toml::from_str("base_url = \"http://localhost:8080/fedora\"").unwrap();
        assert_eq!(config.connection.base_url, "http://localhost:8080/fedora");
        assert!(config.default_namespace.is_none());
        assert_eq!(config.dialect, DialectChoice::Auto);
    }

    #[test]
    fn full_toml() {
        let config: RepositoryConfig = toml::from_str(
            r#"
base_url = "http://localhost:8080/fedora"
username = "fedoraAdmin"
password = "secret"
timeout_secs = 60
default_namespace = "islandora"
"#,
        )
        .unwrap();
        assert_eq!(config.connection.username.as_deref(), Some("fedoraAdmin"));
        assert_eq!(config.connection.timeout_secs, 60);
        assert_eq!(config.default_namespace.as_deref(), Some("islandora"));
    }

    #[test]
    fn builder_chain() {
        let config = RepositoryConfig::new("http://localhost:8080/fedora")
            .with_credentials("u", "p")
            .with_default_namespace("demo")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.connection.timeout_secs, 5);
        assert_eq!(config.default_namespace.as_deref(), Some("demo"));
    }

    #[test]
    fn from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dor.toml");
        std::fs::write(
            &path,
            "base_url = \"http://localhost:8080/fedora\"\ndefault_namespace = \"demo\"\n",
        )
        .unwrap();

        let config = RepositoryConfig::from_file(&path).unwrap();
        assert_eq!(config.connection.base_url, "http://localhost:8080/fedora");
        assert_eq!(config.default_namespace.as_deref(), Some("demo"));
    }

    #[test]
    fn missing_file_is_bad_argument() {
        let err = RepositoryConfig::from_file(Path::new("/nonexistent/dor.toml")).unwrap_err();
        assert!(matches!(err, ClientError::BadArgument(_)));
    }
}
