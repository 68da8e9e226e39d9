//! The bundled binding and its shared per-server state.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use dor_http::{ConnectionConfig, HttpConnection, Request, Response, Transport};
use dor_types::RepositoryInfo;

use crate::api_a::ApiA;
use crate::api_m::ApiM;
use crate::error::{ApiError, ApiResult};
use crate::serializer;
use crate::version::{DialectChoice, ServerInfo, ServerVersion};

/// State one binding shares between its two call surfaces: the transport
/// and the once-detected server identity.
pub(crate) struct Shared {
    transport: Arc<dyn Transport>,
    choice: DialectChoice,
    info: OnceCell<ServerInfo>,
}

impl Shared {
    pub(crate) fn new(transport: Arc<dyn Transport>, choice: DialectChoice) -> Self {
        Self {
            transport,
            choice,
            info: OnceCell::new(),
        }
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// One round trip; any failure status becomes [`ApiError::Remote`].
    pub(crate) async fn execute(&self, request: Request) -> ApiResult<Response> {
        self.transport.execute(request).await.map_err(ApiError::from)
    }

    /// One round trip on a fetch path: a 404 names the missing identifier.
    pub(crate) async fn execute_for(&self, id: &str, request: Request) -> ApiResult<Response> {
        self.transport
            .execute(request)
            .await
            .map_err(|e| ApiError::for_missing(e, id))
    }

    /// Fetch the describe document. Never cached; version detection layers
    /// its own memoization on top.
    pub(crate) async fn describe(&self) -> ApiResult<RepositoryInfo> {
        let request = Request::get("/describe")
            .query("xml", "true")
            .header("Accept", "application/json");
        let response = self.execute(request).await?;
        serializer::describe_any(&response.text().map_err(ApiError::from)?)
    }

    /// The server's version, capabilities, and dialect, detected on first
    /// use and pinned for the life of the binding.
    pub(crate) async fn server_info(&self) -> ApiResult<ServerInfo> {
        let info = self
            .info
            .get_or_try_init(|| async {
                let described = self.describe().await?;
                let version: ServerVersion = described.version.parse()?;
                let mut info = ServerInfo::for_version(version);
                if let DialectChoice::Fixed(dialect) = self.choice {
                    info.dialect = dialect;
                }
                debug!(version = %info.version, dialect = ?info.dialect, "detected server");
                Ok::<_, ApiError>(info)
            })
            .await?;
        Ok(*info)
    }

    /// Fail with [`ApiError::Unsupported`] unless the server has the given
    /// capability.
    pub(crate) async fn require(
        &self,
        operation: &str,
        has: impl Fn(&crate::version::Capabilities) -> bool,
    ) -> ApiResult<ServerInfo> {
        let info = self.server_info().await?;
        if has(&info.capabilities) {
            Ok(info)
        } else {
            Err(ApiError::Unsupported {
                operation: operation.to_string(),
                version: info.version.to_string(),
            })
        }
    }
}

/// The access and management call surfaces over one shared transport.
#[derive(Clone)]
pub struct RepositoryApi {
    pub a: ApiA,
    pub m: ApiM,
    shared: Arc<Shared>,
}

impl RepositoryApi {
    /// Build a binding over an arbitrary transport.
    pub fn new(transport: Arc<dyn Transport>, choice: DialectChoice) -> Self {
        let shared = Arc::new(Shared::new(transport, choice));
        Self {
            a: ApiA::new(Arc::clone(&shared)),
            m: ApiM::new(Arc::clone(&shared)),
            shared,
        }
    }

    /// Build a binding with a live HTTP connection.
    pub fn connect(config: ConnectionConfig, choice: DialectChoice) -> ApiResult<Self> {
        let connection = HttpConnection::new(config).map_err(ApiError::from)?;
        Ok(Self::new(Arc::new(connection), choice))
    }

    /// The underlying transport, for collaborators that issue their own
    /// requests (the resource-index query helper does).
    pub fn transport(&self) -> Arc<dyn Transport> {
        self.shared.transport()
    }

    /// Detected server identity.
    pub async fn server_info(&self) -> ApiResult<ServerInfo> {
        self.shared.server_info().await
    }
}
