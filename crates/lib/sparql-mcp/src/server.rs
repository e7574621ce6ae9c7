//! MCP server runners for sparql-mcp.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use rmcp::serve_server;
use rmcp::transport::io::stdio;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig,
    StreamableHttpService,
    session::local::LocalSessionManager,
};
use sparql_core::Dispatcher;
use tracing::info;

use crate::SparqlMcp;
use crate::auth;

pub const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:4030";

/// Configuration for the MCP streamable HTTP server.
#[derive(Debug, Clone)]
pub struct McpHttpServerConfig {
    pub addr: SocketAddr,
    pub stateful_mode: bool,
    pub sse_keep_alive: Option<Duration>,
    pub sse_retry: Option<Duration>,
    pub api_key: Option<String>,
}

impl McpHttpServerConfig {
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            stateful_mode: true,
            sse_keep_alive: Some(Duration::from_secs(15)),
            sse_retry: Some(Duration::from_secs(3)),
            api_key: None,
        }
    }

    #[must_use]
    pub const fn with_stateful_mode(mut self, stateful_mode: bool) -> Self {
        self.stateful_mode = stateful_mode;
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

impl Default for McpHttpServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MCP_HTTP_ADDR.parse().expect("valid MCP HTTP address"))
    }
}

/// Serves the MCP server over stdio.
///
/// # Errors
/// Returns any transport or server error.
pub async fn serve_stdio(
    dispatcher: Arc<Dispatcher>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let service = SparqlMcp::with_dispatcher(dispatcher);
    let (stdin, stdout) = stdio();
    info!("sparql-mcp serving over stdio");
    let running = serve_server(service, (stdin, stdout)).await?;
    let _ = running.waiting().await?;
    Ok(())
}

/// Serves the MCP server using streamable HTTP transport.
///
/// # Errors
/// Returns any listener or server error.
pub async fn serve_streamable_http(
    dispatcher: Arc<Dispatcher>,
    config: McpHttpServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "sparql-mcp listening for streamable HTTP");
    axum::serve(listener, build_router(dispatcher, config)).await?;
    Ok(())
}

fn build_router(dispatcher: Arc<Dispatcher>, config: McpHttpServerConfig) -> Router {
    let service: StreamableHttpService<SparqlMcp, LocalSessionManager> =
        StreamableHttpService::new(
            move || Ok(SparqlMcp::with_dispatcher(dispatcher.clone())),
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig {
                sse_keep_alive: config.sse_keep_alive,
                sse_retry: config.sse_retry,
                stateful_mode: config.stateful_mode,
                ..Default::default()
            },
        );

    let mcp = auth::protect(Router::new().nest_service("/mcp", service), config.api_key);
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(mcp)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sparql_core::ConnectionDefaults;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn health_stays_open_when_api_key_is_set() {
        let dispatcher = Arc::new(Dispatcher::new(ConnectionDefaults::default()));
        let config = McpHttpServerConfig::default().with_api_key(Some("k1".to_string()));
        let router = build_router(dispatcher, config);

        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router should respond");
        assert_eq!(health.status(), StatusCode::OK);

        let mcp = router
            .oneshot(Request::post("/mcp").body(Body::empty()).expect("request"))
            .await
            .expect("router should respond");
        assert_eq!(mcp.status(), StatusCode::UNAUTHORIZED);
    }
}
