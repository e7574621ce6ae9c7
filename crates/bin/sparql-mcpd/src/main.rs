//! Daemon entry point for the SPARQL MCP server.
//!
//! Loads configuration from CLI flags and the environment, builds the tool
//! dispatcher, and serves the MCP protocol over stdio or streamable HTTP.

mod config;
mod dispatcher;

use std::sync::Arc;

use sparql_mcp::server::{serve_stdio, serve_streamable_http};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::SparqlConfig;
use crate::dispatcher::build_dispatcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // stdout belongs to the stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = SparqlConfig::from_args()?;
    info!(endpoint = %config.endpoint, "connecting to SPARQL endpoint");
    info!(dataset = %config.dataset, "using default dataset");
    if let Some(username) = config.username.as_deref() {
        info!(username, "using basic authentication");
    }

    let dispatcher = Arc::new(build_dispatcher(&config)?);
    if config.enable_http {
        serve_streamable_http(dispatcher, config.http_server_config()).await
    } else {
        serve_stdio(dispatcher).await
    }
}
