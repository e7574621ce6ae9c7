//! MCP server implementation for sparql-mcp.
//!
//! This crate wires the core dispatcher into rmcp tool handlers and exposes the
//! MCP-facing API surface for SPARQL query, update, and graph listing.

mod auth;
mod helpers;
mod tools;
pub mod server;

pub use auth::{API_KEY_HEADER, API_KEY_QUERY_PARAM};

use std::sync::Arc;

use rmcp::{
    ErrorData,
    RoleServer,
    ServerHandler,
    model::{
        CallToolRequestParams,
        CallToolResult,
        ErrorCode,
        ListToolsResult,
        PaginatedRequestParams,
        ServerCapabilities,
        ServerInfo,
    },
    service::RequestContext,
};
use sparql_core::{DispatchError, Dispatcher};

const SERVER_INSTRUCTIONS: &str = r"sparql-mcp runs SPARQL 1.1 queries and updates against a triple store.

Tools:
- `execute_sparql_query`: run a SPARQL query (SELECT, ASK, ...). Returns the store's results JSON.
- `execute_sparql_update`: run a SPARQL update (INSERT DATA, DELETE WHERE, CLEAR, ...).
- `list_graphs`: list the named graphs in a dataset as a JSON array of URIs.

Every tool accepts optional `dataset` and `endpoint` arguments that override the server
defaults for that call only. Query and update text is sent to the store unchanged; store
errors are returned as tool errors with the store's own message.";

/// MCP server wrapper around the SPARQL dispatcher.
#[derive(Clone)]
pub struct SparqlMcp {
    dispatcher: Arc<Dispatcher>,
}

impl SparqlMcp {
    /// Creates a new server using a dispatcher by value.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::with_dispatcher(Arc::new(dispatcher))
    }

    /// Creates a new server using a shared dispatcher handle.
    #[must_use]
    pub const fn with_dispatcher(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

fn map_dispatch_err(err: DispatchError) -> ErrorData {
    match err {
        DispatchError::UnknownTool(name) => helpers::mcp_err(
            ErrorCode::INVALID_PARAMS,
            format!("Unknown tool: {name}"),
        ),
    }
}

impl ServerHandler for SparqlMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(tools::sparql::tool_list()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.call_sparql_tool(&request.name, request.arguments).await
    }
}
