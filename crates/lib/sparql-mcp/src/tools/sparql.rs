use std::sync::Arc;

use rmcp::ErrorData;
use rmcp::model::{CallToolResult, JsonObject, Tool};
use sparql_core::ToolInvocation;
use sparql_core::dispatch::catalog;

use crate::{SparqlMcp, helpers, map_dispatch_err};

/// Advertised tools, built from the dispatcher catalog.
pub fn tool_list() -> Vec<Tool> {
    catalog()
        .iter()
        .map(|spec| {
            Tool::new(
                spec.name,
                spec.description,
                Arc::new(spec.input_schema.clone()),
            )
        })
        .collect()
}

impl SparqlMcp {
    /// Hands a tool call to the dispatcher with its arguments untouched.
    ///
    /// # Errors
    /// Returns `INVALID_PARAMS` for a tool name outside the catalog. Store
    /// and argument problems come back as tool errors instead.
    pub async fn call_sparql_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ErrorData> {
        let invocation = ToolInvocation::new(name, arguments.unwrap_or_default());
        let reply = self
            .dispatcher
            .dispatch(invocation)
            .await
            .map_err(map_dispatch_err)?;
        Ok(helpers::into_call_result(reply))
    }
}

#[cfg(test)]
mod tests {
    use rmcp::model::{ErrorCode, ListToolsResult};
    use serde_json::{Value, json};
    use sparql_core::{ConnectionDefaults, Dispatcher};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn server_for(store: &MockServer) -> SparqlMcp {
        SparqlMcp::new(Dispatcher::new(ConnectionDefaults::new(store.uri(), "ds")))
    }

    fn arguments(value: Value) -> Option<JsonObject> {
        match value {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    fn first_text(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|content| content.as_text())
            .map(|text| text.text.clone())
            .expect("result should carry text content")
    }

    #[test]
    fn tool_list_matches_the_core_catalog() {
        let tools = tool_list();

        assert_eq!(tools.len(), catalog().len());
        for (tool, spec) in tools.iter().zip(catalog()) {
            assert_eq!(tool.name, spec.name);
            assert_eq!(tool.description.as_deref(), Some(spec.description));
            assert_eq!(tool.input_schema.as_ref(), &spec.input_schema);
        }
    }

    #[test]
    fn listed_tools_serialize_catalog_schemas() {
        let listed = serde_json::to_value(ListToolsResult::with_all_items(tool_list()))
            .expect("encode tool list");

        assert_eq!(listed["tools"][0]["name"], json!("execute_sparql_query"));
        assert_eq!(
            listed["tools"][0]["inputSchema"],
            Value::Object(catalog()[0].input_schema.clone())
        );
        assert_eq!(listed["tools"][2]["inputSchema"]["required"], json!([]));
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let store = MockServer::start().await;

        let err = server_for(&store)
            .call_sparql_tool("drop_dataset", None)
            .await
            .expect_err("unknown tool should be a protocol error");

        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, "Unknown tool: drop_dataset");
        let requests = store.received_requests().await.unwrap_or_default();
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn update_tool_reports_success() {
        let store = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ds/update"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&store)
            .await;

        let result = server_for(&store)
            .call_sparql_tool(
                "execute_sparql_update",
                arguments(json!({ "update": "INSERT DATA {<a><b><c>}" })),
            )
            .await
            .expect("tool call should succeed");

        assert_eq!(result.is_error, Some(false));
        assert_eq!(first_text(&result), "Update successful");
    }

    #[tokio::test]
    async fn query_tool_reports_store_errors_as_tool_errors() {
        let store = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ds/query"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&store)
            .await;

        let result = server_for(&store)
            .call_sparql_tool(
                "execute_sparql_query",
                arguments(json!({ "query": "SELECT * {}" })),
            )
            .await
            .expect("store failures are tool errors, not protocol errors");

        assert_eq!(result.is_error, Some(true));
        assert!(first_text(&result).contains("SPARQL query failed"));
    }

    #[tokio::test]
    async fn missing_query_reaches_the_store() {
        let store = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ds/query"))
            .respond_with(ResponseTemplate::new(400).set_body_string("No query string"))
            .expect(1)
            .mount(&store)
            .await;

        let result = server_for(&store)
            .call_sparql_tool("execute_sparql_query", None)
            .await
            .expect("missing arguments are tool errors, not protocol errors");

        assert_eq!(result.is_error, Some(true));
        assert!(first_text(&result).ends_with("No query string"));
    }

    #[tokio::test]
    async fn non_string_dataset_falls_back_to_default() {
        let store = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ds/query"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "head": {}, "boolean": true })),
            )
            .expect(1)
            .mount(&store)
            .await;

        let result = server_for(&store)
            .call_sparql_tool(
                "execute_sparql_query",
                arguments(json!({ "query": "ASK {}", "dataset": 42 })),
            )
            .await
            .expect("tool call should succeed");

        assert_eq!(result.is_error, Some(false));
        let body: Value = serde_json::from_str(&first_text(&result)).expect("result JSON");
        assert_eq!(body, json!({ "head": {}, "boolean": true }));
    }

    #[tokio::test]
    async fn list_graphs_tool_honours_dataset_override() {
        let store = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/archive/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "head": { "vars": ["g"] },
                "results": { "bindings": [ { "g": { "type": "uri", "value": "http://a" } } ] }
            })))
            .expect(1)
            .mount(&store)
            .await;

        let result = server_for(&store)
            .call_sparql_tool("list_graphs", arguments(json!({ "dataset": "archive" })))
            .await
            .expect("tool call should succeed");

        assert_eq!(result.is_error, Some(false));
        let graphs: Vec<String> =
            serde_json::from_str(&first_text(&result)).expect("graph list JSON");
        assert_eq!(graphs, vec!["http://a"]);
    }
}
