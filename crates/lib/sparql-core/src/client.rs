//! SPARQL 1.1 protocol client.
//!
//! Queries go out as `GET {base}/{dataset}/query?query=...`, updates as a
//! form-encoded `POST {base}/{dataset}/update`. Every operation is a single
//! HTTP exchange with no retries.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::connection::ConnectionParams;

/// Media type requested for query results.
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
/// Confirmation returned by a successful update.
pub const UPDATE_SUCCESSFUL: &str = "Update successful";
/// Query used to enumerate named graphs.
pub const LIST_GRAPHS_QUERY: &str = "SELECT DISTINCT ?g WHERE { GRAPH ?g { ?s ?p ?o } }";

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

const GRAPH_VAR: &str = "g";

#[derive(Debug, thiserror::Error)]
pub enum SparqlError {
    #[error("SPARQL query failed: {message}. {detail}")]
    Query { message: String, detail: String },
    #[error("SPARQL update failed: {message}. {detail}")]
    Update { message: String, detail: String },
    #[error("malformed query result: {0}")]
    MalformedResult(String),
    #[error("failed to encode tool result: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),
}

/// Query response body exactly as the store sent it.
///
/// SPARQL results JSON is kept verbatim, including members this crate never
/// reads. A body that is not JSON at all (a CONSTRUCT answered in Turtle,
/// say) is carried as a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryResult(Value);

impl QueryResult {
    #[must_use]
    pub fn from_body(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(value) => Self(value),
            Err(_) => Self(Value::String(body)),
        }
    }

    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Projects `g.value` of every row, keeping row order.
    ///
    /// # Errors
    /// Returns [`SparqlError::MalformedResult`] when the document has no
    /// bindings array or a row lacks a string `g` value.
    pub fn graph_names(&self) -> Result<Vec<String>, SparqlError> {
        let Some(bindings) = self.0.pointer("/results/bindings").and_then(Value::as_array) else {
            return Err(SparqlError::MalformedResult(
                "response has no results bindings".to_string(),
            ));
        };
        bindings
            .iter()
            .enumerate()
            .map(|(index, binding)| {
                binding
                    .get(GRAPH_VAR)
                    .and_then(|term| term.get("value"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        SparqlError::MalformedResult(format!(
                            "binding {index} has no `{GRAPH_VAR}` value"
                        ))
                    })
            })
            .collect()
    }
}

impl From<Value> for QueryResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Builds the shared HTTP client, optionally bounded by a request timeout.
///
/// # Errors
/// Returns [`SparqlError::ClientBuild`] when the TLS backend cannot be
/// initialised.
pub fn http_client(timeout: Option<Duration>) -> Result<Client, SparqlError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(SparqlError::ClientBuild)
}

/// Client bound to one endpoint and dataset.
#[derive(Debug, Clone)]
pub struct SparqlClient {
    http: Client,
    params: ConnectionParams,
}

impl SparqlClient {
    #[must_use]
    pub fn new(params: ConnectionParams) -> Self {
        Self::with_http(Client::new(), params)
    }

    #[must_use]
    pub const fn with_http(http: Client, params: ConnectionParams) -> Self {
        Self { http, params }
    }

    #[must_use]
    pub const fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Runs a query through the SPARQL query protocol.
    ///
    /// # Errors
    /// Returns [`SparqlError::Query`] on transport failure or a non-2xx
    /// status.
    pub async fn execute_query(&self, query: &str) -> Result<QueryResult, SparqlError> {
        self.query(Some(query)).await
    }

    /// Query request with the `query` parameter left off when there is no
    /// text.
    pub(crate) async fn query(&self, query: Option<&str>) -> Result<QueryResult, SparqlError> {
        let url = self.params.query_url();
        debug!(url = %url, dataset = %self.params.dataset, "SPARQL query request");

        let mut request = self.http.get(&url).header(header::ACCEPT, SPARQL_RESULTS_JSON);
        if let Some(query) = query {
            request = request.query(&[("query", query)]);
        }
        let response = send(self.authorize(request))
            .await
            .map_err(Failure::into_query_error)?;

        let body = response
            .text()
            .await
            .map_err(|err| Failure::transport(&err).into_query_error())?;
        Ok(QueryResult::from_body(body))
    }

    /// Runs an update through the SPARQL update protocol.
    ///
    /// # Errors
    /// Returns [`SparqlError::Update`] on transport failure or a non-2xx
    /// status.
    pub async fn execute_update(&self, update: &str) -> Result<String, SparqlError> {
        self.update(Some(update)).await
    }

    /// Update request with an empty form when there is no text.
    pub(crate) async fn update(&self, update: Option<&str>) -> Result<String, SparqlError> {
        let url = self.params.update_url();
        debug!(url = %url, dataset = %self.params.dataset, "SPARQL update request");

        let request = match update {
            Some(update) => self.http.post(&url).form(&[("update", update)]),
            None => self.http.post(&url).header(header::CONTENT_TYPE, FORM_URLENCODED),
        };
        send(self.authorize(request))
            .await
            .map_err(Failure::into_update_error)?;

        Ok(UPDATE_SUCCESSFUL.to_string())
    }

    /// Lists the named graphs in the dataset.
    ///
    /// # Errors
    /// Propagates [`SparqlError::Query`] from the listing query, or returns
    /// [`SparqlError::MalformedResult`] when the answer has no bindings or a
    /// row has no graph binding.
    pub async fn list_graphs(&self) -> Result<Vec<String>, SparqlError> {
        let result = self.execute_query(LIST_GRAPHS_QUERY).await?;
        result.graph_names()
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.params.credentials() {
            Some((username, password)) => request.basic_auth(username, Some(password)),
            None => request,
        }
    }
}

/// Transport detail plus whatever the server said about it.
#[derive(Debug)]
struct Failure {
    message: String,
    detail: String,
}

impl Failure {
    fn transport(err: &reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            detail: String::new(),
        }
    }

    async fn from_response(response: Response) -> Self {
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                debug!(status, error = %err, "could not read error response body");
                String::new()
            }
        };
        Self {
            message: format!("Request failed with status code {status}"),
            detail: server_message(&body),
        }
    }

    fn into_query_error(self) -> SparqlError {
        SparqlError::Query {
            message: self.message,
            detail: self.detail,
        }
    }

    fn into_update_error(self) -> SparqlError {
        SparqlError::Update {
            message: self.message,
            detail: self.detail,
        }
    }
}

async fn send(request: RequestBuilder) -> Result<Response, Failure> {
    let response = request
        .send()
        .await
        .map_err(|err| Failure::transport(&err))?;
    if response.status().is_success() {
        return Ok(response);
    }
    Err(Failure::from_response(response).await)
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// JSON `message` field when the store sends one, the plain body otherwise.
fn server_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
        }) => message,
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn server_message_prefers_json_message() {
        assert_eq!(server_message(r#"{"message":"bad query"}"#), "bad query");
        assert_eq!(
            server_message("Error 400: Parse error\n"),
            "Error 400: Parse error"
        );
        assert_eq!(server_message(""), "");
    }

    #[test]
    fn error_messages_follow_template() {
        let err = Failure {
            message: "Request failed with status code 500".to_string(),
            detail: String::new(),
        }
        .into_query_error();
        assert_eq!(
            err.to_string(),
            "SPARQL query failed: Request failed with status code 500. "
        );

        let err = Failure {
            message: "Request failed with status code 400".to_string(),
            detail: "Parse error".to_string(),
        }
        .into_update_error();
        assert_eq!(
            err.to_string(),
            "SPARQL update failed: Request failed with status code 400. Parse error"
        );
    }

    #[test]
    fn graph_names_keep_binding_order() {
        let result = QueryResult::from(json!({
            "head": { "vars": ["g"] },
            "results": { "bindings": [
                { "g": { "type": "uri", "value": "http://b" } },
                { "g": { "type": "uri", "value": "http://a" } }
            ] }
        }));

        let names = result.graph_names().expect("graph names should resolve");
        assert_eq!(names, vec!["http://b", "http://a"]);
    }

    #[test]
    fn graph_names_reject_rows_without_graph() {
        let result = QueryResult::from(json!({
            "head": { "vars": ["s"] },
            "results": { "bindings": [ { "s": { "type": "uri", "value": "http://s" } } ] }
        }));

        let err = result.graph_names().expect_err("missing g should fail");
        assert!(matches!(err, SparqlError::MalformedResult(_)));
        assert!(err.to_string().contains("binding 0"));
    }

    #[test]
    fn ask_results_have_no_graph_names() {
        let result = QueryResult::from_body(r#"{"head":{},"boolean":true}"#.to_string());

        assert_eq!(result.as_value(), &json!({ "head": {}, "boolean": true }));
        assert!(matches!(
            result.graph_names(),
            Err(SparqlError::MalformedResult(_))
        ));
    }

    #[test]
    fn body_is_kept_verbatim() {
        let body = r#"{"head":{"vars":["s","o"]},"results":{"distinct":false,"ordered":true,"bindings":[{"s":{"type":"triple","value":{"subject":{"type":"uri","value":"http://a"}}},"o":{"type":"literal","value":"x"}}]}}"#;

        let result = QueryResult::from_body(body.to_string());

        assert_eq!(
            serde_json::to_string(&result).expect("encode result"),
            body
        );
    }

    #[test]
    fn non_json_body_is_carried_as_text() {
        let result = QueryResult::from_body("<a> <b> <c> .".to_string());

        assert_eq!(result.into_value(), Value::String("<a> <b> <c> .".to_string()));
    }
}
