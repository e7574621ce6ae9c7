//! Tool catalog and dispatch.
//!
//! The dispatcher routes a named invocation to a fresh [`SparqlClient`] and
//! folds the outcome into a [`ToolReply`]. Client failures never escape: they
//! become `isError: true` replies. Only an unknown tool name is returned as
//! an error, since that is a protocol-level misuse rather than a tool fault.

use std::sync::LazyLock;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::client::{SparqlClient, SparqlError};
use crate::connection::{ConnectionDefaults, ConnectionOverrides};

pub type JsonObject = Map<String, Value>;

const DATASET_DESCRIPTION: &str = "Dataset name. If not provided, uses the default dataset.";
const ENDPOINT_DESCRIPTION: &str =
    "SPARQL server endpoint. If not provided, uses the default endpoint.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Query,
    Update,
    ListGraphs,
}

impl ToolKind {
    pub const ALL: [Self; 3] = [Self::Query, Self::Update, Self::ListGraphs];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Query => "execute_sparql_query",
            Self::Update => "execute_sparql_update",
            Self::ListGraphs => "list_graphs",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Query => "Execute a SPARQL query against a SPARQL 1.1 dataset",
            Self::Update => "Execute a SPARQL update against a SPARQL 1.1 dataset",
            Self::ListGraphs => "List all available named graphs in a SPARQL 1.1 dataset",
        }
    }

    /// Argument carrying the SPARQL text, if the tool takes one.
    #[must_use]
    pub const fn text_argument(self) -> Option<&'static str> {
        match self {
            Self::Query => Some("query"),
            Self::Update => Some("update"),
            Self::ListGraphs => None,
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    fn input_schema(self) -> JsonObject {
        let mut properties = Map::new();
        let mut required = Vec::new();
        if let Some(argument) = self.text_argument() {
            let description = match self {
                Self::Update => "The SPARQL update to execute",
                _ => "The SPARQL query to execute",
            };
            properties.insert(
                argument.to_string(),
                json!({ "type": "string", "description": description }),
            );
            required.push(Value::from(argument));
        }
        properties.insert(
            "dataset".to_string(),
            json!({ "type": "string", "description": DATASET_DESCRIPTION }),
        );
        properties.insert(
            "endpoint".to_string(),
            json!({ "type": "string", "description": ENDPOINT_DESCRIPTION }),
        );

        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::from("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), Value::Array(required));
        schema
    }
}

/// Catalog entry advertised to the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: JsonObject,
}

static CATALOG: LazyLock<Vec<ToolSpec>> = LazyLock::new(|| {
    ToolKind::ALL
        .into_iter()
        .map(|kind| ToolSpec {
            name: kind.name(),
            description: kind.description(),
            input_schema: kind.input_schema(),
        })
        .collect()
});

/// The fixed tool catalog.
#[must_use]
pub fn catalog() -> &'static [ToolSpec] {
    &CATALOG
}

/// Inbound tool call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    #[serde(default)]
    pub arguments: JsonObject,
}

impl ToolInvocation {
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: JsonObject) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    fn string_argument(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }

    fn overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            endpoint: self.string_argument("endpoint").map(str::to_string),
            dataset: self.string_argument("dataset").map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReplyContent {
    Text { text: String },
}

/// Reply envelope; identical in shape for every tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolReply {
    pub content: Vec<ReplyContent>,
    pub is_error: bool,
}

impl ToolReply {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![ReplyContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ReplyContent::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// Text of the first content item.
    #[must_use]
    pub fn text(&self) -> &str {
        match self.content.first() {
            Some(ReplyContent::Text { text }) => text,
            None => "",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Routes tool invocations to the SPARQL client.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    defaults: ConnectionDefaults,
    http: Client,
}

impl Dispatcher {
    #[must_use]
    pub fn new(defaults: ConnectionDefaults) -> Self {
        Self::with_http(defaults, Client::new())
    }

    #[must_use]
    pub const fn with_http(defaults: ConnectionDefaults, http: Client) -> Self {
        Self { defaults, http }
    }

    #[must_use]
    pub const fn defaults(&self) -> &ConnectionDefaults {
        &self.defaults
    }

    #[must_use]
    pub fn catalog(&self) -> &'static [ToolSpec] {
        catalog()
    }

    /// Runs one invocation.
    ///
    /// # Errors
    /// Returns [`DispatchError::UnknownTool`] when the name is not in the
    /// catalog. Every other failure is reported inside the reply.
    pub async fn dispatch(&self, invocation: ToolInvocation) -> Result<ToolReply, DispatchError> {
        let Some(kind) = ToolKind::from_name(&invocation.name) else {
            return Err(DispatchError::UnknownTool(invocation.name));
        };

        let params = self.defaults.resolve(&invocation.overrides());
        debug!(
            tool = kind.name(),
            endpoint = %params.base_url,
            dataset = %params.dataset,
            "dispatching tool call"
        );
        let client = SparqlClient::with_http(self.http.clone(), params);
        // Missing SPARQL text is left off the request so the store reports it.
        let text = kind
            .text_argument()
            .and_then(|key| invocation.string_argument(key));

        match run(&client, kind, text).await {
            Ok(payload) => Ok(ToolReply::success(payload)),
            Err(err) => {
                warn!(tool = kind.name(), error = %err, "tool call failed");
                Ok(ToolReply::error(err.to_string()))
            }
        }
    }
}

async fn run(
    client: &SparqlClient,
    kind: ToolKind,
    text: Option<&str>,
) -> Result<String, SparqlError> {
    match kind {
        ToolKind::Query => {
            let result = client.query(text).await?;
            Ok(serde_json::to_string_pretty(&result)?)
        }
        ToolKind::Update => client.update(text).await,
        ToolKind::ListGraphs => {
            let graphs = client.list_graphs().await?;
            Ok(serde_json::to_string_pretty(&graphs)?)
        }
    }
}
