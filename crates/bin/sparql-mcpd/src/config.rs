use clap::{Parser, builder::BoolishValueParser};
use sparql_core::ConnectionDefaults;
use sparql_core::connection::{DEFAULT_DATASET, DEFAULT_ENDPOINT};
use sparql_mcp::server::{DEFAULT_MCP_HTTP_ADDR, McpHttpServerConfig};
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[command(name = "sparql-mcpd", version, about = "SPARQL MCP daemon.")]
struct CliArgs {
    #[arg(short = 'e', long, env = "JENA_FUSEKI_URL", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    #[arg(short = 'd', long, env = "DEFAULT_DATASET", default_value = DEFAULT_DATASET)]
    dataset: String,

    #[arg(short = 'u', long, env = "JENA_USERNAME")]
    username: Option<String>,

    #[arg(short = 'p', long, env = "JENA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(
        long,
        env = "SPARQL_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    request_timeout_secs: u64,

    #[arg(
        long = "http",
        env = "SPARQL_MCP_HTTP",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    enable_http: bool,

    #[arg(long, env = "SPARQL_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    http_addr: SocketAddr,

    #[arg(long, env = "SPARQL_MCP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Clone)]
pub struct SparqlConfig {
    pub endpoint: String,
    pub dataset: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub request_timeout: Option<Duration>,
    pub enable_http: bool,
    pub http_addr: SocketAddr,
    pub api_key: Option<String>,
}

impl fmt::Debug for SparqlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparqlConfig")
            .field("endpoint", &self.endpoint)
            .field("dataset", &self.dataset)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("enable_http", &self.enable_http)
            .field("http_addr", &self.http_addr)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl SparqlConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }

    pub fn connection_defaults(&self) -> ConnectionDefaults {
        ConnectionDefaults::new(self.endpoint.clone(), self.dataset.clone())
            .with_credentials(self.username.clone(), self.password.clone())
    }

    pub fn http_server_config(&self) -> McpHttpServerConfig {
        McpHttpServerConfig::new(self.http_addr).with_api_key(self.api_key.clone())
    }
}

impl TryFrom<CliArgs> for SparqlConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let endpoint = args.endpoint.trim().to_string();
        let endpoint_is_http = Url::parse(&endpoint)
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https"));
        if !endpoint_is_http {
            return Err(ConfigError::InvalidSetting {
                name: "JENA_FUSEKI_URL",
                value: args.endpoint,
            });
        }

        if args.dataset.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "DEFAULT_DATASET",
                value: args.dataset,
            });
        }

        let username = args.username.filter(|value| !value.trim().is_empty());
        let password = args.password.filter(|value| !value.is_empty());
        let api_key = args.api_key.filter(|value| !value.trim().is_empty());
        let request_timeout = if args.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(args.request_timeout_secs))
        };

        Ok(Self {
            endpoint,
            dataset: args.dataset.trim().to_string(),
            username,
            password,
            request_timeout,
            enable_http: args.enable_http,
            http_addr: args.http_addr,
            api_key,
        })
    }
}
