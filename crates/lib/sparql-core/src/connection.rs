//! Connection parameters and the precedence rules that produce them.

/// Store base URL used when neither the call nor the process configures one.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3030";
/// Dataset used when neither the call nor the process configures one.
pub const DEFAULT_DATASET: &str = "ds";

/// Fully resolved parameters for a single client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub base_url: String,
    pub dataset: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ConnectionParams {
    #[must_use]
    pub fn new(base_url: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            dataset: dataset.into(),
            username: None,
            password: None,
        }
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Basic-auth pair, present only when both halves are non-empty.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().filter(|value| !value.is_empty())?;
        let password = self.password.as_deref().filter(|value| !value.is_empty())?;
        Some((username, password))
    }

    /// `{base_url}/{dataset}/query`
    #[must_use]
    pub fn query_url(&self) -> String {
        self.service_url("query")
    }

    /// `{base_url}/{dataset}/update`
    #[must_use]
    pub fn update_url(&self) -> String {
        self.service_url("update")
    }

    fn service_url(&self, service: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/{}/{service}", self.dataset)
    }
}

/// Per-call overrides carried by a tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    pub endpoint: Option<String>,
    pub dataset: Option<String>,
}

/// Process-wide defaults, built once at startup and handed to the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionDefaults {
    pub endpoint: Option<String>,
    pub dataset: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ConnectionDefaults {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            dataset: Some(dataset.into()),
            username: None,
            password: None,
        }
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    /// Merges per-call overrides over these defaults.
    ///
    /// Each field resolves to the first non-blank value of: the override,
    /// the configured default, the built-in constant. Credentials are never
    /// overridden per call.
    #[must_use]
    pub fn resolve(&self, overrides: &ConnectionOverrides) -> ConnectionParams {
        let base_url = first_present(
            overrides.endpoint.as_deref(),
            self.endpoint.as_deref(),
            DEFAULT_ENDPOINT,
        );
        let dataset = first_present(
            overrides.dataset.as_deref(),
            self.dataset.as_deref(),
            DEFAULT_DATASET,
        );
        ConnectionParams {
            base_url: base_url.to_string(),
            dataset: dataset.to_string(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

fn first_present<'a>(call: Option<&'a str>, default: Option<&'a str>, fallback: &'a str) -> &'a str {
    [call, default]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
        .unwrap_or(fallback)
}
