//! Configuration management

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    DEFAULT_BASE_URI, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};

/// Client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvatoConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// API transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default)]
    pub http: HttpOverrides,
}

/// Credentials. Either a personal token or an OAuth application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing)]
    pub personal_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// Persisted session JSON to resume an OAuth login.
    #[serde(default, skip_serializing)]
    pub session: Option<String>,
}

impl AuthConfig {
    /// True when enough is configured to pick an authentication mode.
    pub fn has_credentials(&self) -> bool {
        self.personal_token.as_deref().is_some_and(|t| !t.trim().is_empty())
            || self.client_id.is_some()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_uri: default_base_uri(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout_seconds(),
            max_attempts: default_max_attempts(),
            http: HttpOverrides::default(),
        }
    }
}

fn default_base_uri() -> String {
    DEFAULT_BASE_URI.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

const fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

/// Caller-supplied HTTP overrides.
///
/// `headers` are merged over the client's defaults; every other key is an
/// option handed to the transport (`timeout`, `connect_timeout`, `proxy`,
/// `verify`). All keys are stored lowercase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawOverrides")]
pub struct HttpOverrides {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
    #[serde(flatten)]
    options: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct RawOverrides {
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(flatten)]
    options: BTreeMap<String, Value>,
}

impl From<RawOverrides> for HttpOverrides {
    fn from(raw: RawOverrides) -> Self {
        let mut overrides = Self::default();
        for (key, value) in raw.headers {
            overrides.headers.insert(key.to_lowercase(), value);
        }
        for (key, value) in raw.options {
            let key = key.to_lowercase();
            if key != "headers" {
                overrides.options.insert(key, value);
                continue;
            }
            // Differently-cased `Headers` lands here instead of the named field.
            if let Value::Object(headers) = value {
                for (name, value) in headers {
                    if let Value::String(value) = value {
                        overrides.headers.insert(name.to_lowercase(), value);
                    }
                }
            }
        }
        overrides
    }
}

impl HttpOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name.as_ref().to_lowercase(), value.into());
        self
    }

    /// Add a transport option. The key `headers` is reserved and ignored.
    #[must_use]
    pub fn with_option(mut self, key: impl AsRef<str>, value: impl Into<Value>) -> Self {
        let key = key.as_ref().to_lowercase();
        if key != "headers" {
            self.options.insert(key, value.into());
        }
        self
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn options(&self) -> &BTreeMap<String, Value> {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(&key.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.options.is_empty()
    }

    /// Merge override headers over `defaults`, lower-casing every name.
    ///
    /// Overrides win on conflicts.
    pub fn merge_headers<I, K, V>(&self, defaults: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut merged: BTreeMap<String, String> = defaults
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_lowercase(), value.into()))
            .collect();
        merged.extend(self.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}
