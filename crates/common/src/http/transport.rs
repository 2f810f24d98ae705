//! Transport abstraction between the client and the network
//!
//! The client only ever needs "send method + URL + headers (+ form body),
//! get status + headers + body". Keeping that behind a trait lets tests swap
//! in [`MockTransport`](crate::testing::MockTransport) and lets hosts plug in
//! their own stack.

use std::collections::BTreeMap;

use async_trait::async_trait;
use envato_domain::EnvatoError;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

/// Outgoing HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
    /// Form-encoded body fields, in send order.
    pub form: Option<Vec<(String, String)>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: BTreeMap::new(), form: None }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers.extend(headers.into_iter().map(|(k, v)| (k.to_lowercase(), v)));
        self
    }

    #[must_use]
    pub fn with_form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.form = Some(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Value of a form field, if the request carries a form body.
    pub fn form_field(&self, name: &str) -> Option<&str> {
        self.form
            .as_ref()
            .and_then(|fields| fields.iter().find(|(key, _)| key == name))
            .map(|(_, value)| value.as_str())
    }
}

/// Received HTTP response. Non-2xx statuses are ordinary responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, headers: BTreeMap::new(), body: body.into() }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Body parsed as JSON, or `None` when it is not JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("http request failed: {0}")]
    Request(String),

    #[error("invalid transport configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<TransportError> for EnvatoError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Config(message) => Self::Config(message),
            other => Self::Network(other.to_string()),
        }
    }
}

/// Sends a request and returns whatever the server answered.
///
/// Implementations must not turn HTTP error statuses into `Err`; only
/// failures to obtain a response at all are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
