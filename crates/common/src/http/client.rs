use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Certificate, Client as ReqwestClient, Proxy};
use serde_json::Value;
use tracing::debug;

use super::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// reqwest-backed [`HttpTransport`] with timeouts and connection retries.
///
/// HTTP error statuses are returned as responses. Only failures to reach the
/// server are retried, and only when more than one attempt is configured.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }

    /// Execute the request with retry semantics.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 0..attempts {
            let method = request.method.clone();
            let url = request.url.as_str();
            debug!(attempt = attempt + 1, %method, %url, "sending HTTP request");

            match self.build(&request).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    debug!(attempt = attempt + 1, %method, %url, status, "received HTTP response");
                    return read_response(response).await;
                }
                Err(err) => {
                    debug!(attempt = attempt + 1, %method, %url, error = %err, "HTTP request failed");

                    if attempt + 1 < attempts && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Err(err.into());
                }
            }
        }

        Err(TransportError::Request(
            "http client exhausted retries without producing a result".into(),
        ))
    }

    fn build(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }
        builder
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.execute(request).await
    }
}

async fn read_response(response: reqwest::Response) -> Result<HttpResponse, TransportError> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|value| (name.as_str().to_lowercase(), value.to_string()))
        })
        .collect();
    let body = response.text().await?;
    Ok(HttpResponse { status, headers, body })
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    connect_timeout: Option<Duration>,
    max_attempts: usize,
    base_backoff: Duration,
    proxy: Option<String>,
    ca_bundle: Option<PathBuf>,
    accept_invalid_certs: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(envato_domain::constants::DEFAULT_TIMEOUT_SECS),
            connect_timeout: None,
            max_attempts: envato_domain::constants::DEFAULT_MAX_ATTEMPTS,
            base_backoff: Duration::from_millis(200),
            proxy: None,
            ca_bundle: None,
            accept_invalid_certs: false,
        }
    }
}

impl HttpClientBuilder {
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    #[must_use]
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    #[must_use]
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy = Some(url.into());
        self
    }

    /// Trust the PEM certificate bundle at `path` in addition to the
    /// built-in roots.
    #[must_use]
    pub fn ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_bundle = Some(path.into());
        self
    }

    #[must_use]
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    /// Apply transport options supplied as loosely typed overrides.
    ///
    /// Recognized keys: `timeout` and `connect_timeout` (seconds), `proxy`
    /// (URL) and `verify` (`false`, or a CA bundle path). Other keys are
    /// ignored.
    #[must_use]
    pub fn apply_options(mut self, options: &BTreeMap<String, Value>) -> Self {
        for (key, value) in options {
            match (key.as_str(), value) {
                ("timeout", value) if seconds(value).is_some() => {
                    self.timeout = seconds(value).unwrap_or(self.timeout);
                }
                ("connect_timeout", value) if seconds(value).is_some() => {
                    self.connect_timeout = seconds(value);
                }
                ("proxy", Value::String(url)) => self.proxy = Some(url.clone()),
                ("verify", Value::Bool(verify)) => self.accept_invalid_certs = !verify,
                ("verify", Value::String(path)) => self.ca_bundle = Some(PathBuf::from(path)),
                (key, value) => {
                    debug!(option = key, %value, "ignoring unsupported transport option");
                }
            }
        }
        self
    }

    pub fn build(self) -> Result<HttpClient, TransportError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout);

        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        match &self.proxy {
            Some(url) => {
                let proxy = Proxy::all(url.as_str())
                    .map_err(|err| TransportError::Config(format!("invalid proxy {url}: {err}")))?;
                builder = builder.proxy(proxy);
            }
            None => builder = builder.no_proxy(),
        }

        if let Some(path) = &self.ca_bundle {
            let pem = std::fs::read(path).map_err(|err| {
                TransportError::Config(format!("cannot read CA bundle {}: {err}", path.display()))
            })?;
            let certificates = Certificate::from_pem_bundle(&pem).map_err(|err| {
                TransportError::Config(format!("invalid CA bundle {}: {err}", path.display()))
            })?;
            for certificate in certificates {
                builder = builder.add_root_certificate(certificate);
            }
        }

        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|err| TransportError::Config(err.to_string()))?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}

fn seconds(value: &Value) -> Option<Duration> {
    let secs = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    if err.is_timeout() {
        return true;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::Method;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with_defaults() -> HttpClient {
        HttpClient::builder()
            .base_backoff(Duration::from_millis(10))
            .max_attempts(3)
            .build()
            .expect("http client")
    }

    #[tokio::test]
    async fn returns_successful_response_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/market/total-users.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"total-users":{"total_users":"1"}}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response = client
            .execute(HttpRequest::new(
                Method::GET,
                format!("{}/v1/market/total-users.json", server.uri()),
            ))
            .await
            .expect("response");

        assert_eq!(response.status, 200);
        assert!(response.json().is_some());
    }

    #[tokio::test]
    async fn error_statuses_are_responses_not_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.execute(HttpRequest::new(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status, 429);
        assert_eq!(response.header("Retry-After"), Some("7"));
    }

    #[tokio::test]
    async fn does_not_retry_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.execute(HttpRequest::new(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn sends_headers_and_form_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("user-agent", "tests"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_string(), "tests".to_string());
        let request = HttpRequest::new(Method::POST, format!("{}/token", server.uri()))
            .with_headers(headers)
            .with_form([("grant_type", "refresh_token")]);

        let response = client_with_defaults().execute(request).await.expect("response");
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn reports_network_failure_after_retries() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        let url = format!("http://{}", addr);

        let client = HttpClient::builder()
            .base_backoff(Duration::from_millis(5))
            .max_attempts(2)
            .build()
            .expect("http client");

        let result = client.execute(HttpRequest::new(Method::GET, url)).await;
        assert!(matches!(result, Err(TransportError::Connect(_) | TransportError::Request(_))));
    }

    #[test]
    fn applies_known_options_and_ignores_the_rest() {
        let mut options = BTreeMap::new();
        options.insert("timeout".to_string(), json!(2.5));
        options.insert("connect_timeout".to_string(), json!("1"));
        options.insert("verify".to_string(), json!(false));
        options.insert("handler".to_string(), json!("custom"));

        let builder = HttpClient::builder().apply_options(&options);
        assert_eq!(builder.timeout, Duration::from_millis(2500));
        assert_eq!(builder.connect_timeout, Some(Duration::from_secs(1)));
        assert!(builder.accept_invalid_certs);
        assert!(builder.build().is_ok());
    }

    #[test]
    fn ignores_timeouts_too_large_for_a_duration() {
        let mut options = BTreeMap::new();
        options.insert("timeout".to_string(), json!(1e20));
        options.insert("connect_timeout".to_string(), json!("1e20"));

        let default_timeout = HttpClient::builder().timeout;
        let builder = HttpClient::builder().apply_options(&options);
        assert_eq!(builder.timeout, default_timeout);
        assert_eq!(builder.connect_timeout, None);
        assert!(builder.build().is_ok());
    }

    #[test]
    fn rejects_missing_ca_bundle() {
        let mut options = BTreeMap::new();
        options.insert("verify".to_string(), json!("/nonexistent/cacert.pem"));

        let result = HttpClient::builder().apply_options(&options).build();
        assert!(matches!(result, Err(TransportError::Config(_))));
    }
}
