//! Request executor
//!
//! Sends authenticated requests to the API and turns every HTTP outcome into
//! a [`ResultSet`] or a typed error. The transport never fails on status, so
//! all classification happens here, in this order:
//!
//! 1. body carries `error_message` → `ResultSet` holding that error
//! 2. `400` → [`EnvatoError::BadRequest`]
//! 3. `401` / `403` → [`EnvatoError::Unauthorized`]
//! 4. `429` → [`EnvatoError::TooManyRequests`] with the `Retry-After` delay
//! 5. anything else → `ResultSet` with the parsed body

use std::sync::Arc;
use std::time::{Duration, Instant};

use envato_common::http::{HttpRequest, HttpResponse, HttpTransport};
use envato_domain::constants::{BAD_REQUEST_MESSAGE, FORBIDDEN_MESSAGE, UNAUTHORIZED_MESSAGE};
use envato_domain::{EnvatoError, HttpOverrides, Result, ResultSet, RetryAfter};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::{form_urlencoded, Url};

use super::params::Params;

/// Builds and sends API requests for a client.
pub struct RequestWriter {
    transport: Arc<dyn HttpTransport>,
    base_uri: Url,
    user_agent: String,
    overrides: HttpOverrides,
}

impl RequestWriter {
    /// # Errors
    /// `Config` when `base_uri` is not an absolute URL.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_uri: &str,
        user_agent: impl Into<String>,
        overrides: HttpOverrides,
    ) -> Result<Self> {
        let base_uri = Url::parse(base_uri)
            .map_err(|e| EnvatoError::Config(format!("Invalid base URI '{base_uri}': {e}")))?;

        Ok(Self { transport, base_uri, user_agent: user_agent.into(), overrides })
    }

    pub fn base_uri(&self) -> &str {
        self.base_uri.as_str()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Absolute URL for `path` with `query` appended as a form-encoded
    /// query string. Absolute paths replace the base URI's path.
    ///
    /// # Errors
    /// `Config` when `path` cannot be joined onto the base URI.
    pub fn url_for(&self, path: &str, query: &Params) -> Result<String> {
        let mut url = self
            .base_uri
            .join(path)
            .map_err(|e| EnvatoError::Config(format!("Invalid request path '{path}': {e}")))?;

        if !query.is_empty() {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query.iter())
                .finish();
            url.set_query(Some(&encoded));
        }
        Ok(url.into())
    }

    /// Send a request with `bearer` as the access token.
    ///
    /// # Errors
    /// The classified HTTP errors described in the module docs, `Network`
    /// when the transport fails, `Config` for an unusable path.
    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        params: Params,
        bearer: &str,
    ) -> Result<ResultSet> {
        let started = Instant::now();
        let url = self.url_for(path, &params)?;

        let authorization = format!("Bearer {bearer}");
        let headers = self.overrides.merge_headers([
            ("user-agent", self.user_agent.as_str()),
            ("authorization", authorization.as_str()),
        ]);

        let request = HttpRequest::new(method, url).with_headers(headers);
        let response = self.transport.send(request).await?;
        debug!(status = response.status, elapsed = ?started.elapsed(), "API responded");

        classify(&response, started.elapsed())
    }
}

impl std::fmt::Debug for RequestWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestWriter")
            .field("base_uri", &self.base_uri.as_str())
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

/// Map a raw response to a result set or a typed error.
pub fn classify(response: &HttpResponse, elapsed: Duration) -> Result<ResultSet> {
    let payload = response.json();

    if let Some(message) = payload.as_ref().and_then(error_message) {
        debug!(%message, "API reported a logical error");
        return Ok(ResultSet::with_error(message, elapsed));
    }

    match response.status {
        400 => Err(EnvatoError::BadRequest(BAD_REQUEST_MESSAGE.into())),
        401 => Err(EnvatoError::Unauthorized(UNAUTHORIZED_MESSAGE.into())),
        403 => Err(EnvatoError::Unauthorized(FORBIDDEN_MESSAGE.into())),
        429 => {
            let delay = retry_after(response.header("retry-after"));
            warn!(retry_after_secs = delay.as_secs_f64(), "rate limited");
            Err(EnvatoError::TooManyRequests(RetryAfter::new(delay)))
        }
        _ => Ok(ResultSet::new(payload, elapsed)),
    }
}

fn error_message(payload: &Value) -> Option<String> {
    match payload.get("error_message")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

/// `Retry-After` as a delay in seconds. Absent, negative or unparseable
/// values mean no delay.
fn retry_after(header: Option<&str>) -> Duration {
    let Some(raw) = header.map(str::trim) else {
        return Duration::ZERO;
    };

    if let Ok(seconds) = raw.parse::<u64>() {
        return Duration::from_secs(seconds);
    }
    match raw.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => {
            Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
        }
        _ => Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use envato_common::testing::MockTransport;
    use envato_common::TransportError;
    use serde_json::json;

    use super::*;

    fn writer(transport: &MockTransport, overrides: HttpOverrides) -> RequestWriter {
        RequestWriter::new(
            Arc::new(transport.clone()),
            "https://api.envato.com/",
            "test-agent",
            overrides,
        )
        .unwrap()
    }

    #[test]
    fn test_url_for_joins_and_encodes_query() {
        let writer = writer(&MockTransport::new(), HttpOverrides::default());

        assert_eq!(
            writer.url_for("/v1/market/total-items.json", &Params::new()).unwrap(),
            "https://api.envato.com/v1/market/total-items.json"
        );
        assert_eq!(
            writer
                .url_for("/v1/discovery/search/search/item", &Params::new().with("term", "a b&c"))
                .unwrap(),
            "https://api.envato.com/v1/discovery/search/search/item?term=a+b%26c"
        );
    }

    #[test]
    fn test_rejects_relative_base_uri() {
        let result = RequestWriter::new(
            Arc::new(MockTransport::new()),
            "not a url",
            "agent",
            HttpOverrides::default(),
        );
        assert!(matches!(result, Err(EnvatoError::Config(_))));
    }

    #[tokio::test]
    async fn test_send_sets_headers_and_overrides_win() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({ "total_items": { "total_items": "100" } }));
        let overrides =
            HttpOverrides::new().with_header("User-Agent", "custom").with_header("X-A", "1");
        let writer = writer(&transport, overrides);

        let result = writer.send(Method::GET, "/a", Params::new(), "tok").await.unwrap();

        assert!(!result.is_error());
        let request = transport.last_request().unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.header("authorization"), Some("Bearer tok"));
        assert_eq!(request.header("user-agent"), Some("custom"));
        assert_eq!(request.header("x-a"), Some("1"));
        assert!(request.form.is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let transport = MockTransport::new();
        transport.push_error(TransportError::Connect("refused".into()));
        let writer = writer(&transport, HttpOverrides::default());

        let err = writer.send(Method::GET, "/a", Params::new(), "tok").await.unwrap_err();
        assert!(matches!(err, EnvatoError::Network(_)));
    }

    #[test]
    fn test_error_message_wins_over_status() {
        let response = HttpResponse::new(401, r#"{"error_message":"Item not found"}"#);
        let result = classify(&response, Duration::from_millis(5)).unwrap();

        assert_eq!(result.error(), Some("Item not found"));
        assert!(result.raw().is_none());
        assert_eq!(result.elapsed(), Duration::from_millis(5));
    }

    #[test]
    fn test_null_error_message_is_ignored() {
        let response = HttpResponse::new(200, r#"{"error_message":null,"ok":true}"#);
        let result = classify(&response, Duration::ZERO).unwrap();
        assert!(!result.is_error());
        assert_eq!(result.get("ok"), Some(&json!(true)));
    }

    #[test]
    fn test_status_classification() {
        let bad = classify(&HttpResponse::new(400, ""), Duration::ZERO).unwrap_err();
        assert_eq!(bad.to_string(), BAD_REQUEST_MESSAGE);

        let unauthorized = classify(&HttpResponse::new(401, "{}"), Duration::ZERO).unwrap_err();
        let forbidden = classify(&HttpResponse::new(403, "{}"), Duration::ZERO).unwrap_err();
        assert!(matches!(&unauthorized, EnvatoError::Unauthorized(m) if m == UNAUTHORIZED_MESSAGE));
        assert!(matches!(&forbidden, EnvatoError::Unauthorized(m) if m == FORBIDDEN_MESSAGE));
        assert_ne!(unauthorized.to_string(), forbidden.to_string());
    }

    #[test]
    fn test_too_many_requests_carries_retry_after() {
        let response = HttpResponse::new(429, "").with_header("Retry-After", "5");
        let err = classify(&response, Duration::ZERO).unwrap_err();

        let retry = err.retry_after().unwrap();
        assert_eq!(retry.retry_after(), Duration::from_secs(5));
        assert!(retry.seconds_remaining() <= 5.0);
        assert!(retry.seconds_remaining() > 4.0);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_retry_after_parsing() {
        assert_eq!(retry_after(None), Duration::ZERO);
        assert_eq!(retry_after(Some(" 7 ")), Duration::from_secs(7));
        assert_eq!(retry_after(Some("1.5")), Duration::from_millis(1500));
        assert_eq!(retry_after(Some("-3")), Duration::ZERO);
        assert_eq!(retry_after(Some("Wed, 21 Oct 2015 07:28:00 GMT")), Duration::ZERO);
    }

    #[test]
    fn test_non_json_body_gives_empty_payload() {
        let response = HttpResponse::new(500, "<html>oops</html>");
        let result = classify(&response, Duration::ZERO).unwrap();
        assert!(result.raw().is_none());
        assert!(!result.is_error());
    }
}
