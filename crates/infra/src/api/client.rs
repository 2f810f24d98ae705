//! Envato API client
//!
//! Holds an authentication procedure, hands out endpoint groups, and makes
//! sure every request carries a live token: an expired OAuth token is
//! refreshed once, behind a single-flight gate, before the request goes out.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use envato_common::auth::AuthProcedure;
use envato_common::http::{HttpClient, HttpTransport};
use envato_domain::constants::WHOAMI_PATH;
use envato_domain::{ApiConfig, EnvatoConfig, EnvatoError, Identity, Result, ResultSet};
use reqwest::Method;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::auth::build_procedure;
use super::endpoint::Endpoint;
use super::groups::{Catalog, Market, Profile, User};
use super::params::Params;
use super::request::RequestWriter;
use super::schema::Schema;

/// Authenticated connection to the Envato API.
pub struct EnvatoClient {
    procedure: Arc<dyn AuthProcedure>,
    request: RequestWriter,
    schema: Arc<Schema>,
    token_gate: Mutex<()>,
}

impl EnvatoClient {
    /// Create a client with the default API configuration.
    ///
    /// The procedure must already hold a token.
    ///
    /// # Errors
    /// `NotAuthenticated` when the procedure has no token.
    pub fn new(procedure: Arc<dyn AuthProcedure>) -> Result<Self> {
        Self::builder().procedure(procedure).build()
    }

    /// Create a client with a custom API configuration.
    pub fn with_config(procedure: Arc<dyn AuthProcedure>, config: ApiConfig) -> Result<Self> {
        Self::builder().procedure(procedure).config(config).build()
    }

    /// Build the procedure and the client from loaded configuration.
    ///
    /// # Errors
    /// `Config` when no credentials are configured, `NotAuthenticated` for
    /// an OAuth application without a stored session.
    pub fn from_config(config: &EnvatoConfig) -> Result<Self> {
        let procedure = build_procedure(&config.auth, &config.api)?;
        Self::with_config(procedure, config.api.clone())
    }

    pub fn builder() -> EnvatoClientBuilder {
        EnvatoClientBuilder::default()
    }

    pub fn procedure(&self) -> &Arc<dyn AuthProcedure> {
        &self.procedure
    }

    pub fn request(&self) -> &RequestWriter {
        &self.request
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Current bearer token, refreshed first when it has expired.
    ///
    /// Concurrent callers queue on one gate, so an expired token is
    /// refreshed once and everyone behind the refresh sees the new token.
    ///
    /// # Errors
    /// `NotAuthenticated` when the procedure lost its token, or the
    /// procedure's refresh error.
    #[instrument(skip(self))]
    pub async fn get_token(&self) -> Result<String> {
        let _gate = self.token_gate.lock().await;

        let expires = self.procedure.expires_at().ok_or(EnvatoError::NotAuthenticated)?;
        if expires <= Utc::now().timestamp() && self.procedure.can_refresh() {
            debug!(expires, "access token expired, refreshing");
            if !self.procedure.refresh().await? {
                debug!("refresh produced no new token");
            }
        }

        self.procedure.access_token().ok_or(EnvatoError::NotAuthenticated)
    }

    /// Endpoint group by name (case-insensitive), if the schema has it.
    pub fn group(&self, name: &str) -> Option<Endpoint<'_>> {
        self.schema.group_name(name).map(|group| Endpoint::new(self, group))
    }

    /// Call `group.action` by name.
    ///
    /// # Errors
    /// `EndpointNotFound` for an unknown group or action.
    pub async fn call(
        &self,
        group: &str,
        action: &str,
        params: impl Into<Params>,
    ) -> Result<ResultSet> {
        let endpoint = self.group(group).ok_or_else(|| EnvatoError::EndpointNotFound {
            group: group.to_ascii_lowercase(),
            action: action.to_ascii_lowercase(),
        })?;
        endpoint.call(action, params).await
    }

    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self)
    }

    pub fn profile(&self) -> Profile<'_> {
        Profile::new(self)
    }

    pub fn user(&self) -> User<'_> {
        User::new(self)
    }

    pub fn market(&self) -> Market<'_> {
        Market::new(self)
    }

    /// `GET` an arbitrary API path; `params` become the query string.
    pub async fn get(&self, path: &str, params: impl Into<Params>) -> Result<ResultSet> {
        self.send(Method::GET, path, params.into()).await
    }

    pub async fn post(&self, path: &str, params: impl Into<Params>) -> Result<ResultSet> {
        self.send(Method::POST, path, params.into()).await
    }

    pub async fn put(&self, path: &str, params: impl Into<Params>) -> Result<ResultSet> {
        self.send(Method::PUT, path, params.into()).await
    }

    pub async fn patch(&self, path: &str, params: impl Into<Params>) -> Result<ResultSet> {
        self.send(Method::PATCH, path, params.into()).await
    }

    pub async fn delete(&self, path: &str, params: impl Into<Params>) -> Result<ResultSet> {
        self.send(Method::DELETE, path, params.into()).await
    }

    /// Account id, granted scopes and token TTL of the caller.
    ///
    /// # Errors
    /// Request errors, `ApiMessage` when the API reports a logical error, or
    /// `Serialization` for an unexpected payload.
    pub async fn get_identity(&self) -> Result<Identity> {
        self.get(WHOAMI_PATH, Params::new()).await?.deserialize()
    }

    pub async fn get_user_id(&self) -> Result<u64> {
        Ok(self.get_identity().await?.user_id)
    }

    async fn send(&self, method: Method, path: &str, params: Params) -> Result<ResultSet> {
        let token = self.get_token().await?;
        self.request.send(method, path, params, &token).await
    }
}

impl std::fmt::Debug for EnvatoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvatoClient")
            .field("request", &self.request)
            .field("groups", &self.schema.groups().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Builder for [`EnvatoClient`]
#[derive(Default)]
pub struct EnvatoClientBuilder {
    procedure: Option<Arc<dyn AuthProcedure>>,
    config: Option<ApiConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    schema: Option<Schema>,
}

impl EnvatoClientBuilder {
    /// Set the authentication procedure (required)
    #[must_use]
    pub fn procedure(mut self, procedure: Arc<dyn AuthProcedure>) -> Self {
        self.procedure = Some(procedure);
        self
    }

    /// Set base URI, user agent, timeouts and HTTP overrides
    #[must_use]
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a caller-provided transport instead of building one from config
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the Envato endpoint table
    #[must_use]
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Build the client
    ///
    /// # Errors
    /// `Config` when no procedure was set or the transport cannot be built,
    /// `NotAuthenticated` when the procedure has no token.
    pub fn build(self) -> Result<EnvatoClient> {
        let procedure = self
            .procedure
            .ok_or_else(|| EnvatoError::Config("Auth procedure not set".to_string()))?;
        if procedure.access_token().is_none() {
            return Err(EnvatoError::NotAuthenticated);
        }

        let config = self.config.unwrap_or_default();
        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(transport_for(&config)?),
        };
        let request = RequestWriter::new(
            transport,
            &config.base_uri,
            config.user_agent.clone(),
            config.http.clone(),
        )?;

        info!(base_uri = %request.base_uri(), "Envato client ready");

        Ok(EnvatoClient {
            procedure,
            request,
            schema: Arc::new(self.schema.unwrap_or_else(|| Schema::envato().clone())),
            token_gate: Mutex::new(()),
        })
    }
}

/// reqwest transport configured from `config`; override options win over
/// the configured timeout.
pub(crate) fn transport_for(config: &ApiConfig) -> Result<HttpClient> {
    Ok(HttpClient::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .max_attempts(config.max_attempts)
        .apply_options(config.http.options())
        .build()?)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use envato_common::auth::Token;
    use envato_common::testing::MockTransport;
    use serde_json::json;

    use super::*;

    fn client(transport: &MockTransport) -> EnvatoClient {
        let token = Arc::new(Token::personal("personal").unwrap());
        EnvatoClient::builder()
            .procedure(token)
            .transport(Arc::new(transport.clone()))
            .build()
            .unwrap()
    }

    /// Procedure whose token expires until refreshed.
    struct ExpiringProcedure {
        refreshes: AtomicUsize,
        expires: parking_lot::RwLock<i64>,
    }

    #[async_trait]
    impl AuthProcedure for ExpiringProcedure {
        fn access_token(&self) -> Option<String> {
            Some(format!("token-{}", self.refreshes.load(Ordering::SeqCst)))
        }

        fn expires_at(&self) -> Option<i64> {
            Some(*self.expires.read())
        }

        fn can_refresh(&self) -> bool {
            true
        }

        async fn refresh(&self) -> Result<bool> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            *self.expires.write() = Utc::now().timestamp() + 3600;
            Ok(true)
        }
    }

    #[test]
    fn test_builder_requires_procedure() {
        let result = EnvatoClient::builder().transport(Arc::new(MockTransport::new())).build();
        assert!(matches!(result, Err(EnvatoError::Config(_))));
    }

    #[test]
    fn test_unauthenticated_procedure_is_rejected() {
        let procedure = envato_common::auth::OAuthProcedure::with_transport(
            envato_common::auth::OAuthOptions::new("id", "secret", "https://example.com/cb"),
            None,
            envato_domain::HttpOverrides::default(),
            Arc::new(MockTransport::new()),
        )
        .unwrap();

        let result = EnvatoClient::new(Arc::new(procedure));
        assert!(matches!(result, Err(EnvatoError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_personal_token_is_never_refreshed() {
        let transport = MockTransport::new();
        let client = client(&transport);

        assert_eq!(client.get_token().await.unwrap(), "personal");
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_once_for_concurrent_callers() {
        let procedure = Arc::new(ExpiringProcedure {
            refreshes: AtomicUsize::new(0),
            expires: parking_lot::RwLock::new(0),
        });
        let client = EnvatoClient::builder()
            .procedure(procedure.clone())
            .transport(Arc::new(MockTransport::new()))
            .build()
            .unwrap();

        let tokens = futures::future::join_all((0..5).map(|_| client.get_token())).await;

        assert_eq!(procedure.refreshes.load(Ordering::SeqCst), 1);
        assert!(tokens.into_iter().all(|token| token.unwrap() == "token-1"));
    }

    #[tokio::test]
    async fn test_group_lookup_is_tolerant_and_call_is_strict() {
        let transport = MockTransport::new();
        let client = client(&transport);

        assert!(client.group("MARKET").is_some());
        assert!(client.group("nope").is_none());

        let err = client.call("nope", "items", Params::new()).await.unwrap_err();
        assert!(matches!(err, EnvatoError::EndpointNotFound { group, .. } if group == "nope"));

        let err = client.call("market", "nope", Params::new()).await.unwrap_err();
        assert!(matches!(err, EnvatoError::EndpointNotFound { action, .. } if action == "nope"));

        let missing = client.group("market").unwrap().try_call("nope", Params::new()).await;
        assert!(missing.unwrap().is_none());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_call_resolves_template_and_sends_get() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({ "number-of-files": [] }));
        let client = client(&transport);

        client
            .call("Market", "Site", Params::new().with("site", "themeforest").with("page", 2))
            .await
            .unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(
            request.url,
            "https://api.envato.com/v1/market/number-of-files:themeforest.json?page=2"
        );
        assert_eq!(request.header("authorization"), Some("Bearer personal"));
    }

    #[tokio::test]
    async fn test_raw_verbs_use_query_string() {
        let transport = MockTransport::new();
        for _ in 0..4 {
            transport.push_json(200, json!({}));
        }
        let client = client(&transport);

        client.post("/v3/x", Params::new().with("a", 1)).await.unwrap();
        client.put("/v3/x", Params::new()).await.unwrap();
        client.patch("/v3/x", Params::new()).await.unwrap();
        client.delete("/v3/x", Params::new()).await.unwrap();

        let methods: Vec<_> = transport.requests().into_iter().map(|r| r.method).collect();
        assert_eq!(methods, [Method::POST, Method::PUT, Method::PATCH, Method::DELETE]);
        assert_eq!(transport.requests()[0].url, "https://api.envato.com/v3/x?a=1");
    }

    #[tokio::test]
    async fn test_identity() {
        let transport = MockTransport::new();
        transport.push_json(
            200,
            json!({ "clientId": null, "userId": 1234, "scopes": ["default"], "ttl": 315360000 }),
        );
        transport.push_json(200, json!({ "clientId": "app", "userId": 99, "scopes": [], "ttl": 1 }));
        let client = client(&transport);

        let identity = client.get_identity().await.unwrap();
        assert_eq!(identity.user_id, 1234);
        assert!(identity.client_id.is_none());
        assert_eq!(identity.scopes, ["default"]);

        assert_eq!(client.get_user_id().await.unwrap(), 99);
        assert!(transport.last_request().unwrap().url.ends_with("/whoami"));
    }
}
