//! OAuth 2.0 authorization-code procedure
//!
//! Handles the Envato OAuth flow:
//! - Authorization URL building
//! - Authorization code exchange
//! - Token refresh (the refresh token is kept across refreshes)
//! - Session persistence through a renewal hook
//!
//! Every exchange or refresh fully replaces the current credentials and
//! hands the new session JSON to the renewal hook.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use envato_domain::constants::{AUTHORIZATION_URL, CODE_NOT_FOUND, DEFAULT_USER_AGENT, TOKEN_URL};
use envato_domain::{EnvatoError, GrantType, HttpOverrides, Result};
use parking_lot::RwLock;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::form_urlencoded;

use super::token::{looks_like_json, Token};
use super::traits::AuthProcedure;
use super::types::{OAuthOptions, RenewHook, Session, TokenResponse};
use crate::http::{HttpClient, HttpRequest, HttpTransport};

#[derive(Clone)]
struct Credentials {
    session: Session,
    token: Token,
}

/// Stateful OAuth procedure owning at most one current token.
pub struct OAuthProcedure {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorization_uri: String,
    token_url: String,
    user_agent: String,
    overrides: HttpOverrides,
    on_renew: Option<RenewHook>,
    transport: Arc<dyn HttpTransport>,
    credentials: RwLock<Option<Credentials>>,
    exchange_lock: Mutex<()>,
}

impl OAuthProcedure {
    /// Create a procedure for the given application.
    ///
    /// # Arguments
    /// * `options` - client id, secret, redirect URI and an optional `store`
    ///   hook, which wins over `on_renew`
    /// * `on_renew` - hook receiving the session JSON after every exchange
    /// * `overrides` - headers merged into token requests; other keys
    ///   configure the transport
    ///
    /// # Errors
    /// `MissingProperty` naming the first absent option, checked in the
    /// order client id, client secret, redirect URI. `Config` when the
    /// transport options are unusable.
    pub fn new(
        options: OAuthOptions,
        on_renew: Option<RenewHook>,
        overrides: HttpOverrides,
    ) -> Result<Self> {
        let transport = HttpClient::builder().apply_options(overrides.options()).build()?;
        Self::with_transport(options, on_renew, overrides, Arc::new(transport))
    }

    /// Like [`new`](Self::new) with a caller-provided transport.
    pub fn with_transport(
        options: OAuthOptions,
        on_renew: Option<RenewHook>,
        overrides: HttpOverrides,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let client_id = require(options.client_id, "client_id")?;
        let client_secret = require(options.client_secret, "client_secret")?;
        let redirect_uri = require(options.redirect_uri, "redirect_uri")?;

        let authorization_uri = format!(
            "{AUTHORIZATION_URL}?response_type=code&client_id={}&redirect_uri={}",
            encode(&client_id),
            encode(&redirect_uri)
        );

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            authorization_uri,
            token_url: TOKEN_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            overrides,
            on_renew: options.store.or(on_renew),
            transport,
            credentials: RwLock::new(None),
            exchange_lock: Mutex::new(()),
        })
    }

    /// Point token requests at another endpoint (sandboxes, tests).
    #[must_use]
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Resume from a stored session: a record, or its JSON string.
    ///
    /// Does not invoke the renewal hook.
    ///
    /// # Errors
    /// `InvalidToken` for plain strings (OAuth sessions are never personal
    /// tokens), other value kinds, or incomplete records.
    pub fn load(&self, session: &Value) -> Result<()> {
        let session = match session {
            Value::String(raw) if looks_like_json(raw) => Session::parse(raw)?,
            Value::String(_) => {
                return Err(EnvatoError::InvalidToken(
                    "Not authenticated: provided token is not valid JSON.".into(),
                ))
            }
            Value::Object(_) | Value::Array(_) => Session::from_value(session)?,
            _ => {
                return Err(EnvatoError::InvalidToken(
                    "Not authenticated: provided token is not valid.".into(),
                ))
            }
        };

        let token = Token::from_session(&session)?;
        *self.credentials.write() = Some(Credentials { session, token });
        debug!("loaded stored OAuth session");
        Ok(())
    }

    /// [`load`](Self::load) for a session JSON string.
    pub fn load_str(&self, session: &str) -> Result<()> {
        self.load(&Value::String(session.to_string()))
    }

    /// URL to send the user to for granting access.
    pub fn authorization_uri(&self) -> &str {
        &self.authorization_uri
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Current token, exchanging `code` first when no token exists yet.
    ///
    /// # Errors
    /// Propagates [`exchange_code`](Self::exchange_code) failures.
    pub async fn auth(&self, code: Option<&str>) -> Result<Option<Token>> {
        if let Some(code) = code.map(str::trim).filter(|code| !code.is_empty()) {
            if self.current_token().is_none() {
                self.exchange_code(code).await?;
            }
        }
        Ok(self.current_token())
    }

    /// Access token string, exchanging `code` first when no token exists
    /// yet. `None` when there is neither a token nor a code.
    pub async fn token(&self, code: Option<&str>) -> Result<Option<String>> {
        Ok(self.auth(code).await?.map(|token| token.token().to_string()))
    }

    /// Expiry of the current token in epoch seconds.
    ///
    /// # Errors
    /// `NotAuthenticated` when no token exists.
    pub fn expires(&self) -> Result<i64> {
        self.credentials
            .read()
            .as_ref()
            .map(|credentials| credentials.token.expires())
            .ok_or(EnvatoError::NotAuthenticated)
    }

    /// Current session as JSON, or `null` when there is none.
    pub fn session(&self) -> String {
        self.credentials
            .read()
            .as_ref()
            .and_then(|credentials| credentials.session.to_json().ok())
            .unwrap_or_else(|| "null".to_string())
    }

    pub fn current_session(&self) -> Option<Session> {
        self.credentials.read().as_ref().map(|credentials| credentials.session.clone())
    }

    pub fn current_token(&self) -> Option<Token> {
        self.credentials.read().as_ref().map(|credentials| credentials.token.clone())
    }

    /// Exchange an authorization code for a session.
    ///
    /// # Returns
    /// `Some(session)` on success. `None` when the provider reports the code
    /// as already consumed, or answers with neither tokens nor an error.
    ///
    /// # Errors
    /// `Authentication` when the provider rejects the code for any other
    /// reason, or the token endpoint cannot be reached or parsed.
    #[instrument(skip_all, fields(grant_type = %GrantType::AuthorizationCode))]
    pub async fn exchange_code(&self, code: &str) -> Result<Option<Session>> {
        let _guard = self.exchange_lock.lock().await;

        let form = [
            ("grant_type", GrantType::AuthorizationCode.as_str()),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let response = self.request_token(&form, "Failed to generate token").await?;

        if let Some(refresh_token) = response.refresh_token {
            let access_token = response.access_token.ok_or_else(|| {
                EnvatoError::Authentication(
                    "Failed to generate token: response has no access token".into(),
                )
            })?;
            let session =
                Session::issued_now(access_token, refresh_token, response.expires_in.unwrap_or(0));
            self.install(session.clone())?;
            info!(expires = session.expires, "authorization code exchanged");
            return Ok(Some(session));
        }

        match response.error_description {
            Some(description) if description == CODE_NOT_FOUND => {
                debug!("authorization code already consumed");
                Ok(None)
            }
            Some(description) => {
                Err(EnvatoError::Authentication(format!("Failed to generate token: {description}")))
            }
            None => {
                warn!("token endpoint answered without tokens or an error description");
                Ok(None)
            }
        }
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// # Returns
    /// `Ok(false)` without any network call when no refresh token is on
    /// record. `Ok(true)` once the token has been replaced.
    ///
    /// # Errors
    /// `Authentication` when the provider rejects the refresh or the token
    /// endpoint cannot be reached or parsed.
    #[instrument(skip_all, fields(grant_type = %GrantType::RefreshToken))]
    pub async fn refresh(&self) -> Result<bool> {
        let _guard = self.exchange_lock.lock().await;

        let Some(refresh_token) = self
            .credentials
            .read()
            .as_ref()
            .map(|credentials| credentials.session.refresh_token.clone())
        else {
            debug!("no refresh token on record, skipping refresh");
            return Ok(false);
        };

        let form = [
            ("grant_type", GrantType::RefreshToken.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let response = self.request_token(&form, "Failed to refresh token").await?;

        if let Some(access_token) = response.access_token {
            let session =
                Session::issued_now(access_token, refresh_token, response.expires_in.unwrap_or(0));
            let expires = session.expires;
            self.install(session)?;
            info!(expires, "access token refreshed");
            return Ok(true);
        }

        if let Some(description) = response.error_description {
            return Err(EnvatoError::Authentication(format!(
                "Failed to refresh token: {description}"
            )));
        }

        warn!("token endpoint answered without an access token or an error description");
        Ok(false)
    }

    async fn request_token(&self, form: &[(&str, &str)], context: &str) -> Result<TokenResponse> {
        let headers = self.overrides.merge_headers([("user-agent", self.user_agent.as_str())]);
        let request = HttpRequest::new(Method::POST, self.token_url.as_str())
            .with_headers(headers)
            .with_form(form.iter().copied());

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|err| EnvatoError::Authentication(format!("{context}: {err}")))?;
        debug!(status = response.status, "token endpoint responded");

        serde_json::from_str(&response.body).map_err(|err| {
            EnvatoError::Authentication(format!("{context}: unreadable response ({err})"))
        })
    }

    fn install(&self, session: Session) -> Result<()> {
        let token = Token::from_session(&session)?;
        let json = session.to_json()?;
        *self.credentials.write() = Some(Credentials { session, token });

        if let Some(hook) = &self.on_renew {
            hook(&json);
        }
        Ok(())
    }
}

fn require(value: Option<String>, name: &str) -> Result<String> {
    value.ok_or_else(|| EnvatoError::MissingProperty(name.to_string()))
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

impl fmt::Debug for OAuthProcedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthProcedure")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("token_url", &self.token_url)
            .field("authenticated", &self.credentials.read().is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProcedure for OAuthProcedure {
    fn access_token(&self) -> Option<String> {
        self.credentials.read().as_ref().map(|credentials| credentials.token.token().to_string())
    }

    fn expires_at(&self) -> Option<i64> {
        self.expires().ok()
    }

    fn can_refresh(&self) -> bool {
        true
    }

    async fn refresh(&self) -> Result<bool> {
        Self::refresh(self).await
    }
}
