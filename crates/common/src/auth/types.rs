//! OAuth session, options and token endpoint payloads
//!
//! A [`Session`] is the persisted form of OAuth state. It serializes to the
//! same JSON the token renewal hook receives and [`Session::parse`] accepts
//! back, so hosts can store the string and resume later.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use envato_domain::constants::EXPIRY_MARGIN_SECS;
use envato_domain::{EnvatoError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Callback receiving the serialized session whenever a new token is issued.
pub type RenewHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Serializable OAuth state: access token, refresh token and expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry in epoch seconds
    pub expires: i64,
}

impl Session {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires: i64,
    ) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into(), expires }
    }

    /// Build a session expiring `expires_in` seconds from now, minus the
    /// safety margin.
    pub fn issued_now(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: i64,
    ) -> Self {
        let expires = Utc::now().timestamp().saturating_add(expires_in) - EXPIRY_MARGIN_SECS;
        Self::new(access_token, refresh_token, expires)
    }

    /// Serialize to the JSON form handed to the renewal hook.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a session from its JSON form.
    ///
    /// # Errors
    /// `InvalidToken` when the JSON is malformed or a field is missing.
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|err| {
            EnvatoError::InvalidToken(format!("Failed to parse OAuth session data as JSON: {err}"))
        })?;
        Self::from_value(&value)
    }

    /// Read a session record from already-decoded JSON.
    ///
    /// All of `access_token`, `refresh_token` and `expires` are required.
    /// `expires` may be a number or a numeric string.
    pub fn from_value(value: &Value) -> Result<Self> {
        let access_token = required(value, "access_token")?;
        let refresh_token = required(value, "refresh_token")?;
        let expires = match required(value, "expires")? {
            Value::Number(number) => number.as_i64().or_else(|| number.as_f64().map(|f| f as i64)),
            Value::String(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| {
            EnvatoError::InvalidToken(
                "Field \"expires\" in session data is not a timestamp.".into(),
            )
        })?;

        Ok(Self::new(
            text_field(access_token, "access_token")?,
            text_field(refresh_token, "refresh_token")?,
            expires,
        ))
    }
}

fn required<'a>(value: &'a Value, field: &str) -> Result<&'a Value> {
    match value.get(field) {
        Some(found) if !found.is_null() => Ok(found),
        _ => Err(EnvatoError::InvalidToken(format!("Missing field \"{field}\" in session data."))),
    }
}

fn text_field(value: &Value, field: &str) -> Result<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        EnvatoError::InvalidToken(format!("Field \"{field}\" in session data is not a string."))
    })
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("expires", &self.expires)
            .finish()
    }
}

/// Options for constructing an [`OAuthProcedure`](super::OAuthProcedure).
///
/// All three identifiers are required; they are optional here so a missing
/// one can be reported by name.
#[derive(Clone, Default)]
pub struct OAuthOptions {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    /// Renewal hook. Takes precedence over the hook passed to the
    /// constructor.
    pub store: Option<RenewHook>,
}

impl OAuthOptions {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            redirect_uri: Some(redirect_uri.into()),
            store: None,
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }
}

impl fmt::Debug for OAuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthOptions")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[redacted]"))
            .field("redirect_uri", &self.redirect_uri)
            .field("store", &self.store.is_some())
            .finish()
    }
}

/// Token endpoint response. Every field is optional: success and failure
/// share one shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}
