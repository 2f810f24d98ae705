//! Access credential with optional refresh credential and expiry
//!
//! A [`Token`] is either a long-lived personal token (never expires) or the
//! token half of an OAuth [`Session`]. It is immutable: a refresh produces a
//! new `Token` and the owning procedure swaps it in.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use envato_domain::constants::PERSONAL_TOKEN_EXPIRY;
use envato_domain::{EnvatoError, Result};
use serde_json::Value;

use super::traits::AuthProcedure;
use super::types::Session;

#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: i64,
}

impl Token {
    /// Wrap a personal token. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// `InvalidToken` when nothing remains after trimming.
    pub fn personal(raw: &str) -> Result<Self> {
        let access_token = raw.trim();
        if access_token.is_empty() {
            return Err(EnvatoError::InvalidToken(
                "Not authenticated: provided token is empty.".into(),
            ));
        }
        Ok(Self {
            access_token: access_token.to_string(),
            refresh_token: None,
            expires_at: PERSONAL_TOKEN_EXPIRY,
        })
    }

    /// # Errors
    /// `InvalidToken` when the session's access token is empty.
    pub fn from_session(session: &Session) -> Result<Self> {
        if session.access_token.trim().is_empty() {
            return Err(EnvatoError::InvalidToken(
                "Field \"access_token\" in session data is empty.".into(),
            ));
        }
        Ok(Self {
            access_token: session.access_token.clone(),
            refresh_token: Some(session.refresh_token.clone()),
            expires_at: session.expires,
        })
    }

    /// Build from loosely typed input.
    ///
    /// A string that does not start with `[` or `{` is a personal token; a
    /// string that does is decoded as a session record, as is an object or
    /// array. Anything else is rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(raw) => raw.parse(),
            Value::Object(_) | Value::Array(_) => Self::from_session(&Session::from_value(value)?),
            _ => Err(EnvatoError::InvalidToken(
                "Not authenticated: provided token is not valid.".into(),
            )),
        }
    }

    pub fn token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Expiry in epoch seconds; `i64::MAX` for personal tokens.
    pub fn expires(&self) -> i64 {
        self.expires_at
    }

    pub fn is_personal(&self) -> bool {
        self.refresh_token.is_none()
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }

    /// Dynamic, case-insensitive field lookup over `token`, `refresh` and
    /// `expires`. `refresh` is null for personal tokens.
    ///
    /// # Errors
    /// `UnknownProperty` for any other name.
    pub fn property(&self, name: &str) -> Result<Value> {
        match name.to_lowercase().as_str() {
            "token" => Ok(Value::String(self.access_token.clone())),
            "refresh" => Ok(self.refresh_token.clone().map_or(Value::Null, Value::String)),
            "expires" => Ok(Value::from(self.expires_at)),
            _ => Err(EnvatoError::UnknownProperty { property: name.to_string(), type_name: "Token" }),
        }
    }
}

impl FromStr for Token {
    type Err = EnvatoError;

    fn from_str(raw: &str) -> Result<Self> {
        if looks_like_json(raw) {
            Self::from_session(&Session::parse(raw)?)
        } else {
            Self::personal(raw)
        }
    }
}

pub(crate) fn looks_like_json(raw: &str) -> bool {
    matches!(raw.chars().next(), Some('[' | '{'))
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A bare token authenticates as-is and never refreshes.
#[async_trait]
impl AuthProcedure for Token {
    fn access_token(&self) -> Option<String> {
        Some(self.access_token.clone())
    }

    fn expires_at(&self) -> Option<i64> {
        Some(self.expires_at)
    }

    fn can_refresh(&self) -> bool {
        false
    }

    async fn refresh(&self) -> Result<bool> {
        Ok(false)
    }
}
