//! Uniform wrapper for a completed API call

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{EnvatoError, Result};

/// Outcome of a single API call.
///
/// A logical API error (an `error_message` field in the body) is carried
/// here rather than raised, with the payload cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    payload: Option<Value>,
    elapsed: Duration,
    error_message: Option<String>,
}

impl ResultSet {
    pub fn new(payload: Option<Value>, elapsed: Duration) -> Self {
        Self { payload, elapsed, error_message: None }
    }

    pub fn with_error(message: impl Into<String>, elapsed: Duration) -> Self {
        Self { payload: None, elapsed, error_message: Some(message.into()) }
    }

    /// The parsed JSON payload, untouched.
    pub fn raw(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn into_raw(self) -> Option<Value> {
        self.payload
    }

    /// Top-level field of an object payload.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.as_ref().and_then(|payload| payload.get(field))
    }

    pub fn error(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Deserialize the payload into a typed value.
    ///
    /// # Errors
    /// `ApiMessage` when the call returned a logical error, `Serialization`
    /// when the payload is missing or does not match `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        if let Some(message) = &self.error_message {
            return Err(EnvatoError::ApiMessage(message.clone()));
        }
        let payload = self
            .payload
            .clone()
            .ok_or_else(|| EnvatoError::Serialization("response has no payload".into()))?;
        Ok(serde_json::from_value(payload)?)
    }
}
