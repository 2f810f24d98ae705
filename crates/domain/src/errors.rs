//! Error types used throughout the client

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Categories of client errors, used by callers deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller-fixable setup problems (missing options, bad token input)
    Configuration,
    /// Token endpoint rejection, missing or insufficient credentials
    Authentication,
    /// 429 responses carrying a retry deadline
    RateLimit,
    /// Rejected requests and programmer errors
    Client,
    /// Transport failures
    Network,
}

/// Main error type for the Envato client
#[derive(Error, Debug, Clone)]
pub enum EnvatoError {
    #[error("Missing property \"{0}\"")]
    MissingProperty(String),

    #[error("{0}")]
    InvalidToken(String),

    #[error("{0}")]
    Authentication(String),

    #[error("Not authenticated: no token has been established")]
    NotAuthenticated,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Too many requests, retry in {:.0} seconds", .0.seconds_remaining())]
    TooManyRequests(RetryAfter),

    #[error("Unknown property '{property}' for class '{type_name}'")]
    UnknownProperty { property: String, type_name: &'static str },

    #[error("Endpoint not found: {group}.{action}")]
    EndpointNotFound { group: String, action: String },

    #[error("Missing parameter \"{0}\" for endpoint template")]
    MissingParameter(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    ApiMessage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EnvatoError {
    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingProperty(_) | Self::InvalidToken(_) | Self::Config(_) => {
                ErrorCategory::Configuration
            }
            Self::Authentication(_) | Self::NotAuthenticated | Self::Unauthorized(_) => {
                ErrorCategory::Authentication
            }
            Self::TooManyRequests(_) => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::BadRequest(_)
            | Self::UnknownProperty { .. }
            | Self::EndpointNotFound { .. }
            | Self::MissingParameter(_)
            | Self::ApiMessage(_)
            | Self::Serialization(_) => ErrorCategory::Client,
        }
    }

    /// Whether the same request may succeed if sent again later.
    ///
    /// The client never retries on its own; this only informs callers.
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::RateLimit | ErrorCategory::Network)
    }

    /// Retry metadata, present only for rate-limited requests.
    pub fn retry_after(&self) -> Option<&RetryAfter> {
        match self {
            Self::TooManyRequests(retry) => Some(retry),
            _ => None,
        }
    }
}

/// Retry timing captured from a `Retry-After` header.
///
/// The deadline is fixed when the value is built, so
/// [`seconds_remaining`](Self::seconds_remaining) shrinks as time passes.
#[derive(Debug, Clone)]
pub struct RetryAfter {
    delay: Duration,
    deadline: Instant,
    deadline_utc: DateTime<Utc>,
}

impl RetryAfter {
    /// Build from a whole number of seconds.
    pub fn from_secs(seconds: u64) -> Self {
        Self::new(Duration::from_secs(seconds))
    }

    pub fn new(delay: Duration) -> Self {
        let deadline_utc = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|offset| Utc::now().checked_add_signed(offset))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self { delay, deadline: Instant::now() + delay, deadline_utc }
    }

    /// Delay announced by the server.
    pub fn retry_after(&self) -> Duration {
        self.delay
    }

    /// Seconds left until a retry is allowed, never negative.
    pub fn seconds_remaining(&self) -> f64 {
        self.deadline.saturating_duration_since(Instant::now()).as_secs_f64()
    }

    /// Absolute time at which a retry is allowed.
    pub fn retry_deadline(&self) -> DateTime<Utc> {
        self.deadline_utc
    }

    /// Suspend the current task until the retry deadline has passed.
    ///
    /// Sleeps for the remaining time rounded up to whole seconds, and returns
    /// immediately when the deadline is already behind us.
    pub async fn wait_until_retry_allowed(&self) {
        let remaining = self.seconds_remaining();
        if remaining > 0.0 {
            tokio::time::sleep(Duration::from_secs(remaining.ceil() as u64)).await;
        }
    }
}

impl From<serde_json::Error> for EnvatoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for Envato client operations
pub type Result<T> = std::result::Result<T, EnvatoError>;
