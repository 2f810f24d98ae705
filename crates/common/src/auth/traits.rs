//! Traits for authentication procedures
//!
//! The API client only needs the current bearer token, its expiry, and a way
//! to ask for a refresh. Abstracting that lets the client hold a personal
//! token and an OAuth procedure behind the same handle, and lets tests
//! substitute counting fakes.

use async_trait::async_trait;
use envato_domain::Result;

/// Source of bearer tokens for API calls.
#[async_trait]
pub trait AuthProcedure: Send + Sync {
    /// Current access token, or `None` before one has been established.
    fn access_token(&self) -> Option<String>;

    /// Expiry of the current token in epoch seconds.
    fn expires_at(&self) -> Option<i64>;

    /// Whether [`refresh`](Self::refresh) can ever produce a new token.
    fn can_refresh(&self) -> bool;

    /// Exchange the refresh credential for a new access token.
    ///
    /// # Returns
    /// `Ok(false)` when there is nothing to refresh with, `Ok(true)` when the
    /// token was replaced.
    ///
    /// # Errors
    /// `Authentication` when the token endpoint rejects the refresh or cannot
    /// be reached.
    async fn refresh(&self) -> Result<bool>;
}
