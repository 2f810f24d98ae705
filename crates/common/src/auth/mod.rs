//! Authentication procedures for the Envato API
//!
//! Two ways to authenticate, both behind [`AuthProcedure`]:
//!
//! - **Personal token**: a long-lived [`Token`] that never expires and never
//!   refreshes.
//! - **OAuth**: an [`OAuthProcedure`] that exchanges an authorization code
//!   for a [`Session`], refreshes it on demand, and reports every new session
//!   to a renewal hook so the host can persist it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  AuthProcedure   │  what the API client holds
//! └────────┬─────────┘
//!          │
//!          ├──► Token            (personal token, static)
//!          │
//!          └──► OAuthProcedure   (code exchange + refresh)
//!                    │
//!                    ├──► Session        (persisted form, renewal hook)
//!                    └──► HttpTransport  (POST /token)
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use envato_common::auth::{OAuthOptions, OAuthProcedure};
//! use envato_domain::HttpOverrides;
//!
//! # async fn example() -> envato_domain::Result<()> {
//! let options = OAuthOptions::new("client-id", "client-secret", "https://example.com/callback")
//!     .with_store(|session| {
//!         // persist `session` (JSON) somewhere durable
//!         let _ = session;
//!     });
//! let procedure = OAuthProcedure::new(options, None, HttpOverrides::default())?;
//!
//! // Send the user to the provider...
//! let _url = procedure.authorization_uri();
//!
//! // ...and exchange the code they come back with.
//! let token = procedure.auth(Some("code-from-callback")).await?;
//! assert!(token.is_some());
//! # Ok(())
//! # }
//! ```

pub mod oauth;
pub mod token;
pub mod traits;
pub mod types;

pub use oauth::OAuthProcedure;
pub use token::Token;
pub use traits::AuthProcedure;
pub use types::{OAuthOptions, RenewHook, Session, TokenResponse};
