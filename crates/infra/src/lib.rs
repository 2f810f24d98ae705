//! # Envato Infrastructure
//!
//! The Envato Market API client and its configuration loader.
//!
//! This crate contains:
//! - The endpoint schema, dispatcher and typed endpoint groups
//! - The request executor and response classification
//! - `EnvatoClient`, which keeps the token fresh across requests
//! - Configuration loading from environment variables and files
//!
//! ## Architecture
//! - Builds on the auth procedures and transport in `envato-common`
//! - Errors and configuration types come from `envato-domain`
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use envato_common::auth::Token;
//! use envato_infra::api::{EnvatoClient, Params};
//!
//! # async fn example() -> envato_domain::Result<()> {
//! let client = EnvatoClient::new(Arc::new(Token::personal("my-personal-token")?))?;
//!
//! let totals = client.market().items(Params::new()).await?;
//! let search = client.catalog().items(Params::new().with("term", "slider")).await?;
//! let user_id = client.get_user_id().await?;
//! # let _ = (totals, search, user_id);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;

// Re-export commonly used items
pub use api::{EnvatoClient, Endpoint, Params, RequestWriter, Schema};
