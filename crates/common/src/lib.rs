//! Authentication and HTTP plumbing shared by the Envato client crates.
//!
//! # Modules
//!
//! - `auth`: personal tokens, OAuth code exchange and refresh
//! - `http`: transport trait and the reqwest-backed client
//! - `testing`: mock transport (feature `test-utils`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod http;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{AuthProcedure, OAuthOptions, OAuthProcedure, RenewHook, Session, Token};
pub use http::{HttpClient, HttpRequest, HttpResponse, HttpTransport, TransportError};
