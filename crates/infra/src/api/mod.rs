//! Envato Market API client
//!
//! # Architecture
//!
//! ```text
//! EnvatoClient ──get_token()──► AuthProcedure (Token | OAuthProcedure)
//!      │
//!      ├── group()/call()/market()... ──► Endpoint ──resolve_template()──┐
//!      │                                                               │
//!      └── get/post/put/patch/delete ────────────────► RequestWriter ◄─┘
//!                                                          │
//!                                                     HttpTransport
//! ```
//!
//! - Endpoint names resolve against a static [`Schema`]
//! - Every endpoint call is a `GET`
//! - Responses are classified once, in [`RequestWriter`]
//! - Nothing is retried: rate limits surface as `TooManyRequests` with the
//!   server's `Retry-After`

pub mod auth;
pub mod client;
pub mod endpoint;
pub mod groups;
pub mod params;
pub mod request;
pub mod schema;

pub use auth::{build_procedure, build_procedure_with_renew};
pub use client::{EnvatoClient, EnvatoClientBuilder};
pub use endpoint::{resolve_template, Endpoint};
pub use groups::{Catalog, Market, Profile, User};
pub use params::Params;
pub use request::{classify, RequestWriter};
pub use schema::Schema;
