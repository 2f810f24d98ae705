//! Testing utilities and helpers
//!
//! - **[`mocks`]**: scripted [`HttpTransport`](crate::http::HttpTransport)
//!   for exercising the auth procedures and API client without a network
//!
//! ## Usage
//!
//! ```rust
//! use envato_common::testing::MockTransport;
//!
//! let transport = MockTransport::new();
//! transport.push_json(200, serde_json::json!({ "userId": 1 }));
//! assert_eq!(transport.pending(), 1);
//! ```

pub mod mocks;

pub use mocks::MockTransport;
