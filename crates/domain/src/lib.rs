//! # Envato Domain
//!
//! Domain types for the Envato Market API client.
//!
//! This crate contains:
//! - The client error taxonomy and `Result` alias
//! - Configuration structures and HTTP overrides
//! - Response types (`ResultSet`, `Identity`)
//! - Protocol constants
//!
//! ## Architecture
//! - No dependencies on other Envato crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
