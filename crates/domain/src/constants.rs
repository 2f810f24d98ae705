//! Client constants
//!
//! Centralized location for the fixed endpoints and protocol values used
//! throughout the client.

// Endpoints
pub const DEFAULT_BASE_URI: &str = "https://api.envato.com/";
pub const AUTHORIZATION_URL: &str = "https://api.envato.com/authorization";
pub const TOKEN_URL: &str = "https://api.envato.com/token";
pub const WHOAMI_PATH: &str = "/whoami";

// Identification
pub const DEFAULT_USER_AGENT: &str = "https://github.com/baileyherbert/envato.php";

// Token lifecycle
pub const EXPIRY_MARGIN_SECS: i64 = 60; // subtracted from expires_in on every exchange
pub const PERSONAL_TOKEN_EXPIRY: i64 = i64::MAX;

// Token endpoint sentinel for an already consumed authorization code
pub const CODE_NOT_FOUND: &str = "Code not found";

// HTTP defaults
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_ATTEMPTS: usize = 1;

// Classification messages
pub const BAD_REQUEST_MESSAGE: &str =
    "The request was rejected because one or more parameters were invalid";
pub const UNAUTHORIZED_MESSAGE: &str = "The token was missing or not in the correct format";
pub const FORBIDDEN_MESSAGE: &str =
    "The token was not found or did not have sufficient permissions";
