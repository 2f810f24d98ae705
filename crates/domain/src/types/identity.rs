//! Token identity returned by `/whoami`

use serde::{Deserialize, Serialize};

/// Account and grant details for the current token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// OAuth application id, null for personal tokens
    #[serde(default)]
    pub client_id: Option<String>,
    pub user_id: u64,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Remaining token lifetime in seconds
    #[serde(default)]
    pub ttl: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_personal_token_identity() {
        let body = r#"{"clientId":null,"userId":1234,"scopes":["default"],"ttl":315360000}"#;
        let identity: Identity = serde_json::from_str(body).unwrap();

        assert_eq!(identity.client_id, None);
        assert_eq!(identity.user_id, 1234);
        assert_eq!(identity.scopes, vec!["default".to_string()]);
        assert_eq!(identity.ttl, 315_360_000);
    }
}
