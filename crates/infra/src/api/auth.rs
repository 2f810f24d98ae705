//! Authentication procedure construction from configuration
//!
//! A personal token wins over an OAuth application when both are set.

use std::sync::Arc;

use envato_common::auth::{AuthProcedure, OAuthOptions, OAuthProcedure, RenewHook, Token};
use envato_domain::{ApiConfig, AuthConfig, EnvatoError, Result};
use tracing::{debug, info};

use super::client::transport_for;

/// Build the procedure described by `auth`.
///
/// # Errors
/// `Config` when neither a personal token nor an OAuth client id is set,
/// `MissingProperty` for an incomplete OAuth application, `InvalidToken`
/// for an unusable stored session.
pub fn build_procedure(auth: &AuthConfig, api: &ApiConfig) -> Result<Arc<dyn AuthProcedure>> {
    build_procedure_with_renew(auth, api, None)
}

/// Like [`build_procedure`], notifying `on_renew` with the session JSON
/// whenever an OAuth token is issued or refreshed.
pub fn build_procedure_with_renew(
    auth: &AuthConfig,
    api: &ApiConfig,
    on_renew: Option<RenewHook>,
) -> Result<Arc<dyn AuthProcedure>> {
    if let Some(raw) = auth.personal_token.as_deref().filter(|t| !t.trim().is_empty()) {
        debug!("using personal token");
        return Ok(Arc::new(Token::personal(raw)?));
    }

    if auth.client_id.is_none() {
        return Err(EnvatoError::Config(
            "No credentials configured: set a personal token or an OAuth client id".to_string(),
        ));
    }

    let options = OAuthOptions {
        client_id: auth.client_id.clone(),
        client_secret: auth.client_secret.clone(),
        redirect_uri: auth.redirect_uri.clone(),
        store: None,
    };
    let procedure = OAuthProcedure::with_transport(
        options,
        on_renew,
        api.http.clone(),
        Arc::new(transport_for(api)?),
    )?
    .with_user_agent(api.user_agent.clone());

    if let Some(session) = auth.session.as_deref() {
        procedure.load_str(session)?;
        info!("resumed stored OAuth session");
    }

    Ok(Arc::new(procedure))
}
