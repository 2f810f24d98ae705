//! Endpoint dispatcher
//!
//! Resolves `group.action` against the [`Schema`](super::Schema), fills the
//! template's path variables from the call parameters, and hands the request
//! to the client. Parameters that fill no placeholder travel as the query
//! string.

use std::collections::HashMap;

use envato_domain::{EnvatoError, Result, ResultSet};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

use super::client::EnvatoClient;
use super::params::Params;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("PLACEHOLDER should compile - this is a bug"));

/// Substitute `{placeholder}` variables in `template`.
///
/// Placeholder names match parameter keys case-insensitively and take the
/// raw value. Every parameter that filled a placeholder is consumed; the
/// rest are returned for the query string.
///
/// # Errors
/// `MissingParameter` naming the first placeholder no parameter fills.
pub fn resolve_template(template: &str, params: Params) -> Result<(String, Params)> {
    let mut remaining = params;
    let mut filled: HashMap<String, String> = HashMap::new();
    let mut path = String::with_capacity(template.len());
    let mut last = 0;

    for captures in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let key = name.as_str().to_ascii_lowercase();

        let value = match filled.get(&key) {
            Some(value) => value.clone(),
            None => {
                let value = remaining
                    .take(&key)
                    .ok_or_else(|| EnvatoError::MissingParameter(name.as_str().to_string()))?;
                filled.insert(key, value.clone());
                value
            }
        };

        path.push_str(&template[last..whole.start()]);
        path.push_str(&value);
        last = whole.end();
    }
    path.push_str(&template[last..]);

    Ok((path, remaining))
}

/// A group of endpoints bound to a client.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    client: &'a EnvatoClient,
    group: &'a str,
}

impl<'a> Endpoint<'a> {
    pub(crate) fn new(client: &'a EnvatoClient, group: &'a str) -> Self {
        Self { client, group }
    }

    /// Group name as stored in the schema (lowercase).
    pub fn group(&self) -> &str {
        self.group
    }

    /// Call an action of this group with `GET`.
    ///
    /// # Errors
    /// `EndpointNotFound` for an unknown action, `MissingParameter` for an
    /// unfilled path variable, otherwise whatever the request executor
    /// reports.
    #[instrument(skip(self, params), fields(group = %self.group))]
    pub async fn call(&self, action: &str, params: impl Into<Params>) -> Result<ResultSet> {
        self.try_call(action, params).await?.ok_or_else(|| EnvatoError::EndpointNotFound {
            group: self.group.to_string(),
            action: action.to_ascii_lowercase(),
        })
    }

    /// Like [`call`](Self::call), but an unknown action yields `Ok(None)`.
    pub async fn try_call(
        &self,
        action: &str,
        params: impl Into<Params>,
    ) -> Result<Option<ResultSet>> {
        let Some(template) = self.client.schema().template(self.group, action) else {
            debug!(action, "no such endpoint");
            return Ok(None);
        };

        let (path, query) = resolve_template(template, params.into())?;
        self.client.get(&path, query).await.map(Some)
    }
}
