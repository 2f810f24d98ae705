//! Endpoint schema: group → action → URL template
//!
//! Templates contain `{placeholder}` path variables that the dispatcher fills
//! from call parameters. Group and action names are stored lowercase and
//! looked up case-insensitively.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

type Actions = BTreeMap<String, String>;

static ENVATO_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::empty()
        .with_group(
            "catalog",
            [
                ("collection", "/v3/market/catalog/collection"),
                ("item", "/v3/market/catalog/item"),
                ("item_version", "/v3/market/catalog/item-version"),
                ("items", "/v1/discovery/search/search/item"),
                ("comments", "/v1/discovery/search/search/comment"),
                ("popular", "/v1/market/popular:{site}.json"),
                ("categories", "/v1/market/categories:{site}.json"),
                ("prices", "/v1/market/item-prices:{item_id}.json"),
                ("newest", "/v1/market/new-files:{site},{category}.json"),
                ("featured", "/v1/market/features:{site}.json"),
                ("random", "/v1/market/random-new-files:{site}.json"),
            ],
        )
        .with_group(
            "profile",
            [
                ("collections", "/v3/market/user/collections"),
                ("collection", "/v3/market/user/collection"),
                ("details", "/v1/market/user:{username}.json"),
                ("badges", "/v1/market/user-badges:{username}.json"),
                ("portfolio", "/v1/market/user-items-by-site:{username}.json"),
                ("newest", "/v1/market/new-files-from-user:{username},{site}.json"),
            ],
        )
        .with_group(
            "user",
            [
                ("sales", "/v3/market/author/sales"),
                ("sale", "/v3/market/author/sale"),
                ("purchases", "/v3/market/buyer/list-purchases"),
                ("purchase", "/v3/market/buyer/purchase"),
                ("download", "/v3/market/buyer/download"),
                ("details", "/v1/market/private/user/account.json"),
                ("username", "/v1/market/private/user/username.json"),
                ("email", "/v1/market/private/user/email.json"),
                ("earnings", "/v1/market/private/user/earnings-and-sales-by-month.json"),
                ("statement", "/v3/market/user/statement"),
            ],
        )
        .with_group(
            "market",
            [
                ("users", "/v1/market/total-users.json"),
                ("items", "/v1/market/total-items.json"),
                ("site", "/v1/market/number-of-files:{site}.json"),
            ],
        )
});

/// Static table of endpoint URL templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    groups: BTreeMap<String, Actions>,
}

impl Schema {
    /// The Envato Market endpoint table.
    pub fn envato() -> &'static Schema {
        &ENVATO_SCHEMA
    }

    /// A schema with no groups, for building custom tables.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add (or extend) a group of actions.
    #[must_use]
    pub fn with_group<I, A, T>(mut self, group: &str, actions: I) -> Self
    where
        I: IntoIterator<Item = (A, T)>,
        A: AsRef<str>,
        T: Into<String>,
    {
        let entry = self.groups.entry(group.to_ascii_lowercase()).or_default();
        for (action, template) in actions {
            entry.insert(action.as_ref().to_ascii_lowercase(), template.into());
        }
        self
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.group_name(group).is_some()
    }

    /// Stored (lowercase) name of `group`, if the schema has it.
    pub fn group_name(&self, group: &str) -> Option<&str> {
        self.groups.get_key_value(&group.to_ascii_lowercase()).map(|(name, _)| name.as_str())
    }

    /// URL template for `group.action`, if both exist.
    pub fn template(&self, group: &str, action: &str) -> Option<&str> {
        self.groups
            .get(&group.to_ascii_lowercase())?
            .get(&action.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn actions(&self, group: &str) -> impl Iterator<Item = &str> {
        self.groups
            .get(&group.to_ascii_lowercase())
            .into_iter()
            .flat_map(|actions| actions.keys().map(String::as_str))
    }
}
