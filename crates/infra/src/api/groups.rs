//! Typed endpoint groups
//!
//! One struct per schema group with one method per action. Each method is a
//! `GET` through [`Endpoint::call`], so parameters fill path variables first
//! and the rest become the query string.

use envato_domain::{EndpointGroup, Result, ResultSet};

use super::client::EnvatoClient;
use super::endpoint::Endpoint;
use super::params::Params;

macro_rules! endpoint_group {
    (
        $(#[$meta:meta])*
        $name:ident => $group:ident {
            $( $(#[$doc:meta])* $method:ident => $action:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'a> {
            endpoint: Endpoint<'a>,
        }

        impl<'a> $name<'a> {
            pub(crate) fn new(client: &'a EnvatoClient) -> Self {
                Self { endpoint: Endpoint::new(client, EndpointGroup::$group.as_str()) }
            }

            /// The untyped endpoint behind this group.
            pub fn endpoint(&self) -> Endpoint<'a> {
                self.endpoint
            }

            $(
                $(#[$doc])*
                pub async fn $method(&self, params: impl Into<Params>) -> Result<ResultSet> {
                    self.endpoint.call($action, params).await
                }
            )*
        }
    };
}

endpoint_group! {
    /// Catalog search and item lookups.
    Catalog => Catalog {
        collection => "collection",
        /// Needs `id`.
        item => "item",
        item_version => "item_version",
        /// Item search (`term`, `site`, `page`, ...).
        items => "items",
        comments => "comments",
        /// Needs `site`.
        popular => "popular",
        /// Needs `site`.
        categories => "categories",
        /// Needs `item_id`.
        prices => "prices",
        /// Needs `site` and `category`.
        newest => "newest",
        /// Needs `site`.
        featured => "featured",
        /// Needs `site`.
        random => "random",
    }
}

endpoint_group! {
    /// Public and private user profiles.
    Profile => Profile {
        collections => "collections",
        collection => "collection",
        /// Needs `username`.
        details => "details",
        /// Needs `username`.
        badges => "badges",
        /// Needs `username`.
        portfolio => "portfolio",
        /// Needs `username` and `site`.
        newest => "newest",
    }
}

endpoint_group! {
    /// The authenticated user's sales, purchases and account.
    User => User {
        sales => "sales",
        /// Needs `code` (purchase code).
        sale => "sale",
        purchases => "purchases",
        purchase => "purchase",
        download => "download",
        details => "details",
        username => "username",
        email => "email",
        earnings => "earnings",
        statement => "statement",
    }
}

endpoint_group! {
    /// Marketplace-wide totals.
    Market => Market {
        users => "users",
        items => "items",
        /// Needs `site`.
        site => "site",
    }
}
