//! Domain types and models

pub mod identity;
pub mod result_set;

pub use identity::Identity;
pub use result_set::ResultSet;

use crate::impl_wire_name_conversions;

/// Named groups of marketplace endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointGroup {
    Catalog,
    Profile,
    User,
    Market,
}

impl EndpointGroup {
    pub const ALL: [Self; 4] = [Self::Catalog, Self::Profile, Self::User, Self::Market];
}

impl_wire_name_conversions!(EndpointGroup {
    Catalog => "catalog",
    Profile => "profile",
    User => "user",
    Market => "market",
});

/// OAuth grant types sent to the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
}

impl_wire_name_conversions!(GrantType {
    AuthorizationCode => "authorization_code",
    RefreshToken => "refresh_token",
});
