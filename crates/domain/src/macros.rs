//! Macro for mapping fieldless enums to their wire names
//!
//! Endpoint groups and OAuth grant types travel as lowercase strings. The
//! macro below gives such an enum a `const fn as_str`, a `Display` impl that
//! writes the wire name, and a case-insensitive `FromStr`.
//!
//! # Example
//!
//! ```rust
//! use envato_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Site {
//!     ThemeForest,
//!     CodeCanyon,
//! }
//!
//! impl_wire_name_conversions!(Site {
//!     ThemeForest => "themeforest",
//!     CodeCanyon => "codecanyon",
//! });
//!
//! assert_eq!(Site::CodeCanyon.as_str(), "codecanyon");
//! assert_eq!("ThemeForest".parse::<Site>().unwrap(), Site::ThemeForest);
//! ```

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum.
///
/// Parsing lowercases the input first, so every mapped string must itself be
/// lowercase.
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Wire name of this variant.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
