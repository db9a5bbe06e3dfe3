//! Macro for implementing Display and FromStr for status enums
//!
//! Persisted enums (run status, log level, item outcome) are stored as
//! lowercase strings. This macro provides both directions of that mapping
//! from a single variant table.
//!
//! # Example
//!
//! ```rust
//! use almanac_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum FeedState {
//!     Active,
//!     Paused,
//! }
//!
//! impl_domain_status_conversions!(FeedState {
//!     Active => "active",
//!     Paused => "paused",
//! });
//!
//! assert_eq!(FeedState::Paused.to_string(), "paused");
//! assert_eq!("ACTIVE".parse::<FeedState>(), Ok(FeedState::Active));
//! ```

/// Implements Display and FromStr traits for status enums
///
/// - Display writes the mapped lowercase string
/// - FromStr parses case-insensitively and reports the enum name on failure
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
