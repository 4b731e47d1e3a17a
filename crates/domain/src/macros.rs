//! Macro for implementing Display and FromStr for wire-name enums
//!
//! Several small enums travel as lowercase strings: header values, service
//! names, config values. This macro keeps the string mapping in one place.
//!
//! # Example
//!
//! ```rust
//! use feedstream_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Scheme {
//!     Jwt,
//!     Simple,
//! }
//!
//! impl_wire_name_conversions!(Scheme {
//!     Jwt => "jwt",
//!     Simple => "simple",
//! });
//!
//! assert_eq!(Scheme::Jwt.to_string(), "jwt");
//! assert_eq!("SIMPLE".parse::<Scheme>(), Ok(Scheme::Simple));
//! ```

/// Implements Display and FromStr for an enum with fixed wire names
///
/// - Display writes the wire name
/// - FromStr parses case-insensitively; wire names must be lowercase
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
