//! Token issuance and signature handling

pub mod signature;
pub mod tokens;

use feedstream_domain::impl_wire_name_conversions;

pub use signature::{auth_header_value, classify, decode_claims, trailing_segment};
pub use tokens::TokenIssuer;

/// How a signature is presented to the API, sent as `stream-auth-type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureKind {
    /// Structured three-segment token
    Jwt,
    /// Opaque credential forwarded verbatim
    Simple,
}

impl_wire_name_conversions!(SignatureKind {
    Jwt => "jwt",
    Simple => "simple",
});
