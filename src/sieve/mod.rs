//! SIEVE (RFC 5228) side of the conversion.
pub mod emitter;
pub mod lexer;
pub mod parser;

pub use emitter::emit;
pub use parser::parse;

/// Comparator that turns off the default case-insensitive matching.
pub(crate) const CASE_SENSITIVE_COMPARATOR: &str = "i;octet";

/// Trailing wildcard of a `:matches` prefix pattern.
pub(crate) const WILDCARD: char = '*';
