// error.rs: error type for set construction and raw-address encoding
use thiserror::Error;

/// Errors raised while building a set or encoding raw address bytes.
///
/// Construction from text is all-or-nothing: the first bad token aborts the
/// whole set. Queries never return an error; bytes that cannot be encoded are
/// simply not contained in anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrSetError {
    /// Raw address bytes must be exactly 4 (ipv4) or 16 (ipv6) octets.
    #[error("invalid address: expected 4 or 16 bytes, got {0}")]
    InvalidAddress(usize),
    /// A list token that parses as neither an ip address nor a cidr block.
    #[error("unparseable ip or cidr token {token:?}")]
    Parse { token: String },
}
