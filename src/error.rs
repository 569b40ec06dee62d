use thiserror::Error;

/// Reasons a request fails authorization.
///
/// Every variant maps to the same `403 Forbidden` response; the distinction
/// only exists for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// A query parameter other than `signature` or `expires` was supplied
    #[error("Unexpected query parameter: {0}")]
    UnexpectedParameter(String),

    /// `signature` or `expires` appeared more than once
    #[error("Duplicate query parameter: {0}")]
    DuplicateParameter(String),

    /// Request method is neither GET nor PUT
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Signature is missing or empty
    #[error("Missing signature parameter")]
    MissingSignature,

    /// Expiry timestamp is missing or empty
    #[error("Missing expires parameter")]
    MissingExpiry,

    /// Request path failed the path safety rules
    #[error("Unsafe path")]
    UnsafePath,

    /// Expiry timestamp is not a valid integer
    #[error("Invalid expiry format")]
    InvalidExpiryFormat,

    /// Signature has expired
    #[error("Signature expired at {expired_at} (current time: {current_time})")]
    Expired { expired_at: u64, current_time: u64 },

    /// Expiry lies further in the future than a signature may be valid for
    #[error("Expiry {expires_at} exceeds the maximum allowed {max_allowed}")]
    ExpiryTooFar { expires_at: u64, max_allowed: u64 },

    /// Signature does not match
    #[error("Invalid signature")]
    InvalidSignature,
}

/// Errors raised by the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No file exists at the requested path
    #[error("File not found: {0}")]
    NotFound(String),

    /// A file already exists at the destination (stored files are immutable)
    #[error("File already exists: {0}")]
    Conflict(String),

    /// Range header is malformed or lies outside the file
    #[error("Range not satisfiable for file of {size} bytes")]
    RangeNotSatisfiable { size: u64 },

    /// Filesystem or body stream failure
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Wrap an I/O error with a short description of the failed step.
    pub fn io(context: &'static str, source: std::io::Error) -> Self {
        StorageError::Io { context, source }
    }
}
