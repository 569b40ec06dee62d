//! Request authorization.
//!
//! Three layers, leaves first:
//!
//! - [`signature`]: computes and verifies the time-boxed request tag
//! - [`path`]: allow-list validation of client-supplied paths
//! - [`authorizer`]: applies both to an incoming request's path and query

pub mod authorizer;
pub mod path;
pub mod signature;

pub use authorizer::{AuthorizationOutcome, AuthorizedPath, Authorizer};
pub use path::{is_safe, MAX_SEGMENTS, MAX_SEGMENT_LEN, RESERVED_DIR};
pub use signature::{
    unix_now, SignedMethod, UrlSigner, EXPIRES_PARAM, MAX_SIGNATURE_TTL, SIGNATURE_HEX_LEN,
    SIGNATURE_PARAM,
};
