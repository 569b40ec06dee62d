//! Time-boxed request signatures.
//!
//! A signature binds an HTTP method, a path and an expiry timestamp to the
//! shared secret:
//!
//! ```text
//! signature = hex(SHA-256("{METHOD}\n{path}\n{expires}\n{secret}"))
//! ```
//!
//! Signed URLs carry the tag and the expiry as query parameters:
//!
//! ```text
//! /reports/2024/jan.txt?signature=3f1c...&expires=1735689600
//! ```
//!
//! # Example
//!
//! ```rust
//! use fsgate::auth::{SignedMethod, UrlSigner};
//! use std::time::Duration;
//!
//! let signer = UrlSigner::new("my-secret-key");
//! let path = "/reports/2024/jan.txt";
//! let (signature, expires) = signer.sign_with_ttl(SignedMethod::Get, path, Duration::from_secs(60));
//!
//! assert!(signer
//!     .verify(SignedMethod::Get, path, &expires.to_string(), &signature)
//!     .is_ok());
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use url::form_urlencoded;

use crate::error::AuthError;

/// Longest validity window a signature may carry (24 hours).
pub const MAX_SIGNATURE_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Length of a hex-encoded SHA-256 tag.
pub const SIGNATURE_HEX_LEN: usize = 64;

/// Query parameter carrying the tag.
pub const SIGNATURE_PARAM: &str = "signature";

/// Query parameter carrying the expiry timestamp.
pub const EXPIRES_PARAM: &str = "expires";

/// HTTP methods a signature can authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignedMethod {
    Get,
    Put,
}

impl SignedMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignedMethod::Get => "GET",
            SignedMethod::Put => "PUT",
        }
    }
}

impl fmt::Display for SignedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignedMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(SignedMethod::Get),
            "PUT" => Ok(SignedMethod::Put),
            other => Err(format!("unsupported method: {}", other)),
        }
    }
}

impl TryFrom<&http::Method> for SignedMethod {
    type Error = ();

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        if method == http::Method::GET {
            Ok(SignedMethod::Get)
        } else if method == http::Method::PUT {
            Ok(SignedMethod::Put)
        } else {
            Err(())
        }
    }
}

/// Computes and verifies request signatures with a shared secret.
#[derive(Clone)]
pub struct UrlSigner {
    secret: String,
}

impl UrlSigner {
    /// Create a signer for the given shared secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Compute the tag for a method, path and expiry timestamp.
    pub fn sign(&self, method: SignedMethod, path: &str, expires_at: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(canonical_input(method, path, expires_at, &self.secret).as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Sign a request that expires `ttl` from now.
    ///
    /// Returns the tag and the expiry timestamp (Unix epoch seconds).
    pub fn sign_with_ttl(&self, method: SignedMethod, path: &str, ttl: Duration) -> (String, u64) {
        let expires_at = unix_now().saturating_add(ttl.as_secs());
        (self.sign(method, path, expires_at), expires_at)
    }

    /// Build a complete signed URL for `path` under `base_url`, valid for
    /// `ttl` from now.
    pub fn signed_url(
        &self,
        base_url: &str,
        method: SignedMethod,
        path: &str,
        ttl: Duration,
    ) -> String {
        let expires_at = unix_now().saturating_add(ttl.as_secs());
        self.signed_url_at(base_url, method, path, expires_at)
    }

    /// Build a signed URL expiring at `expires_at`.
    ///
    /// An empty `base_url` yields a relative URL (`/path?signature=..`).
    pub fn signed_url_at(
        &self,
        base_url: &str,
        method: SignedMethod,
        path: &str,
        expires_at: u64,
    ) -> String {
        let signature = self.sign(method, path, expires_at);

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(SIGNATURE_PARAM, &signature)
            .append_pair(EXPIRES_PARAM, &expires_at.to_string())
            .finish();

        format!("{}{}?{}", base_url.trim_end_matches('/'), path, query)
    }

    /// Check a tag against the method, path and raw `expires` parameter.
    ///
    /// The expiry must parse as an integer, must not lie in the past and must
    /// not be more than [`MAX_SIGNATURE_TTL`] in the future.
    pub fn verify(
        &self,
        method: SignedMethod,
        path: &str,
        expires: &str,
        signature: &str,
    ) -> Result<(), AuthError> {
        self.verify_at(method, path, expires, signature, unix_now())
    }

    fn verify_at(
        &self,
        method: SignedMethod,
        path: &str,
        expires: &str,
        signature: &str,
        current_time: u64,
    ) -> Result<(), AuthError> {
        let expires_at: u64 = expires
            .parse()
            .map_err(|_| AuthError::InvalidExpiryFormat)?;

        if expires_at < current_time {
            return Err(AuthError::Expired {
                expired_at: expires_at,
                current_time,
            });
        }

        let max_allowed = current_time.saturating_add(MAX_SIGNATURE_TTL.as_secs());
        if expires_at > max_allowed {
            return Err(AuthError::ExpiryTooFar {
                expires_at,
                max_allowed,
            });
        }

        // Length check precedes the byte comparison.
        if signature.len() != SIGNATURE_HEX_LEN {
            return Err(AuthError::InvalidSignature);
        }

        let expected = self.sign(method, path, expires_at);
        if expected.as_bytes().ct_eq(signature.as_bytes()).into() {
            Ok(())
        } else {
            Err(AuthError::InvalidSignature)
        }
    }
}

impl fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}

fn canonical_input(method: SignedMethod, path: &str, expires_at: u64, secret: &str) -> String {
    format!("{}\n{}\n{}\n{}", method.as_str(), path, expires_at, secret)
}

/// Current wall-clock time in seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
