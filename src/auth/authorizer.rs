use std::fmt;

use url::form_urlencoded;

use super::path::is_safe;
use super::signature::{SignedMethod, UrlSigner, EXPIRES_PARAM, SIGNATURE_PARAM};
use crate::error::AuthError;

/// A request path that passed path validation and signature verification.
///
/// Only [`Authorizer::authorize`] constructs one, so holding an
/// `AuthorizedPath` is proof the request was authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedPath(String);

impl AuthorizedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The validated segments, split on both `/` and `\` with empty
    /// segments (such as a trailing slash) dropped.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(['/', '\\']).filter(|segment| !segment.is_empty())
    }
}

impl fmt::Display for AuthorizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of authorizing one request.
pub type AuthorizationOutcome = Result<AuthorizedPath, AuthError>;

/// Checks query parameters, path safety and the signature of a request.
#[derive(Debug, Clone)]
pub struct Authorizer {
    signer: UrlSigner,
}

impl Authorizer {
    pub fn new(signer: UrlSigner) -> Self {
        Self { signer }
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// Authorize `method` on `request_path` given the raw query string.
    ///
    /// `request_path` must already be percent-decoded once. Checks run in a
    /// fixed order and stop at the first failure:
    ///
    /// 1. only `signature` and `expires` may appear, each at most once
    /// 2. both must be present and non-empty
    /// 3. the path must be safe
    /// 4. the signature must verify for `(method, request_path, expires)`
    pub fn authorize(
        &self,
        method: SignedMethod,
        request_path: &str,
        query: &str,
    ) -> AuthorizationOutcome {
        let mut signature: Option<String> = None;
        let mut expires: Option<String> = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                SIGNATURE_PARAM => &mut signature,
                EXPIRES_PARAM => &mut expires,
                _ => return Err(AuthError::UnexpectedParameter(key.to_string())),
            };
            if slot.is_some() {
                return Err(AuthError::DuplicateParameter(key.to_string()));
            }
            *slot = Some(value.into_owned());
        }

        let signature = signature
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingSignature)?;
        let expires = expires
            .filter(|e| !e.is_empty())
            .ok_or(AuthError::MissingExpiry)?;

        if !is_safe(request_path) {
            return Err(AuthError::UnsafePath);
        }

        self.signer
            .verify(method, request_path, &expires, &signature)?;

        Ok(AuthorizedPath(request_path.to_string()))
    }
}
