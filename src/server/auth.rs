//! Signed URL enforcement for the HTTP layer.
//!
//! Every file route runs [`authorize_middleware`] before its handler. The
//! middleware decodes the request path once, hands it to the
//! [`Authorizer`] together with the raw query string, and on success stores
//! the resulting [`AuthorizedPath`] in the request extensions:
//!
//! ```text
//! GET /reports/2024/jan.txt?signature=3f1c...&expires=1735689600
//!        │                        │
//!        └──── decoded path ──────┴── query ──▶ Authorizer ──▶ AuthorizedPath
//! ```
//!
//! Failures never reach a handler, so no filesystem access happens for an
//! unauthorized request.

use axum::{
    extract::{OriginalUri, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::auth::{Authorizer, SignedMethod};
use crate::error::AuthError;

/// Body of every authorization failure. The reason stays in the logs.
const FORBIDDEN_BODY: &str = "Forbidden\n";

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // A bad signature on an otherwise well-formed request could indicate
        // an attack; everything else is ordinary client noise.
        match &self {
            AuthError::InvalidSignature => {
                warn!(status = 403, "Authorization failed: {}", self);
            }
            _ => {
                debug!(status = 403, "Authorization failed: {}", self);
            }
        }

        (StatusCode::FORBIDDEN, FORBIDDEN_BODY).into_response()
    }
}

/// Axum middleware authorizing a request by its signed URL.
///
/// # Example
///
/// ```ignore
/// use axum::{middleware, routing::get, Router};
/// use fsgate::auth::{Authorizer, UrlSigner};
/// use fsgate::server::auth::authorize_middleware;
///
/// let authorizer = Authorizer::new(UrlSigner::new("secret"));
/// let app = Router::new()
///     .route("/{*path}", get(download_handler))
///     .route_layer(middleware::from_fn_with_state(authorizer, authorize_middleware));
/// ```
pub async fn authorize_middleware(
    State(authorizer): State<Authorizer>,
    OriginalUri(original_uri): OriginalUri,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let method = SignedMethod::try_from(request.method())
        .map_err(|_| AuthError::UnsupportedMethod(request.method().to_string()))?;

    let path =
        urlencoding::decode(original_uri.path()).map_err(|_| AuthError::UnsafePath)?;
    let query = original_uri.query().unwrap_or("");

    let authorized = authorizer.authorize(method, &path, query)?;
    debug!(method = %method, path = %authorized, "Request authorized");

    request.extensions_mut().insert(authorized);
    Ok(next.run(request).await)
}
