//! Router configuration for fsgate.
//!
//! # Route Structure
//!
//! ```text
//! GET /{*path}   - Download a file (signed)
//! PUT /{*path}   - Upload a file (signed)
//! ```
//!
//! `/` is routed to the same handlers so that it is rejected by the
//! authorization middleware rather than by the router.
//!
//! # Example
//!
//! ```ignore
//! use fsgate::server::routes::{create_router, RouterConfig};
//!
//! let config = RouterConfig::new("/srv/files", "a-long-shared-secret");
//! let router = create_router(config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::fmt;
use std::path::PathBuf;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::auth::authorize_middleware;
use super::handlers::{download_handler, upload_handler, AppState};
use crate::auth::{Authorizer, UrlSigner};
use crate::storage::FileStore;

// =============================================================================
// Router Configuration
// =============================================================================

/// Immutable configuration for the HTTP router, fixed at startup.
#[derive(Clone)]
pub struct RouterConfig {
    /// Directory all stored files live under
    pub storage_root: PathBuf,

    /// Shared secret used to verify signed URLs
    pub secret: String,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration. Tracing is enabled by default.
    pub fn new(storage_root: impl Into<PathBuf>, secret: impl Into<String>) -> Self {
        Self {
            storage_root: storage_root.into(),
            secret: secret.into(),
            enable_tracing: true,
        }
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterConfig")
            .field("storage_root", &self.storage_root)
            .field("secret", &"<redacted>")
            .field("enable_tracing", &self.enable_tracing)
            .finish()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
///
/// Every route requires a valid signed URL; request bodies are streamed
/// without a size limit.
pub fn create_router(config: RouterConfig) -> Router {
    let app_state = AppState::new(FileStore::new(config.storage_root));
    let authorizer = Authorizer::new(UrlSigner::new(config.secret));

    let router = Router::new()
        .route("/", get(download_handler).put(upload_handler))
        .route("/{*path}", get(download_handler).put(upload_handler))
        .route_layer(middleware::from_fn_with_state(
            authorizer,
            authorize_middleware,
        ))
        .layer(DefaultBodyLimit::disable())
        .with_state(app_state);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

// =============================================================================
// Tests
// =============================================================================
