//! # fsgate
//!
//! A minimal HTTP gateway exposing one filesystem directory for two
//! operations: signed uploads (`PUT`) and signed, range-aware downloads
//! (`GET`).
//!
//! fsgate performs no user authentication of its own. A trusted issuer holding
//! the shared secret hands out short-lived signed URLs; possession of a
//! correct, unexpired signature for a method and path is the only
//! authorization.
//!
//! ## Features
//!
//! - **Signed URLs**: SHA-256 tags bound to method, path and expiry (max 24 hours)
//! - **Allow-listed paths**: traversal and encoding tricks cannot be expressed
//! - **Write-once uploads**: staged to a private directory, published by an
//!   atomic no-replace rename; existing files are never overwritten
//! - **Range downloads**: `Range: bytes=<start>-[<end>]` served as `206`
//!
//! ## Architecture
//!
//! - [`auth`] - Signature engine, path validator and request authorizer
//! - [`storage`] - Staged uploads and streaming downloads on the filesystem
//! - [`server`] - Axum router, authorization middleware and handlers
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use fsgate::{create_router, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RouterConfig::new("/srv/files", "a-shared-secret-of-at-least-64-characters");
//!     let router = create_router(config);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use auth::{
    is_safe, AuthorizationOutcome, AuthorizedPath, Authorizer, SignedMethod, UrlSigner,
    MAX_SIGNATURE_TTL,
};
pub use config::{CheckConfig, Cli, Command, ServeConfig, SignConfig, SignOutputFormat};
pub use error::{AuthError, StorageError};
pub use server::{
    authorize_middleware, create_router, download_handler, upload_handler, AppState, RouterConfig,
};
pub use storage::{ByteRange, FileDownload, FileStore, StagedUpload};
