//! HTTP server layer for fsgate.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │            GET|PUT /{path}?signature=..&expires=..              │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │    auth     │  │  handlers   │  │        routes           │  │
//! │  │ (signed URL)│─▶│ (GET / PUT) │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └───────────────────────────┬─────────────────────────────────────┘
//!                             ▼
//!                         FileStore
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::authorize_middleware;
pub use handlers::{download_handler, upload_handler, AppState};
pub use routes::{create_router, RouterConfig};
