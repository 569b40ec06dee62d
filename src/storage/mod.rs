//! Filesystem storage with atomic, write-once uploads.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── reports/2024/jan.txt        published files
//! └── .fsgate/uploads/<uuid>.tmp  in-flight uploads (never addressable)
//! ```
//!
//! # Upload lifecycle
//!
//! ```text
//! exists? ──yes──▶ Conflict
//!    │no
//!    ▼
//! stage body ──error──▶ cleanup
//!    │
//!    ▼
//! exists? ──yes──▶ Conflict + cleanup
//!    │no
//!    ▼
//! no-replace rename ──EEXIST──▶ Conflict + cleanup
//!    │
//!    ▼
//!  Done
//! ```

mod range;
mod staging;
mod store;

pub use range::ByteRange;
pub use staging::{StagedUpload, STAGING_SUFFIX};
pub use store::{FileDownload, FileStore, UPLOADS_DIR};
