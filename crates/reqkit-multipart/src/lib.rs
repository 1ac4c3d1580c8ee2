//! Reqkit Multipart Library
//!
//! Files in and files out: this crate persists multipart file uploads to a
//! destination directory with content sniffing and per-request byte budgets,
//! and builds streaming attachment responses for static-file downloads.
//!
//! # Upload naming
//!
//! By default every stored file is renamed to a 25-character random
//! identifier plus the original extension, so client-supplied names never
//! reach the filesystem. Renaming can be disabled per call, in which case
//! the original name is reduced to its final path component and checked for
//! traversal sequences before use.

pub mod download;
pub mod error;
pub mod save;

// Re-export commonly used types
pub use download::download_attachment;
pub use error::{DownloadError, PartialUpload, UploadError};
pub use save::{save_file, save_files, SaveOptions, UploadedFile};
