//! Upload and download error types.

use std::path::PathBuf;

use axum::extract::multipart::MultipartError;
use thiserror::Error;

use reqkit_core::ErrorStatus;

use crate::save::UploadedFile;

/// Upload pipeline errors.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to create upload directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading multipart request: {0}")]
    Multipart(#[from] MultipartError),

    #[error("file type not allowed: {detected}")]
    FileTypeNotAllowed { detected: String },

    #[error("invalid filename: {0:?}")]
    BadFilename(String),

    #[error("request exceeds maximum upload size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("no file field in request")]
    NoFile,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorStatus for UploadError {
    fn http_status_code(&self) -> u16 {
        match self {
            UploadError::Multipart(_)
            | UploadError::FileTypeNotAllowed { .. }
            | UploadError::BadFilename(_)
            | UploadError::NoFile => 400,
            UploadError::TooLarge { .. } => 413,
            UploadError::CreateDir { .. } | UploadError::Io(_) => 500,
        }
    }
}

/// Outcome of a multi-file save that failed partway through.
///
/// `saved` holds every file persisted before the failing part, in request
/// order. Those files stay on disk; the pipeline performs no rollback, so
/// cleanup, if wanted, is the caller's responsibility.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PartialUpload {
    pub saved: Vec<UploadedFile>,
    #[source]
    pub error: UploadError,
}

impl ErrorStatus for PartialUpload {
    fn http_status_code(&self) -> u16 {
        self.error.http_status_code()
    }
}

/// Static-file download errors.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build response: {0}")]
    Response(String),
}

impl ErrorStatus for DownloadError {
    fn http_status_code(&self) -> u16 {
        match self {
            DownloadError::NotFound(_) => 404,
            DownloadError::Io(_) | DownloadError::Response(_) => 500,
        }
    }
}
