//! Static-file download responses.

use std::io::ErrorKind;
use std::path::Path;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use tokio::fs;
use tokio_util::io::ReaderStream;

use crate::error::DownloadError;

/// Streams the file at `path` back to the client with a
/// `Content-Disposition: attachment` header, forcing a "save as" dialog
/// instead of inline display. `display_name` is the filename offered to the
/// user, independent of the name on disk.
pub async fn download_attachment(
    path: impl AsRef<Path>,
    display_name: &str,
) -> Result<Response, DownloadError> {
    let path = path.as_ref();

    let file = fs::File::open(path).await.map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            DownloadError::NotFound(path.to_path_buf())
        } else {
            DownloadError::Io(err)
        }
    })?;
    let length = file.metadata().await?.len();
    let stream = ReaderStream::new(file);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", escape_quoted(display_name)),
        )
        .body(Body::from_stream(stream))
        .map_err(|err| DownloadError::Response(err.to_string()))?;

    tracing::info!(
        path = %path.display(),
        display_name = %display_name,
        size_bytes = length,
        "Serving attachment download"
    );

    Ok(response)
}

/// Escapes a value for use inside a quoted-string header parameter.
fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
