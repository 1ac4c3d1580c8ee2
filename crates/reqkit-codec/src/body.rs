//! Byte-limited body collection shared by the JSON and XML readers.

use axum::body::Body;
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::error::BodyError;

/// Collects `body` into memory, refusing to read past `limit` bytes.
///
/// A breached limit surfaces as [`BodyError::TooLarge`] rather than a
/// silently truncated buffer.
pub(crate) async fn collect_limited(body: Body, limit: usize) -> Result<Bytes, BodyError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(BodyError::TooLarge { limit })
        }
        Err(err) => Err(BodyError::Read(err.to_string())),
    }
}

/// Strips parameters from a media type
/// (e.g. `application/json; charset=utf-8` -> `application/json`).
pub(crate) fn normalize_media_type(value: &str) -> &str {
    value.split(';').next().map(str::trim).unwrap_or(value)
}
