//! Strict JSON body decoding and typed JSON responses.

use std::fmt;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;

use reqkit_core::Config;

use crate::body::{collect_limited, normalize_media_type};
use crate::envelope::ResponseEnvelope;
use crate::error::{BodyError, BodyFormat};

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json";

/// Decodes a request body into `T`.
///
/// If a `Content-Type` header is present its media type must be
/// `application/json` (parameters ignored, case-insensitive); a missing
/// header decodes anyway. The body is read through a byte limit of
/// `config.max_json_bytes`, must hold exactly one JSON document, and unknown
/// object fields are rejected unless `config.allow_unknown_fields` is set.
/// Failures come back as the classified [`BodyError`] variants.
pub async fn read_json<T: DeserializeOwned>(
    config: &Config,
    headers: &HeaderMap,
    body: Body,
) -> Result<T, BodyError> {
    if let Some(value) = headers.get(header::CONTENT_TYPE) {
        let found = value.to_str().unwrap_or_default();
        if !normalize_media_type(found).eq_ignore_ascii_case(JSON_CONTENT_TYPE) {
            return Err(BodyError::ContentType {
                expected: JSON_CONTENT_TYPE,
                found: found.to_string(),
            });
        }
    }

    let bytes = collect_limited(body, config.max_json_bytes).await?;
    decode_json(&bytes, config.allow_unknown_fields)
}

/// Decodes exactly one JSON document from `bytes`.
pub(crate) fn decode_json<T: DeserializeOwned>(
    bytes: &[u8],
    allow_unknown_fields: bool,
) -> Result<T, BodyError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);

    let value = if allow_unknown_fields {
        T::deserialize(&mut deserializer).map_err(|err| classify(err, bytes))?
    } else {
        let mut unknown: Option<String> = None;
        let value = serde_ignored::deserialize(&mut deserializer, |path| {
            if unknown.is_none() {
                unknown = Some(path.to_string());
            }
        })
        .map_err(|err| classify(err, bytes))?;
        if let Some(field) = unknown {
            return Err(BodyError::UnknownField { field });
        }
        value
    };

    // Anything but end-of-stream after the first document means the body
    // held more than one value.
    deserializer.end().map_err(|_| BodyError::MultipleValues {
        format: BodyFormat::Json,
    })?;

    Ok(value)
}

fn classify(err: serde_json::Error, bytes: &[u8]) -> BodyError {
    match err.classify() {
        Category::Eof => {
            if bytes.iter().all(u8::is_ascii_whitespace) {
                BodyError::Empty
            } else {
                BodyError::Truncated {
                    format: BodyFormat::Json,
                }
            }
        }
        Category::Syntax => BodyError::Syntax {
            format: BodyFormat::Json,
            position: format!("line {}, column {}", err.line(), err.column()),
        },
        // serde_json's data errors already name the field and position.
        Category::Data => BodyError::FieldType {
            detail: err.to_string(),
        },
        Category::Io => BodyError::Read(err.to_string()),
    }
}

/// Serializes `data` as the JSON body of a response.
///
/// Caller headers are merged first; the `Content-Type` is then always set to
/// `application/json`, so it cannot be overridden. Serialization failure
/// returns before any part of the response is built.
pub fn write_json<T: Serialize>(
    status: StatusCode,
    data: &T,
    headers: Option<HeaderMap>,
) -> Result<Response, BodyError> {
    let body = serde_json::to_vec(data).map_err(|err| BodyError::Serialize(err.to_string()))?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    if let Some(extra) = headers {
        response.headers_mut().extend(extra);
    }
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

    Ok(response)
}

/// Encodes `error` as a JSON error envelope.
///
/// The status defaults to 400 Bad Request when not supplied.
pub fn error_json(
    error: &impl fmt::Display,
    status: Option<StatusCode>,
) -> Result<Response, BodyError> {
    let payload = ResponseEnvelope::<()>::error(error.to_string());
    write_json(status.unwrap_or(StatusCode::BAD_REQUEST), &payload, None)
}
