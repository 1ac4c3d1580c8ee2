//! Strict XML body decoding and typed XML responses.
//!
//! XML failures classify into the same [`BodyError`] taxonomy the JSON
//! reader uses, so handlers surface one set of messages regardless of
//! format.

use std::fmt;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::Serialize;

use reqkit_core::Config;

use crate::body::collect_limited;
use crate::envelope::ResponseEnvelope;
use crate::error::{BodyError, BodyFormat};

pub(crate) const XML_CONTENT_TYPE: &str = "application/xml";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Decodes an XML request body into `T`.
///
/// The body is read through a byte limit of `config.max_xml_bytes`, must be
/// UTF-8, and must hold exactly one XML document.
pub async fn read_xml<T: DeserializeOwned>(config: &Config, body: Body) -> Result<T, BodyError> {
    let bytes = collect_limited(body, config.max_xml_bytes).await?;
    let text = std::str::from_utf8(&bytes).map_err(|_| BodyError::Encoding)?;
    decode_xml(text)
}

/// Decodes exactly one XML document from `text`.
pub(crate) fn decode_xml<T: DeserializeOwned>(text: &str) -> Result<T, BodyError> {
    check_single_document(text)?;

    // Well-formedness and document count are already checked, so failures
    // here are shape mismatches between the document and the target type.
    quick_xml::de::from_str(text).map_err(|err| BodyError::FieldType {
        detail: err.to_string(),
    })
}

/// Scans the raw text and verifies it holds exactly one XML document.
fn check_single_document(text: &str) -> Result<(), BodyError> {
    let mut reader = Reader::from_str(text);
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Empty(_)) => {
                if depth == 0 {
                    roots += 1;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(BodyError::Syntax {
                    format: BodyFormat::Xml,
                    position: format!("byte offset {}: {err}", reader.buffer_position()),
                })
            }
        }
    }

    if depth > 0 {
        return Err(BodyError::Truncated {
            format: BodyFormat::Xml,
        });
    }

    match roots {
        0 => Err(BodyError::Empty),
        1 => Ok(()),
        _ => Err(BodyError::MultipleValues {
            format: BodyFormat::Xml,
        }),
    }
}

/// Serializes `data` as the XML body of a response, prefixed with a
/// standard XML declaration.
///
/// Header handling matches [`crate::write_json`]: caller headers merge
/// first, then `Content-Type: application/xml` is set.
pub fn write_xml<T: Serialize>(
    status: StatusCode,
    data: &T,
    headers: Option<HeaderMap>,
) -> Result<Response, BodyError> {
    let serialized =
        quick_xml::se::to_string(data).map_err(|err| BodyError::Serialize(err.to_string()))?;

    let mut body = String::with_capacity(XML_DECLARATION.len() + 1 + serialized.len());
    body.push_str(XML_DECLARATION);
    body.push('\n');
    body.push_str(&serialized);

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    if let Some(extra) = headers {
        response.headers_mut().extend(extra);
    }
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE));

    Ok(response)
}

/// Encodes `error` as an XML error envelope.
///
/// The status defaults to 400 Bad Request when not supplied.
pub fn error_xml(
    error: &impl fmt::Display,
    status: Option<StatusCode>,
) -> Result<Response, BodyError> {
    let payload = ResponseEnvelope::<()>::error(error.to_string());
    write_xml(status.unwrap_or(StatusCode::BAD_REQUEST), &payload, None)
}
