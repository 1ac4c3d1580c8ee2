//! Uniform response envelope.

use serde::{Deserialize, Serialize};

/// Wrapper shape used for both success and error responses, in JSON and XML.
///
/// JSON: `{"error": bool, "message": string, "data"?: ...}` with `data`
/// omitted when absent. XML: a `<response>` root containing `<error>`,
/// `<message>`, and an optional `<data>` element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "response")]
pub struct ResponseEnvelope<T> {
    pub error: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ResponseEnvelope<T> {
    /// Success envelope carrying a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            error: false,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Error envelope; no payload.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            data: None,
        }
    }
}
