//! Body codec error taxonomy.

use std::fmt;

use thiserror::Error;

use reqkit_core::ErrorStatus;

/// Which body format an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Xml,
}

impl fmt::Display for BodyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyFormat::Json => f.write_str("JSON"),
            BodyFormat::Xml => f.write_str("XML"),
        }
    }
}

/// Failures while decoding or encoding a structured body.
///
/// The messages on the client-input variants are written to be returned to
/// the end user verbatim.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("Content-Type must be {expected}, got {found:?}")]
    ContentType {
        expected: &'static str,
        found: String,
    },

    #[error("body must not be larger than {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Read(String),

    #[error("body must not be empty")]
    Empty,

    #[error("body contains badly-formed {format} (at {position})")]
    Syntax { format: BodyFormat, position: String },

    #[error("body contains badly-formed {format}: unexpected end of input")]
    Truncated { format: BodyFormat },

    #[error("body contains an incorrect value: {detail}")]
    FieldType { detail: String },

    #[error("body contains unknown field {field:?}")]
    UnknownField { field: String },

    #[error("body must contain only one {format} value")]
    MultipleValues { format: BodyFormat },

    #[error("body is not valid UTF-8")]
    Encoding,

    #[error("failed to serialize response body: {0}")]
    Serialize(String),

    #[error("failed to push JSON to remote: {0}")]
    Push(#[from] reqwest::Error),
}

impl ErrorStatus for BodyError {
    fn http_status_code(&self) -> u16 {
        match self {
            BodyError::ContentType { .. } => 415,
            BodyError::TooLarge { .. } => 413,
            BodyError::Read(_) | BodyError::Serialize(_) | BodyError::Push(_) => 500,
            BodyError::Empty
            | BodyError::Syntax { .. }
            | BodyError::Truncated { .. }
            | BodyError::FieldType { .. }
            | BodyError::UnknownField { .. }
            | BodyError::MultipleValues { .. }
            | BodyError::Encoding => 400,
        }
    }
}
