//! Reqkit Codec Library
//!
//! Structured request/response bodies for axum handlers: strict JSON and XML
//! decoding (byte-limited, exactly one document, classified errors), typed
//! response encoding, a uniform success/error envelope, and a helper for
//! pushing JSON payloads to remote endpoints.
//!
//! # Error taxonomy
//!
//! Both body formats fail through the same [`BodyError`] variants, so a host
//! can surface one set of messages regardless of which codec a handler used.

pub mod body;
pub mod envelope;
pub mod error;
pub mod json;
pub mod push;
pub mod xml;

// Re-export commonly used types
pub use envelope::ResponseEnvelope;
pub use error::{BodyError, BodyFormat};
pub use json::{error_json, read_json, write_json};
pub use push::push_json;
pub use xml::{error_xml, read_xml, write_xml};
