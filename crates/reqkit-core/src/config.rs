//! Shared configuration
//!
//! One `Config` instance is built by the host application and shared
//! read-only across every reqkit call. Operations never write back into the
//! shared instance; a field left at its default is used as-is rather than
//! being patched in at call time, so an instance behind an `Arc` is safe to
//! share between concurrent handlers.

/// Default ceiling for the total bytes accepted by one upload call (1 GiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1024 * 1024 * 1024;

/// Default ceiling for a JSON request body (10 MiB).
pub const DEFAULT_MAX_JSON_BYTES: usize = 10 * 1024 * 1024;

/// Default ceiling for an XML request body (10 MiB).
pub const DEFAULT_MAX_XML_BYTES: usize = 10 * 1024 * 1024;

/// Limits and policies shared by the upload pipeline and the body codecs.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum total bytes accepted across all file parts of one upload call.
    pub max_upload_bytes: u64,
    /// MIME types admitted by the upload pipeline, matched case-insensitively
    /// against the sniffed type. Empty means every type is admitted.
    pub allowed_file_types: Vec<String>,
    /// Maximum bytes read from a JSON request body.
    pub max_json_bytes: usize,
    /// Maximum bytes read from an XML request body.
    pub max_xml_bytes: usize,
    /// Tolerate object fields the decode target does not know about.
    pub allow_unknown_fields: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_file_types: Vec::new(),
            max_json_bytes: DEFAULT_MAX_JSON_BYTES,
            max_xml_bytes: DEFAULT_MAX_XML_BYTES,
            allow_unknown_fields: false,
        }
    }
}
