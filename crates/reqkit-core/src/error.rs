//! Error classification shared across reqkit crates.

/// Maps an error onto the HTTP response a host handler should produce.
///
/// Client-input failures (bad file type, malformed body, empty slug input)
/// land in the 4xx range and carry text safe to show to the end user;
/// everything else is an environment or programmer problem and maps to 5xx.
pub trait ErrorStatus {
    /// HTTP status code for this error.
    fn http_status_code(&self) -> u16;

    /// Whether the error was caused by the client's input.
    fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status_code())
    }
}
