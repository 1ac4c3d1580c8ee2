//! Outbound JSON delivery.

use std::sync::LazyLock;

use axum::http::StatusCode;
use serde::Serialize;

use crate::error::BodyError;
use crate::json::JSON_CONTENT_TYPE;

static DEFAULT_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// Serializes `data` to JSON and POSTs it to `uri`, returning the raw
/// response together with its status code.
///
/// A caller-supplied `client` is used when given (which also makes the
/// operation testable against a local listener); otherwise a process-wide
/// default client is used. No retry is attempted and no timeout is imposed
/// beyond whatever the client enforces.
pub async fn push_json<T: Serialize>(
    uri: &str,
    data: &T,
    client: Option<&reqwest::Client>,
) -> Result<(reqwest::Response, StatusCode), BodyError> {
    let body = serde_json::to_vec(data).map_err(|err| BodyError::Serialize(err.to_string()))?;

    let client = client.unwrap_or(&DEFAULT_CLIENT);
    let response = client
        .post(uri)
        .header(reqwest::header::CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(body)
        .send()
        .await?;

    let status = response.status();
    tracing::debug!(uri = %uri, status = %status, "Pushed JSON to remote");

    Ok((response, status))
}
