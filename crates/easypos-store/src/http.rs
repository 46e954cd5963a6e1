//! Shared HTTP status mapping for the two remote backends.

use reqwest::Response;

use crate::error::{StoreError, StoreResult};

/// Maps a non-success response onto the store taxonomy.
///
/// ```text
/// 404          → NotFound   (callers with an entity/id give better context)
/// 409          → Conflict
/// 5xx          → Unavailable
/// anything else → Unknown (with the response body for debugging)
/// ```
pub(crate) async fn expect_ok(resp: Response, context: &str) -> StoreResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        404 => StoreError::not_found(context, "unknown"),
        409 => StoreError::conflict(context, "unknown"),
        _ if status.is_server_error() => {
            StoreError::Unavailable(format!("{context}: HTTP {status}"))
        }
        _ => StoreError::Unknown(format!("{context}: HTTP {status}: {body}")),
    })
}
