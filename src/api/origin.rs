use axum::{extract::Request, middleware::Next, response::Response};
use std::sync::Arc;

use super::error::ApiError;

/// Reject sentinel upgrades from browser origins outside `allowed`.
///
/// Only installed when an allow-list is configured. Plain HTTP requests and
/// upgrades without an `Origin` header (non-browser sentinels) pass through.
pub async fn require_allowed_origin(
    allowed: Arc<[String]>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let is_upgrade = req
        .headers()
        .get("upgrade")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"));
    if !is_upgrade {
        return Ok(next.run(req).await);
    }

    let origin = req.headers().get("origin").and_then(|v| v.to_str().ok());
    match origin {
        Some(origin) if !allowed.iter().any(|a| a == origin) => {
            tracing::warn!(%origin, "upgrade from disallowed origin rejected");
            Err(ApiError::OriginNotAllowed)
        }
        _ => Ok(next.run(req).await),
    }
}
