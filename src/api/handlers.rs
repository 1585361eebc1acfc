use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::session;

use super::error::ApiError;
use super::{AppState, STACK_ID_HEADER};

pub(super) async fn healthz() -> &'static str {
    "ok"
}

/// Extract a non-blank stack identifier from the request headers.
///
/// Values that are not valid UTF-8 are refused rather than decoded lossily,
/// so two distinct ids can never collapse onto one registry key.
fn stack_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(STACK_ID_HEADER)?;
    let id = std::str::from_utf8(value.as_bytes()).ok()?;
    if id.trim().is_empty() {
        None
    } else {
        Some(id.to_owned())
    }
}

/// Validate the stack id, promote the transport, and hand the socket to a
/// session loop. Returns as soon as the upgrade response is ready.
pub(super) async fn connect(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let stack_id = stack_id(&headers).ok_or(ApiError::MissingStackId)?;

    let ws = ws.map_err(|rejection| {
        tracing::warn!(stack_id = %stack_id, error = %rejection, "upgrade error");
        ApiError::Upgrade(rejection)
    })?;

    let registry = state.registry.clone();
    let failed_id = stack_id.clone();
    Ok(ws
        .on_failed_upgrade(move |error: axum::Error| {
            tracing::warn!(stack_id = %failed_id, %error, "upgrade error");
        })
        .on_upgrade(move |socket| session::serve(socket, stack_id, registry))
        .into_response())
}
