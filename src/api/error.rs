use axum::{
    extract::ws::rejection::WebSocketUpgradeRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Failures surfaced to a sentinel before its connection is established.
///
/// None of these touch the registry.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400 - The `X-Stack-ID` header is absent or blank.
    #[error("missing X-Stack-ID")]
    MissingStackId,
    /// 403 - The upgrade came from an origin outside the allow-list.
    #[error("origin not allowed")]
    OriginNotAllowed,
    /// Transport negotiation failed; answered by the upgrade mechanism itself.
    #[error("websocket upgrade failed: {0}")]
    Upgrade(WebSocketUpgradeRejection),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingStackId => StatusCode::BAD_REQUEST,
            ApiError::OriginNotAllowed => StatusCode::FORBIDDEN,
            ApiError::Upgrade(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Upgrade(rejection) => rejection.into_response(),
            other => (other.status_code(), other.to_string()).into_response(),
        }
    }
}
