//! Standard API response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success envelope mirroring the error body shape.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub meta: ResponseMeta,
}

/// Response metadata.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    /// Response timestamp (RFC 3339).
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// Wrap `data` in a successful envelope.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: ResponseMeta::now(),
        }
    }
}

impl ResponseMeta {
    /// Create metadata with current timestamp.
    pub fn now() -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// `201 Created` with an enveloped body.
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(ApiResponse::success(self.0))).into_response()
    }
}
