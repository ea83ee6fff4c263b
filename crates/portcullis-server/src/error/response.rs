//! Error response implementation.

use super::types::ApiError;
use crate::middleware::auth::AuthFailure;
use crate::store::StoreError;
use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, error, warn};

/// Challenge sent with basic-auth rejections.
pub const BASIC_CHALLENGE: &str = r#"Basic realm="restricted", charset="UTF-8""#;

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<HashMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(err) => {
                error!(error = %format!("{err:#}"), code = self.error_code(), "server error");
            }
            ApiError::Unauthorized(reason) => {
                warn!(reason = reason.as_str(), "authentication failed");
            }
            ApiError::Forbidden => warn!("authorization denied"),
            other => debug!(error = %other, code = other.error_code(), "request rejected"),
        }

        let status = self.status_code();
        let code = self.error_code();

        let (message, fields, retry_after) = match &self {
            ApiError::ValidationError(field_errors) => {
                (self.to_string(), Some(field_errors.clone()), None)
            }
            ApiError::RateLimited { retry_after } => (self.to_string(), None, Some(*retry_after)),
            ApiError::Internal(_) => ("An internal error occurred".to_string(), None, None),
            _ => (self.to_string(), None, None),
        };

        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code,
                message,
                fields,
                retry_after,
            },
        };

        let mut response = (status, Json(body)).into_response();

        match self {
            ApiError::RateLimited { retry_after } => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            }
            ApiError::Unauthorized(AuthFailure::BasicAuth) => {
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(BASIC_CHALLENGE),
                );
            }
            _ => {}
        }

        response
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => ApiError::NotFound(entity.to_string()),
            StoreError::Duplicate(what) => ApiError::Conflict(what),
            StoreError::Backend(inner) => ApiError::Internal(inner),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        ApiError::ValidationError(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited { retry_after: 5 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "5");

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["retry_after"], 5);
    }

    #[tokio::test]
    async fn test_basic_auth_rejection_carries_challenge() {
        let response = ApiError::Unauthorized(AuthFailure::BasicAuth).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], BASIC_CHALLENGE);
    }

    #[tokio::test]
    async fn test_bearer_rejection_has_no_challenge() {
        let response = ApiError::Unauthorized(AuthFailure::Expired).into_response();
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "unauthorized");
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let response = ApiError::Internal(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            ApiError::from(StoreError::NotFound("post")),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::Duplicate("email".into())),
            ApiError::Conflict(_)
        ));
    }
}
