//! User activation and lookup.

use super::auth::activation_digest;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::Auth;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::store::User;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

/// `PUT /v1/users/activate/:token`
///
/// The user's cache entry is dropped before the response goes out, so the
/// next lookup sees the account as active.
pub async fn activate_user(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<StatusCode> {
    let user = state
        .store
        .activate_user(&activation_digest(&token), Utc::now())
        .await?;
    state.invalidate_user(user.id).await;

    info!(user_id = user.id, "user activated");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v1/users/:id`
pub async fn get_user(
    State(state): State<AppState>,
    Auth(_caller): Auth,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let Path(id) = path.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let user = state.user_by_id(id).await?;
    Ok(Json(ApiResponse::success(user)))
}
