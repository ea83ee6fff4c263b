//! Post handlers. Loading and authorization happen in the route layers.

use crate::error::ApiResult;
use crate::middleware::auth::Auth;
use crate::middleware::authz::PostContext;
use crate::request::{CreatePostRequest, UpdatePostRequest, ValidatedJson};
use crate::response::{ApiResponse, Created};
use crate::state::AppState;
use crate::store::{NewPost, Post, PostChanges};
use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

/// `POST /v1/posts`
pub async fn create_post(
    State(state): State<AppState>,
    Auth(caller): Auth,
    ValidatedJson(payload): ValidatedJson<CreatePostRequest>,
) -> ApiResult<Created<Post>> {
    let post = state
        .store
        .create_post(NewPost {
            user_id: caller.id,
            title: payload.title,
            content: payload.content,
            tags: payload.tags,
        })
        .await?;

    info!(post_id = post.id, user_id = caller.id, "post created");
    Ok(Created(post))
}

/// `GET /v1/posts/:id`
pub async fn get_post(PostContext(post): PostContext) -> Json<ApiResponse<Post>> {
    Json(ApiResponse::success(post))
}

/// `PATCH /v1/posts/:id`
pub async fn update_post(
    State(state): State<AppState>,
    PostContext(post): PostContext,
    ValidatedJson(payload): ValidatedJson<UpdatePostRequest>,
) -> ApiResult<Json<ApiResponse<Post>>> {
    let updated = state
        .store
        .update_post(
            post.id,
            PostChanges {
                title: payload.title,
                content: payload.content,
                tags: payload.tags,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// `DELETE /v1/posts/:id`
pub async fn delete_post(
    State(state): State<AppState>,
    PostContext(post): PostContext,
) -> ApiResult<StatusCode> {
    state.store.delete_post(post.id).await?;
    info!(post_id = post.id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}
