//! Resource-context loading for `/posts/:id` routes.

use super::resource::Owned;
use crate::{error::ApiError, state::AppState, store::Post};
use axum::{
    async_trait,
    extract::{rejection::PathRejection, FromRequestParts, Path, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

/// The post a request targets, loaded before authorization.
#[derive(Debug, Clone)]
pub struct PostContext(pub Post);

/// Fetch the post named by the `:id` segment and attach it, with its
/// ownership fact, to the request. A missing post ends the request with 404
/// before any ownership decision is made.
pub async fn load_post_context(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Path(id) = path.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let post = state.store.find_post_by_id(id).await?;

    req.extensions_mut().insert(post.ownership());
    req.extensions_mut().insert(PostContext(post));
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for PostContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PostContext>()
            .cloned()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("post context was not loaded")))
    }
}
