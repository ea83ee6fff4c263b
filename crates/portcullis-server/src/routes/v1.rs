//! API v1 routes.

use super::internal;
use crate::handlers::{auth, posts, users};
use crate::middleware::{load_post_context, AccessPolicy, AuthLayer, AuthzLayer, Role};
use crate::state::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
    Router,
};

/// Create the v1 API router.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/authentication", authentication_routes())
        .nest("/users", user_routes(state.clone()))
        .nest("/posts", post_routes(state.clone()))
        .merge(internal::router(state))
}

fn authentication_routes() -> Router<AppState> {
    Router::new()
        .route("/user", post(auth::register_user))
        .route("/token", post(auth::create_token))
}

fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:id", get(users::get_user).route_layer(AuthLayer::new(state)))
        .route("/activate/:token", put(users::activate_user))
}

/// Layers run outside in: bearer authentication, then the post is loaded
/// (404 when absent), then the method's access policy is enforced.
fn post_routes(state: AppState) -> Router<AppState> {
    let metrics = state.metrics.clone();
    let authz = |policy| AuthzLayer::new(policy, metrics.clone());

    let by_id = get(posts::get_post)
        .route_layer(authz(AccessPolicy::Authenticated))
        .merge(patch(posts::update_post).route_layer(authz(AccessPolicy::OwnerOr(Role::Moderator))))
        .merge(delete(posts::delete_post).route_layer(authz(AccessPolicy::OwnerOr(Role::Admin))));

    Router::new()
        .route("/:id", by_id)
        .route_layer(from_fn_with_state(state.clone(), load_post_context))
        .route("/", post(posts::create_post))
        .route_layer(AuthLayer::new(state))
}
