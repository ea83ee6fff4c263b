//! Request-admission middleware for the Portcullis API server.

pub mod auth;
pub mod authz;
pub mod rate_limit;

pub use auth::{Auth, AuthLayer, AuthMiddleware, AuthUser, BasicAuthLayer};
pub use authz::{
    load_post_context, AccessPolicy, AuthzLayer, AuthzMiddleware, OwnershipFact, PostContext, Role,
};
pub use rate_limit::{RateLimitLayer, RateLimitMiddleware, RateLimiter};
