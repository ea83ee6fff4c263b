//! Authorization: roles, route policies, resource context and the
//! ownership-first decision layer.

pub mod audit;
pub mod context;
pub mod layer;
pub mod resource;
pub mod types;

pub use audit::{log_authz, AuthzAuditEvent};
pub use context::{load_post_context, PostContext};
pub use layer::{AuthzLayer, AuthzMiddleware};
pub use resource::{Decision, Owned, OwnershipFact};
pub use types::{AccessPolicy, Role};
