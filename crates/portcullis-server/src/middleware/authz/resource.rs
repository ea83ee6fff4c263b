//! Resource-level authorization decisions.

use super::types::AccessPolicy;
use crate::{middleware::auth::AuthUser, store::Post};

/// Owning subject of the resource a request targets. Inserted into request
/// extensions by a resource-context loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipFact {
    pub owner_id: i64,
}

/// Entities with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> i64;

    fn ownership(&self) -> OwnershipFact {
        OwnershipFact {
            owner_id: self.owner_id(),
        }
    }
}

impl Owned for Post {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// Outcome of evaluating a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Policy did not require a resource check.
    Authenticated,
    /// Caller owns the resource.
    Owner,
    /// Caller's role meets the route minimum.
    Role,
    Denied,
}

impl Decision {
    pub fn is_granted(&self) -> bool {
        !matches!(self, Self::Denied)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::Owner => "owner",
            Self::Role => "role",
            Self::Denied => "denied",
        }
    }
}

impl AccessPolicy {
    /// Evaluate the policy. Ownership is checked before role.
    ///
    /// A resource policy without a fact is denied.
    pub fn decide(&self, user: &AuthUser, fact: Option<OwnershipFact>) -> Decision {
        if !self.needs_resource() {
            return Decision::Authenticated;
        }
        let Some(fact) = fact else {
            return Decision::Denied;
        };

        if fact.owner_id == user.id {
            return Decision::Owner;
        }
        match self {
            Self::OwnerOr(minimum) if user.role >= *minimum => Decision::Role,
            _ => Decision::Denied,
        }
    }
}
