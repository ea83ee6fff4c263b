//! Authorization audit logging.

use super::resource::{Decision, OwnershipFact};
use super::types::{AccessPolicy, Role};
use crate::middleware::auth::AuthUser;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// One authorization decision.
#[derive(Debug, Serialize)]
pub struct AuthzAuditEvent {
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub role: Role,
    pub policy: String,
    pub method: String,
    pub path: String,
    pub resource_owner: Option<i64>,
    pub granted: bool,
    pub reason: &'static str,
}

impl AuthzAuditEvent {
    pub fn new(
        user: &AuthUser,
        policy: AccessPolicy,
        method: &str,
        path: &str,
        fact: Option<OwnershipFact>,
        decision: Decision,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: user.id,
            role: user.role,
            policy: policy.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            resource_owner: fact.map(|f| f.owner_id),
            granted: decision.is_granted(),
            reason: decision.as_str(),
        }
    }

    pub fn log(&self) {
        let kind = if self.granted { "authz_granted" } else { "authz_denied" };
        info!(
            event = kind,
            user_id = self.user_id,
            role = %self.role,
            policy = %self.policy,
            method = %self.method,
            path = %self.path,
            resource_owner = ?self.resource_owner,
            reason = self.reason,
            "authorization decision"
        );
    }
}

/// Log an authorization decision.
pub fn log_authz(
    user: &AuthUser,
    policy: AccessPolicy,
    method: &str,
    path: &str,
    fact: Option<OwnershipFact>,
    decision: Decision,
) {
    AuthzAuditEvent::new(user, policy, method, path, fact, decision).log();
}
