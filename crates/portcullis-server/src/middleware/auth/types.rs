//! Authentication types.

use crate::middleware::authz::Role;
use crate::store::User;
use serde::{Deserialize, Serialize};

/// Bearer token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID, decimal string).
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiration (unix seconds).
    pub exp: i64,
}

/// Why a request failed authentication.
///
/// Only ever logged and counted; the client sees a uniform 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFailure {
    MissingToken,
    Malformed,
    InvalidSignature,
    Expired,
    InvalidIssuer,
    /// Token was valid but its subject is gone or inactive.
    UnknownSubject,
    /// Login with an unknown email or wrong password.
    BadCredentials,
    /// Operator endpoint credentials missing or wrong.
    BasicAuth,
}

impl AuthFailure {
    /// Stable tag used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::Malformed => "malformed_token",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired_token",
            Self::InvalidIssuer => "invalid_issuer",
            Self::UnknownSubject => "unknown_subject",
            Self::BadCredentials => "bad_credentials",
            Self::BasicAuth => "basic_auth",
        }
    }
}

/// Verified caller, stored in request extensions by [`super::AuthLayer`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
    pub profile: User,
}

impl AuthUser {
    pub fn from_profile(profile: User) -> Self {
        Self {
            id: profile.id,
            role: profile.role,
            profile,
        }
    }
}
