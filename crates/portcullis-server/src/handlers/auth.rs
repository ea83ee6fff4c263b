//! Registration and login.

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::{hash_password, verify_against_decoy, verify_password, AuthFailure};
use crate::request::{CreateTokenRequest, RegisterUserRequest, ValidatedJson};
use crate::response::{ApiResponse, Created};
use crate::state::AppState;
use crate::store::{NewUser, StoreError, User};
use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

/// Registered user plus the plaintext activation token.
#[derive(Debug, Serialize)]
pub struct UserWithToken {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Storage keeps only the SHA-256 digest of an activation token.
pub fn activation_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// When an invitation issued at `now` stops being redeemable. `None` if the
/// lifetime does not fit the calendar.
pub fn invitation_expiry(now: DateTime<Utc>, ttl_secs: u64) -> Option<DateTime<Utc>> {
    let ttl = Duration::from_std(std::time::Duration::from_secs(ttl_secs)).ok()?;
    now.checked_add_signed(ttl)
}

/// `POST /v1/authentication/user`
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterUserRequest>,
) -> ApiResult<Created<UserWithToken>> {
    let password = hash_password(&payload.password).map_err(anyhow::Error::from)?;
    let token = Uuid::new_v4().to_string();
    let expires_at = invitation_expiry(Utc::now(), state.config.auth.invitation_ttl_secs)
        .ok_or_else(|| anyhow::anyhow!("invitation lifetime out of range"))?;

    let user = state
        .store
        .create_user_and_invite(
            NewUser {
                username: payload.username,
                email: payload.email,
                password,
            },
            activation_digest(&token),
            expires_at,
        )
        .await?;

    info!(user_id = user.id, "user registered, awaiting activation");
    Ok(Created(UserWithToken { user, token }))
}

/// `POST /v1/authentication/token`
pub async fn create_token(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateTokenRequest>,
) -> ApiResult<Json<ApiResponse<TokenResponse>>> {
    let reject = || {
        state.metrics.auth_failure(AuthFailure::BadCredentials);
        ApiError::Unauthorized(AuthFailure::BadCredentials)
    };

    let user = match state.store.find_user_by_email(&payload.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => {
            verify_against_decoy(&payload.password);
            return Err(reject());
        }
        Err(err) => return Err(err.into()),
    };

    // Verify before looking at the activation flag so both rejections cost
    // one hash.
    let password_ok = verify_password(&payload.password, &user.password);
    if !password_ok || !user.is_active {
        return Err(reject());
    }

    let token = state
        .tokens
        .issue(user.id, Utc::now())
        .map_err(anyhow::Error::from)?;

    info!(user_id = user.id, "token issued");
    Ok(Json(ApiResponse::success(TokenResponse {
        token,
        token_type: "Bearer",
        expires_in: state.tokens.ttl_secs(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_digest_is_stable_hex() {
        let digest = activation_digest("abc");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, activation_digest("abc"));
        assert_ne!(digest, activation_digest("abd"));
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_invitation_expiry() {
        let now = Utc::now();
        assert_eq!(invitation_expiry(now, 60), Some(now + Duration::seconds(60)));
        assert_eq!(invitation_expiry(now, u64::MAX), None);
        assert_eq!(invitation_expiry(now, i64::MAX as u64), None);
    }
}
