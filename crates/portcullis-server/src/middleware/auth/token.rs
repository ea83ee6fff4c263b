//! Bearer token issuance and verification (HS256).
//!
//! Both operations take `now` explicitly so expiry is testable without
//! sleeping. Timestamps carry whole seconds: `issue` truncates `now`, and
//! `verify` treats a token as expired once `now` reaches the second stored
//! in `exp`.

use super::types::{AuthFailure, Claims};
use crate::config::TokenConfig;
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    crypto, decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use thiserror::Error;

/// Token verification errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token issuer does not match")]
    InvalidIssuer,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for AuthFailure {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSignature => AuthFailure::InvalidSignature,
            TokenError::Expired => AuthFailure::Expired,
            TokenError::InvalidIssuer => AuthFailure::InvalidIssuer,
            TokenError::Malformed | TokenError::Signing(_) => AuthFailure::Malformed,
        }
    }
}

/// Issues and verifies signed, time-bounded bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl_secs: i64,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl_secs: u64) -> Self {
        let issuer = issuer.into();

        // Expiry is checked against the caller's clock, not jsonwebtoken's.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.set_issuer(&[issuer.as_str()]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer,
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
            validation,
        }
    }

    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(config.secret.as_bytes(), &config.issuer, config.ttl_secs)
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Sign a token for `subject`, valid from `now` for the configured TTL.
    pub fn issue(&self, subject: i64, now: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            iat,
            exp: iat.saturating_add(self.ttl_secs),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Check signature, issuer and expiry, returning the subject id.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<i64, TokenError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };

        // Raw segments are authenticated before anything is decoded.
        let message = &token[..header.len() + 1 + payload.len()];
        match crypto::verify(signature, message.as_bytes(), &self.decoding, Algorithm::HS256) {
            Ok(true) => {}
            Ok(false) | Err(_) => return Err(TokenError::InvalidSignature),
        }

        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        claims.sub.parse::<i64>().map_err(|_| TokenError::Malformed)
    }
}
