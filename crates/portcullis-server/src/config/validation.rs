//! Configuration validation.

use super::types::ServerConfig;
use portcullis_common_log::LogLevel;
use thiserror::Error;

/// Minimum HS256 secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Upper bound for every configured lifetime (ten years).
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("auth.token.secret must be at least 32 bytes")]
    WeakTokenSecret,

    #[error("auth.token.issuer must not be empty")]
    MissingIssuer,

    #[error("auth.token.ttl_secs must be between 1 and 315360000")]
    InvalidTokenTtl,

    #[error("auth.invitation_ttl_secs must be between 1 and 315360000")]
    InvalidInvitationTtl,

    #[error("auth.basic username and password must both be set")]
    MissingBasicCredentials,

    #[error("rate_limit requires requests_per_window > 0 and window_secs > 0 when enabled")]
    InvalidRateLimit,

    #[error("cache.ttl_secs must be between 1 and 315360000 and cache.op_timeout_ms above zero when enabled")]
    InvalidCache,

    #[error("server.request_timeout_secs must be greater than zero")]
    InvalidRequestTimeout,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}

/// Validate server configuration, collecting every problem.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let token = &config.auth.token;

    if token.secret.len() < MIN_SECRET_LEN {
        errors.push(ConfigError::WeakTokenSecret);
    }
    if token.issuer.trim().is_empty() {
        errors.push(ConfigError::MissingIssuer);
    }
    if !ttl_in_range(token.ttl_secs) {
        errors.push(ConfigError::InvalidTokenTtl);
    }
    if !ttl_in_range(config.auth.invitation_ttl_secs) {
        errors.push(ConfigError::InvalidInvitationTtl);
    }

    let basic = &config.auth.basic;
    if basic.username.is_empty() || basic.password.is_empty() {
        errors.push(ConfigError::MissingBasicCredentials);
    }

    let limiter = &config.rate_limit;
    if limiter.enabled && (limiter.requests_per_window == 0 || limiter.window_secs == 0) {
        errors.push(ConfigError::InvalidRateLimit);
    }

    let cache = &config.cache;
    if cache.enabled && (!ttl_in_range(cache.ttl_secs) || cache.op_timeout_ms == 0) {
        errors.push(ConfigError::InvalidCache);
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ConfigError::InvalidRequestTimeout);
    }

    if config.server.socket_addr().is_err() {
        errors.push(ConfigError::InvalidBindAddress(format!(
            "{}:{}",
            config.server.host, config.server.port
        )));
    }

    if LogLevel::parse(&config.logging.level).is_none() {
        errors.push(ConfigError::InvalidLogLevel(config.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn ttl_in_range(secs: u64) -> bool {
    (1..=MAX_TTL_SECS).contains(&secs)
}
