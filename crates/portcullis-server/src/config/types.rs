//! Server configuration types.

use crate::middleware::rate_limit::{RateLimitConfig, RateLimitMode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

/// Main server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerBindConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server binding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerBindConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Wall-clock budget for one request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Largest accepted request body.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    /// Deployment environment name, reported by the health endpoint.
    #[serde(default = "default_env")]
    pub env: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    60
}

fn default_body_limit() -> usize {
    1024 * 1024
}

fn default_env() -> String {
    "development".to_string()
}

impl Default for ServerBindConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            body_limit_bytes: default_body_limit(),
            env: default_env(),
        }
    }
}

impl ServerBindConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub basic: BasicAuthConfig,
    /// Lifetime of an activation invitation.
    #[serde(default = "default_invitation_ttl")]
    pub invitation_ttl_secs: u64,
}

fn default_invitation_ttl() -> u64 {
    3 * 24 * 3600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: TokenConfig::default(),
            basic: BasicAuthConfig::default(),
            invitation_ttl_secs: default_invitation_ttl(),
        }
    }
}

/// Bearer token settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// HS256 signing secret.
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_token_ttl")]
    pub ttl_secs: u64,
}

fn default_issuer() -> String {
    "portcullis".to_string()
}

fn default_token_ttl() -> u64 {
    3 * 24 * 3600
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: default_issuer(),
            ttl_secs: default_token_ttl(),
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

/// Operator endpoint credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct BasicAuthConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for BasicAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_requests_per_window")]
    pub requests_per_window: u32,
    #[serde(default = "default_window")]
    pub window_secs: u64,
    /// Key clients by `X-Forwarded-For` / `X-Real-IP`. Only enable behind a
    /// proxy that overwrites those headers.
    #[serde(default)]
    pub trust_forwarded_headers: bool,
}

fn default_true() -> bool {
    true
}

fn default_requests_per_window() -> u32 {
    20
}

fn default_window() -> u64 {
    5
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_window: default_requests_per_window(),
            window_secs: default_window(),
            trust_forwarded_headers: false,
        }
    }
}

impl RateLimitSettings {
    pub fn mode(&self) -> RateLimitMode {
        if self.enabled {
            RateLimitMode::FixedWindow(RateLimitConfig::new(
                self.requests_per_window,
                Duration::from_secs(self.window_secs),
            ))
        } else {
            RateLimitMode::Disabled
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Redis connection URL. Without one the cache lives in process memory,
    /// and so do rate-limit windows.
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    /// Budget for a single cache call before it counts as a miss.
    #[serde(default = "default_op_timeout")]
    pub op_timeout_ms: u64,
    /// Capacity of the in-memory backend.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_op_timeout() -> u64 {
    200
}

fn default_max_entries() -> usize {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redis_url: None,
            ttl_secs: default_cache_ttl(),
            op_timeout_ms: default_op_timeout(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty`, `compact` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_mode() {
        let settings = RateLimitSettings::default();
        assert_eq!(
            settings.mode(),
            RateLimitMode::FixedWindow(RateLimitConfig::new(20, Duration::from_secs(5)))
        );

        let disabled = RateLimitSettings {
            enabled: false,
            ..settings
        };
        assert_eq!(disabled.mode(), RateLimitMode::Disabled);
    }

    #[test]
    fn test_defaults_match_serde_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.auth.invitation_ttl_secs, 3 * 24 * 3600);
        assert!(!config.rate_limit.trust_forwarded_headers);

        let parsed: AuthConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.invitation_ttl_secs, config.auth.invitation_ttl_secs);
    }

    #[test]
    fn test_socket_addr() {
        let bind = ServerBindConfig {
            host: "127.0.0.1".into(),
            port: 3000,
            ..ServerBindConfig::default()
        };
        assert_eq!(bind.socket_addr().unwrap().port(), 3000);

        let bad = ServerBindConfig {
            host: "not an ip".into(),
            ..ServerBindConfig::default()
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let token = TokenConfig {
            secret: "super-secret-signing-key".into(),
            ..TokenConfig::default()
        };
        let basic = BasicAuthConfig {
            username: "ops".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{token:?}").contains("super-secret"));
        assert!(!format!("{basic:?}").contains("hunter2"));
    }
}
