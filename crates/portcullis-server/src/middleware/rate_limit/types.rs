//! Rate limiting types.

use std::time::{Duration, Instant};

/// Fixed-window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests admitted per window.
    pub limit: u32,
    /// Window length.
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

/// Limiter mode chosen at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitMode {
    /// Admit everything and emit no rate-limit headers.
    Disabled,
    FixedWindow(RateLimitConfig),
}

/// Per-key counter for the current window.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub count: u32,
    pub started_at: Instant,
}

impl Window {
    pub fn new(now: Instant) -> Self {
        Self {
            count: 0,
            started_at: now,
        }
    }

    /// Reset if the window has elapsed, then try to take one slot.
    pub fn admit(&mut self, config: &RateLimitConfig, now: Instant) -> Admission {
        if now.duration_since(self.started_at) >= config.window {
            self.started_at = now;
            self.count = 0;
        }

        if self.count < config.limit {
            self.count += 1;
            Admission::allowed(config.limit, config.limit - self.count)
        } else {
            let elapsed = now.duration_since(self.started_at);
            Admission::rejected(config.limit, config.window.saturating_sub(elapsed))
        }
    }
}

/// Result of a limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the window resets; set only on rejection.
    pub retry_after: Option<Duration>,
}

impl Admission {
    pub fn allowed(limit: u32, remaining: u32) -> Self {
        Self {
            allowed: true,
            limit,
            remaining,
            retry_after: None,
        }
    }

    pub fn rejected(limit: u32, retry_after: Duration) -> Self {
        Self {
            allowed: false,
            limit,
            remaining: 0,
            retry_after: Some(retry_after),
        }
    }

    /// `Retry-After` value in whole seconds, rounded up.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after
            .map(|d| d.as_secs() + u64::from(d.subsec_nanos() > 0))
    }
}
