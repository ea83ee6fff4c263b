//! Prometheus counters for admission decisions.

use crate::middleware::auth::AuthFailure;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Admission-layer counters, each registered on a private registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    rate_limited: IntCounter,
    auth_failures: IntCounterVec,
    authz_decisions: IntCounterVec,
    cache_lookups: IntCounterVec,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let rate_limited = IntCounter::new(
            "portcullis_rate_limited_total",
            "Requests rejected by the rate limiter.",
        )?;
        let auth_failures = IntCounterVec::new(
            Opts::new(
                "portcullis_auth_failures_total",
                "Authentication failures partitioned by reason.",
            ),
            &["reason"],
        )?;
        let authz_decisions = IntCounterVec::new(
            Opts::new(
                "portcullis_authz_decisions_total",
                "Authorization decisions partitioned by outcome.",
            ),
            &["outcome"],
        )?;
        let cache_lookups = IntCounterVec::new(
            Opts::new(
                "portcullis_cache_lookups_total",
                "Entity cache lookups partitioned by outcome.",
            ),
            &["outcome"],
        )?;

        registry.register(Box::new(rate_limited.clone()))?;
        registry.register(Box::new(auth_failures.clone()))?;
        registry.register(Box::new(authz_decisions.clone()))?;
        registry.register(Box::new(cache_lookups.clone()))?;

        Ok(Self {
            registry,
            rate_limited,
            auth_failures,
            authz_decisions,
            cache_lookups,
        })
    }

    pub fn rate_limited(&self) {
        self.rate_limited.inc();
    }

    pub fn auth_failure(&self, reason: AuthFailure) {
        self.auth_failures.with_label_values(&[reason.as_str()]).inc();
    }

    pub fn authz_decision(&self, outcome: &str) {
        self.authz_decisions.with_label_values(&[outcome]).inc();
    }

    pub fn cache_lookup(&self, hit: bool) {
        let outcome = if hit { "hit" } else { "miss" };
        self.cache_lookups.with_label_values(&[outcome]).inc();
    }

    /// Render every counter in the Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
