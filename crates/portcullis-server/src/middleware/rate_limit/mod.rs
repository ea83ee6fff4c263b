//! Fixed-window rate limiting.

pub mod layer;
pub mod limiter;
pub mod store;
pub mod types;

pub use layer::{client_key, RateLimitLayer, RateLimitMiddleware};
pub use limiter::RateLimiter;
pub use store::{InMemoryStore, RateLimitError, RateLimitStore, RedisStore};
pub use types::{Admission, RateLimitConfig, RateLimitMode, Window};
