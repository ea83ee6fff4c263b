//! System-of-record collaborator.
//!
//! The admission layer only needs a handful of lookups and mutations, so the
//! boundary is one object-safe trait. [`MemoryStore`] is the in-process
//! implementation used by the binary and the test suite.

pub mod memory;
pub mod models;

pub use memory::MemoryStore;
pub use models::{NewPost, NewUser, Password, Post, PostChanges, User};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched. Carries the entity name.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness constraint was violated.
    #[error("duplicate {0}")]
    Duplicate(String),

    /// Transport or backend failure.
    #[error("storage backend error")]
    Backend(#[source] anyhow::Error),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Entity storage used by handlers and the resource-context loader.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn find_user_by_id(&self, id: i64) -> StoreResult<User>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<User>;

    /// Insert an inactive user together with an invitation keyed by
    /// `token_hash`, atomically.
    async fn create_user_and_invite(
        &self,
        user: NewUser,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<User>;

    /// Consume an unexpired invitation and mark its user active.
    async fn activate_user(&self, token_hash: &str, now: DateTime<Utc>) -> StoreResult<User>;

    async fn find_post_by_id(&self, id: i64) -> StoreResult<Post>;

    async fn create_post(&self, post: NewPost) -> StoreResult<Post>;

    async fn update_post(&self, id: i64, changes: PostChanges) -> StoreResult<Post>;

    async fn delete_post(&self, id: i64) -> StoreResult<()>;
}
