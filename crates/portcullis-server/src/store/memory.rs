//! In-process storage.

use super::models::{NewPost, NewUser, Password, Post, PostChanges, User};
use super::{Storage, StoreError, StoreResult};
use crate::middleware::authz::Role;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone)]
struct Invitation {
    user_id: i64,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<i64, User>,
    posts: HashMap<i64, Post>,
    invitations: HashMap<String, Invitation>,
    next_user_id: i64,
    next_post_id: i64,
}

impl Tables {
    fn allocate_user_id(&mut self) -> i64 {
        self.next_user_id += 1;
        self.next_user_id
    }

    fn allocate_post_id(&mut self) -> i64 {
        self.next_post_id += 1;
        self.next_post_id
    }

    fn check_unique(&self, username: &str, email: &str) -> StoreResult<()> {
        for user in self.users.values() {
            if user.email.eq_ignore_ascii_case(email) {
                return Err(StoreError::Duplicate("email".into()));
            }
            if user.username == username {
                return Err(StoreError::Duplicate("username".into()));
            }
        }
        Ok(())
    }
}

/// `HashMap` tables behind one lock; each operation is a single critical
/// section, so multi-table writes are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an already-active user with the given role.
    pub fn seed_user(
        &self,
        username: &str,
        email: &str,
        password: Password,
        role: Role,
    ) -> StoreResult<User> {
        let mut tables = self.tables.write();
        tables.check_unique(username, email)?;
        let user = User {
            id: tables.allocate_user_id(),
            username: username.to_string(),
            email: email.to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
            password,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Make every subsequent call fail with a backend error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "memory store marked unavailable"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn find_user_by_id(&self, id: i64) -> StoreResult<User> {
        self.ensure_available()?;
        self.tables
            .read()
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("user"))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<User> {
        self.ensure_available()?;
        self.tables
            .read()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or(StoreError::NotFound("user"))
    }

    async fn create_user_and_invite(
        &self,
        user: NewUser,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<User> {
        self.ensure_available()?;
        let mut tables = self.tables.write();
        tables.check_unique(&user.username, &user.email)?;

        let created = User {
            id: tables.allocate_user_id(),
            username: user.username,
            email: user.email,
            role: Role::User,
            is_active: false,
            created_at: Utc::now(),
            password: user.password,
        };
        tables.invitations.insert(
            token_hash,
            Invitation {
                user_id: created.id,
                expires_at,
            },
        );
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn activate_user(&self, token_hash: &str, now: DateTime<Utc>) -> StoreResult<User> {
        self.ensure_available()?;
        let mut tables = self.tables.write();

        let invitation = match tables.invitations.get(token_hash) {
            Some(inv) if inv.expires_at > now => inv.clone(),
            _ => return Err(StoreError::NotFound("invitation")),
        };

        let user = tables
            .users
            .get_mut(&invitation.user_id)
            .ok_or(StoreError::NotFound("user"))?;
        user.is_active = true;
        let activated = user.clone();

        tables.invitations.retain(|_, inv| inv.user_id != invitation.user_id);
        Ok(activated)
    }

    async fn find_post_by_id(&self, id: i64) -> StoreResult<Post> {
        self.ensure_available()?;
        self.tables
            .read()
            .posts
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("post"))
    }

    async fn create_post(&self, post: NewPost) -> StoreResult<Post> {
        self.ensure_available()?;
        let mut tables = self.tables.write();
        let now = Utc::now();
        let created = Post {
            id: tables.allocate_post_id(),
            user_id: post.user_id,
            title: post.title,
            content: post.content,
            tags: post.tags,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> StoreResult<Post> {
        self.ensure_available()?;
        let mut tables = self.tables.write();
        let post = tables.posts.get_mut(&id).ok_or(StoreError::NotFound("post"))?;

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(tags) = changes.tags {
            post.tags = tags;
        }
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete_post(&self, id: i64) -> StoreResult<()> {
        self.ensure_available()?;
        self.tables
            .write()
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("post"))
    }
}
