//! Storage seams. Handlers only ever see these traits; `PgStore` backs them
//! in production and `MemoryStore` in tests and local runs.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::posts::listing::PostQuery;
use crate::posts::repo_types::{Membership, NewPost, Post, Reaction};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    Duplicate(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return StoreError::Duplicate(db.message().to_string());
            }
        }
        StoreError::Database(e)
    }
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    /// Exact match on the stored access token.
    async fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError>;
    /// Sorted, then windowed: `skip`/`limit` apply to the scope-matching set.
    async fn find_posts(&self, query: &PostQuery) -> Result<Vec<Post>, StoreError>;
    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError>;
    /// Updates only when both `id` and `owner` match; `None` otherwise.
    async fn update_message(
        &self,
        id: Uuid,
        owner: Uuid,
        message: &str,
    ) -> Result<Option<Post>, StoreError>;
    /// Returns whether a post with that `id` and `owner` was removed.
    async fn delete_post(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError>;
    /// One conditional update: set add/remove plus the like counter delta.
    /// Adding an already-present member leaves the set unchanged but still
    /// applies the counter delta. Returns whether the post exists.
    async fn apply_reaction(
        &self,
        id: Uuid,
        user: Uuid,
        reaction: Reaction,
        change: Membership,
    ) -> Result<bool, StoreError>;
}

pub trait Readiness: Send + Sync {
    fn ready(&self) -> bool;
}
