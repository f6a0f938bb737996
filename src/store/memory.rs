use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{IdentityStore, PostStore, Readiness, StoreError};
use crate::auth::repo_types::{NewUser, User};
use crate::posts::listing::{PostQuery, PostScope};
use crate::posts::repo_types::{Membership, NewPost, Post, Reaction};

/// In-process store with the same semantics as `PgStore`.
///
/// Clones share state, so a test can keep a handle to flip readiness or
/// inject failures after the app has taken its own copy.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    users: RwLock<Vec<User>>,
    posts: RwLock<HashMap<Uuid, Post>>,
    ready: AtomicBool,
    failing: AtomicBool,
    posts_failing: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                users: RwLock::new(Vec::new()),
                posts: RwLock::new(HashMap::new()),
                ready: AtomicBool::new(true),
                failing: AtomicBool::new(false),
                posts_failing: AtomicBool::new(false),
            }),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.inner.ready.store(ready, Ordering::SeqCst);
    }

    /// While set, every operation fails with `StoreError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Like `set_failing`, but only post operations fail. Token lookups keep
    /// working, so authenticated routes reach their own store calls.
    pub fn set_posts_failing(&self, failing: bool) {
        self.inner.posts_failing.store(failing, Ordering::SeqCst);
    }

    /// Inserts a fully-formed post, keeping its id and timestamps.
    pub async fn insert_post(&self, post: Post) {
        self.inner.posts.write().await.insert(post.id, post);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is failing".into()));
        }
        Ok(())
    }

    fn check_posts(&self) -> Result<(), StoreError> {
        self.check()?;
        if self.inner.posts_failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("post collection is failing".into()));
        }
        Ok(())
    }
}

impl Readiness for MemoryStore {
    fn ready(&self) -> bool {
        self.inner.ready.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.check()?;
        let mut users = self.inner.users.write().await;
        if users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(format!(
                "username {:?} already exists",
                user.username
            )));
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(format!(
                "email {:?} already exists",
                user.email
            )));
        }
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            access_token: user.access_token,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        let users = self.inner.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        let users = self.inner.users.read().await;
        Ok(users.iter().find(|u| u.access_token == token).cloned())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        self.check_posts()?;
        let created = Post {
            id: Uuid::new_v4(),
            headline: post.headline,
            location: post.location,
            message: post.message,
            level: post.level,
            created_at: OffsetDateTime::now_utc(),
            created_by: post.created_by,
            num_of_likes: 0,
            liked_by: Vec::new(),
            saved_fav_by: Vec::new(),
        };
        self.inner
            .posts
            .write()
            .await
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_posts(&self, query: &PostQuery) -> Result<Vec<Post>, StoreError> {
        self.check_posts()?;
        let posts = self.inner.posts.read().await;
        let mut matching: Vec<Post> = posts
            .values()
            .filter(|p| match query.scope {
                PostScope::All => true,
                PostScope::CreatedBy(owner) => p.created_by == owner,
                PostScope::FavoritedBy(user) => p.saved_fav_by.contains(&user),
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| query.sort.compare(a, b));
        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(skip).take(limit).collect())
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        self.check_posts()?;
        Ok(self.inner.posts.read().await.get(&id).cloned())
    }

    async fn update_message(
        &self,
        id: Uuid,
        owner: Uuid,
        message: &str,
    ) -> Result<Option<Post>, StoreError> {
        self.check_posts()?;
        let mut posts = self.inner.posts.write().await;
        match posts.get_mut(&id) {
            Some(post) if post.created_by == owner => {
                post.message = message.to_string();
                Ok(Some(post.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_post(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        self.check_posts()?;
        let mut posts = self.inner.posts.write().await;
        match posts.get(&id) {
            Some(post) if post.created_by == owner => {
                posts.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn apply_reaction(
        &self,
        id: Uuid,
        user: Uuid,
        reaction: Reaction,
        change: Membership,
    ) -> Result<bool, StoreError> {
        self.check_posts()?;
        let mut posts = self.inner.posts.write().await;
        let Some(post) = posts.get_mut(&id) else {
            return Ok(false);
        };
        let set = match reaction {
            Reaction::Like => &mut post.liked_by,
            Reaction::Favorite => &mut post.saved_fav_by,
        };
        match change {
            Membership::Add => {
                if !set.contains(&user) {
                    set.push(user);
                }
            }
            Membership::Remove => set.retain(|u| *u != user),
        }
        if reaction == Reaction::Like {
            post.num_of_likes += match change {
                Membership::Add => 1,
                Membership::Remove => -1,
            };
        }
        debug!(post_id = %id, user_id = %user, ?reaction, ?change, "reaction applied");
        Ok(true)
    }
}
