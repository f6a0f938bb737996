use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "beginner" => Some(Level::Beginner),
            "intermediate" => Some(Level::Intermediate),
            "advanced" => Some(Level::Advanced),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

/// A surf recommendation as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub headline: String,
    pub location: String,
    pub message: String,
    pub level: Level,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub created_by: Uuid,
    pub num_of_likes: i64,
    pub liked_by: Vec<Uuid>,
    pub saved_fav_by: Vec<Uuid>,
}

#[derive(Debug)]
pub struct NewPost {
    pub headline: String,
    pub location: String,
    pub message: String,
    pub level: Level,
    pub created_by: Uuid,
}

#[derive(Debug, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub headline: String,
    pub location: String,
    pub message: String,
    pub level: String,
    pub created_at: OffsetDateTime,
    pub created_by: Uuid,
    pub num_of_likes: i64,
    pub liked_by: Vec<Uuid>,
    pub saved_fav_by: Vec<Uuid>,
}

impl TryFrom<PostRow> for Post {
    type Error = StoreError;

    fn try_from(r: PostRow) -> Result<Self, Self::Error> {
        let level = Level::parse(&r.level)
            .ok_or_else(|| StoreError::Corrupt(format!("post {} has level {:?}", r.id, r.level)))?;
        Ok(Self {
            id: r.id,
            headline: r.headline,
            location: r.location,
            message: r.message,
            level,
            created_at: r.created_at,
            created_by: r.created_by,
            num_of_likes: r.num_of_likes,
            liked_by: r.liked_by,
            saved_fav_by: r.saved_fav_by,
        })
    }
}

/// Which membership set a toggle acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// `likedBy`, with the `numOfLikes` counter.
    Like,
    /// `savedFavBy`, no counter.
    Favorite,
}

impl Reaction {
    pub fn members(self, post: &Post) -> &[Uuid] {
        match self {
            Reaction::Like => &post.liked_by,
            Reaction::Favorite => &post.saved_fav_by,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Add,
    Remove,
}
