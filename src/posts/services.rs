use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    error::ApiError,
    posts::{
        dto::{CreatePostRequest, UpdatePostRequest},
        repo_types::{Level, Membership, NewPost, Post, Reaction},
    },
    state::AppState,
};

const NOT_FOUND_FOR_USER: &str = "No post with this id found for this user";

/// "cOOL spot" -> "Cool spot".
pub fn capitalize(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    Ok(())
}

pub async fn create_post(
    state: &AppState,
    author: &User,
    req: CreatePostRequest,
) -> Result<Post, ApiError> {
    require("headline", &req.headline)?;
    require("location", &req.location)?;
    require("message", &req.message)?;
    let level = req
        .level
        .as_deref()
        .and_then(Level::parse)
        .ok_or_else(|| {
            ApiError::bad_request("level must be one of beginner, intermediate, advanced")
        })?;

    let post = state
        .posts
        .create_post(NewPost {
            headline: capitalize(&req.headline),
            location: capitalize(&req.location),
            message: req.message,
            level,
            created_by: author.id,
        })
        .await
        .map_err(ApiError::store_rejected)?;

    info!(post_id = %post.id, user_id = %author.id, "post created");
    Ok(post)
}

/// Owner-only. Someone else's post and a missing post both give 404.
pub async fn update_message(
    state: &AppState,
    raw_id: &str,
    owner: &User,
    req: UpdatePostRequest,
) -> Result<Post, ApiError> {
    let Ok(id) = Uuid::parse_str(raw_id) else {
        return Err(ApiError::not_found(NOT_FOUND_FOR_USER));
    };
    require("message", &req.message)?;

    match state.posts.update_message(id, owner.id, &req.message).await {
        Ok(Some(post)) => {
            info!(post_id = %id, user_id = %owner.id, "post updated");
            Ok(post)
        }
        Ok(None) => {
            warn!(post_id = %id, user_id = %owner.id, "update target missing or not owned");
            Err(ApiError::not_found(NOT_FOUND_FOR_USER))
        }
        Err(e) => Err(ApiError::store_failed(e)),
    }
}

/// Owner-only, same 404 conflation as [`update_message`].
pub async fn delete_post(state: &AppState, raw_id: &str, owner: &User) -> Result<String, ApiError> {
    let Ok(id) = Uuid::parse_str(raw_id) else {
        return Err(ApiError::not_found(NOT_FOUND_FOR_USER));
    };

    match state.posts.delete_post(id, owner.id).await {
        Ok(true) => {
            info!(post_id = %id, user_id = %owner.id, "post deleted");
            Ok(format!("Post {id} has been deleted"))
        }
        Ok(false) => {
            warn!(post_id = %id, user_id = %owner.id, "delete target missing or not owned");
            Err(ApiError::not_found(NOT_FOUND_FOR_USER))
        }
        Err(e) => Err(ApiError::store_failed(e)),
    }
}

/// Flips the caller's membership in the like or favorite set.
///
/// Read, then one conditional update, then re-read. The read and the update
/// are separate store calls, so two concurrent toggles by the same user can
/// both see "absent" and both add: the set stays deduplicated but the like
/// counter ends up one ahead.
pub async fn toggle_reaction(
    state: &AppState,
    raw_id: &str,
    user: &User,
    reaction: Reaction,
) -> Result<Post, ApiError> {
    let missing = || ApiError::bad_request(format!("No post found with id {raw_id}"));
    let id = Uuid::parse_str(raw_id).map_err(|_| missing())?;

    let post = state
        .posts
        .find_post(id)
        .await
        .map_err(ApiError::store_rejected)?
        .ok_or_else(missing)?;

    let change = if reaction.members(&post).contains(&user.id) {
        Membership::Remove
    } else {
        Membership::Add
    };

    let applied = state
        .posts
        .apply_reaction(id, user.id, reaction, change)
        .await
        .map_err(ApiError::store_rejected)?;
    if !applied {
        return Err(missing());
    }
    debug!(post_id = %id, user_id = %user.id, ?reaction, ?change, "reaction toggled");

    state
        .posts
        .find_post(id)
        .await
        .map_err(ApiError::store_rejected)?
        .ok_or_else(missing)
}
