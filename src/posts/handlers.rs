use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{delete, get, patch},
    Json, Router,
};
use tracing::{debug, error, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    posts::{
        dto::{CreatePostRequest, UpdatePostRequest},
        listing::{ListingParams, ListingPlan, PostScope},
        repo_types::{Post, Reaction},
        services,
    },
    response::{ApiResponse, ApiResult},
    state::AppState,
};

pub fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/surfposts", get(list_posts).post(create_post))
        .route("/mysurfposts", get(my_posts))
        .route("/myfavsurfposts", get(my_favorites))
}

/// Query strings the extractor cannot decode (repeated keys, bad encoding)
/// are treated like any other garbage input: every parameter takes its default.
fn lenient(query: Result<Query<ListingParams>, QueryRejection>) -> ListingParams {
    match query {
        Ok(Query(params)) => params,
        Err(e) => {
            debug!(error = %e.body_text(), "unreadable listing query, using defaults");
            ListingParams::default()
        }
    }
}

pub fn mutation_routes() -> Router<AppState> {
    Router::new()
        .route("/surfposts/:id/like", patch(toggle_like))
        .route("/surfposts/:id/addfav", patch(toggle_favorite))
        .route("/surfposts/:id/update", patch(update_post))
        .route("/surfposts/:id/delete", delete(delete_post))
}

/// Public feed. Empty pages are still a success.
#[instrument(skip(state, query))]
pub async fn list_posts(
    State(state): State<AppState>,
    query: Result<Query<ListingParams>, QueryRejection>,
) -> ApiResult<Vec<Post>> {
    let params = lenient(query);
    let plan = ListingPlan::new(PostScope::All, &params, &state.config.paging);
    let posts = plan.execute(state.posts.as_ref()).await.map_err(|e| {
        error!(error = %e, "list posts failed");
        ApiError::store_rejected(e)
    })?;
    Ok(ApiResponse::ok(posts))
}

#[instrument(skip(state, user, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> ApiResult<Post> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let post = services::create_post(&state, &user, payload).await?;
    Ok(ApiResponse::created(post))
}

/// Caller's own posts: page, size and sort; no post-window filters.
#[instrument(skip(state, user, query))]
pub async fn my_posts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<ListingParams>, QueryRejection>,
) -> ApiResult<Vec<Post>> {
    let params = ListingParams {
        level: None,
        location: None,
        ..lenient(query)
    };
    let plan = ListingPlan::new(PostScope::CreatedBy(user.id), &params, &state.config.paging);
    let posts = plan
        .execute(state.posts.as_ref())
        .await
        .map_err(ApiError::store_failed)?;
    if posts.is_empty() {
        return Err(ApiError::not_found("No posts found from this creator."));
    }
    Ok(ApiResponse::ok(posts))
}

/// Caller's favorites: page, size and location; default sort.
#[instrument(skip(state, user, query))]
pub async fn my_favorites(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<ListingParams>, QueryRejection>,
) -> ApiResult<Vec<Post>> {
    let params = ListingParams {
        sort: None,
        level: None,
        ..lenient(query)
    };
    let plan = ListingPlan::new(PostScope::FavoritedBy(user.id), &params, &state.config.paging);
    let posts = plan
        .execute(state.posts.as_ref())
        .await
        .map_err(ApiError::store_failed)?;
    if posts.is_empty() {
        return Err(ApiError::not_found("No favourites saved."));
    }
    Ok(ApiResponse::ok(posts))
}

#[instrument(skip(state, user))]
pub async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Post> {
    let post = services::toggle_reaction(&state, &id, &user, Reaction::Like).await?;
    Ok(ApiResponse::created(post))
}

#[instrument(skip(state, user))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Post> {
    let post = services::toggle_reaction(&state, &id, &user, Reaction::Favorite).await?;
    Ok(ApiResponse::created(post))
}

#[instrument(skip(state, user, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> ApiResult<Post> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let post = services::update_message(&state, &id, &user, payload).await?;
    Ok(ApiResponse::ok(post))
}

/// 200 with a text confirmation.
#[instrument(skip(state, user))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<String> {
    let confirmation = services::delete_post(&state, &id, &user).await?;
    Ok(ApiResponse::ok(confirmation))
}
