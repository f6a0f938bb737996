pub mod dto;
pub mod handlers;
pub mod listing;
mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::listing_routes())
        .merge(handlers::mutation_routes())
}
