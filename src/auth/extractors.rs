use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::{error, warn};

use crate::{auth::repo_types::User, error::ApiError, state::AppState};

/// Resolves the caller from the raw `Authorization` header.
///
/// The header holds the access token itself, without a scheme prefix, and is
/// compared exactly against stored tokens.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Please log in"))?;

        match state.users.find_by_token(token).await {
            Ok(Some(user)) => Ok(AuthUser(user)),
            Ok(None) => {
                warn!("unknown access token");
                Err(ApiError::unauthorized("Please log in"))
            }
            Err(e) => {
                error!(error = %e, "token lookup failed");
                Err(ApiError::store_failed(e))
            }
        }
    }
}
