use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::{LoggedInUser, LoginRequest, RegisterRequest, RegisteredUser},
        password::{generate_access_token, hash_password, verify_password},
        repo_types::NewUser,
    },
    error::ApiError,
    state::AppState,
};

const USERNAME_MIN: usize = 2;
const USERNAME_MAX: usize = 14;
const BAD_CREDENTIALS: &str = "Credentials do not match";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"(?i)^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    if !is_valid_email(&req.email) {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    let len = req.username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(ApiError::bad_request(format!(
            "Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
        )));
    }
    if req.password.is_empty() {
        return Err(ApiError::bad_request("Password is required"));
    }
    Ok(())
}

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<RegisteredUser, ApiError> {
    if let Err(e) = validate_registration(&req) {
        warn!(username = %req.username, error = %e, "registration rejected");
        return Err(e);
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::internal(e.to_string())
    })?;

    let user = state
        .users
        .create_user(NewUser {
            username: req.username,
            email: req.email,
            password_hash,
            access_token: generate_access_token(),
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "create user failed");
            ApiError::store_rejected(e)
        })?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(RegisteredUser {
        username: user.username,
        email: user.email,
        id: user.id,
        access_token: user.access_token,
    })
}

/// Unknown usernames and wrong passwords get the same 401.
pub async fn login(state: &AppState, req: LoginRequest) -> Result<LoggedInUser, ApiError> {
    let user = match state.users.find_by_username(&req.username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(username = %req.username, "login unknown username");
            return Err(ApiError::unauthorized(BAD_CREDENTIALS));
        }
        Err(e) => return Err(ApiError::store_failed(e)),
    };

    let ok = verify_password(&req.password, &user.password_hash).map_err(|e| {
        error!(error = %e, user_id = %user.id, "verify_password failed");
        ApiError::internal(e.to_string())
    })?;

    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(LoggedInUser {
        username: user.username,
        id: user.id,
        access_token: user.access_token,
    })
}
