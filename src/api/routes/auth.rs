use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::{info, instrument};

use super::ApiResult;
use crate::{
    api::{
        error::ApiError,
        types::{ApiForm, ApiJson, ApiQuery, AuthUser, LoginForm, Profile, RefreshQuery},
        AppState,
    },
    auth::{password, token, AuthError, TokenPair},
    domain::user::{Signup, User},
    store::users,
};

#[instrument(skip(state, signup), fields(username = %signup.username))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(signup): ApiJson<Signup>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    let username = signup.username.trim();
    if username.is_empty() || signup.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password are required".into(),
        ));
    }
    let signup = Signup {
        username: username.to_string(),
        ..signup
    };

    let iterations = state.settings.password_hash_iterations;
    let plain = signup.password.clone();
    let hash =
        tokio::task::spawn_blocking(move || password::hash_password(&plain, iterations)).await?;
    let user = User::new(&signup, hash);

    state.store.write(|tx| {
        if users::find_by_username(tx, &user.username)?.is_some() {
            return Err(ApiError::Conflict("Username already exists".into()));
        }
        users::insert_user(tx, &user)?;
        Ok(())
    })?;

    info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(Profile::from(&user))))
}

/// Exchange form credentials for an access and refresh token.
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn token(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> ApiResult<TokenPair> {
    let user = state
        .store
        .read(|conn| users::find_by_username(conn, &form.username))?
        .ok_or(AuthError::InvalidCredentials)?;

    let stored = user.password_hash.clone();
    let presented = form.password;
    let verified =
        tokio::task::spawn_blocking(move || password::verify_password(&presented, &stored))
            .await??;
    if !verified {
        return Err(AuthError::InvalidCredentials.into());
    }

    let policy = state.settings.token_policy;
    let pair = state
        .store
        .write(|tx| token::issue_pair(tx, &user.id, &policy))?;
    info!(user_id = %user.id, "tokens issued");
    Ok(Json(pair))
}

pub async fn refresh(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RefreshQuery>,
) -> ApiResult<TokenPair> {
    let policy = state.settings.token_policy;
    let pair = state
        .store
        .write(|tx| token::refresh(tx, &query.refresh_token, &policy))?;
    Ok(Json(pair))
}

pub async fn me(Extension(AuthUser(user)): Extension<AuthUser>) -> ApiResult<Profile> {
    Ok(Json(Profile::from(&user)))
}
