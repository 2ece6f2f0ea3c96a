//! Bearer token authentication for protected routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use super::{error::ApiError, types::AuthUser, AppState};
use crate::{
    auth::{token, AuthError, TokenKind},
    store::{users, StoreError},
};

/// Resolve `Authorization: Bearer <token>` to a user and inject [`AuthUser`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))?;

    let user = state.store.read(|conn| {
        let user_id = token::authenticate(conn, presented, TokenKind::Access, Utc::now())?;
        users::get_user(conn, &user_id).map_err(|err| match err {
            StoreError::NotFound { .. } => AuthError::InvalidToken,
            other => AuthError::Store(other),
        })
    })?;

    tracing::debug!(user_id = %user.id, "authenticated request");
    req.extensions_mut().insert(AuthUser(user));
    Ok(next.run(req).await)
}
