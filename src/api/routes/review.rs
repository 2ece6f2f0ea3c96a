use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::ApiResult;
use crate::{
    api::{
        error::ApiError,
        types::{ApiJson, AuthUser, ReviewDetail},
        AppState,
    },
    domain::assessment::{Review, ReviewVerdict},
    store::{reviews, users, StoreError},
};

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ReviewDetail> {
    let detail = state.store.read(|conn| {
        let review = reviews::get_review(conn, &id)?;
        let user = users::get_user(conn, &review.user_id)?.summary();
        Ok::<_, StoreError>(ReviewDetail { review, user })
    })?;
    Ok(Json(detail))
}

/// Only the author may change a review.
pub async fn update(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(verdict): ApiJson<ReviewVerdict>,
) -> ApiResult<ReviewDetail> {
    verdict.validate().map_err(|msg| ApiError::BadRequest(msg.into()))?;
    let review = state.store.write(|tx| {
        let mut review = reviews::get_review(tx, &id)?;
        ensure_author(&review, &user.id)?;
        review.apply(verdict);
        reviews::update_review(tx, &review)?;
        Ok::<_, ApiError>(review)
    })?;
    Ok(Json(ReviewDetail {
        review,
        user: user.summary(),
    }))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.write(|tx| {
        let review = reviews::get_review(tx, &id)?;
        ensure_author(&review, &user.id)?;
        reviews::delete_review(tx, &id)?;
        Ok::<_, ApiError>(())
    })?;
    Ok(StatusCode::NO_CONTENT)
}

fn ensure_author(review: &Review, user_id: &str) -> Result<(), ApiError> {
    if review.user_id != user_id {
        return Err(ApiError::Forbidden(
            "only the author may modify this review".into(),
        ));
    }
    Ok(())
}
