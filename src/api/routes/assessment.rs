use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rusqlite::Connection;

use super::ApiResult;
use crate::{
    api::{
        error::ApiError,
        types::{ApiJson, AssessmentDetail, AuthUser, ReviewDetail},
        AppState,
    },
    domain::assessment::{Review, ReviewVerdict},
    store::{assessments, reviews, StoreError},
};

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<AssessmentDetail> {
    let detail = state.store.read(|conn| {
        let assessment = assessments::get_assessment(conn, &id)?;
        let reviews = reviews_of(conn, &id)?;
        Ok::<_, StoreError>(AssessmentDetail {
            assessment,
            reviews,
        })
    })?;
    Ok(Json(detail))
}

pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<ReviewDetail>> {
    let reviews = state.store.read(|conn| {
        assessments::get_assessment(conn, &id)?;
        reviews_of(conn, &id)
    })?;
    Ok(Json(reviews))
}

pub async fn add_review(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(verdict): ApiJson<ReviewVerdict>,
) -> Result<(StatusCode, Json<ReviewDetail>), ApiError> {
    verdict.validate().map_err(|msg| ApiError::BadRequest(msg.into()))?;
    let review = Review::new(&id, &user.id, verdict);
    state.store.write(|tx| {
        assessments::get_assessment(tx, &id)?;
        reviews::insert_review(tx, &review)
    })?;
    tracing::info!(review_id = %review.id, assessment_id = %id, approved = review.approved, "review recorded");
    Ok((
        StatusCode::CREATED,
        Json(ReviewDetail {
            review,
            user: user.summary(),
        }),
    ))
}

pub(super) fn reviews_of(
    conn: &Connection,
    assessment_id: &str,
) -> Result<Vec<ReviewDetail>, StoreError> {
    Ok(reviews::list_for_assessment(conn, assessment_id)?
        .into_iter()
        .map(|(review, user)| ReviewDetail { review, user })
        .collect())
}
