use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::ApiResult;
use crate::{
    api::{
        error::ApiError,
        types::{AdrDetail, ApiJson, ApiQuery, AuthUser, Pagination},
        AppState,
    },
    domain::adr::{Adr, AdrInput},
    reports,
    store::{adrs, assessments},
};

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> ApiResult<Vec<Adr>> {
    let (offset, limit) = page.resolve()?;
    let items = state
        .store
        .read(|conn| adrs::list_adrs(conn, offset, limit))?;
    Ok(Json(items))
}

/// Store a report and its first assessment.
pub async fn create(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiJson(input): ApiJson<AdrInput>,
) -> Result<(StatusCode, Json<AdrDetail>), ApiError> {
    validate(&input)?;
    let report = reports::create_report(&state.store, &state.engine, &user.id, input)?;
    Ok((
        StatusCode::CREATED,
        Json(AdrDetail {
            adr: report.adr,
            causality_assessment_levels: vec![report.assessment],
        }),
    ))
}

pub async fn detail(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<AdrDetail> {
    let detail = state.store.read(|conn| {
        let adr = adrs::get_adr(conn, &id)?;
        let causality_assessment_levels = assessments::list_for_adr(conn, &id)?;
        Ok::<_, ApiError>(AdrDetail {
            adr,
            causality_assessment_levels,
        })
    })?;
    Ok(Json(detail))
}

/// Replace a report and reassess it under the configured policy.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<AdrInput>,
) -> ApiResult<AdrDetail> {
    validate(&input)?;
    let report = reports::update_report(
        &state.store,
        &state.engine,
        &id,
        input,
        state.settings.reassessment_policy,
    )?;
    let causality_assessment_levels = state
        .store
        .read(|conn| assessments::list_for_adr(conn, &report.adr.id))?;
    Ok(Json(AdrDetail {
        adr: report.adr,
        causality_assessment_levels,
    }))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.write(|tx| adrs::delete_adr(tx, &id))?;
    tracing::info!(adr_id = %id, "report deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn validate(input: &AdrInput) -> Result<(), ApiError> {
    if input.patient_name.trim().is_empty() {
        return Err(ApiError::BadRequest("patient_name must not be empty".into()));
    }
    let negative = [
        ("patient_age", input.patient_age),
        ("patient_weight_kg", input.patient_weight_kg),
        ("patient_height_cm", input.patient_height_cm),
    ]
    .into_iter()
    .find(|(_, value)| value.is_some_and(|v| v < 0));
    if let Some((field, _)) = negative {
        return Err(ApiError::BadRequest(format!("{field} must not be negative")));
    }
    Ok(())
}
