use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::ApiResult;
use crate::{
    api::{
        error::ApiError,
        types::{ApiJson, ApiQuery, Pagination},
        AppState,
    },
    domain::institution::{
        is_valid_telephone, InstitutionInput, MedicalInstitution, Telephone, TelephoneInput,
    },
    store::institutions,
};

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> ApiResult<Vec<MedicalInstitution>> {
    let (offset, limit) = page.resolve()?;
    let items = state
        .store
        .read(|conn| institutions::list_institutions(conn, offset, limit))?;
    Ok(Json(items))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<InstitutionInput>,
) -> Result<(StatusCode, Json<MedicalInstitution>), ApiError> {
    validate(&input)?;
    let institution = MedicalInstitution::new(input);
    state
        .store
        .write(|tx| institutions::insert_institution(tx, &institution))?;
    Ok((StatusCode::CREATED, Json(institution)))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MedicalInstitution> {
    let institution = state
        .store
        .read(|conn| institutions::get_institution(conn, &id))?;
    Ok(Json(institution))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<InstitutionInput>,
) -> ApiResult<MedicalInstitution> {
    validate(&input)?;
    let institution = state.store.write(|tx| {
        let mut institution = institutions::get_institution(tx, &id)?;
        institution.apply(input);
        institutions::update_institution(tx, &institution)?;
        Ok::<_, ApiError>(institution)
    })?;
    Ok(Json(institution))
}

/// Reports that referenced the institution keep a null reference.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .write(|tx| institutions::delete_institution(tx, &id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn telephones(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Telephone>> {
    let phones = state.store.read(|conn| {
        institutions::get_institution(conn, &id)?;
        institutions::list_telephones(conn, &id)
    })?;
    Ok(Json(phones))
}

pub async fn add_telephone(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TelephoneInput>,
) -> Result<(StatusCode, Json<Telephone>), ApiError> {
    if !is_valid_telephone(&input.telephone) {
        return Err(ApiError::BadRequest(format!(
            "{:?} is not a valid telephone number",
            input.telephone
        )));
    }
    let telephone = Telephone::new(&id, &input.telephone);
    state.store.write(|tx| {
        institutions::get_institution(tx, &id)?;
        institutions::insert_telephone(tx, &telephone)
    })?;
    Ok((StatusCode::CREATED, Json(telephone)))
}

pub async fn remove_telephone(
    State(state): State<AppState>,
    Path((id, telephone_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .write(|tx| institutions::delete_telephone(tx, &id, &telephone_id))?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate(input: &InstitutionInput) -> Result<(), ApiError> {
    for (field, value) in [
        ("name", &input.name),
        ("county", &input.county),
        ("sub_county", &input.sub_county),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!("{field} must not be empty")));
        }
    }
    Ok(())
}
