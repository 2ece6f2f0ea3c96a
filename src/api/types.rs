//! Request extractors and response DTOs.

use axum::extract::{FromRequest, FromRequestParts};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::error::ApiError;
use crate::domain::{
    adr::Adr,
    assessment::{CausalityAssessment, Review},
    user::{User, UserSummary},
};

/// JSON body whose rejections use the API error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// URL-encoded form whose rejections use the API error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct ApiForm<T>(pub T);

/// Query string whose rejections use the API error shape.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Authenticated caller, inserted by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// `(offset, limit)` after range checks.
    pub fn resolve(self) -> Result<(u32, u32), ApiError> {
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(i64::from(DEFAULT_LIMIT));
        let offset = u32::try_from(offset)
            .map_err(|_| ApiError::BadRequest("offset must be a non-negative integer".into()))?;
        if !(1..=i64::from(MAX_LIMIT)).contains(&limit) {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok((offset, limit as u32))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshQuery {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MonitoringQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A report with its assessments, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct AdrDetail {
    #[serde(flatten)]
    pub adr: Adr,
    pub causality_assessment_levels: Vec<CausalityAssessment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewDetail {
    #[serde(flatten)]
    pub review: Review,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentDetail {
    #[serde(flatten)]
    pub assessment: CausalityAssessment,
    pub reviews: Vec<ReviewDetail>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: user.created_at,
        }
    }
}
