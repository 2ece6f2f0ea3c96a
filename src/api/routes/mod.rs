//! Route handlers, one module per resource.

pub mod adr;
pub mod assessment;
pub mod auth;
pub mod institution;
pub mod monitoring;
pub mod review;

use axum::Json;

use super::error::ApiError;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Liveness probe.
pub async fn root() -> &'static str {
    "adr-causality is running"
}
