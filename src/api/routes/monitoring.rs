use axum::extract::State;
use axum::Json;

use super::ApiResult;
use crate::{
    api::{
        error::ApiError,
        types::{ApiQuery, MonitoringQuery},
        AppState,
    },
    store::monitoring::{self, MonitoringReport},
};

/// Per-field literal counts for reports created between `start` and `end`.
pub async fn summary(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MonitoringQuery>,
) -> ApiResult<MonitoringReport> {
    if query.start > query.end {
        return Err(ApiError::BadRequest(
            "start must not be after end".into(),
        ));
    }
    let report = state
        .store
        .read(|conn| monitoring::summarize(conn, query.start, query.end))?;
    Ok(Json(report))
}
