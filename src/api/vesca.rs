use crate::api::AppState;
use crate::engine::VeScaMetrics;
use crate::error::AppError;
use crate::orchestration::VeScaQueries;
use axum::extract::{Path, State};
use axum::Json;

pub async fn get_ve_sca(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<VeScaMetrics>, AppError> {
    if !key.starts_with("0x") {
        return Err(AppError::BadRequest("Invalid veSCA key id".into()));
    }
    Ok(Json(state.querier.get_ve_sca(&key).await?))
}
