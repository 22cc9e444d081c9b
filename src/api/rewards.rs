use crate::api::{parse_coin, AppState};
use crate::engine::{IncentivePoolMetrics, SpoolMetrics};
use crate::error::AppError;
use crate::orchestration::{BorrowIncentiveQueries, SpoolQueries};
use axum::extract::{Path, State};
use axum::Json;

pub async fn get_spool(
    Path(coin): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SpoolMetrics>, AppError> {
    let coin = parse_coin(&coin)?;
    Ok(Json(state.querier.get_spool(&coin).await?))
}

pub async fn get_borrow_incentive_pool(
    Path(coin): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<IncentivePoolMetrics>, AppError> {
    let coin = parse_coin(&coin)?;
    Ok(Json(state.querier.get_borrow_incentive_pool(&coin).await?))
}
