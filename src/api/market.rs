use crate::api::{parse_coin, AppState};
use crate::error::AppError;
use crate::orchestration::{CoreQueries, MarketSnapshot};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPoolsQuery {
    /// Comma-separated coin names; every configured market coin when absent.
    pub coins: Option<String>,
}

pub async fn get_market_pools(
    Query(params): Query<MarketPoolsQuery>,
    State(state): State<AppState>,
) -> Result<Json<MarketSnapshot>, AppError> {
    let coins = match params.coins.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.split(',')
                .map(parse_coin)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        None => None,
    };

    let snapshot = state.querier.get_market_pools(coins.as_deref()).await?;
    Ok(Json(snapshot))
}
