use crate::api::{parse_coin, parse_owner, AppState};
use crate::engine::Lending;
use crate::error::AppError;
use crate::orchestration::CoreQueries;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LendingQuery {
    pub owner: String,
}

pub async fn get_lending(
    Path(coin): Path<String>,
    Query(params): Query<LendingQuery>,
    State(state): State<AppState>,
) -> Result<Json<Lending>, AppError> {
    let coin = parse_coin(&coin)?;
    let owner = parse_owner(&params.owner)?;

    let lending = state.querier.get_lending(&coin, &owner).await?;
    Ok(Json(lending))
}
