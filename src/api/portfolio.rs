use crate::api::{parse_owner, AppState};
use crate::engine::Portfolio;
use crate::error::AppError;
use crate::orchestration::PortfolioQueries;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PortfolioQuery {
    pub owner: String,
}

pub async fn get_portfolio(
    Query(params): Query<PortfolioQuery>,
    State(state): State<AppState>,
) -> Result<Json<Portfolio>, AppError> {
    let owner = parse_owner(&params.owner)?;
    let portfolio = state.querier.get_user_portfolio(&owner).await?;
    tracing::debug!(
        "Portfolio for {}: {} lendings, {} borrowings",
        owner,
        portfolio.lendings.len(),
        portfolio.borrowings.len()
    );
    Ok(Json(portfolio))
}
