pub mod health;
pub mod lendings;
pub mod market;
pub mod obligations;
pub mod portfolio;
pub mod rewards;
pub mod vesca;

use crate::domain::{Address, CoinName};
use crate::error::AppError;
use crate::orchestration::MarketQuerier;
use axum::{routing::get, Router};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub querier: Arc<MarketQuerier>,
}

impl AppState {
    pub fn new(querier: MarketQuerier) -> Self {
        Self {
            querier: Arc::new(querier),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/market/pools", get(market::get_market_pools))
        .route("/v1/obligations/:id", get(obligations::get_obligation))
        .route("/v1/lendings/:coin", get(lendings::get_lending))
        .route("/v1/spools/:coin", get(rewards::get_spool))
        .route(
            "/v1/borrow-incentive-pools/:coin",
            get(rewards::get_borrow_incentive_pool),
        )
        .route("/v1/vesca/:key", get(vesca::get_ve_sca))
        .route("/v1/portfolio", get(portfolio::get_portfolio))
        .layer(cors)
        .with_state(state)
}

pub(crate) fn parse_owner(raw: &str) -> Result<Address, AppError> {
    Address::from_str(raw).map_err(|e| AppError::BadRequest(format!("Invalid owner address: {}", e)))
}

pub(crate) fn parse_coin(raw: &str) -> Result<CoinName, AppError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::BadRequest(format!("Invalid coin: {:?}", raw)));
    }
    Ok(CoinName::new(raw))
}
