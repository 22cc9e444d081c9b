use crate::api::AppState;
use axum::extract::State;
use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Ready once the querier is built; reports the coins it serves.
pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    let coins = state.querier.coins();
    Json(serde_json::json!({
        "status": "ready",
        "marketCoins": coins.market,
        "cached": state.querier.session().cache_ttl().is_some(),
    }))
}
