use crate::api::AppState;
use crate::domain::ObligationId;
use crate::error::AppError;
use crate::engine::ObligationAccount;
use crate::orchestration::CoreQueries;
use axum::extract::{Path, State};
use axum::Json;

pub async fn get_obligation(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ObligationAccount>, AppError> {
    let id = id.trim();
    if !id.starts_with("0x") || id.len() < 3 {
        return Err(AppError::BadRequest("Invalid obligation id".into()));
    }

    let account = state
        .querier
        .get_obligation_account(&ObligationId::new(id))
        .await?;
    Ok(Json(account))
}
