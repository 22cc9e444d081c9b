use crate::orchestration::QueryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound(what) => AppError::NotFound(what),
            QueryError::PriceUnavailable(_) => AppError::Unavailable(err.to_string()),
            QueryError::DataSource(_) => AppError::Upstream(err.to_string()),
            QueryError::Calc(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", error_message);
        }

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::DataSourceError;
    use crate::engine::CalcError;

    fn status_of(err: QueryError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_query_errors_map_to_status() {
        assert_eq!(
            status_of(QueryError::NotFound("obligation 0x1".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(QueryError::PriceUnavailable("sui".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(DataSourceError::RateLimited.into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(CalcError::Overflow("apy").into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
