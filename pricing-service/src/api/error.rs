use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pricing_core::{pricing::EngineError, store::StoreError};
use serde::Serialize;

use crate::transform::ValidationError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Rejected(#[from] ValidationError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Engine(e.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            // Existing ingestion clients expect a server error for bad batches.
            Self::Rejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Engine(EngineError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Engine(EngineError::Cost(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        };

        match &self {
            Self::Engine(EngineError::NotFound(_)) => tracing::debug!(error = %self, "not found"),
            Self::Engine(EngineError::Cost(_)) => {
                metrics::counter!("cost_division_by_zero_total").increment(1);
                tracing::warn!(error = %self, "cost calculation failed");
            }
            Self::InvalidInput(_) | Self::Rejected(_) => tracing::info!(error = %self, "request rejected"),
        }

        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Turns optional `offset`/`limit` query values into a page window.
pub fn page_window(offset: Option<i64>, limit: Option<i64>) -> Result<(usize, usize), ApiError> {
    let non_negative = |name: &str, v: i64| {
        usize::try_from(v).map_err(|_| ApiError::InvalidInput(format!("{name} must be non-negative, got {v}")))
    };

    Ok((
        non_negative("offset", offset.unwrap_or(0))?,
        non_negative("limit", limit.unwrap_or(super::DEFAULT_PAGE_LIMIT))?,
    ))
}
