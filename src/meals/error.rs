use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::nutrition::EstimationError;

/// Every manager failure, one variant per HTTP outcome.
#[derive(Debug, Error)]
pub enum MealError {
    #[error("{0}")]
    Validation(String),

    #[error("meal with id {0} not found")]
    NotFound(Uuid),

    #[error("nutrition analysis service is not available")]
    EstimationUnavailable,

    #[error("failed to analyze meal nutrition: {0}")]
    Upstream(#[from] EstimationError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl MealError {
    pub fn status(&self) -> StatusCode {
        match self {
            MealError::Validation(_) => StatusCode::BAD_REQUEST,
            MealError::NotFound(_) => StatusCode::NOT_FOUND,
            MealError::EstimationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            MealError::Upstream(_) => StatusCode::BAD_GATEWAY,
            MealError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MealError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            MealError::Store(e) => {
                error!(error = ?e, "store failure");
                "an unexpected storage error occurred".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_maps_to_one_status() {
        assert_eq!(MealError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(MealError::NotFound(Uuid::nil()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            MealError::EstimationUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            MealError::from(EstimationError::EmptyResponse).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            MealError::from(anyhow::anyhow!("disk on fire")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
