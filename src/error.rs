use axum::http::StatusCode;
use thiserror::Error;

use crate::model::ModelError;

/// Failures surfaced by the advisory handlers
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("{0}")]
    MissingInput(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("AI service unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),

    #[error("Unable to parse AI response: {0}")]
    MalformedModelOutput(#[from] serde_json::Error),
}

impl AdvisoryError {
    pub fn status(&self) -> StatusCode {
        match self {
            AdvisoryError::MissingInput(_) | AdvisoryError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AdvisoryError::ModelUnavailable(_) | AdvisoryError::MalformedModelOutput(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
