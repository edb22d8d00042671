use thiserror::Error;

use super::types::Nutrient;

/// Why an estimation attempt produced no usable nutrient profile.
#[derive(Debug, Error)]
pub enum EstimationError {
    #[error("nutrition estimation is not configured")]
    Unavailable,

    #[error("estimation request failed: {0}")]
    Transport(String),

    #[error("estimation service returned an empty response")]
    EmptyResponse,

    #[error("could not parse estimation response: {message}")]
    Parse { message: String, raw: String },

    #[error("estimated {field} of {value} is outside the accepted range")]
    OutOfRange { field: Nutrient, value: f64 },
}

impl From<reqwest::Error> for EstimationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EstimationError::Transport("request timed out".into())
        } else {
            EstimationError::Transport(e.to_string())
        }
    }
}
