use thiserror::Error;

use crate::selectors::Phase;

/// Errors raised while validating inputs or loading factor tables.
#[derive(Debug, Error)]
pub enum EmissionsError {
    #[error("unknown selector for {phase} phase: {selector}")]
    UnknownSelector { phase: Phase, selector: String },

    #[error("invalid input {field} = {value}: must be a finite, non-negative number")]
    InvalidInput { field: &'static str, value: f64 },

    #[error("invalid emission factor catalog: {0}")]
    InvalidCatalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type EmissionsResult<T> = Result<T, EmissionsError>;

impl EmissionsError {
    pub fn unknown_selector(phase: Phase, selector: impl Into<String>) -> Self {
        EmissionsError::UnknownSelector {
            phase,
            selector: selector.into(),
        }
    }
}

/// Reject negative and non-finite quantities; zero is a valid "not yet entered" value.
pub fn ensure_non_negative(field: &'static str, value: f64) -> EmissionsResult<f64> {
    if value.is_finite() && value >= 0.0 {
        // Fold -0.0 into 0.0 so zero inputs never print as "-0".
        Ok(if value == 0.0 { 0.0 } else { value })
    } else {
        Err(EmissionsError::InvalidInput { field, value })
    }
}
