use serde::Serialize;

/// Error taxonomy for the checkout engine.
///
/// `ValidationError` and `OrderError` are terminal for the current submission
/// attempt and surfaced to the user. `ExternalApiError` raised during a
/// confirmation pass is recovered locally: the order stays pending and is
/// retried on the next poll tick.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Order error: {0}")]
    OrderError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::ExternalServiceError(err.to_string())
    }
}

impl ServiceError {
    /// True for failures that abort the current checkout attempt and must be
    /// shown to the user, as opposed to status-query failures that the poller
    /// retries silently.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidInput(_)
                | Self::OrderError(_)
                | Self::ConfigError(_)
        )
    }
}
