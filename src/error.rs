use thiserror::Error;

/// Main error type for the swap flow library and CLI
#[derive(Error, Debug)]
pub enum SwapFlowError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Backend error: {0}")]
    Backend(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Input errors
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for SwapFlowError
pub type Result<T> = std::result::Result<T, SwapFlowError>;

/// Failure reported by an external provider (quote, balance or transaction).
///
/// Providers only hand back the fault text; the controller classifies it into
/// an [`ErrorKind`](crate::domain::ErrorKind).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderFault {
    pub message: String,
}

impl ProviderFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<SwapFlowError> for ProviderFault {
    fn from(err: SwapFlowError) -> Self {
        ProviderFault::new(err.to_string())
    }
}

impl From<reqwest::Error> for ProviderFault {
    fn from(err: reqwest::Error) -> Self {
        ProviderFault::new(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_joins_messages() {
        let err = SwapFlowError::InvalidConfig(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Invalid configuration: a; b");
    }

    #[test]
    fn test_provider_fault_keeps_message_verbatim() {
        let fault: ProviderFault = SwapFlowError::Backend("execution reverted".into()).into();
        assert_eq!(fault.message, "Backend error: execution reverted");
        assert_eq!(ProviderFault::new("boom").to_string(), "boom");
    }
}
