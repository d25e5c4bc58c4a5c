use thiserror::Error;

/// Failures talking to the completion service. None of these are retried;
/// the caller decides what the student sees.
#[derive(Debug, Error)]
pub enum AIError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
    #[error("Rate limit error: {0}")]
    RateLimitError(String),
    #[error("API error: {0}")]
    APIError(String),
}

impl From<reqwest::Error> for AIError {
    fn from(error: reqwest::Error) -> Self {
        AIError::NetworkError(error.to_string())
    }
}
