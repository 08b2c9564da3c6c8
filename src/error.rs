use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Completion API error ({status}): {message}")]
    CompletionApi {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Completion response error: {0}")]
    CompletionResponse(String),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid webhook payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Reply delivery error: {0}")]
    Delivery(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Returns true for failures of the completion backend, which are
    /// recovered with an apology instead of being propagated.
    #[must_use]
    pub fn is_completion_failure(&self) -> bool {
        matches!(
            self,
            RelayError::CompletionApi { .. }
                | RelayError::CompletionResponse(_)
                | RelayError::Reqwest(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
