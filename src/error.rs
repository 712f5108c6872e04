use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("ticket store error: {0}")]
    TicketStore(String),
    #[error("user store error: {0}")]
    UserStore(String),
    #[error("language model error: {0}")]
    LanguageModel(String),
    #[error("notification error: {0}")]
    Notification(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("ticket {0} not found")]
    TicketNotFound(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AppError {
    /// Whether re-running the failed step could succeed.
    pub fn is_retriable(&self) -> bool {
        !matches!(
            self,
            AppError::TicketNotFound(_) | AppError::Configuration(_) | AppError::InvalidInput(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
