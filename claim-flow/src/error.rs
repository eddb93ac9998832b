use thiserror::Error;

/// Errors raised by the claim pipeline, its storage adapters and the state manager
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Context error: {0}")]
    ContextError(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Graph exceeded {0} steps without ending")]
    StepLimitExceeded(usize),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Claim not found after save: {0}")]
    ClaimNotPersisted(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for FlowError {
    fn from(err: sqlx::Error) -> Self {
        FlowError::StorageError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
