//! Service publication error types

use berth_stack::StackError;
use berth_types::ProviderError;
use thiserror::Error;

/// Publication errors
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Task definition registration failed: {0}")]
    Registration(#[source] ProviderError),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error("Stack {stack} has no output {key}")]
    MissingOutput { stack: String, key: String },

    #[error("Service creation failed: {0}")]
    CreateService(#[source] ProviderError),

    #[error("Service update failed: {0}")]
    UpdateService(#[source] ProviderError),
}

/// Result type for publication
pub type PublishResult<T> = std::result::Result<T, PublishError>;
