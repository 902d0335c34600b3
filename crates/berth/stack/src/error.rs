//! Stack convergence error types

use berth_types::ProviderError;
use thiserror::Error;

/// Stack errors
#[derive(Debug, Error)]
pub enum StackError {
    #[error("Stack not found: {stack}")]
    NotFound { stack: String },

    #[error("Expected exactly one stack named {stack}, provider returned {count}")]
    Ambiguous { stack: String, count: usize },

    #[error("Stack {stack} ended in failed state {status}")]
    Failed { stack: String, status: String },

    #[error("Timed out waiting for stack {stack} after {iterations} polls")]
    Timeout { stack: String, iterations: u32 },

    #[error("Waiting for stack {stack} was cancelled")]
    Cancelled { stack: String },

    #[error("Provider error on stack {stack}: {source}")]
    Provider {
        stack: String,
        #[source]
        source: ProviderError,
    },
}

impl StackError {
    pub fn provider(stack: impl Into<String>, source: ProviderError) -> Self {
        Self::Provider {
            stack: stack.into(),
            source,
        }
    }

    /// Name of the stack the error concerns
    pub fn stack(&self) -> &str {
        match self {
            StackError::NotFound { stack }
            | StackError::Ambiguous { stack, .. }
            | StackError::Failed { stack, .. }
            | StackError::Timeout { stack, .. }
            | StackError::Cancelled { stack }
            | StackError::Provider { stack, .. } => stack,
        }
    }
}

/// Result type for stack operations
pub type StackResult<T> = std::result::Result<T, StackError>;
