//! Deployment error types

use berth_service::PublishError;
use berth_stack::StackError;
use thiserror::Error;

/// Deployment errors
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Application {0} is not in the catalog")]
    UnknownApplication(String),

    #[error("Application {application} has no environment {environment}")]
    UnknownEnvironment {
        application: String,
        environment: String,
    },

    #[error("Cluster stack {stack} has no output {key}")]
    MissingClusterOutput { stack: String, key: String },

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl DeployError {
    /// The stack-level failure behind this error, wherever it surfaced
    pub fn stack_error(&self) -> Option<&StackError> {
        match self {
            DeployError::Stack(err) | DeployError::Publish(PublishError::Stack(err)) => Some(err),
            _ => None,
        }
    }
}

/// Result type for deployments
pub type DeployResult<T> = std::result::Result<T, DeployError>;
