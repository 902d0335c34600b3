//! Provider error taxonomy
//!
//! Adapters classify provider failures into a small set of kinds that the
//! reconciler and publisher branch on. Classification prefers structured
//! error codes; [`ProviderErrorKind::from_message`] is the fallback for
//! providers that only report these conditions in human-readable text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static STACK_NOT_FOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)stack.*does not exist").expect("valid regex"));

static NO_UPDATES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)no updates are to be performed").expect("valid regex"));

static NOT_IDEMPOTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)creation of service was not idempotent").expect("valid regex")
});

/// Conditions the core treats as expected steady-state signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// The named resource is not (yet) visible
    NotFound,
    /// An update would not change anything
    NoUpdates,
    /// A create collided with an existing resource
    AlreadyExists,
    /// Anything else; fatal for the step that hit it
    Other,
}

impl ProviderErrorKind {
    /// Classify from the human-readable message alone.
    ///
    /// Message matching is fragile: wording changes on the provider side turn
    /// expected signals into [`ProviderErrorKind::Other`].
    pub fn from_message(message: &str) -> Self {
        if NO_UPDATES.is_match(message) {
            ProviderErrorKind::NoUpdates
        } else if NOT_IDEMPOTENT.is_match(message) {
            ProviderErrorKind::AlreadyExists
        } else if STACK_NOT_FOUND.is_match(message) {
            ProviderErrorKind::NotFound
        } else {
            ProviderErrorKind::Other
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderErrorKind::NotFound => "not found",
            ProviderErrorKind::NoUpdates => "no updates",
            ProviderErrorKind::AlreadyExists => "already exists",
            ProviderErrorKind::Other => "provider error",
        };
        f.write_str(name)
    }
}

/// Error reported by a provider call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed ({kind}): {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    /// Provider operation that failed, e.g. `UpdateStack`
    pub operation: String,
    /// Structured error code, when the provider supplied one
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(
        kind: ProviderErrorKind,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            operation: operation.into(),
            code: None,
            message: message.into(),
        }
    }

    /// Build an error whose kind is taken from the message text
    pub fn from_message(operation: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ProviderErrorKind::from_message(&message), operation, message)
    }

    pub fn not_found(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, operation, message)
    }

    pub fn no_updates(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NoUpdates, operation, message)
    }

    pub fn already_exists(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::AlreadyExists, operation, message)
    }

    pub fn other(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, operation, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ProviderErrorKind::NotFound
    }

    pub fn is_no_updates(&self) -> bool {
        self.kind == ProviderErrorKind::NoUpdates
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind == ProviderErrorKind::AlreadyExists
    }
}

/// Result type for provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_fallback() {
        assert_eq!(
            ProviderErrorKind::from_message("Stack with id app-x-dev does not exist"),
            ProviderErrorKind::NotFound
        );
        assert_eq!(
            ProviderErrorKind::from_message("ValidationError: No updates are to be performed."),
            ProviderErrorKind::NoUpdates
        );
        assert_eq!(
            ProviderErrorKind::from_message(
                "InvalidParameterException: Creation of service was not idempotent."
            ),
            ProviderErrorKind::AlreadyExists
        );
        assert_eq!(
            ProviderErrorKind::from_message("Rate exceeded"),
            ProviderErrorKind::Other
        );
    }

    #[test]
    fn test_display_names_operation() {
        let err = ProviderError::other("CreateStack", "Template format error").with_code("ValidationError");
        assert_eq!(
            err.to_string(),
            "CreateStack failed (provider error): Template format error"
        );
        assert_eq!(err.code.as_deref(), Some("ValidationError"));
    }
}
