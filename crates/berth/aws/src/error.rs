//! Classification of AWS SDK errors

use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use berth_types::{ProviderError, ProviderErrorKind};
use std::fmt::Debug;

/// Classify a CloudFormation failure.
///
/// `ValidationError` covers both "does not exist" and "no updates", so it is
/// resolved from the message.
pub fn classify_cloudformation(
    operation: &str,
    code: Option<&str>,
    message: &str,
) -> ProviderError {
    let kind = match code {
        Some("AlreadyExistsException") => ProviderErrorKind::AlreadyExists,
        Some("StackNotFoundException") => ProviderErrorKind::NotFound,
        _ => ProviderErrorKind::from_message(message),
    };
    with_code(ProviderError::new(kind, operation, message), code)
}

/// Classify an ECS failure.
///
/// A duplicate create-service is an `InvalidParameterException` whose only
/// distinguishing feature is the message.
pub fn classify_ecs(operation: &str, code: Option<&str>, message: &str) -> ProviderError {
    let kind = match code {
        Some("ServiceNotFoundException") | Some("ClusterNotFoundException") => {
            ProviderErrorKind::NotFound
        }
        Some("ServiceNotActiveException") => ProviderErrorKind::Other,
        _ => ProviderErrorKind::from_message(message),
    };
    with_code(ProviderError::new(kind, operation, message), code)
}

fn with_code(err: ProviderError, code: Option<&str>) -> ProviderError {
    match code {
        Some(code) => err.with_code(code),
        None => err,
    }
}

/// Turn an SDK error into a [`ProviderError`] with `classify`.
///
/// Transport failures carry no service message; their full error chain is
/// used instead.
pub(crate) fn from_sdk<E, R>(
    operation: &str,
    err: SdkError<E, R>,
    classify: fn(&str, Option<&str>, &str) -> ProviderError,
) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let message = match err.message() {
        Some(message) => message.to_string(),
        None => DisplayErrorContext(&err).to_string(),
    };
    classify(operation, err.code(), &message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloudformation_validation_errors_resolve_by_message() {
        let missing = classify_cloudformation(
            "UpdateStack",
            Some("ValidationError"),
            "Stack [currency-service-dev] does not exist",
        );
        assert!(missing.is_not_found());
        assert_eq!(missing.code.as_deref(), Some("ValidationError"));

        let unchanged = classify_cloudformation(
            "UpdateStack",
            Some("ValidationError"),
            "No updates are to be performed.",
        );
        assert!(unchanged.is_no_updates());

        let invalid = classify_cloudformation(
            "UpdateStack",
            Some("ValidationError"),
            "Template format error: unsupported structure.",
        );
        assert_eq!(invalid.kind, ProviderErrorKind::Other);
    }

    #[test]
    fn test_cloudformation_codes_take_precedence() {
        let err = classify_cloudformation(
            "CreateStack",
            Some("AlreadyExistsException"),
            "Stack [x] already exists",
        );
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_ecs_duplicate_create_is_already_exists() {
        let err = classify_ecs(
            "CreateService",
            Some("InvalidParameterException"),
            "Creation of service was not idempotent.",
        );
        assert!(err.is_already_exists());

        let other = classify_ecs(
            "CreateService",
            Some("InvalidParameterException"),
            "Unable to assume role",
        );
        assert_eq!(other.kind, ProviderErrorKind::Other);
    }

    #[test]
    fn test_ecs_missing_service_is_not_found() {
        let err = classify_ecs("UpdateService", Some("ServiceNotFoundException"), "Service not found.");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_code_falls_back_to_message() {
        let err = classify_cloudformation("DescribeStacks", None, "Stack with id x does not exist");
        assert!(err.is_not_found());
        assert!(err.code.is_none());
    }
}
