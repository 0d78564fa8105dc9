//! Classification of DynamoDB SDK failures into core errors.

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::RequestId;
use wpsnapshots_core::{Error, StoreFailure};

const ACCESS_DENIED_CODE: &str = "AccessDeniedException";

/// What the SDK tells us about a failed call, detached from its generic types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Diagnostics {
    pub code: Option<String>,
    pub message: String,
    pub request_id: Option<String>,
    pub error_type: &'static str,
}

impl Diagnostics {
    pub(crate) fn from_sdk<E>(err: &SdkError<E>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        let error_type = match err {
            SdkError::ServiceError(ctx) if ctx.raw().status().is_server_error() => "Server",
            SdkError::ServiceError(_) => "Client",
            SdkError::TimeoutError(_) => "Timeout",
            SdkError::DispatchFailure(_) => "Transport",
            SdkError::ResponseError(_) => "Response",
            SdkError::ConstructionFailure(_) => "Construction",
            _ => "Unknown",
        };
        Self {
            code: err.code().map(str::to_string),
            message: err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(err).to_string()),
            request_id: err.request_id().map(str::to_string),
            error_type,
        }
    }
}

/// Access denial keeps its own variant; everything else becomes a store failure.
pub(crate) fn classify(table: &str, diagnostics: Diagnostics) -> Error {
    if diagnostics.code.as_deref() == Some(ACCESS_DENIED_CODE) {
        return Error::AccessDenied { table: table.to_string(), message: diagnostics.message };
    }

    let mut failure = StoreFailure::new(diagnostics.message).with_type(diagnostics.error_type);
    if let Some(code) = diagnostics.code {
        failure = failure.with_code(code);
    }
    if let Some(request_id) = diagnostics.request_id {
        failure = failure.with_request_id(request_id);
    }
    Error::Store(failure)
}

pub(crate) fn map_sdk_error<E>(table: &str, err: SdkError<E>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    classify(table, Diagnostics::from_sdk(&err))
}

/// Request construction failed before anything was sent.
pub(crate) fn build_error(err: impl std::fmt::Display) -> Error {
    Error::Store(StoreFailure::new(format!("invalid request: {err}")).with_type("Construction"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wpsnapshots_core::error::{TABLE_EXISTS_CODE, TABLE_MISSING_CODE};

    fn diagnostics(code: &str) -> Diagnostics {
        Diagnostics {
            code: Some(code.to_string()),
            message: "boom".into(),
            request_id: Some("REQ1".into()),
            error_type: "Client",
        }
    }

    #[test]
    fn test_access_denied_keeps_table() {
        let err = classify("wpsnapshots-main", diagnostics(ACCESS_DENIED_CODE));
        match err {
            Error::AccessDenied { table, message } => {
                assert_eq!(table, "wpsnapshots-main");
                assert_eq!(message, "boom");
            }
            other => panic!("expected AccessDenied, got {other:?}"),
        }
    }

    #[test]
    fn test_store_failure_carries_diagnostics() {
        let err = classify("wpsnapshots-main", diagnostics("ProvisionedThroughputExceededException"));
        let Error::Store(failure) = err else { panic!("expected Store") };
        assert_eq!(failure.error_code.as_deref(), Some("ProvisionedThroughputExceededException"));
        assert_eq!(failure.request_id.as_deref(), Some("REQ1"));
        assert_eq!(failure.error_type.as_deref(), Some("Client"));
    }

    #[test]
    fn test_table_codes_drive_hints() {
        let exists = classify("t", diagnostics(TABLE_EXISTS_CODE));
        assert!(exists.hint().is_some());
        let missing = classify("t", diagnostics(TABLE_MISSING_CODE));
        assert_eq!(missing.store_code(), Some(TABLE_MISSING_CODE));
        assert!(missing.hint().is_some());
    }

    #[test]
    fn test_transport_failure_without_code() {
        let err = classify(
            "t",
            Diagnostics { message: "dns error".into(), error_type: "Transport", ..Default::default() },
        );
        let Error::Store(failure) = err else { panic!("expected Store") };
        assert!(failure.error_code.is_none());
        assert_eq!(failure.error_type.as_deref(), Some("Transport"));
        assert_eq!(failure.message, "dns error");
    }
}
