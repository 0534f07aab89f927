use async_graphql::*;
use tracing::warn;

/// Error codes carried in the `code` extension
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ErrorCode {
    /// A storage or upstream operation failed; the cause stays in the logs
    OperationFailed,
    /// Malformed argument that passed GraphQL validation
    BadRequest,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::OperationFailed => "OPERATION_FAILED",
            ErrorCode::BadRequest => "BAD_REQUEST",
        }
    }
}

/// Structured error builder for consistent error handling
pub struct StructuredError;

impl StructuredError {
    /// Client-facing failure of a named operation, e.g. `Error: find post by id`.
    ///
    /// The underlying cause is logged, never returned.
    pub fn operation(operation: &str, cause: impl std::fmt::Display) -> Error {
        warn!(operation, "{}", cause);
        Error::new(format!("Error: {}", operation)).extend_with(|_, e| {
            e.set("code", ErrorCode::OperationFailed.as_str());
            e.set("operation", operation);
        })
    }

    /// Create a "bad request" error
    pub fn bad_request(message: impl Into<String>) -> Error {
        Error::new(message.into()).extend_with(|_, e| {
            e.set("code", ErrorCode::BadRequest.as_str());
        })
    }
}

/// Maps any failure into an operation-labelled GraphQL error.
pub trait OperationExt<T> {
    fn or_operation(self, operation: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> OperationExt<T> for std::result::Result<T, E> {
    fn or_operation(self, operation: &str) -> Result<T> {
        self.map_err(|e| StructuredError::operation(operation, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StorageError;

    #[test]
    fn test_operation_error_hides_cause() {
        let err = StructuredError::operation("find all posts", "connection reset by peer");
        assert_eq!(err.message, "Error: find all posts");

        let extensions = err.extensions.expect("extensions");
        assert_eq!(
            extensions.get("code"),
            Some(&Value::from("OPERATION_FAILED"))
        );
        assert_eq!(
            extensions.get("operation"),
            Some(&Value::from("find all posts"))
        );
    }

    #[test]
    fn test_or_operation_labels_storage_errors() {
        let failed: std::result::Result<(), StorageError> = Err(StorageError::required("title"));
        let err = failed.or_operation("save post").unwrap_err();
        assert_eq!(err.message, "Error: save post");
        assert!(!err.message.contains("title"));
    }

    #[test]
    fn test_bad_request_code() {
        let err = StructuredError::bad_request("'id' must be an ID");
        let extensions = err.extensions.expect("extensions");
        assert_eq!(extensions.get("code"), Some(&Value::from("BAD_REQUEST")));
    }
}
