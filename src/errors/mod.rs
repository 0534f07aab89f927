//! Domain-specific error types for the gateway
//!
//! Errors are split by the collaborator that raises them:
//!
//! - **StorageError**: document store failures (validation, database I/O)
//! - **UpstreamError**: failures talking to the upstream show service
//!
//! "Not found" is deliberately *not* an error. Storage lookups return
//! [`Lookup::NotFound`] carrying the marker that is handed to clients
//! unchanged, while genuine infrastructure faults travel as `Err`.
//!
//! # Examples
//!
//! ```rust
//! use showcase::errors::{Lookup, NotFound, StorageError};
//!
//! let missing: Lookup<String> = Lookup::NotFound(NotFound::entity("Post"));
//! assert!(missing.is_not_found());
//!
//! let err = StorageError::required("title");
//! assert!(err.is_validation());
//! ```

pub mod storage;
pub mod upstream;

pub use storage::{Lookup, NotFound, StorageError};
pub use upstream::UpstreamError;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for upstream connector operations
pub type UpstreamResult<T> = Result<T, UpstreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_result_alias() {
        let result: StorageResult<()> = Err(StorageError::required("body"));
        assert!(result.is_err());
    }

    #[test]
    fn test_upstream_result_alias() {
        let result: UpstreamResult<()> = Err(UpstreamError::Application("boom".to_string()));
        assert!(result.is_err());
    }
}
