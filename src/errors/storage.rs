//! Storage error types and the not-found marker
//!
//! Every storage operation that addresses a single document by id returns
//! `Result<Lookup<T>, StorageError>`, which gives callers three cases to
//! match on: found, not found (an expected business outcome), and failure.

use serde::Serialize;
use thiserror::Error;

/// Document store errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// A required field was absent or blank
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// Offending field, as named in the client-facing schema
        field: String,
        /// Human readable reason
        message: String,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl StorageError {
    /// Validation failure for a missing required field
    pub fn required(field: &str) -> Self {
        StorageError::Validation {
            field: field.to_string(),
            message: format!("The {} field is required", field),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StorageError::Validation { .. })
    }
}

/// Structured marker returned instead of an error when a document is absent.
///
/// Serializes as `{"failed": true, "message": "<Entity> not found"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NotFound {
    pub failed: bool,
    pub message: String,
}

impl NotFound {
    pub fn entity(entity: &str) -> Self {
        Self {
            failed: true,
            message: format!("{} not found", entity),
        }
    }
}

/// Outcome of a lookup addressed by id
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound(NotFound),
}

impl<T> Lookup<T> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Lookup::NotFound(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound(_) => None,
        }
    }

    /// Build a lookup from an optional row, naming the entity in the marker
    pub fn from_option(value: Option<T>, entity: &str) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound(NotFound::entity(entity)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_marker_shape() {
        let marker = NotFound::entity("Post");
        let json = serde_json::to_value(&marker).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "failed": true, "message": "Post not found" })
        );
    }

    #[test]
    fn test_required_field_message() {
        let err = StorageError::required("title");
        assert!(err.is_validation());
        assert!(err.to_string().contains("The title field is required"));
    }

    #[test]
    fn test_lookup_from_option() {
        let found = Lookup::from_option(Some(3), "Comment");
        assert_eq!(found.clone().found(), Some(3));

        let missing: Lookup<i32> = Lookup::from_option(None, "Comment");
        assert!(missing.is_not_found());
        assert_eq!(missing, Lookup::NotFound(NotFound::entity("Comment")));
    }
}
