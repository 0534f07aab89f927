//! Per-entity persistence adapters over the document store.
//!
//! Every entity follows the same five-operation contract, expressed by
//! [`DocumentStorage`]. Lookups addressed by id answer with [`Lookup`] so
//! that an absent document is an ordinary value rather than an error.

mod comments;
mod filter;
mod posts;

use async_trait::async_trait;

use crate::errors::{Lookup, StorageResult};

pub use comments::{Comment, CommentDraft, CommentFilter, CommentPatch, CommentStorage};
pub use filter::{contains_ignore_case, fold_case};
pub use posts::{Post, PostDraft, PostFilter, PostPatch, PostStorage};

/// CRUD capability set for one kind of document.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Client-facing document, identity exposed as `id`
    type Document: Send;
    /// Field set accepted by `save`
    type Draft: Send;
    /// Partial field set accepted by `update`
    type Patch: Send;
    /// Query constraints accepted by `find`; `Default` matches everything
    type Filter: Send + Default;

    async fn find(&self, filter: Self::Filter) -> StorageResult<Vec<Self::Document>>;

    async fn find_by_id(&self, id: &str) -> StorageResult<Lookup<Self::Document>>;

    /// Validate and persist a new document, assigning identity and timestamps.
    async fn save(&self, draft: Self::Draft) -> StorageResult<Self::Document>;

    /// Merge `patch` into the stored document; absent fields keep their values.
    async fn update(&self, id: &str, patch: Self::Patch) -> StorageResult<Lookup<Self::Document>>;

    /// Remove the document and hand back what was removed.
    async fn delete(&self, id: &str) -> StorageResult<Lookup<Self::Document>>;
}

pub type DynPostStorage =
    dyn DocumentStorage<Document = Post, Draft = PostDraft, Patch = PostPatch, Filter = PostFilter>;

pub type DynCommentStorage = dyn DocumentStorage<
    Document = Comment,
    Draft = CommentDraft,
    Patch = CommentPatch,
    Filter = CommentFilter,
>;

/// Reject absent or blank values for fields the store requires.
pub(crate) fn required(field: &str, value: Option<String>) -> StorageResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(crate::errors::StorageError::required(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        assert!(required("title", None).is_err());
        assert!(required("title", Some("   ".to_string())).is_err());
        assert_eq!(required("title", Some("T".to_string())).unwrap(), "T");
    }
}
