use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use super::{contains_ignore_case, fold_case, required, DocumentStorage};
use crate::database::entities::comments;
use crate::errors::{Lookup, StorageError, StorageResult};

const ENTITY: &str = "Comment";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub name: String,
    pub email: String,
    pub body: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<comments::Model> for Comment {
    fn from(model: comments::Model) -> Self {
        Self {
            id: model.doc_id,
            name: model.name,
            email: model.email,
            body: model.body,
            post_id: model.post_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Field set for a new comment; every field is required.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub body: Option<String>,
    pub post_id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub body: Option<String>,
    pub post_id: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct CommentFilter {
    pub body_contains: Option<String>,
    pub post_id: Option<String>,
}

impl CommentFilter {
    pub fn body_contains(needle: impl Into<String>) -> Self {
        Self {
            body_contains: Some(needle.into()),
            ..Default::default()
        }
    }

    pub fn for_post(post_id: impl Into<String>) -> Self {
        Self {
            post_id: Some(post_id.into()),
            ..Default::default()
        }
    }
}

/// Comment adapter borrowing the shared connection pool.
#[derive(Clone)]
pub struct CommentStorage {
    db: DatabaseConnection,
}

impl CommentStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: &str) -> StorageResult<Option<comments::Model>> {
        Ok(comments::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?)
    }
}

#[async_trait]
impl DocumentStorage for CommentStorage {
    type Document = Comment;
    type Draft = CommentDraft;
    type Patch = CommentPatch;
    type Filter = CommentFilter;

    async fn find(&self, filter: CommentFilter) -> StorageResult<Vec<Comment>> {
        let mut query = comments::Entity::find()
            .order_by_asc(comments::Column::CreatedAt)
            .order_by_asc(comments::Column::DocId);

        if let Some(needle) = filter.body_contains.as_deref() {
            query = query.filter(contains_ignore_case(comments::Column::BodyFolded, needle));
        }
        if let Some(post_id) = filter.post_id {
            query = query.filter(comments::Column::PostId.eq(post_id));
        }

        let models = query.all(&self.db).await?;
        Ok(models.into_iter().map(Comment::from).collect())
    }

    async fn find_by_id(&self, id: &str) -> StorageResult<Lookup<Comment>> {
        let model = self.find_model(id).await?;
        Ok(Lookup::from_option(model.map(Comment::from), ENTITY))
    }

    async fn save(&self, draft: CommentDraft) -> StorageResult<Comment> {
        let result = async {
            let name = required("name", draft.name)?;
            let body = required("body", draft.body)?;
            let email = required("email", draft.email)?;
            let post_id = required("postId", draft.post_id)?;

            let now = Utc::now();
            let comment = comments::ActiveModel {
                doc_id: Set(Uuid::new_v4().to_string()),
                name: Set(name),
                email: Set(email),
                body_folded: Set(fold_case(&body)),
                body: Set(body),
                post_id: Set(post_id),
                created_at: Set(now),
                updated_at: Set(now),
            };

            Ok::<_, StorageError>(comment.insert(&self.db).await?)
        }
        .await;

        match result {
            Ok(model) => {
                debug!("Saved comment {} on post {}", model.doc_id, model.post_id);
                Ok(Comment::from(model))
            }
            Err(err) => {
                error!("Failed to save comment: {}", err);
                Err(err)
            }
        }
    }

    async fn update(&self, id: &str, patch: CommentPatch) -> StorageResult<Lookup<Comment>> {
        let Some(existing) = self.find_model(id).await? else {
            return Ok(Lookup::from_option(None, ENTITY));
        };

        let mut comment: comments::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            comment.name = Set(required("name", Some(name))?);
        }
        if let Some(email) = patch.email {
            comment.email = Set(required("email", Some(email))?);
        }
        if let Some(body) = patch.body {
            let body = required("body", Some(body))?;
            comment.body_folded = Set(fold_case(&body));
            comment.body = Set(body);
        }
        if let Some(post_id) = patch.post_id {
            comment.post_id = Set(required("postId", Some(post_id))?);
        }
        comment.updated_at = Set(Utc::now());

        let updated = comment.update(&self.db).await?;
        Ok(Lookup::Found(Comment::from(updated)))
    }

    async fn delete(&self, id: &str) -> StorageResult<Lookup<Comment>> {
        let Some(existing) = self.find_model(id).await? else {
            return Ok(Lookup::from_option(None, ENTITY));
        };

        let result = comments::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(Lookup::from_option(None, ENTITY));
        }

        Ok(Lookup::Found(Comment::from(existing)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::errors::NotFound;

    fn draft(post_id: &str, body: &str) -> CommentDraft {
        CommentDraft {
            name: Some("Reader".to_string()),
            email: Some("reader@example.com".to_string()),
            body: Some(body.to_string()),
            post_id: Some(post_id.to_string()),
        }
    }

    #[tokio::test]
    async fn test_save_requires_every_field() {
        let storage = CommentStorage::new(setup_test_db().await);

        let mut missing_post = draft("p1", "text");
        missing_post.post_id = None;
        let err = storage.save(missing_post).await.unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("postId"));

        let mut blank_email = draft("p1", "text");
        blank_email.email = Some(String::new());
        assert!(storage.save(blank_email).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_find_by_post_reference() {
        let storage = CommentStorage::new(setup_test_db().await);
        storage.save(draft("p1", "first")).await.unwrap();
        storage.save(draft("p1", "second")).await.unwrap();
        storage.save(draft("p2", "other")).await.unwrap();

        let on_p1 = storage.find(CommentFilter::for_post("p1")).await.unwrap();
        assert_eq!(on_p1.len(), 2);
        assert!(on_p1.iter().all(|comment| comment.post_id == "p1"));
    }

    #[tokio::test]
    async fn test_missing_ids_return_marker() {
        let storage = CommentStorage::new(setup_test_db().await);
        let marker = Lookup::NotFound(NotFound::entity("Comment"));

        assert_eq!(storage.find_by_id("nope").await.unwrap(), marker);
        assert_eq!(
            storage.update("nope", CommentPatch::default()).await.unwrap(),
            marker
        );
        assert_eq!(storage.delete("nope").await.unwrap(), marker);
    }

    #[tokio::test]
    async fn test_update_keeps_absent_fields() {
        let storage = CommentStorage::new(setup_test_db().await);
        let saved = storage.save(draft("p1", "typo")).await.unwrap();

        let updated = storage
            .update(
                &saved.id,
                CommentPatch {
                    body: Some("fixed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .found()
            .unwrap();

        assert_eq!(updated.body, "fixed");
        assert_eq!(updated.name, saved.name);
        assert_eq!(updated.email, saved.email);
        assert_eq!(updated.post_id, "p1");
    }

    #[tokio::test]
    async fn test_find_body_contains_folds_non_ascii() {
        let storage = CommentStorage::new(setup_test_db().await);
        storage.save(draft("p1", "Ça marche TRÈS bien")).await.unwrap();
        storage.save(draft("p1", "plain ascii")).await.unwrap();

        let hits = storage
            .find(CommentFilter::body_contains("très"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].body, "Ça marche TRÈS bien");

        let hits = storage.find(CommentFilter::body_contains("ça")).await.unwrap();
        assert_eq!(hits.len(), 1);
    }
}
