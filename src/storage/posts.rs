use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use super::{contains_ignore_case, fold_case, required, DocumentStorage};
use crate::database::entities::posts;
use crate::errors::{Lookup, StorageError, StorageResult};

const ENTITY: &str = "Post";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author: String,
    pub email: Option<String>,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<posts::Model> for Post {
    fn from(model: posts::Model) -> Self {
        Self {
            id: model.doc_id,
            author: model.author,
            email: model.email,
            title: model.title,
            body: model.body,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Field set for a new post; `author`, `title` and `body` are required.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PostDraft {
    pub author: Option<String>,
    pub email: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PostPatch {
    pub author: Option<String>,
    pub email: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct PostFilter {
    pub body_contains: Option<String>,
}

impl PostFilter {
    pub fn body_contains(needle: impl Into<String>) -> Self {
        Self {
            body_contains: Some(needle.into()),
        }
    }
}

/// Post adapter borrowing the shared connection pool.
#[derive(Clone)]
pub struct PostStorage {
    db: DatabaseConnection,
}

impl PostStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: &str) -> StorageResult<Option<posts::Model>> {
        Ok(posts::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?)
    }
}

#[async_trait]
impl DocumentStorage for PostStorage {
    type Document = Post;
    type Draft = PostDraft;
    type Patch = PostPatch;
    type Filter = PostFilter;

    async fn find(&self, filter: PostFilter) -> StorageResult<Vec<Post>> {
        let mut query = posts::Entity::find()
            .order_by_asc(posts::Column::CreatedAt)
            .order_by_asc(posts::Column::DocId);

        if let Some(needle) = filter.body_contains.as_deref() {
            query = query.filter(contains_ignore_case(posts::Column::BodyFolded, needle));
        }

        let models = query.all(&self.db).await?;
        Ok(models.into_iter().map(Post::from).collect())
    }

    async fn find_by_id(&self, id: &str) -> StorageResult<Lookup<Post>> {
        let model = self.find_model(id).await?;
        Ok(Lookup::from_option(model.map(Post::from), ENTITY))
    }

    async fn save(&self, draft: PostDraft) -> StorageResult<Post> {
        let result = async {
            let author = required("author", draft.author)?;
            let title = required("title", draft.title)?;
            let body = required("body", draft.body)?;

            let now = Utc::now();
            let post = posts::ActiveModel {
                doc_id: Set(Uuid::new_v4().to_string()),
                author: Set(author),
                email: Set(draft.email),
                title: Set(title),
                body_folded: Set(fold_case(&body)),
                body: Set(body),
                created_at: Set(now),
                updated_at: Set(now),
            };

            Ok::<_, StorageError>(post.insert(&self.db).await?)
        }
        .await;

        match result {
            Ok(model) => {
                debug!("Saved post {}", model.doc_id);
                Ok(Post::from(model))
            }
            Err(err) => {
                error!("Failed to save post: {}", err);
                Err(err)
            }
        }
    }

    async fn update(&self, id: &str, patch: PostPatch) -> StorageResult<Lookup<Post>> {
        let Some(existing) = self.find_model(id).await? else {
            return Ok(Lookup::from_option(None, ENTITY));
        };

        let mut post: posts::ActiveModel = existing.into();
        if let Some(author) = patch.author {
            post.author = Set(required("author", Some(author))?);
        }
        if let Some(email) = patch.email {
            post.email = Set(Some(email));
        }
        if let Some(title) = patch.title {
            post.title = Set(required("title", Some(title))?);
        }
        if let Some(body) = patch.body {
            let body = required("body", Some(body))?;
            post.body_folded = Set(fold_case(&body));
            post.body = Set(body);
        }
        post.updated_at = Set(Utc::now());

        let updated = post.update(&self.db).await?;
        Ok(Lookup::Found(Post::from(updated)))
    }

    async fn delete(&self, id: &str) -> StorageResult<Lookup<Post>> {
        let Some(existing) = self.find_model(id).await? else {
            return Ok(Lookup::from_option(None, ENTITY));
        };

        let result = posts::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;

        // Removed by someone else between the read and the delete
        if result.rows_affected == 0 {
            return Ok(Lookup::from_option(None, ENTITY));
        }

        Ok(Lookup::Found(Post::from(existing)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::errors::NotFound;

    fn draft(author: &str, title: &str, body: &str) -> PostDraft {
        PostDraft {
            author: Some(author.to_string()),
            email: None,
            title: Some(title.to_string()),
            body: Some(body.to_string()),
        }
    }

    #[tokio::test]
    async fn test_save_then_find_by_id_exposes_id() {
        let storage = PostStorage::new(setup_test_db().await);

        let saved = storage.save(draft("A", "T", "hello world")).await.unwrap();
        let found = storage.find_by_id(&saved.id).await.unwrap().found().unwrap();

        assert_eq!(found, saved);
        assert_eq!(found.author, "A");
        assert_eq!(found.title, "T");
        assert_eq!(found.body, "hello world");

        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["id"], saved.id.as_str());
        assert!(json.get("_id").is_none());
        assert!(json.get("docId").is_none());
        assert!(json["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_save_rejects_missing_required_field() {
        let storage = PostStorage::new(setup_test_db().await);

        let err = storage
            .save(PostDraft {
                author: Some("A".to_string()),
                title: None,
                body: Some("b".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        match err {
            StorageError::Validation { field, .. } => assert_eq!(field, "title"),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(storage.find(PostFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_ids_return_marker() {
        let storage = PostStorage::new(setup_test_db().await);
        let marker = NotFound::entity("Post");

        assert_eq!(
            storage.find_by_id("missing").await.unwrap(),
            Lookup::NotFound(marker.clone())
        );
        assert_eq!(
            storage
                .update("missing", PostPatch::default())
                .await
                .unwrap(),
            Lookup::NotFound(marker.clone())
        );
        assert_eq!(
            storage.delete("missing").await.unwrap(),
            Lookup::NotFound(marker)
        );
    }

    #[tokio::test]
    async fn test_update_merges_partial_patch() {
        let storage = PostStorage::new(setup_test_db().await);
        let saved = storage.save(draft("A", "T", "original")).await.unwrap();

        let updated = storage
            .update(
                &saved.id,
                PostPatch {
                    title: Some("New title".to_string()),
                    email: Some("a@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .found()
            .unwrap();

        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.title, "New title");
        assert_eq!(updated.email.as_deref(), Some("a@example.com"));
        assert_eq!(updated.author, "A");
        assert_eq!(updated.body, "original");
        assert_eq!(updated.created_at, saved.created_at);
    }

    #[tokio::test]
    async fn test_delete_returns_removed_document() {
        let storage = PostStorage::new(setup_test_db().await);
        let saved = storage.save(draft("A", "T", "bye")).await.unwrap();

        let deleted = storage.delete(&saved.id).await.unwrap().found().unwrap();
        assert_eq!(deleted.id, saved.id);
        assert!(storage.find_by_id(&saved.id).await.unwrap().is_not_found());
    }

    #[tokio::test]
    async fn test_find_body_contains_is_case_insensitive() {
        let storage = PostStorage::new(setup_test_db().await);
        storage.save(draft("A", "T", "Hello World")).await.unwrap();
        storage.save(draft("B", "T", "goodbye")).await.unwrap();
        storage.save(draft("C", "T", "100% literal")).await.unwrap();

        let hits = storage.find(PostFilter::body_contains("hello")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].author, "A");

        // Wildcards in the needle are literal
        let hits = storage.find(PostFilter::body_contains("0%")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].author, "C");

        assert_eq!(storage.find(PostFilter::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_find_body_contains_folds_non_ascii() {
        let storage = PostStorage::new(setup_test_db().await);
        let saved = storage.save(draft("A", "T", "ÉCOLE primaire")).await.unwrap();

        let hits = storage.find(PostFilter::body_contains("école")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].body, "ÉCOLE primaire");

        storage
            .update(
                &saved.id,
                PostPatch {
                    body: Some("Über alles".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(storage
            .find(PostFilter::body_contains("école"))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            storage.find(PostFilter::body_contains("ÜBER")).await.unwrap().len(),
            1
        );
    }
}
