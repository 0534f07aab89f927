//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum_test::TestServer;
use sea_orm::{Database, DatabaseConnection};
use showcase::config::GatewayConfig;
use showcase::connector::{Aka, Show, ShowConnector};
use showcase::database::connection::setup_database;
use showcase::errors::{Lookup, StorageError, StorageResult, UpstreamError, UpstreamResult};
use showcase::graphql::RequestContext;
use showcase::server::app::create_app;
use showcase::storage::{
    Comment, CommentDraft, CommentFilter, CommentPatch, CommentStorage, DocumentStorage, Post,
    PostDraft, PostFilter, PostPatch, PostStorage,
};
use tempfile::TempDir;

/// SQLite file in a temporary directory, migrated; the directory lives as long as the guard.
pub async fn test_database() -> Result<(DatabaseConnection, TempDir)> {
    let dir = tempfile::tempdir()?;
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

    let db = Database::connect(&db_url).await?;
    setup_database(&db).await?;

    Ok((db, dir))
}

pub struct TestApp {
    pub server: TestServer,
    pub db: DatabaseConnection,
    _dir: TempDir,
}

/// Full router over a fresh database, shows read from `shows_api_url`.
pub async fn setup_test_app(shows_api_url: &str) -> Result<TestApp> {
    let (db, dir) = test_database().await?;
    let config = GatewayConfig {
        shows_api_url: shows_api_url.to_string(),
        playground: true,
        ..Default::default()
    };

    let app = create_app(db.clone(), &config).await?;
    let server = TestServer::new(app)?;

    Ok(TestApp {
        server,
        db,
        _dir: dir,
    })
}

/// Context over real storages and the given show connector.
pub fn sqlite_context(db: &DatabaseConnection, shows: Arc<dyn ShowConnector>) -> RequestContext {
    RequestContext::new(
        Arc::new(PostStorage::new(db.clone())),
        Arc::new(CommentStorage::new(db.clone())),
        shows,
    )
}

/// Context whose every collaborator fails.
pub fn failing_context() -> RequestContext {
    RequestContext::new(
        Arc::new(FailingPosts),
        Arc::new(FailingComments::default()),
        Arc::new(FailingShows),
    )
}

fn broken() -> StorageError {
    StorageError::Database(sea_orm::DbErr::Custom("disk on fire".to_string()))
}

pub struct FailingPosts;

#[async_trait]
impl DocumentStorage for FailingPosts {
    type Document = Post;
    type Draft = PostDraft;
    type Patch = PostPatch;
    type Filter = PostFilter;

    async fn find(&self, _filter: PostFilter) -> StorageResult<Vec<Post>> {
        Err(broken())
    }

    async fn find_by_id(&self, _id: &str) -> StorageResult<Lookup<Post>> {
        Err(broken())
    }

    async fn save(&self, _draft: PostDraft) -> StorageResult<Post> {
        Err(broken())
    }

    async fn update(&self, _id: &str, _patch: PostPatch) -> StorageResult<Lookup<Post>> {
        Err(broken())
    }

    async fn delete(&self, _id: &str) -> StorageResult<Lookup<Post>> {
        Err(broken())
    }
}

/// Fails every call and counts how often it was asked.
#[derive(Default)]
pub struct FailingComments {
    pub calls: AtomicUsize,
}

impl FailingComments {
    fn fail<T>(&self) -> StorageResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(broken())
    }
}

#[async_trait]
impl DocumentStorage for FailingComments {
    type Document = Comment;
    type Draft = CommentDraft;
    type Patch = CommentPatch;
    type Filter = CommentFilter;

    async fn find(&self, _filter: CommentFilter) -> StorageResult<Vec<Comment>> {
        self.fail()
    }

    async fn find_by_id(&self, _id: &str) -> StorageResult<Lookup<Comment>> {
        self.fail()
    }

    async fn save(&self, _draft: CommentDraft) -> StorageResult<Comment> {
        self.fail()
    }

    async fn update(&self, _id: &str, _patch: CommentPatch) -> StorageResult<Lookup<Comment>> {
        self.fail()
    }

    async fn delete(&self, _id: &str) -> StorageResult<Lookup<Comment>> {
        self.fail()
    }
}

pub struct FailingShows;

#[async_trait]
impl ShowConnector for FailingShows {
    async fn get_shows(&self) -> UpstreamResult<Vec<Show>> {
        Err(UpstreamError::Status(503))
    }

    async fn get_show_by_id(&self, _id: &str) -> UpstreamResult<Show> {
        Err(UpstreamError::Status(503))
    }

    async fn get_shows_akas(&self, _id: &str) -> UpstreamResult<Vec<Aka>> {
        Err(UpstreamError::Application("upstream exploded".to_string()))
    }
}

/// Canned shows, no network.
pub struct StaticShows {
    pub shows: Vec<Show>,
    pub akas: Vec<Aka>,
}

#[async_trait]
impl ShowConnector for StaticShows {
    async fn get_shows(&self) -> UpstreamResult<Vec<Show>> {
        Ok(self.shows.clone())
    }

    async fn get_show_by_id(&self, id: &str) -> UpstreamResult<Show> {
        self.shows
            .iter()
            .find(|show| show.id.to_string() == id)
            .cloned()
            .ok_or(UpstreamError::Status(404))
    }

    async fn get_shows_akas(&self, _id: &str) -> UpstreamResult<Vec<Aka>> {
        Ok(self.akas.clone())
    }
}
