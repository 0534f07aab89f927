use std::sync::Arc;

use async_graphql::dynamic::ResolverContext;
use sea_orm::DatabaseConnection;
use url::Url;

use crate::connector::{HttpShowConnector, ShowConnector};
use crate::storage::{CommentStorage, DynCommentStorage, DynPostStorage, PostStorage};

/// Per-request bundle of data collaborators handed to every resolver.
///
/// Built fresh for each HTTP request or WebSocket connection, so nothing
/// cached by one request is visible to the next.
#[derive(Clone)]
pub struct RequestContext {
    post_storage: Arc<DynPostStorage>,
    comment_storage: Arc<DynCommentStorage>,
    show_connector: Arc<dyn ShowConnector>,
}

impl RequestContext {
    /// Assemble a context from arbitrary collaborators, real or fake.
    pub fn new(
        post_storage: Arc<DynPostStorage>,
        comment_storage: Arc<DynCommentStorage>,
        show_connector: Arc<dyn ShowConnector>,
    ) -> Self {
        Self {
            post_storage,
            comment_storage,
            show_connector,
        }
    }

    pub fn post_storage(&self) -> &DynPostStorage {
        self.post_storage.as_ref()
    }

    pub fn comment_storage(&self) -> &DynCommentStorage {
        self.comment_storage.as_ref()
    }

    pub fn show_connector(&self) -> &dyn ShowConnector {
        self.show_connector.as_ref()
    }

    /// The context attached to the request a resolver runs in.
    pub fn of<'a>(ctx: &ResolverContext<'a>) -> async_graphql::Result<&'a RequestContext> {
        ctx.ctx.data::<RequestContext>()
    }
}

/// Produces a [`RequestContext`] per request from long-lived resources.
#[derive(Clone)]
pub struct ContextFactory {
    db: DatabaseConnection,
    http: reqwest::Client,
    shows_api_root: Url,
}

impl ContextFactory {
    pub fn new(db: DatabaseConnection, shows_api_root: Url) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("showcase-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(db, http, shows_api_root))
    }

    pub fn with_client(db: DatabaseConnection, http: reqwest::Client, shows_api_root: Url) -> Self {
        Self {
            db,
            http,
            shows_api_root,
        }
    }

    pub fn create(&self) -> RequestContext {
        RequestContext::new(
            Arc::new(PostStorage::new(self.db.clone())),
            Arc::new(CommentStorage::new(self.db.clone())),
            Arc::new(HttpShowConnector::new(
                self.http.clone(),
                self.shows_api_root.clone(),
            )),
        )
    }
}
