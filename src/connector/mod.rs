//! Read-only connector to the upstream TV show service.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::UpstreamResult;

pub use http::HttpShowConnector;

/// Query selecting the first listing page; page size is fixed by the upstream
pub const SHOWS_FIRST_PAGE: &str = "page=1";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: i64,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub status: Option<String>,
    pub runtime: Option<i64>,
    pub premiered: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aka {
    pub name: Option<String>,
    pub country: Option<Country>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub name: Option<String>,
    pub code: Option<String>,
    pub timezone: Option<String>,
}

/// Capability set for reading shows from upstream.
#[async_trait]
pub trait ShowConnector: Send + Sync {
    async fn get_shows(&self) -> UpstreamResult<Vec<Show>>;

    async fn get_show_by_id(&self, id: &str) -> UpstreamResult<Show>;

    async fn get_shows_akas(&self, id: &str) -> UpstreamResult<Vec<Aka>>;
}
