use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{Aka, Show, ShowConnector, SHOWS_FIRST_PAGE};
use crate::errors::{UpstreamError, UpstreamResult};

/// `ShowConnector` over HTTP GET + JSON against a configured root.
#[derive(Clone, Debug)]
pub struct HttpShowConnector {
    client: reqwest::Client,
    api_root: Url,
}

impl HttpShowConnector {
    pub fn new(client: reqwest::Client, api_root: Url) -> Self {
        Self { client, api_root }
    }

    fn endpoint(&self, segments: &[&str], query: Option<&str>) -> UpstreamResult<Url> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        url.set_query(query);
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> UpstreamResult<T> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let body: Value = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(UpstreamError::Status(status.as_u16())),
            Err(err) => return Err(UpstreamError::Decode(err)),
        };

        // A 200 does not mean the upstream answered the question
        if let Some(message) = embedded_error(&body) {
            warn!("Upstream error from {}: {}", url, message);
            return Err(UpstreamError::Application(message));
        }
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        Ok(serde_json::from_value(body)?)
    }
}

/// Error carried inside an otherwise well-formed body, if any.
fn embedded_error(body: &Value) -> Option<String> {
    let errors = body.get("errors")?;
    let flagged = match errors {
        Value::Null | Value::Bool(false) => false,
        Value::Array(items) => !items.is_empty(),
        _ => true,
    };
    if !flagged {
        return None;
    }

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| errors.to_string());
    Some(message)
}

#[async_trait]
impl ShowConnector for HttpShowConnector {
    async fn get_shows(&self) -> UpstreamResult<Vec<Show>> {
        let url = self.endpoint(&["shows"], Some(SHOWS_FIRST_PAGE))?;
        self.fetch(url).await
    }

    async fn get_show_by_id(&self, id: &str) -> UpstreamResult<Show> {
        let url = self.endpoint(&["shows", id], None)?;
        self.fetch(url).await
    }

    async fn get_shows_akas(&self, id: &str) -> UpstreamResult<Vec<Aka>> {
        let url = self.endpoint(&["shows", id, "akas"], None)?;
        self.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connector(root: &str) -> HttpShowConnector {
        HttpShowConnector::new(reqwest::Client::new(), Url::parse(root).unwrap())
    }

    #[test]
    fn test_endpoint_joins_root() {
        let shows = connector("https://api.tvmaze.com");
        assert_eq!(
            shows
                .endpoint(&["shows"], Some(SHOWS_FIRST_PAGE))
                .unwrap()
                .as_str(),
            "https://api.tvmaze.com/shows?page=1"
        );
        assert_eq!(
            shows.endpoint(&["shows", "82", "akas"], None).unwrap().as_str(),
            "https://api.tvmaze.com/shows/82/akas"
        );

        let nested = connector("http://localhost:9000/v1/");
        assert_eq!(
            nested.endpoint(&["shows", "1"], None).unwrap().as_str(),
            "http://localhost:9000/v1/shows/1"
        );
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let shows = connector("https://api.tvmaze.com");
        assert_eq!(
            shows.endpoint(&["shows", "1/akas"], None).unwrap().as_str(),
            "https://api.tvmaze.com/shows/1%2Fakas"
        );
    }

    #[test]
    fn test_embedded_error_detection() {
        assert_eq!(
            embedded_error(&json!({ "errors": true, "message": "rate limited" })),
            Some("rate limited".to_string())
        );
        assert!(embedded_error(&json!({ "errors": ["bad"] })).is_some());
        assert!(embedded_error(&json!({ "errors": [] })).is_none());
        assert!(embedded_error(&json!({ "errors": null })).is_none());
        assert!(embedded_error(&json!({ "id": 1, "name": "Show" })).is_none());
        assert!(embedded_error(&json!([{ "id": 1 }])).is_none());
    }
}
