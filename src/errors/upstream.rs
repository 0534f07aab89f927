//! Upstream show service errors

use thiserror::Error;

/// Errors raised by the show connector
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The request could not be sent or the body could not be read
    #[error("Upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The configured root and path did not form a valid URL
    #[error("Invalid upstream url: {0}")]
    Url(#[from] url::ParseError),

    /// The body was not JSON, or not shaped like the expected payload
    #[error("Failed to decode upstream payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Transport succeeded but the body reports an error
    #[error("Upstream reported an error: {0}")]
    Application(String),

    /// Non-success status without an error body
    #[error("Upstream responded with status {0}")]
    Status(u16),
}
