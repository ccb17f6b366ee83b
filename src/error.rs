use thiserror::Error;

/// Failures that prevent a chat request from producing a readable response.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}
