use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ChatError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api/chat";

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Body returned by the chat endpoint.
///
/// `error` is only sent alongside `success: false`; extra fields such as the
/// reply role are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(default)]
    pub response: Option<ReplyBody>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyBody {
    pub message: String,
}

/// Sends one chat message and returns the decoded response.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, message: &str) -> Result<ChatResponse, ChatError>;
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for ChatClient {
    async fn send(&self, message: &str) -> Result<ChatResponse, ChatError> {
        debug!(endpoint = %self.endpoint, chars = message.chars().count(), "posting chat message");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { message })
            .send()
            .await?;

        // The backend reports application failures in the body, so the
        // status only matters for diagnostics.
        let status = response.status();
        if !status.is_success() {
            debug!(%status, "chat endpoint returned non-success status");
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(ChatRequest { message: "hi" }).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "hi" }));
    }

    #[test]
    fn test_response_ignores_reply_role() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"success": true, "response": {"role": "user", "message": "hello"}}"#,
        )
        .unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.response.unwrap().message, "hello");
    }

    #[test]
    fn test_response_failure_without_reply() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"success": false, "error": "No message provided"}"#).unwrap();
        assert!(!parsed.success);
        assert!(parsed.response.is_none());
        assert_eq!(parsed.error.as_deref(), Some("No message provided"));
    }

    #[test]
    fn test_response_requires_success_flag() {
        assert!(serde_json::from_str::<ChatResponse>(r#"{"response": {"message": "x"}}"#).is_err());
    }

    #[test]
    fn test_client_keeps_endpoint() {
        let client = ChatClient::new(DEFAULT_ENDPOINT);
        assert_eq!(client.endpoint(), "http://localhost:5000/api/chat");
    }
}
