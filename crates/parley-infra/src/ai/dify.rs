//! Dify chat backend.
//!
//! Calls the Dify `chat-messages` endpoint in blocking mode. Dify keeps the
//! conversation history server-side; the `conversation_id` it returns is
//! stored on the session and sent back on the next turn.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the `Authorization` header.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use parley_core::ai::{AiBackend, AiError, AiReply};
use parley_types::config::AiConfig;

/// Request body for `POST /chat-messages`.
#[derive(Debug, Serialize)]
struct ChatMessageRequest<'a> {
    inputs: serde_json::Map<String, serde_json::Value>,
    query: &'a str,
    response_mode: &'static str,
    /// Empty string starts a new conversation.
    conversation_id: &'a str,
    user: &'a str,
    files: Vec<serde_json::Value>,
}

/// The subset of the blocking-mode response we use.
#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    answer: String,
    #[serde(default)]
    conversation_id: Option<String>,
}

/// Dify-backed implementation of [`AiBackend`].
pub struct DifyBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl DifyBackend {
    pub fn new(config: &AiConfig, api_key: SecretString) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AiError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/chat-messages", self.base_url)
    }
}

impl AiBackend for DifyBackend {
    async fn chat(
        &self,
        conversation_ref: Option<&str>,
        user_key: &str,
        query: &str,
    ) -> Result<AiReply, AiError> {
        let body = ChatMessageRequest {
            inputs: serde_json::Map::new(),
            query,
            response_mode: "blocking",
            conversation_id: conversation_ref.unwrap_or(""),
            user: user_key,
            files: Vec::new(),
        };

        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout
                } else {
                    AiError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatMessageResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AiError::Timeout
            } else {
                AiError::InvalidResponse(e.to_string())
            }
        })?;

        tracing::debug!(user_key, answer_len = parsed.answer.len(), "AI backend answered");

        Ok(AiReply {
            answer: parsed.answer,
            conversation_ref: parsed.conversation_id.filter(|id| !id.is_empty()),
        })
    }
}
