use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::http::{build_client, post_json, text_at};
use crate::provider::{LlmError, LlmProvider, Message, Role};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

pub struct ClaudeProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ClaudeProvider {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        // Claude API uses separate system parameter
        let (system, chat): (Vec<Message>, Vec<Message>) =
            messages.into_iter().partition(|m| m.role == Role::System);

        let api_messages: Vec<serde_json::Value> = chat
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        if !system.is_empty() {
            let joined = system
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            body["system"] = json!(joined);
        }

        debug!(model = %self.model, "Claude request to {}", MESSAGES_URL);

        let request = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01");
        let resp = post_json(request, &body).await?;
        text_at(&resp, "/content/0/text")
    }

    fn name(&self) -> &str {
        "claude"
    }
}
