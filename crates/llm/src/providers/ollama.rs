use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::http::{build_client, post_json, text_at};
use crate::provider::{LlmError, LlmProvider, Message};

pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(url: String, model: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_client(timeout)?,
            url,
            model,
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));

        let api_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        let body = json!({
            "model": self.model,
            "messages": api_messages,
            "stream": false,
            "options": {
                "temperature": temperature,
                "num_predict": max_tokens,
            },
        });

        debug!(model = %self.model, "Ollama request to {}", url);

        let resp = post_json(self.client.post(&url), &body).await?;
        text_at(&resp, "/message/content")
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
