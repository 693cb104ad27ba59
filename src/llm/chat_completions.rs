//! `OpenAI` Chat Completions API client.
//!
//! One request per conversation turn, no streaming: the reply text is read
//! from `choices[0].message.content`.

use anyhow::Context;

use super::{ChatModel, LlmSettings, PromptMessage};

/// Client for the `OpenAI` Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsClient {
    /// Create a new client with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// Request body for a conversation.
    fn body(&self, messages: &[PromptMessage]) -> serde_json::Value {
        let mut body = serde_json::json!({
            "messages": messages,
            "temperature": self.settings.temperature,
            "top_p": self.settings.top_p,
        });
        if self.settings.provider.sends_model() {
            body["model"] = serde_json::Value::String(self.settings.model.clone());
        }
        body
    }
}

#[async_trait::async_trait]
impl ChatModel for ChatCompletionsClient {
    async fn complete(&self, messages: &[PromptMessage]) -> anyhow::Result<String> {
        let url = self.settings.provider.build_chat_url(&self.settings.base_url);

        let rb = self.http.post(&url).json(&self.body(messages));
        let rb = self
            .settings
            .provider
            .authorize(rb, self.settings.api_key.as_deref());

        let resp = rb.send().await?.error_for_status()?;
        let v: serde_json::Value = resp.json().await?;

        if let Some(usage) = v.get("usage") {
            tracing::debug!(
                prompt_tokens = usage["prompt_tokens"].as_u64(),
                completion_tokens = usage["completion_tokens"].as_u64(),
                "Completion usage"
            );
        }

        extract_reply(&v)
    }
}

/// Pull the trimmed assistant text out of a completion response.
fn extract_reply(v: &serde_json::Value) -> anyhow::Result<String> {
    let content = v["choices"][0]["message"]["content"]
        .as_str()
        .context("completion response has no choices[0].message.content")?;
    Ok(content.trim().to_string())
}
