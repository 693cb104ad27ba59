//! Chat model client.
//!
//! The backend answers each widget request with one non-streaming call to an
//! `OpenAI`-compatible Chat Completions API.
//!
//! # Overview
//!
//! The [`ChatModel`] trait is the seam the HTTP handler depends on;
//! [`ChatCompletionsClient`] is the production implementation and
//! [`Provider`] captures per-vendor URL and auth differences.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragchat::llm::{ChatCompletionsClient, ChatModel, LlmSettings, PromptMessage};
//!
//! let client = ChatCompletionsClient::new(LlmSettings::from(&config.llm));
//! let reply = client.complete(&[PromptMessage::user("Hello")]).await?;
//! ```

pub mod chat_completions;
pub mod provider;

pub use chat_completions::ChatCompletionsClient;
pub use provider::Provider;

use crate::config::LlmConfig;
use crate::widget::{Message, Role};

/// LLM connection and sampling settings.
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// Optional API key for authentication.
    pub api_key: Option<String>,
    /// Model identifier (e.g., `gpt-3.5-turbo`).
    pub model: String,
    /// Provider type (detected from `base_url`).
    pub provider: Provider,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling threshold.
    pub top_p: f32,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .finish()
    }
}

impl From<&LlmConfig> for LlmSettings {
    fn from(config: &LlmConfig) -> Self {
        let provider = Provider::detect_from_url(&config.base_url).with_azure_deployment(
            config.deployment_name.as_deref(),
            config.api_version.as_deref(),
        );

        Self {
            base_url: config.base_url.clone(),
            api_key: config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            model: config.model.clone(),
            provider,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }
}

/// Role of a prompt message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

impl From<Role> for MessageRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::Assistant => Self::Assistant,
        }
    }
}

/// A message sent to the model.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PromptMessage {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content.
    pub content: String,
}

impl PromptMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

impl From<&Message> for PromptMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role().into(),
            content: message.content().to_string(),
        }
    }
}

/// A model that turns a conversation into one reply.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete the conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply has no text.
    async fn complete(&self, messages: &[PromptMessage]) -> anyhow::Result<String>;
}
