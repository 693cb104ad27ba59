//! Provider-specific URL and authentication handling.

/// API version used for Azure when none is configured.
const DEFAULT_AZURE_API_VERSION: &str = "2024-08-01-preview";

/// Supported LLM providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// `OpenAI` (api.openai.com)
    OpenAI,
    /// Azure `OpenAI` Service
    AzureOpenAI {
        /// Deployment name; Azure routes by deployment, not model
        deployment_name: String,
        /// API version (e.g., "2024-08-01-preview")
        api_version: String,
    },
    /// `OpenRouter` (openrouter.ai)
    OpenRouter,
    /// Groq (groq.com)
    Groq,
    /// Generic OpenAI-compatible server (vLLM, Ollama, LM Studio...)
    Generic,
}

impl Provider {
    /// Detect provider from base URL.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ragchat::llm::Provider;
    ///
    /// let provider = Provider::detect_from_url("https://api.openai.com");
    /// assert_eq!(provider, Provider::OpenAI);
    /// ```
    #[must_use]
    pub fn detect_from_url(base_url: &str) -> Self {
        let lower = base_url.to_lowercase();

        if lower.contains("openai.azure.com") || lower.contains("azure.com") {
            Self::AzureOpenAI {
                deployment_name: String::new(),
                api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            }
        } else if lower.contains("openrouter.ai") {
            Self::OpenRouter
        } else if lower.contains("groq.com") {
            Self::Groq
        } else if lower.contains("openai.com") {
            Self::OpenAI
        } else {
            Self::Generic
        }
    }

    /// Fill in Azure deployment details; other providers are returned as is.
    #[must_use]
    pub fn with_azure_deployment(self, deployment: Option<&str>, api_version: Option<&str>) -> Self {
        match self {
            Self::AzureOpenAI {
                deployment_name,
                api_version: detected_version,
            } => Self::AzureOpenAI {
                deployment_name: deployment.map_or(deployment_name, ToString::to_string),
                api_version: api_version.map_or(detected_version, ToString::to_string),
            },
            other => other,
        }
    }

    /// Build the chat completions URL for this provider.
    #[must_use]
    pub fn build_chat_url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');

        match self {
            Self::AzureOpenAI {
                deployment_name,
                api_version,
            } => format!(
                "{base}/openai/deployments/{deployment_name}/chat/completions?api-version={api_version}"
            ),
            Self::Groq if !base.ends_with("/openai") => {
                format!("{base}/openai/v1/chat/completions")
            }
            _ => format!("{base}/v1/chat/completions"),
        }
    }

    /// Attach the API key the way this provider expects it.
    #[must_use]
    pub fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        api_key: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match (self, api_key) {
            (_, None) => request,
            (Self::AzureOpenAI { .. }, Some(key)) => request.header("api-key", key),
            (_, Some(key)) => request.bearer_auth(key),
        }
    }

    /// Whether the request body should name the model.
    ///
    /// Azure picks the model from the deployment in the URL.
    #[must_use]
    pub fn sends_model(&self) -> bool {
        !matches!(self, Self::AzureOpenAI { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_openai() {
        let provider = Provider::detect_from_url("https://api.openai.com");
        assert_eq!(provider, Provider::OpenAI);
    }

    #[test]
    fn test_detect_azure() {
        let provider = Provider::detect_from_url("https://my-resource.openai.azure.com");
        assert!(matches!(provider, Provider::AzureOpenAI { .. }));
    }

    #[test]
    fn test_detect_local_server_is_generic() {
        let provider = Provider::detect_from_url("http://localhost:11434");
        assert_eq!(provider, Provider::Generic);
    }

    #[test]
    fn test_build_url_openai() {
        let url = Provider::OpenAI.build_chat_url("https://api.openai.com/");
        assert_eq!(url, "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_build_url_groq() {
        let url = Provider::Groq.build_chat_url("https://api.groq.com");
        assert_eq!(url, "https://api.groq.com/openai/v1/chat/completions");
    }

    #[test]
    fn test_azure_deployment_override() {
        let provider = Provider::detect_from_url("https://my-resource.openai.azure.com")
            .with_azure_deployment(Some("gpt-35"), None);
        let url = provider.build_chat_url("https://my-resource.openai.azure.com");
        assert_eq!(
            url,
            "https://my-resource.openai.azure.com/openai/deployments/gpt-35/chat/completions?api-version=2024-08-01-preview"
        );
        assert!(!provider.sends_model());
    }

    #[test]
    fn test_deployment_ignored_for_openai() {
        let provider = Provider::OpenAI.with_azure_deployment(Some("gpt-35"), Some("v1"));
        assert_eq!(provider, Provider::OpenAI);
        assert!(provider.sends_model());
    }
}
