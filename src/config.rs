//! Layered configuration: defaults, config file, environment, CLI flags.

use clap::{Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE", global = true)]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT", global = true)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Disable timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED", global = true)]
    pub timeout_disabled: Option<bool>,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Chat from the terminal against a running server
    Chat {
        /// Server base URL (overrides widget.base_url)
        #[arg(long)]
        url: Option<String>,
    },
    /// Split a corpus directory into passages and write the index
    Ingest {
        /// Directory with .txt/.md documents (overrides retrieval.corpus_dir)
        #[arg(long)]
        corpus_dir: Option<String>,
        /// Output file (overrides retrieval.index_path)
        #[arg(long)]
        index_path: Option<String>,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub widget: WidgetConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub static_dir: String,
}

#[derive(Deserialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    /// Azure deployment name (Azure `OpenAI` only).
    pub deployment_name: Option<String>,
    /// Azure API version (Azure `OpenAI` only).
    pub api_version: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("deployment_name", &self.deployment_name)
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalBackend {
    /// BM25 over passage text.
    #[default]
    Lexical,
    /// Cosine similarity over sentence embeddings.
    Embedding,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    pub backend: RetrievalBackend,
    pub index_path: String,
    pub corpus_dir: String,
    pub top_k: usize,
    pub chunk_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetConfig {
    pub base_url: String,
    pub typewriter_delay_ms: u64,
    pub greeting: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub timeout_disabled: bool,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    /// Build the configuration for an already parsed command line.
    ///
    /// Priority: CLI flag > CLI env var > `RAGCHAT_*` env > config file > defaults.
    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 5000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.static_dir", "static")?
            .set_default("llm.base_url", "https://api.openai.com")?
            .set_default("llm.model", "gpt-3.5-turbo")?
            .set_default("llm.temperature", 0.8)?
            .set_default("llm.top_p", 0.9)?
            .set_default("retrieval.backend", "lexical")?
            .set_default("retrieval.index_path", "passages.jsonl")?
            .set_default("retrieval.corpus_dir", "corpus")?
            .set_default("retrieval.top_k", 3)?
            .set_default("retrieval.chunk_size", 1000)?
            .set_default("widget.base_url", "http://127.0.0.1:5000")?
            .set_default("widget.typewriter_delay_ms", 30)?
            .set_default("widget.greeting", crate::widget::DEFAULT_GREETING)?
            .set_default("resilience.timeout_disabled", false)?
            .set_default("resilience.request_timeout_secs", 60)?;

        // 2. Config file: explicit path must exist, ./config.* is optional
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // 3. Environment variables prefixed with RAGCHAT_, e.g. RAGCHAT_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("RAGCHAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. Conventional LLM variables
        if let Some(key) = first_non_empty(&["LLM_API_KEY", "OPENAI_API_KEY"]) {
            builder = builder.set_override("llm.api_key", key)?;
        }
        if let Some(url) = first_non_empty(&["LLM_BASE_URL"]) {
            builder = builder.set_override("llm.base_url", url)?;
        }
        if let Some(model) = first_non_empty(&["LLM_MODEL"]) {
            builder = builder.set_override("llm.model", model)?;
        }
        if let Some(deployment) = first_non_empty(&["AZURE_DEPLOYMENT_NAME"]) {
            builder = builder.set_override("llm.deployment_name", deployment)?;
        }
        if let Some(version) = first_non_empty(&["AZURE_API_VERSION"]) {
            builder = builder.set_override("llm.api_version", version)?;
        }

        // 5. CLI overrides
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(host) = &cli.host {
            builder = builder.set_override("server.host", host.as_str())?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("resilience.timeout_disabled", td)?;
        }
        match &cli.command {
            Some(Command::Chat { url: Some(url) }) => {
                builder = builder.set_override("widget.base_url", url.as_str())?;
            }
            Some(Command::Ingest {
                corpus_dir,
                index_path,
            }) => {
                if let Some(dir) = corpus_dir {
                    builder = builder.set_override("retrieval.corpus_dir", dir.as_str())?;
                }
                if let Some(path) = index_path {
                    builder = builder.set_override("retrieval.index_path", path.as_str())?;
                }
            }
            _ => {}
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.llm.base_url.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "llm.base_url cannot be empty".to_string(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "llm.model cannot be empty".to_string(),
            ));
        }
        if self.retrieval.chunk_size == 0 {
            return Err(config::ConfigError::Message(
                "retrieval.chunk_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn first_non_empty(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}
