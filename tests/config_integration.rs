use ragchat::config::{AppConfig, RetrievalBackend};
use serial_test::serial;
use std::env;
use std::fs;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        for name in [
            "RAGCHAT_SERVER__PORT",
            "RAGCHAT_RETRIEVAL__BACKEND",
            "RAGCHAT_RETRIEVAL__TOP_K",
            "CONFIG_FILE",
            "PORT",
            "TIMEOUT_DISABLED",
            "LLM_API_KEY",
            "OPENAI_API_KEY",
            "LLM_BASE_URL",
            "LLM_MODEL",
            "AZURE_DEPLOYMENT_NAME",
            "AZURE_API_VERSION",
        ] {
            env::remove_var(name);
        }
    }
}

fn load(args: &[&str]) -> Result<AppConfig, config::ConfigError> {
    AppConfig::load_from_args(std::iter::once("ragchat").chain(args.iter().copied()))
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = load(&[]).expect("defaults should load");
    assert_eq!(config.server.port, 5000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.llm.model, "gpt-3.5-turbo");
    assert!((config.llm.temperature - 0.8).abs() < f32::EPSILON);
    assert!((config.llm.top_p - 0.9).abs() < f32::EPSILON);
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.retrieval.backend, RetrievalBackend::Lexical);
    assert_eq!(config.widget.typewriter_delay_ms, 30);
    assert!(config.llm.api_key.is_none());
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("RAGCHAT_SERVER__PORT", "9090");
        env::set_var("RAGCHAT_RETRIEVAL__BACKEND", "embedding");
    }

    let config = load(&[]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.retrieval.backend, RetrievalBackend::Embedding);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_beats_env() {
    clear_env_vars();
    unsafe {
        env::set_var("RAGCHAT_SERVER__PORT", "9090");
    }

    let config = load(&["--port", "8181", "serve"]).expect("Failed to load config");
    assert_eq!(config.server.port, 8181);

    clear_env_vars();
}

#[test]
#[serial]
fn test_llm_key_variables() {
    clear_env_vars();
    unsafe {
        env::set_var("OPENAI_API_KEY", "sk-openai");
    }
    let config = load(&[]).unwrap();
    assert_eq!(config.llm.api_key.as_deref(), Some("sk-openai"));

    unsafe {
        env::set_var("LLM_API_KEY", "sk-llm");
    }
    let config = load(&[]).unwrap();
    assert_eq!(config.llm.api_key.as_deref(), Some("sk-llm"));
    assert!(!format!("{:?}", config.llm).contains("sk-llm"));

    clear_env_vars();
}

#[test]
#[serial]
fn test_subcommand_overrides() {
    clear_env_vars();

    let config = load(&["chat", "--url", "http://10.0.0.5:5000"]).unwrap();
    assert_eq!(config.widget.base_url, "http://10.0.0.5:5000");

    let config = load(&["ingest", "--corpus-dir", "docs", "--index-path", "out/p.jsonl"]).unwrap();
    assert_eq!(config.retrieval.corpus_dir, "docs");
    assert_eq!(config.retrieval.index_path, "out/p.jsonl");
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("ragchat.yaml");
    fs::write(
        &file_path,
        r#"
server:
  port: 7070
retrieval:
  top_k: 5
"#,
    )
    .expect("Failed to write temp config");

    // Tell AppConfig to use this file via Env Var (mocking CLI arg indirectly)
    unsafe {
        env::set_var("CONFIG_FILE", &file_path);
    }

    let config = load(&[]).expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.retrieval.top_k, 5);

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_explicit_file_is_error() {
    clear_env_vars();
    assert!(load(&["--config", "/nonexistent/ragchat.yaml"]).is_err());
}

#[test]
#[serial]
fn test_zero_chunk_size_rejected() {
    clear_env_vars();
    unsafe {
        env::set_var("RAGCHAT_RETRIEVAL__CHUNK_SIZE", "0");
    }
    let result = load(&[]);
    unsafe {
        env::remove_var("RAGCHAT_RETRIEVAL__CHUNK_SIZE");
    }
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_cwd_config_fallback() {
    clear_env_vars();

    // Create ./config.yaml
    let config_content = r#"
server:
  port: 6060
    "#;
    let cwd_path = "config.yaml";
    fs::write(cwd_path, config_content).expect("Failed to write ./config.yaml");

    // No Env var, No CLI: should pick up ./config.yaml
    let config = load(&[]);

    fs::remove_file(cwd_path).unwrap();

    assert_eq!(config.expect("Failed to load config").server.port, 6060);
}
