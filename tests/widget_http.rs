//! Widget talking to a real server over HTTP.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use ragchat::AppState;
use ragchat::config::{
    AppConfig, LlmConfig, ResilienceConfig, RetrievalBackend, RetrievalConfig, ServerConfig,
    WidgetConfig,
};
use ragchat::llm::{ChatModel, PromptMessage};
use ragchat::protocol::{CHAT_PATH, ChatReply};
use ragchat::rag::LexicalRetriever;
use ragchat::server::router;
use ragchat::widget::{
    ChatView, ChatWidget, HttpTransport, MessageId, Role, SubmitOutcome, WidgetOptions,
};

/// Echoes the last prompt message back, or fails when the query says so.
struct EchoModel;

#[async_trait]
impl ChatModel for EchoModel {
    async fn complete(&self, messages: &[PromptMessage]) -> anyhow::Result<String> {
        let query = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        if query == "fail" {
            anyhow::bail!("upstream down");
        }
        Ok(format!(
            "You asked: {query} (after {} turns)",
            messages.len() - 2
        ))
    }
}

/// Collects the text of every rendered message.
#[derive(Default)]
struct TextView {
    messages: Mutex<BTreeMap<usize, (Role, String)>>,
}

impl TextView {
    fn texts(&self) -> Vec<(Role, String)> {
        self.messages.lock().unwrap().values().cloned().collect()
    }
}

impl ChatView for TextView {
    fn open_message(&self, id: MessageId, role: Role) {
        self.messages
            .lock()
            .unwrap()
            .insert(id.0, (role, String::new()));
    }

    fn append_text(&self, id: MessageId, text: &str) {
        if let Some((_, body)) = self.messages.lock().unwrap().get_mut(&id.0) {
            body.push_str(text);
        }
    }

    fn set_cursor(&self, _id: MessageId, _visible: bool) {}
    fn set_submit_enabled(&self, _enabled: bool) {}
    fn set_submit_label(&self, _label: &str) {}
    fn clear_input(&self) {}
}

fn config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
            static_dir: "static".to_string(),
        },
        llm: LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.8,
            top_p: 0.9,
            deployment_name: None,
            api_version: None,
        },
        retrieval: RetrievalConfig {
            backend: RetrievalBackend::Lexical,
            index_path: "passages.jsonl".to_string(),
            corpus_dir: "corpus".to_string(),
            top_k: 3,
            chunk_size: 1000,
        },
        widget: WidgetConfig {
            base_url: String::new(),
            typewriter_delay_ms: 0,
            greeting: "Hello! How can I assist you today?".to_string(),
        },
        resilience: ResilienceConfig {
            timeout_disabled: false,
            request_timeout_secs: 5,
        },
    }
}

/// Serve the app on an ephemeral port and return its base URL.
async fn spawn_server() -> String {
    spawn(router(AppState {
        chat_model: Arc::new(EchoModel),
        retriever: Arc::new(LexicalRetriever::new(Vec::new())),
        config: Arc::new(config()),
    }))
    .await
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn options() -> WidgetOptions {
    WidgetOptions {
        char_delay: Duration::ZERO,
        greeting: "Hello! How can I assist you today?".to_string(),
    }
}

#[tokio::test]
async fn test_round_trip_through_server() {
    let base_url = spawn_server().await;
    let view = Arc::new(TextView::default());
    let transport = HttpTransport::new(&base_url).unwrap();
    let mut widget = ChatWidget::new(transport, Arc::clone(&view), options());

    widget.load().await;
    assert_eq!(widget.submit("first").await, SubmitOutcome::Answered);
    assert_eq!(widget.submit("second").await, SubmitOutcome::Answered);
    widget.wait_for_render().await;

    let texts = view.texts();
    assert_eq!(texts.len(), 5);
    assert_eq!(texts[0].1, "Hello! How can I assist you today?");
    assert_eq!(texts[1], (Role::User, "first".to_string()));
    assert_eq!(
        texts[2],
        (Role::Assistant, "You asked: first (after 0 turns)".to_string())
    );
    // The greeting is not sent; the first exchange is.
    assert_eq!(
        texts[4],
        (Role::Assistant, "You asked: second (after 2 turns)".to_string())
    );
    assert_eq!(widget.history().len(), 4);
}

#[tokio::test]
async fn test_server_error_body_is_shown() {
    let base_url = spawn_server().await;
    let view = Arc::new(TextView::default());
    let transport = HttpTransport::new(&base_url).unwrap();
    let mut widget = ChatWidget::new(transport, Arc::clone(&view), options());

    assert_eq!(widget.submit("fail").await, SubmitOutcome::Failed);
    widget.wait_for_render().await;

    let texts = view.texts();
    assert_eq!(texts[1], (Role::Assistant, "Error: upstream down".to_string()));
}

#[tokio::test]
async fn test_unreachable_server() {
    // Reserve a port, then free it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let view = Arc::new(TextView::default());
    let transport = HttpTransport::new(format!("http://{addr}")).unwrap();
    let mut widget = ChatWidget::new(transport, Arc::clone(&view), options());

    assert_eq!(widget.submit("anyone there?").await, SubmitOutcome::Failed);
    widget.wait_for_render().await;

    let texts = view.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[1].1.starts_with("Error: "));
    assert!(!widget.is_busy());

    // Still usable afterwards.
    assert_eq!(widget.history().len(), 2);
}

#[tokio::test]
async fn test_reply_body_wins_over_error_status() {
    let app = Router::new().route(
        CHAT_PATH,
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatReply {
                    response: "ab".to_string(),
                }),
            )
        }),
    );
    let base_url = spawn(app).await;

    let view = Arc::new(TextView::default());
    let transport = HttpTransport::new(&base_url).unwrap();
    let mut widget = ChatWidget::new(transport, Arc::clone(&view), options());

    assert_eq!(widget.submit("hello").await, SubmitOutcome::Answered);
    widget.wait_for_render().await;

    assert_eq!(view.texts()[1], (Role::Assistant, "ab".to_string()));
}
