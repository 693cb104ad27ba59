use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;

use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use tracing::{error, info, warn};

use crate::AppState;
use crate::config::AppConfig;
use crate::llm::{ChatCompletionsClient, LlmSettings};
use crate::protocol::{CHAT_PATH, ChatReply, ChatRequest, ErrorBody};
use crate::rag::{self, prompt::build_prompt};

/// Request bodies are a short conversation; anything larger is rejected.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let settings = LlmSettings::from(&config.llm);
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        provider = ?settings.provider,
        "LLM configuration loaded"
    );
    if settings.api_key.is_none() {
        warn!("No LLM API key configured; set LLM_API_KEY or OPENAI_API_KEY");
    }

    let retriever = rag::load_retriever(&config.retrieval).await?;
    let chat_model = Arc::new(ChatCompletionsClient::new(settings));

    let state = AppState {
        chat_model,
        retriever,
        config: Arc::clone(&config),
    };

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
///
/// The timeout layer is always installed; disabling it only stretches the
/// deadline so the router type stays the same.
pub fn router(state: AppState) -> Router {
    let timeout_duration = if state.config.resilience.timeout_disabled {
        Duration::from_secs(365 * 24 * 60 * 60)
    } else {
        Duration::from_secs(state.config.resilience.request_timeout_secs)
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route(CHAT_PATH, post(api_chat))
        .nest_service("/static", ServeDir::new(&state.config.server.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Pages
// ─────────────────────────────────────────────────────────────────────────────

fn html_shell(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <link rel="stylesheet" href="/static/style.css">
    <script defer src="/static/script.js"></script>
</head>
<body>
    <main id="app">
        {content}
    </main>
</body>
</html>"#
    )
}

fn chat_content() -> &'static str {
    r#"
    <div class="chat-container">
        <div id="chat-window" class="chat-window"></div>
        <form id="chat-form" class="chat-input">
            <input id="query" type="text" autocomplete="off" placeholder="Ask a question...">
            <button id="send-btn" type="submit" disabled>Send</button>
        </form>
    </div>
    "#
}

/// GET / - Chat page.
async fn index_handler() -> impl IntoResponse {
    Html(html_shell("RAG Chat", chat_content()))
}

/// GET /health - Liveness probe.
async fn health_handler() -> &'static str {
    "ok"
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// POST /api/chat - Answer one question using retrieved context.
async fn api_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    info!(
        name: "chat.request",
        history_len = req.history.len(),
        query = %req.query,
        "Received chat request"
    );

    let top_k = state.config.retrieval.top_k;
    let context = state
        .retriever
        .retrieve(&req.query, top_k)
        .await
        .map_err(|e| {
            error!(error = %e, "Retrieval failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    info!(
        name: "rag.context.retrieved",
        passages = context.len(),
        "Retrieved context"
    );
    for (i, passage) in context.iter().enumerate() {
        tracing::debug!(rank = i + 1, passage = %passage, "Context passage");
    }

    let messages = build_prompt(&req.history, &context, &req.query);
    let response = state.chat_model.complete(&messages).await.map_err(|e| {
        error!(error = %e, "Chat model call failed");
        api_error(StatusCode::BAD_GATEWAY, e.to_string())
    })?;

    Ok(Json(ChatReply { response }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_page_has_widget_elements() {
        let page = html_shell("RAG Chat", chat_content());
        for id in ["chat-window", "query", "send-btn"] {
            assert!(page.contains(&format!("id=\"{id}\"")), "missing #{id}");
        }
        assert!(page.contains("/static/script.js"));
    }
}
