//! Retrieval-augmented chat: a conversational widget and the backend it talks to.
//!
//! # Architecture
//!
//! - **Widget**: transcript, typewriter rendering and submit flow, behind
//!   `ChatTransport` and `ChatView` seams
//! - **Server**: Axum HTTP server exposing `POST /api/chat`
//! - **RAG**: passage ingest, BM25 or embedding retrieval, prompt assembly
//! - **LLM**: OpenAI-compatible Chat Completions client
//!
//! # Modules
//!
//! - [`widget`]: chat widget core and terminal front end
//! - [`protocol`]: request/response bodies shared by client and server
//! - [`server`]: HTTP routes and startup
//! - [`rag`]: passage index, retrievers and prompt builder
//! - [`llm`]: chat model trait and client
//! - [`config`]: layered configuration and CLI

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod llm;
pub mod protocol;
pub mod rag;
pub mod server;
pub mod widget;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::ChatModel;
use crate::rag::Retriever;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Model that writes the reply.
    pub chat_model: Arc<dyn ChatModel>,
    /// Context passage ranking.
    pub retriever: Arc<dyn Retriever>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish()
    }
}
