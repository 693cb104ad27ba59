//! Chat widget controller.
//!
//! [`ChatWidget`] owns the conversation history and drives a display surface
//! ([`ChatView`]) and a backend connection ([`ChatTransport`]). It does not
//! know whether it is rendering to a terminal or a browser, or whether the
//! backend is real or mocked.
//!
//! # Flow
//!
//! 1. [`ChatWidget::load`] renders the greeting.
//! 2. [`ChatWidget::submit`] appends the user's message, posts the prior
//!    history plus the query, and appends the reply (or an `"Error: "`
//!    message).
//! 3. Assistant messages are revealed by a [`Typewriter`]; starting a new
//!    render stops the previous animation first.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragchat::widget::{ChatWidget, HttpTransport, TerminalView, WidgetOptions};
//!
//! let transport = HttpTransport::new("http://127.0.0.1:5000")?;
//! let mut widget = ChatWidget::new(transport, Arc::new(TerminalView::new()), WidgetOptions::default());
//! widget.load().await;
//! widget.submit("Who wrote Hamlet?").await;
//! ```

mod error;
mod message;
mod terminal;
mod transport;
mod typewriter;
mod view;

pub use error::{Result, TransportError};
pub use message::{History, Message, Role};
pub use terminal::{TerminalView, run_terminal_chat};
pub use transport::{ChatTransport, HttpTransport};
pub use typewriter::{DEFAULT_CHAR_DELAY, Typewriter, TypewriterHandle};
pub use view::{ChatView, MessageId};

use std::sync::Arc;
use std::time::Duration;

use crate::config::WidgetConfig;
use crate::protocol::ChatRequest;

/// Greeting rendered when the widget loads.
pub const DEFAULT_GREETING: &str = "Hello! How can I assist you today?";

/// Submit control label while idle.
pub const SEND_LABEL: &str = "Send";

/// Submit control label while a request is outstanding.
pub const SENDING_LABEL: &str = "Sending…";

/// Prefix of assistant messages that report a failed round trip.
pub const ERROR_PREFIX: &str = "Error: ";

/// Construction options for [`ChatWidget`].
#[derive(Debug, Clone)]
pub struct WidgetOptions {
    /// Pause between two revealed characters of an assistant message.
    pub char_delay: Duration,
    /// Assistant greeting shown by [`ChatWidget::load`].
    pub greeting: String,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            char_delay: DEFAULT_CHAR_DELAY,
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

impl From<&WidgetConfig> for WidgetOptions {
    fn from(config: &WidgetConfig) -> Self {
        Self {
            char_delay: Duration::from_millis(config.typewriter_delay_ms),
            greeting: config.greeting.clone(),
        }
    }
}

/// What a call to [`ChatWidget::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The query was blank; nothing happened.
    Ignored,
    /// The backend replied and the reply was appended.
    Answered,
    /// The round trip failed and an error message was appended.
    Failed,
}

/// Stateful chat widget: history, rendering and the send cycle.
pub struct ChatWidget<T, V> {
    transport: T,
    view: Arc<V>,
    history: History,
    typewriter: Typewriter,
    greeting: String,
    animation: Option<TypewriterHandle>,
    rendered: usize,
    busy: bool,
}

impl<T, V> std::fmt::Debug for ChatWidget<T, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWidget")
            .field("history_len", &self.history.len())
            .field("rendered", &self.rendered)
            .field("busy", &self.busy)
            .finish_non_exhaustive()
    }
}

impl<T, V> ChatWidget<T, V>
where
    T: ChatTransport,
    V: ChatView + 'static,
{
    /// Create a widget. Nothing is rendered until [`ChatWidget::load`].
    pub fn new(transport: T, view: Arc<V>, options: WidgetOptions) -> Self {
        Self {
            transport,
            view,
            history: History::new(),
            typewriter: Typewriter::new(options.char_delay),
            greeting: options.greeting,
            animation: None,
            rendered: 0,
            busy: false,
        }
    }

    /// Conversation so far, in append order.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether a request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Number of messages rendered, greeting included.
    pub fn rendered_count(&self) -> usize {
        self.rendered
    }

    /// Render the greeting.
    ///
    /// The greeting goes through the normal render path but is not part of
    /// the history sent to the backend.
    pub async fn load(&mut self) {
        let greeting = Message::assistant(self.greeting.clone());
        self.render(&greeting).await;
    }

    /// The query input changed: the submit control follows whether there is
    /// anything to send, unless a request is outstanding.
    pub fn input_changed(&self, text: &str) {
        if !self.busy {
            self.view.set_submit_enabled(!text.trim().is_empty());
        }
    }

    /// Send a query and append the reply.
    ///
    /// Blank queries are ignored. Failures never propagate: they become an
    /// assistant message starting with [`ERROR_PREFIX`].
    pub async fn submit(&mut self, query: &str) -> SubmitOutcome {
        let query = query.trim();
        if query.is_empty() {
            return SubmitOutcome::Ignored;
        }

        self.busy = true;
        self.view.set_submit_enabled(false);
        self.view.set_submit_label(SENDING_LABEL);

        let request = ChatRequest {
            history: self.history.snapshot(),
            query: query.to_string(),
        };
        self.add_message(Message::user(query)).await;
        self.view.clear_input();

        tracing::debug!(
            history_len = request.history.len(),
            "Sending chat request"
        );

        let outcome = match self.transport.send(&request).await {
            Ok(reply) => {
                self.add_message(Message::assistant(reply.response)).await;
                SubmitOutcome::Answered
            }
            Err(e) => {
                tracing::debug!(error = %e, "Chat request failed");
                self.add_message(Message::assistant(format!("{ERROR_PREFIX}{e}")))
                    .await;
                SubmitOutcome::Failed
            }
        };

        self.view.set_submit_label(SEND_LABEL);
        self.view.set_submit_enabled(true);
        self.busy = false;
        outcome
    }

    /// Append a message to the history and render it.
    pub async fn add_message(&mut self, message: Message) -> MessageId {
        let id = self.render(&message).await;
        self.history.push(message);
        id
    }

    /// Wait for the running animation, if any, to finish on its own.
    pub async fn wait_for_render(&mut self) {
        if let Some(active) = self.animation.take() {
            active.join().await;
        }
    }

    /// Display a message without touching the history.
    async fn render(&mut self, message: &Message) -> MessageId {
        if let Some(active) = self.animation.take() {
            active.stop().await;
        }

        let id = MessageId(self.rendered);
        self.rendered += 1;
        self.view.open_message(id, message.role());

        match message.role() {
            Role::User => {
                self.view.append_text(id, message.content());
                self.view.close_message(id);
                self.view.scroll_to_bottom();
            }
            Role::Assistant => {
                let view = Arc::clone(&self.view) as Arc<dyn ChatView>;
                self.animation =
                    Some(self.typewriter.start(view, id, message.content().to_string()));
            }
        }
        id
    }
}
