//! Terminal front end for the chat widget.

use std::sync::{Arc, Mutex};

use console::{Term, style};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{ChatView, ChatWidget, HttpTransport, MessageId, Role, SEND_LABEL, WidgetOptions};
use crate::config::AppConfig;

const CURSOR: &str = "▌";

/// [`ChatView`] writing to stdout.
///
/// The display region is the scrollback itself, so scrolling is implicit.
#[derive(Debug)]
pub struct TerminalView {
    term: Term,
    cursor_visible: Mutex<bool>,
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalView {
    #[must_use]
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            cursor_visible: Mutex::new(false),
        }
    }

    fn write(&self, text: &str) {
        // A broken stdout has nowhere to report to.
        let _ = self.term.write_str(text);
        let _ = self.term.flush();
    }
}

impl ChatView for TerminalView {
    fn open_message(&self, _id: MessageId, role: Role) {
        let label = match role {
            Role::User => style("you ›").cyan().bold(),
            Role::Assistant => style("assistant ›").green().bold(),
        };
        self.write(&format!("{label} "));
    }

    fn append_text(&self, _id: MessageId, text: &str) {
        let cursor = self
            .cursor_visible
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *cursor {
            self.write(&format!("\u{8}{text}{CURSOR}"));
        } else {
            self.write(text);
        }
    }

    fn set_cursor(&self, _id: MessageId, visible: bool) {
        let mut cursor = self
            .cursor_visible
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match (*cursor, visible) {
            (false, true) => self.write(CURSOR),
            (true, false) => self.write("\u{8} \u{8}"),
            _ => {}
        }
        *cursor = visible;
    }

    fn close_message(&self, _id: MessageId) {
        self.write("\n");
    }

    fn set_submit_enabled(&self, _enabled: bool) {}

    fn set_submit_label(&self, label: &str) {
        if label != SEND_LABEL {
            self.write(&format!("{}\n", style(label).dim()));
        }
    }

    // The line was already consumed from stdin.
    fn clear_input(&self) {}
}

/// Interactive chat against the configured server. Returns on `/quit` or EOF.
pub async fn run_terminal_chat(config: &AppConfig) -> anyhow::Result<()> {
    let transport = HttpTransport::new(&config.widget.base_url)?;
    tracing::info!(
        name: "widget.started",
        endpoint = %transport.endpoint(),
        "Terminal chat started"
    );

    let view = Arc::new(TerminalView::new());
    let mut widget = ChatWidget::new(transport, view, WidgetOptions::from(&config.widget));
    widget.load().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if matches!(line.trim(), "/quit" | "/exit" | "/q") {
            break;
        }
        widget.input_changed(&line);
        widget.submit(&line).await;
    }

    widget.wait_for_render().await;
    Ok(())
}
