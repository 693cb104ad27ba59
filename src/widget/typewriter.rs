//! Character-by-character reveal of assistant messages.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::view::{ChatView, MessageId};

/// Default pause between two revealed characters.
pub const DEFAULT_CHAR_DELAY: Duration = Duration::from_millis(30);

/// Spawns typewriter animations with a fixed per-character delay.
#[derive(Debug, Clone, Copy)]
pub struct Typewriter {
    delay: Duration,
}

impl Default for Typewriter {
    fn default() -> Self {
        Self::new(DEFAULT_CHAR_DELAY)
    }
}

impl Typewriter {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Start animating `text` into slot `id`.
    ///
    /// The cursor is shown before the first character and removed once the
    /// last one has been followed by one more delay. Must be called from
    /// within a tokio runtime.
    pub fn start(&self, view: Arc<dyn ChatView>, id: MessageId, text: String) -> TypewriterHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let delay = self.delay;

        let task = tokio::spawn(async move {
            view.set_cursor(id, true);

            let mut chars = text.chars();
            let mut buf = [0u8; 4];
            while let Some(ch) = chars.next() {
                view.append_text(id, ch.encode_utf8(&mut buf));
                view.scroll_to_bottom();

                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        let rest = chars.as_str();
                        if !rest.is_empty() {
                            view.append_text(id, rest);
                            view.scroll_to_bottom();
                        }
                        tracing::debug!(message_id = id.0, "Typewriter cancelled");
                        break;
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }

            view.set_cursor(id, false);
            view.close_message(id);
        });

        TypewriterHandle { id, cancel, task }
    }
}

/// Handle to one running animation.
///
/// Dropping the handle detaches the animation; it still runs to completion.
#[derive(Debug)]
pub struct TypewriterHandle {
    id: MessageId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TypewriterHandle {
    /// Ask the animation to stop. The remaining text is revealed at once and
    /// the cursor removed; nothing is lost.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait until the animation has written its last output.
    pub async fn stop(self) {
        self.cancel();
        self.join().await;
    }

    /// Wait for the animation to finish on its own.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::warn!(message_id = self.id.0, error = %e, "Typewriter task failed");
        }
    }
}
