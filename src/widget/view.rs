//! Display seam of the widget.

use super::message::Role;

/// Position of a rendered message in the display region.
///
/// Ids are handed out in render order, so they also give display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub usize);

/// Everything the widget needs from a display surface.
///
/// Methods take `&self` because the typewriter task writes to the view while
/// the widget keeps its own reference; implementations synchronize
/// internally.
pub trait ChatView: Send + Sync {
    /// Create an empty slot for a message at the end of the display region.
    fn open_message(&self, id: MessageId, role: Role);

    /// Append text to the end of a message slot, before the cursor if shown.
    fn append_text(&self, id: MessageId, text: &str);

    /// Show or remove the trailing typing cursor of a message slot.
    fn set_cursor(&self, id: MessageId, visible: bool);

    /// The message in this slot is fully rendered.
    fn close_message(&self, _id: MessageId) {}

    /// Keep the newest content in sight.
    fn scroll_to_bottom(&self) {}

    /// Enable or disable the submit control.
    fn set_submit_enabled(&self, enabled: bool);

    /// Change the text shown on the submit control.
    fn set_submit_label(&self, label: &str);

    /// Empty the query input field.
    fn clear_input(&self);
}
