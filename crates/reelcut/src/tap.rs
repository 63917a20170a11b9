//! Read-only observation of every event the editor processes.

use crate::editor::EditorEvent;

/// Sees each event before it is reduced. Taps cannot change state and must
/// not block.
pub trait EventTap: Send + Sync + 'static {
    fn on_event(&self, event: &EditorEvent);
}

/// Logs every event at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTap;

impl EventTap for TracingTap {
    fn on_event(&self, event: &EditorEvent) {
        tracing::trace!(?event, "editor event");
    }
}

