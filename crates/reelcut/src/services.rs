//! Collaborators the editor host calls to carry out effects.
//!
//! Implementations do the IO; the editor only decides when to call them.
//! Failures are returned as `anyhow` errors and surfaced to the view.

use async_trait::async_trait;

use crate::capture::CapturedClip;
use crate::clip::{DatabaseId, PersistedClipRow};

/// Persistence for the clips of one video.
#[async_trait]
pub trait ClipStore: Send + Sync + 'static {
    async fn list_clips(&self, video_id: &str) -> anyhow::Result<Vec<PersistedClipRow>>;

    /// Inserts captured clips in order and returns the created rows in the
    /// same order.
    async fn append_clips(
        &self,
        video_id: &str,
        clips: Vec<CapturedClip>,
    ) -> anyhow::Result<Vec<PersistedClipRow>>;

    async fn archive_clips(&self, ids: &[DatabaseId]) -> anyhow::Result<()>;

    async fn update_clip_scenes(&self, entries: &[(DatabaseId, String)]) -> anyhow::Result<()>;

    /// Length of a source recording in seconds. `None` when unknown, in
    /// which case rows from it are only checked for a well-formed window.
    async fn media_duration(&self, _video_filename: &str) -> anyhow::Result<Option<f64>> {
        Ok(None)
    }
}

/// Speech-to-text for persisted clips.
#[async_trait]
pub trait Transcriber: Send + Sync + 'static {
    /// Transcribes the clips and returns `(id, text)` for those that
    /// finished. Missing ids stay awaiting transcription.
    async fn transcribe(&self, ids: &[DatabaseId]) -> anyhow::Result<Vec<(DatabaseId, String)>>;
}
