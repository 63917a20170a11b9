//! Clip identities and the optimistic/persisted clip model.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReelError;

/// Client-side identity of a clip.
///
/// Assigned the moment a clip appears in the editor and kept across the
/// optimistic → persisted transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontendId(Uuid);

impl FrontendId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id, mostly useful for fixtures.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for FrontendId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for FrontendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Server-assigned identity of a persisted clip.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseId(String);

impl DatabaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DatabaseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DatabaseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of fresh frontend ids for the reconciliation reducer.
///
/// Random in production. The sequential mode hands out `1, 2, 3, ...` so
/// tests can compare whole states by value.
#[derive(Debug)]
pub enum IdAllocator {
    Random,
    Sequential(AtomicU64),
}

impl IdAllocator {
    pub fn random() -> Self {
        Self::Random
    }

    pub fn sequential() -> Self {
        Self::Sequential(AtomicU64::new(1))
    }

    pub fn next_id(&self) -> FrontendId {
        match self {
            Self::Random => FrontendId::new_random(),
            Self::Sequential(counter) => {
                FrontendId::from_u128(u128::from(counter.fetch_add(1, Ordering::Relaxed)))
            }
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::random()
    }
}

/// A clip created locally before the backend has assigned it an identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimisticClip {
    pub frontend_id: FrontendId,
    pub scene: String,
    /// Deleted by the user before its row arrived. The row is archived on
    /// arrival instead of being inserted.
    pub should_archive: bool,
}

/// A clip backed by a database row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedClip {
    pub frontend_id: FrontendId,
    pub database_id: DatabaseId,
    pub video_filename: String,
    pub source_start_time: f64,
    pub source_end_time: f64,
    pub text: String,
    pub transcribed_at: Option<DateTime<Utc>>,
    pub scene: Option<String>,
}

impl PersistedClip {
    /// Builds the in-editor clip for a freshly arrived row.
    pub fn from_row(frontend_id: FrontendId, row: &PersistedClipRow) -> Self {
        Self {
            frontend_id,
            database_id: row.id.clone(),
            video_filename: row.video_filename.clone(),
            source_start_time: row.source_start_time,
            source_end_time: row.source_end_time,
            text: row.text.clone(),
            transcribed_at: row.transcribed_at,
            scene: row.scene.clone(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.source_end_time - self.source_start_time
    }
}

/// A clip in the editor timeline, discriminated by lifecycle stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Clip {
    Optimistic(OptimisticClip),
    Persisted(PersistedClip),
}

impl Clip {
    pub fn frontend_id(&self) -> FrontendId {
        match self {
            Clip::Optimistic(clip) => clip.frontend_id,
            Clip::Persisted(clip) => clip.frontend_id,
        }
    }

    pub fn database_id(&self) -> Option<&DatabaseId> {
        match self {
            Clip::Optimistic(_) => None,
            Clip::Persisted(clip) => Some(&clip.database_id),
        }
    }

    pub fn as_persisted(&self) -> Option<&PersistedClip> {
        match self {
            Clip::Persisted(clip) => Some(clip),
            Clip::Optimistic(_) => None,
        }
    }

    pub fn is_optimistic(&self) -> bool {
        matches!(self, Clip::Optimistic(_))
    }
}

/// A clip row as delivered by the persistence service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedClipRow {
    pub id: DatabaseId,
    pub video_filename: String,
    pub source_start_time: f64,
    pub source_end_time: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub transcribed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scene: Option<String>,
}

impl PersistedClipRow {
    /// Rejects rows whose source window cannot be played.
    pub fn validate(&self) -> Result<(), ReelError> {
        let (start, end) = (self.source_start_time, self.source_end_time);
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
            return Err(ReelError::InvalidClipWindow {
                database_id: self.id.clone(),
                start,
                end,
            });
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate), additionally requiring the window to
    /// lie inside a source of `media_duration` seconds.
    pub fn validate_within(&self, media_duration: f64) -> Result<(), ReelError> {
        self.validate()?;
        if self.source_end_time > media_duration {
            return Err(ReelError::WindowBeyondMedia {
                database_id: self.id.clone(),
                end: self.source_end_time,
                duration: media_duration,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(start: f64, end: f64) -> PersistedClipRow {
        PersistedClipRow {
            id: DatabaseId::from("7"),
            video_filename: "take-1.mkv".to_string(),
            source_start_time: start,
            source_end_time: end,
            text: String::new(),
            transcribed_at: None,
            scene: None,
        }
    }

    #[test]
    fn sequential_allocator_counts_up() {
        let ids = IdAllocator::sequential();
        assert_eq!(ids.next_id(), FrontendId::from_u128(1));
        assert_eq!(ids.next_id(), FrontendId::from_u128(2));
    }

    #[test]
    fn random_allocator_does_not_repeat() {
        let ids = IdAllocator::random();
        assert_ne!(ids.next_id(), ids.next_id());
    }

    #[test]
    fn row_with_end_before_start_is_rejected() {
        assert!(row(2.0, 4.5).validate().is_ok());
        assert!(matches!(
            row(4.5, 2.0).validate(),
            Err(ReelError::InvalidClipWindow { .. })
        ));
        assert!(row(3.0, 3.0).validate().is_err());
        assert!(row(-1.0, 3.0).validate().is_err());
        assert!(row(0.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn row_past_media_end_is_rejected() {
        assert!(row(1.0, 9.0).validate_within(10.0).is_ok());
        assert!(matches!(
            row(1.0, 12.0).validate_within(10.0),
            Err(ReelError::WindowBeyondMedia { .. })
        ));
    }

    #[test]
    fn row_deserializes_from_camel_case_json() {
        let json = r#"{"id":"42","videoFilename":"a.mp4","sourceStartTime":1.5,"sourceEndTime":3.0}"#;
        let row: PersistedClipRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.id.as_str(), "42");
        assert_eq!(row.text, "");
        assert!(row.scene.is_none());
    }

    #[test]
    fn clip_exposes_shared_identity() {
        let id = FrontendId::from_u128(9);
        let optimistic = Clip::Optimistic(OptimisticClip {
            frontend_id: id,
            scene: "Camera".to_string(),
            should_archive: false,
        });
        assert_eq!(optimistic.frontend_id(), id);
        assert!(optimistic.database_id().is_none());

        let persisted = Clip::Persisted(PersistedClip::from_row(id, &row(0.0, 1.0)));
        assert_eq!(persisted.frontend_id(), id);
        assert_eq!(persisted.database_id().map(DatabaseId::as_str), Some("7"));
    }
}
