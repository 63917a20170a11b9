//! Clips coming out of the recording tool.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::clip::PersistedClip;

/// A clip boundary produced by the recorder, not yet stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedClip {
    pub video_filename: String,
    pub source_start_time: f64,
    pub source_end_time: f64,
    /// Transcript segments the recorder already produced, if any.
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl CapturedClip {
    /// Text assembled from the recorder's segments.
    pub fn transcript(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn key(&self) -> ClipKey {
        ClipKey::new(
            &self.video_filename,
            self.source_start_time,
            self.source_end_time,
        )
    }
}

/// Signals from the recording tool.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordingSignal {
    Started,
    Stopped,
    ClipsCaptured(Vec<CapturedClip>),
}

/// Identity of a source window: filename plus start and end, compared on
/// their exact bit patterns.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ClipKey {
    video_filename: String,
    start: u64,
    end: u64,
}

impl ClipKey {
    fn new(video_filename: &str, start: f64, end: f64) -> Self {
        Self {
            video_filename: video_filename.to_string(),
            start: start.to_bits(),
            end: end.to_bits(),
        }
    }
}

/// Drops captured clips that already exist, or repeat an earlier entry of
/// the same batch. Order of the survivors is preserved.
pub fn dedupe_captured<'a>(
    existing: impl IntoIterator<Item = &'a PersistedClip>,
    captured: Vec<CapturedClip>,
) -> Vec<CapturedClip> {
    let mut seen: HashSet<ClipKey> = existing
        .into_iter()
        .map(|clip| {
            ClipKey::new(
                &clip.video_filename,
                clip.source_start_time,
                clip.source_end_time,
            )
        })
        .collect();

    captured
        .into_iter()
        .filter(|clip| seen.insert(clip.key()))
        .collect()
}
