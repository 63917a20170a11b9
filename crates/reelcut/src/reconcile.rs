//! Clip reconciliation: optimistic clips in, database rows and transcripts
//! matched against them, archive/transcribe requests out.
//!
//! Rows are matched to pending optimistic clips strictly first-in first-out.
//! The capture service must deliver rows in the order boundaries were
//! detected; nothing here tries to repair an out-of-order delivery.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::clip::{
    Clip, DatabaseId, FrontendId, IdAllocator, OptimisticClip, PersistedClip, PersistedClipRow,
};
use crate::error::ReelError;
use crate::machine::{Effects, Machine, Transition};

/// Events consumed by [`ClipTimeline`].
#[derive(Clone, Debug, PartialEq)]
pub enum ClipEvent {
    /// Local speech detection or a manual action marked a new clip boundary.
    OptimisticClipDetected { scene: String },
    /// New rows were written by the persistence service.
    DatabaseClipsArrived { clips: Vec<PersistedClipRow> },
    /// The user deleted clips from the timeline.
    ClipsDeleted { frontend_ids: Vec<FrontendId> },
    /// The transcription service finished some clips.
    ClipsTranscribed { entries: Vec<(DatabaseId, String)> },
}

/// Side effects requested by [`ClipTimeline`]. The host performs the IO.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClipEffect {
    ScrollToBottom,
    ArchiveClips { database_ids: Vec<DatabaseId> },
    TranscribeClips { database_ids: Vec<DatabaseId> },
    UpdateClipsScene { entries: Vec<(DatabaseId, String)> },
    /// Rows that failed ingestion checks. They are archived as well.
    RowsRejected { database_ids: Vec<DatabaseId> },
}

/// Ordered clip sequence plus the clips still waiting for a transcript.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipTimeline {
    clips: Vec<Clip>,
    awaiting_transcription: BTreeSet<FrontendId>,
}

impl ClipTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a timeline from rows loaded at startup. Every row gets a
    /// fresh frontend id; rows without text are considered awaiting
    /// transcription.
    pub fn from_rows(ids: &IdAllocator, rows: &[PersistedClipRow]) -> Self {
        let mut timeline = Self::new();
        for row in rows {
            let clip = PersistedClip::from_row(ids.next_id(), row);
            if clip.text.is_empty() {
                timeline.awaiting_transcription.insert(clip.frontend_id);
            }
            timeline.clips.push(Clip::Persisted(clip));
        }
        timeline
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn clip_ids(&self) -> Vec<FrontendId> {
        self.clips.iter().map(Clip::frontend_id).collect()
    }

    /// Ids the view shows: every clip except optimistic ones already
    /// deleted.
    pub fn visible_ids(&self) -> Vec<FrontendId> {
        self.clips
            .iter()
            .filter(|clip| !matches!(clip, Clip::Optimistic(pending) if pending.should_archive))
            .map(Clip::frontend_id)
            .collect()
    }

    pub fn get(&self, id: FrontendId) -> Option<&Clip> {
        self.clips.iter().find(|clip| clip.frontend_id() == id)
    }

    pub fn persisted(&self) -> impl Iterator<Item = &PersistedClip> {
        self.clips.iter().filter_map(Clip::as_persisted)
    }

    pub fn awaiting_transcription(&self) -> &BTreeSet<FrontendId> {
        &self.awaiting_transcription
    }

    pub fn is_awaiting_transcription(&self, id: FrontendId) -> bool {
        self.awaiting_transcription.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    fn earliest_optimistic(&self) -> Option<usize> {
        self.clips.iter().position(Clip::is_optimistic)
    }

    fn detect(&self, ids: &IdAllocator, scene: &str) -> Transition<Self, ClipEffect> {
        let mut next = self.clone();
        next.clips.push(Clip::Optimistic(OptimisticClip {
            frontend_id: ids.next_id(),
            scene: scene.to_string(),
            should_archive: false,
        }));
        Transition::with_effects(next, smallvec::smallvec![ClipEffect::ScrollToBottom])
    }

    /// Matches `rows` against pending clips in detection order, with `check`
    /// deciding which rows are playable. A rejected row still uses up the
    /// earliest pending clip; that clip is dropped and the row archived.
    pub fn receive_rows<F>(
        &self,
        ids: &IdAllocator,
        rows: &[PersistedClipRow],
        check: F,
    ) -> Transition<Self, ClipEffect>
    where
        F: Fn(&PersistedClipRow) -> Result<(), ReelError>,
    {
        let mut next = self.clone();
        let mut to_archive = Vec::new();
        let mut to_transcribe = Vec::new();
        let mut scene_updates = Vec::new();
        let mut rejected = Vec::new();
        let mut appended_without_match = false;

        for row in rows {
            let playable = match check(row) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(error = %err, "Rejecting clip row");
                    rejected.push(row.id.clone());
                    false
                }
            };
            match next.earliest_optimistic() {
                Some(index) => {
                    let Clip::Optimistic(pending) = &next.clips[index] else {
                        unreachable!("earliest_optimistic returned a persisted clip");
                    };
                    if !playable {
                        next.clips.remove(index);
                        to_archive.push(row.id.clone());
                        continue;
                    }
                    if pending.should_archive {
                        tracing::debug!(
                            frontend_id = %pending.frontend_id,
                            database_id = %row.id,
                            "Dropping row for clip deleted before it was persisted"
                        );
                        next.clips.remove(index);
                        to_archive.push(row.id.clone());
                        continue;
                    }

                    let frontend_id = pending.frontend_id;
                    let scene = pending.scene.clone();
                    let mut promoted = PersistedClip::from_row(frontend_id, row);
                    promoted.scene = Some(scene.clone());
                    next.clips[index] = Clip::Persisted(promoted);

                    scene_updates.push((row.id.clone(), scene));
                    to_transcribe.push(row.id.clone());
                    next.awaiting_transcription.insert(frontend_id);
                }
                None if !playable => to_archive.push(row.id.clone()),
                None => {
                    let frontend_id = ids.next_id();
                    next.clips
                        .push(Clip::Persisted(PersistedClip::from_row(frontend_id, row)));
                    to_transcribe.push(row.id.clone());
                    next.awaiting_transcription.insert(frontend_id);
                    appended_without_match = true;
                }
            }
        }

        let mut effects = Effects::new();
        if !scene_updates.is_empty() {
            effects.push(ClipEffect::UpdateClipsScene {
                entries: scene_updates,
            });
        }
        if appended_without_match {
            effects.push(ClipEffect::ScrollToBottom);
        }
        if !to_archive.is_empty() {
            effects.push(ClipEffect::ArchiveClips {
                database_ids: to_archive,
            });
        }
        if !to_transcribe.is_empty() {
            effects.push(ClipEffect::TranscribeClips {
                database_ids: to_transcribe,
            });
        }
        if !rejected.is_empty() {
            effects.push(ClipEffect::RowsRejected {
                database_ids: rejected,
            });
        }
        Transition::with_effects(next, effects)
    }

    fn delete(&self, frontend_ids: &[FrontendId]) -> Transition<Self, ClipEffect> {
        let targets: HashSet<FrontendId> = frontend_ids.iter().copied().collect();
        if !self.clips.iter().any(|clip| targets.contains(&clip.frontend_id())) {
            return Transition::to(self.clone());
        }

        let mut to_archive = Vec::new();
        let mut clips = Vec::with_capacity(self.clips.len());
        let mut awaiting = self.awaiting_transcription.clone();

        for clip in &self.clips {
            if !targets.contains(&clip.frontend_id()) {
                clips.push(clip.clone());
                continue;
            }
            match clip {
                Clip::Optimistic(pending) => clips.push(Clip::Optimistic(OptimisticClip {
                    should_archive: true,
                    ..pending.clone()
                })),
                Clip::Persisted(persisted) => {
                    awaiting.remove(&persisted.frontend_id);
                    to_archive.push(persisted.database_id.clone());
                }
            }
        }

        let next = Self {
            clips,
            awaiting_transcription: awaiting,
        };
        let mut effects = Effects::new();
        if !to_archive.is_empty() {
            effects.push(ClipEffect::ArchiveClips {
                database_ids: to_archive,
            });
        }
        Transition::with_effects(next, effects)
    }

    fn transcribed(&self, entries: &[(DatabaseId, String)]) -> Transition<Self, ClipEffect> {
        let mut next = self.clone();
        for (database_id, text) in entries {
            let Some(clip) = next.clips.iter_mut().find_map(|clip| match clip {
                Clip::Persisted(persisted) if &persisted.database_id == database_id => {
                    Some(persisted)
                }
                _ => None,
            }) else {
                tracing::debug!(%database_id, "Transcript for a clip no longer in the timeline");
                continue;
            };
            clip.text = text.clone();
            next.awaiting_transcription.remove(&clip.frontend_id);
        }
        Transition::to(next)
    }
}

impl Machine for ClipTimeline {
    type Event = ClipEvent;
    type Effect = ClipEffect;
    type Context = IdAllocator;

    fn reduce(&self, ids: &IdAllocator, event: &ClipEvent) -> Transition<Self, ClipEffect> {
        match event {
            ClipEvent::OptimisticClipDetected { scene } => self.detect(ids, scene),
            ClipEvent::DatabaseClipsArrived { clips } => {
                self.receive_rows(ids, clips, PersistedClipRow::validate)
            }
            ClipEvent::ClipsDeleted { frontend_ids } => self.delete(frontend_ids),
            ClipEvent::ClipsTranscribed { entries } => self.transcribed(entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> PersistedClipRow {
        PersistedClipRow {
            id: DatabaseId::from(id),
            video_filename: "recording.mkv".to_string(),
            source_start_time: 0.0,
            source_end_time: 2.0,
            text: String::new(),
            transcribed_at: None,
            scene: None,
        }
    }

    fn detect(timeline: &ClipTimeline, ids: &IdAllocator, scene: &str) -> ClipTimeline {
        timeline
            .reduce(
                ids,
                &ClipEvent::OptimisticClipDetected {
                    scene: scene.to_string(),
                },
            )
            .state
    }

    fn arrive(
        timeline: &ClipTimeline,
        ids: &IdAllocator,
        rows: &[&str],
    ) -> Transition<ClipTimeline, ClipEffect> {
        timeline.reduce(
            ids,
            &ClipEvent::DatabaseClipsArrived {
                clips: rows.iter().map(|id| row(id)).collect(),
            },
        )
    }

    #[test]
    fn optimistic_clip_is_appended_and_scrolls() {
        let ids = IdAllocator::sequential();
        let out = ClipTimeline::new().reduce(
            &ids,
            &ClipEvent::OptimisticClipDetected {
                scene: "Camera".to_string(),
            },
        );
        assert_eq!(out.state.len(), 1);
        assert!(out.state.clips()[0].is_optimistic());
        assert_eq!(out.effects.as_slice(), &[ClipEffect::ScrollToBottom]);
    }

    #[test]
    fn row_with_no_pending_clip_is_appended() {
        let ids = IdAllocator::sequential();
        let out = arrive(&ClipTimeline::new(), &ids, &["123"]);

        assert_eq!(out.state.len(), 1);
        let clip = out.state.clips()[0].as_persisted().unwrap();
        assert_eq!(clip.database_id.as_str(), "123");
        assert!(out.state.is_awaiting_transcription(clip.frontend_id));
        assert_eq!(
            out.effects.as_slice(),
            &[
                ClipEffect::ScrollToBottom,
                ClipEffect::TranscribeClips {
                    database_ids: vec![DatabaseId::from("123")]
                },
            ]
        );
    }

    #[test]
    fn row_promotes_pending_clip_and_carries_scene() {
        let ids = IdAllocator::sequential();
        let pending = detect(&ClipTimeline::new(), &ids, "Camera");
        let pending_id = pending.clips()[0].frontend_id();

        let out = arrive(&pending, &ids, &["1"]);

        let clip = out.state.clips()[0].as_persisted().unwrap();
        assert_eq!(clip.frontend_id, pending_id);
        assert_eq!(clip.scene.as_deref(), Some("Camera"));
        assert!(out.effects.contains(&ClipEffect::UpdateClipsScene {
            entries: vec![(DatabaseId::from("1"), "Camera".to_string())]
        }));
        assert!(!out.effects.contains(&ClipEffect::ScrollToBottom));
    }

    #[test]
    fn sequential_rows_take_scenes_in_detection_order() {
        let ids = IdAllocator::sequential();
        let timeline = detect(&ClipTimeline::new(), &ids, "Camera");
        let timeline = detect(&timeline, &ids, "No Face");

        let first = arrive(&timeline, &ids, &["a"]);
        let second = arrive(&first.state, &ids, &["b"]);

        assert!(first.effects.contains(&ClipEffect::UpdateClipsScene {
            entries: vec![(DatabaseId::from("a"), "Camera".to_string())]
        }));
        assert!(second.effects.contains(&ClipEffect::UpdateClipsScene {
            entries: vec![(DatabaseId::from("b"), "No Face".to_string())]
        }));
        let scenes: Vec<_> = second
            .state
            .persisted()
            .map(|clip| clip.scene.clone().unwrap_or_default())
            .collect();
        assert_eq!(scenes, vec!["Camera", "No Face"]);
    }

    #[test]
    fn deleting_pending_clip_archives_its_row_on_arrival() {
        let ids = IdAllocator::sequential();
        let timeline = detect(&ClipTimeline::new(), &ids, "Camera");
        let pending_id = timeline.clips()[0].frontend_id();

        let deleted = timeline.reduce(
            &ids,
            &ClipEvent::ClipsDeleted {
                frontend_ids: vec![pending_id],
            },
        );
        assert!(deleted.effects.is_empty());
        assert_eq!(deleted.state.len(), 1, "soft delete keeps the clip until its row arrives");
        assert!(deleted.state.visible_ids().is_empty());

        let out = arrive(&deleted.state, &ids, &["9"]);
        assert!(out.state.is_empty());
        assert_eq!(
            out.effects.as_slice(),
            &[ClipEffect::ArchiveClips {
                database_ids: vec![DatabaseId::from("9")]
            }]
        );
    }

    #[test]
    fn deleting_persisted_clip_removes_it_and_archives() {
        let ids = IdAllocator::sequential();
        let timeline = arrive(&ClipTimeline::new(), &ids, &["1", "2"]).state;
        let first = timeline.clips()[0].frontend_id();

        let out = timeline.reduce(
            &ids,
            &ClipEvent::ClipsDeleted {
                frontend_ids: vec![first],
            },
        );
        assert_eq!(out.state.len(), 1);
        assert!(!out.state.is_awaiting_transcription(first));
        assert_eq!(
            out.effects.as_slice(),
            &[ClipEffect::ArchiveClips {
                database_ids: vec![DatabaseId::from("1")]
            }]
        );
    }

    #[test]
    fn deleting_unknown_id_is_a_no_op() {
        let ids = IdAllocator::sequential();
        let timeline = arrive(&ClipTimeline::new(), &ids, &["1"]).state;
        let out = timeline.reduce(
            &ids,
            &ClipEvent::ClipsDeleted {
                frontend_ids: vec![FrontendId::from_u128(999)],
            },
        );
        assert_eq!(out.state, timeline);
        assert!(out.effects.is_empty());
    }

    #[test]
    fn transcripts_fill_text_and_clear_awaiting() {
        let ids = IdAllocator::sequential();
        let timeline = arrive(&ClipTimeline::new(), &ids, &["1", "2"]).state;

        let out = timeline.reduce(
            &ids,
            &ClipEvent::ClipsTranscribed {
                entries: vec![
                    (DatabaseId::from("2"), "hello there".to_string()),
                    (DatabaseId::from("gone"), "ignored".to_string()),
                ],
            },
        );
        let clips: Vec<_> = out.state.persisted().collect();
        assert_eq!(clips[0].text, "");
        assert_eq!(clips[1].text, "hello there");
        assert!(out.state.is_awaiting_transcription(clips[0].frontend_id));
        assert!(!out.state.is_awaiting_transcription(clips[1].frontend_id));
        assert!(out.effects.is_empty());
    }

    #[test]
    fn mixed_batch_batches_each_effect_once() {
        let ids = IdAllocator::sequential();
        let timeline = detect(&ClipTimeline::new(), &ids, "Camera");
        let timeline = detect(&timeline, &ids, "Slides");
        let doomed = timeline.clips()[0].frontend_id();
        let timeline = timeline
            .reduce(
                &ids,
                &ClipEvent::ClipsDeleted {
                    frontend_ids: vec![doomed],
                },
            )
            .state;

        let out = arrive(&timeline, &ids, &["1", "2", "3"]);

        assert_eq!(
            out.effects.as_slice(),
            &[
                ClipEffect::UpdateClipsScene {
                    entries: vec![(DatabaseId::from("2"), "Slides".to_string())]
                },
                ClipEffect::ScrollToBottom,
                ClipEffect::ArchiveClips {
                    database_ids: vec![DatabaseId::from("1")]
                },
                ClipEffect::TranscribeClips {
                    database_ids: vec![DatabaseId::from("2"), DatabaseId::from("3")]
                },
            ]
        );
        assert_eq!(out.state.len(), 2);
    }

    #[test]
    fn rejected_row_takes_the_place_of_its_pending_clip() {
        let ids = IdAllocator::sequential();
        let timeline = detect(&ClipTimeline::new(), &ids, "Camera");
        let timeline = detect(&timeline, &ids, "Slides");
        let slides = timeline.clips()[1].frontend_id();

        let mut broken = row("1");
        broken.source_start_time = 5.0;
        broken.source_end_time = 3.0;
        let out = timeline.reduce(
            &ids,
            &ClipEvent::DatabaseClipsArrived {
                clips: vec![broken, row("2")],
            },
        );

        assert_eq!(out.state.len(), 1);
        let clip = out.state.clips()[0].as_persisted().unwrap();
        assert_eq!(clip.frontend_id, slides);
        assert_eq!(clip.database_id.as_str(), "2");
        assert_eq!(clip.scene.as_deref(), Some("Slides"));
        assert_eq!(
            out.effects.as_slice(),
            &[
                ClipEffect::UpdateClipsScene {
                    entries: vec![(DatabaseId::from("2"), "Slides".to_string())]
                },
                ClipEffect::ArchiveClips {
                    database_ids: vec![DatabaseId::from("1")]
                },
                ClipEffect::TranscribeClips {
                    database_ids: vec![DatabaseId::from("2")]
                },
                ClipEffect::RowsRejected {
                    database_ids: vec![DatabaseId::from("1")]
                },
            ]
        );
    }

    #[test]
    fn rejected_row_without_pending_clip_is_archived() {
        let ids = IdAllocator::sequential();
        let out = ClipTimeline::new().receive_rows(&ids, &[row("1"), row("2")], |row| {
            if row.id.as_str() == "2" {
                row.validate_within(1.0)
            } else {
                row.validate()
            }
        });

        assert_eq!(out.state.len(), 1);
        assert!(out.effects.contains(&ClipEffect::ArchiveClips {
            database_ids: vec![DatabaseId::from("2")]
        }));
        assert!(out.effects.contains(&ClipEffect::RowsRejected {
            database_ids: vec![DatabaseId::from("2")]
        }));
    }

    #[test]
    fn reduce_leaves_input_untouched() {
        let ids = IdAllocator::sequential();
        let before = detect(&ClipTimeline::new(), &ids, "Camera");
        let snapshot = before.clone();
        let _ = arrive(&before, &ids, &["1"]);
        assert_eq!(before, snapshot);
    }

    #[test]
    fn from_rows_marks_untranscribed_rows() {
        let ids = IdAllocator::sequential();
        let mut done = row("1");
        done.text = "already transcribed".to_string();
        let timeline = ClipTimeline::from_rows(&ids, &[done, row("2")]);
        let clips: Vec<_> = timeline.persisted().collect();
        assert!(!timeline.is_awaiting_transcription(clips[0].frontend_id));
        assert!(timeline.is_awaiting_transcription(clips[1].frontend_id));
    }
}
