//! The editor host: owns the machines, feeds them events in delivery order
//! and carries out the effects they request.
//!
//! ```text
//!  view / recorder / players
//!        │ emit()
//!        ▼
//!  mpsc<EditorEvent> ──► Editor::dispatch ──► ClipTimeline.reduce ──┐
//!        ▲                      │            PlaybackState.reduce ──┤ effects
//!        │                      │            SpeechDetector.reduce ─┤
//!        │                      ▼                                   ▼
//!        │              broadcast<EditorNotice>     debounce / spawn on JoinSet
//!        │                                                          │
//!        └──────────────── completion events ◄──────────────────────┘
//! ```
//!
//! Reductions happen on the editor's task only. Store and transcription
//! calls run on spawned tasks and come back as ordinary events.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::Instant;

use crate::capture::{dedupe_captured, CapturedClip, RecordingSignal};
use crate::clip::{DatabaseId, IdAllocator, PersistedClipRow};
use crate::config::EditorConfig;
use crate::debounce::Debouncer;
use crate::error::ReelError;
use crate::machine::Machine;
use crate::playback::{PlaybackEffect, PlaybackEvent, PlaybackState};
use crate::player::PlayerReport;
use crate::reconcile::{ClipEffect, ClipEvent, ClipTimeline};
use crate::services::{ClipStore, Transcriber};
use crate::speech::{SilenceState, SpeechDetector, SpeechEffect, SpeechEvent};
use crate::tap::EventTap;

const NOTICE_CAPACITY: usize = 256;

/// Everything the editor reacts to.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    Clip(ClipEvent),
    Playback(PlaybackEvent),
    Speech(SpeechEvent),
    Recording(RecordingSignal),
    /// The recorder switched scenes; new clips are labelled with it.
    SceneChanged { scene: String },
    /// The store reported how long a source recording is.
    MediaDurationKnown { video_filename: String, duration: f64 },
    Player(PlayerReport),
    EffectFailed { effect: EffectKind, message: String },
    Shutdown,
}

impl From<ClipEvent> for EditorEvent {
    fn from(event: ClipEvent) -> Self {
        EditorEvent::Clip(event)
    }
}

impl From<PlaybackEvent> for EditorEvent {
    fn from(event: PlaybackEvent) -> Self {
        EditorEvent::Playback(event)
    }
}

impl From<SpeechEvent> for EditorEvent {
    fn from(event: SpeechEvent) -> Self {
        EditorEvent::Speech(event)
    }
}

impl From<RecordingSignal> for EditorEvent {
    fn from(signal: RecordingSignal) -> Self {
        EditorEvent::Recording(signal)
    }
}

impl From<PlayerReport> for EditorEvent {
    fn from(report: PlayerReport) -> Self {
        EditorEvent::Player(report)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectKind {
    Archive,
    Transcribe,
    UpdateScenes,
    AppendClips,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EffectKind::Archive => "archive",
            EffectKind::Transcribe => "transcribe",
            EffectKind::UpdateScenes => "update-scenes",
            EffectKind::AppendClips => "append-clips",
        };
        f.write_str(name)
    }
}

/// A copy of the editor's state for the view.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorSnapshot {
    pub clips: ClipTimeline,
    pub playback: PlaybackState,
    pub silence: SilenceState,
    pub recording: bool,
}

/// What the view hears from the editor.
#[derive(Clone, Debug)]
pub enum EditorNotice {
    ScrollToBottom,
    StateChanged(Arc<EditorSnapshot>),
    RowsRejected { count: usize },
    EffectFailed { effect: EffectKind, message: String },
}

/// Cheap, cloneable way into a running editor.
#[derive(Clone, Debug)]
pub struct EditorHandle {
    events: mpsc::UnboundedSender<EditorEvent>,
    notices: broadcast::Sender<EditorNotice>,
}

impl EditorHandle {
    pub fn emit(&self, event: impl Into<EditorEvent>) -> Result<(), ReelError> {
        self.events
            .send(event.into())
            .map_err(|_| ReelError::ChannelClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorNotice> {
        self.notices.subscribe()
    }

    pub fn shutdown(&self) -> Result<(), ReelError> {
        self.emit(EditorEvent::Shutdown)
    }

    /// Feeds reports from mounted clip players into the editor until either
    /// side closes.
    pub fn forward_player_reports(
        &self,
        mut reports: mpsc::UnboundedReceiver<PlayerReport>,
    ) -> JoinHandle<()> {
        let events = self.events.clone();
        tokio::spawn(async move {
            while let Some(report) = reports.recv().await {
                if events.send(EditorEvent::Player(report)).is_err() {
                    break;
                }
            }
        })
    }
}

pub struct EditorBuilder<S, T> {
    store: Arc<S>,
    transcriber: Arc<T>,
    config: EditorConfig,
    video_id: String,
    scene: String,
    ids: IdAllocator,
    rows: Vec<PersistedClipRow>,
    media_durations: HashMap<String, f64>,
    taps: Vec<Arc<dyn EventTap>>,
}

impl<S: ClipStore, T: Transcriber> EditorBuilder<S, T> {
    pub fn new(store: Arc<S>, transcriber: Arc<T>) -> Self {
        Self {
            store,
            transcriber,
            config: EditorConfig::default(),
            video_id: String::new(),
            scene: "Camera".to_string(),
            ids: IdAllocator::random(),
            rows: Vec::new(),
            media_durations: HashMap::new(),
            taps: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn for_video(mut self, video_id: impl Into<String>) -> Self {
        self.video_id = video_id.into();
        self
    }

    /// Scene label given to clips detected before any scene change arrives.
    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = scene.into();
        self
    }

    pub fn with_id_allocator(mut self, ids: IdAllocator) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_rows(mut self, rows: Vec<PersistedClipRow>) -> Self {
        self.rows = rows;
        self
    }

    /// Rows from `video_filename` must end within `secs`.
    pub fn with_media_duration(mut self, video_filename: impl Into<String>, secs: f64) -> Self {
        self.media_durations.insert(video_filename.into(), secs);
        self
    }

    pub fn with_tap(mut self, tap: impl EventTap) -> Self {
        self.taps.push(Arc::new(tap));
        self
    }

    /// Loads the video's existing clips from the store.
    pub async fn load_existing(mut self) -> anyhow::Result<Self> {
        self.rows = self.store.list_clips(&self.video_id).await?;
        tracing::info!(video_id = %self.video_id, count = self.rows.len(), "Loaded existing clips");

        let files: BTreeSet<&str> = self.rows.iter().map(|row| row.video_filename.as_str()).collect();
        let durations = lookup_durations(self.store.as_ref(), files).await;
        self.media_durations.extend(durations);
        Ok(self)
    }

    pub fn build(self) -> Result<(Editor<S, T>, EditorHandle), ReelError> {
        self.config.validate()?;

        let durations = &self.media_durations;
        let (valid, rejected): (Vec<_>, Vec<_>) = self
            .rows
            .into_iter()
            .partition(|row| check_row(durations, row).is_ok());
        for row in &rejected {
            tracing::warn!(database_id = %row.id, "Skipping stored clip with an unplayable window");
        }

        let clips = ClipTimeline::from_rows(&self.ids, &valid);
        let clip_ids = clips.visible_ids();
        let mut playback = PlaybackState::new().with_lookahead(self.config.preload_lookahead);
        if let Some(&first) = clip_ids.first() {
            playback = playback.starting_at(&clip_ids, first);
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let handle = EditorHandle {
            events: events_tx.clone(),
            notices: notices.clone(),
        };

        let editor = Editor {
            speech: SpeechDetector::new(
                self.config.silence_threshold_db,
                self.config.long_silence_ms,
            ),
            archive_batch: Debouncer::new(self.config.archive_debounce()),
            scene_batch: Debouncer::new(self.config.scene_debounce()),
            config: self.config,
            video_id: self.video_id,
            scene: self.scene,
            ids: self.ids,
            media_durations: self.media_durations,
            clips,
            playback,
            recording: false,
            heard_speech: false,
            store: self.store,
            transcriber: self.transcriber,
            events_tx,
            events_rx,
            notices,
            inflight: JoinSet::new(),
            taps: self.taps,
        };
        Ok((editor, handle))
    }
}

enum Step {
    Event(Option<EditorEvent>),
    Joined(Result<(), JoinError>),
    Flush,
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

pub struct Editor<S, T> {
    config: EditorConfig,
    video_id: String,
    scene: String,
    ids: IdAllocator,
    media_durations: HashMap<String, f64>,
    clips: ClipTimeline,
    playback: PlaybackState,
    speech: SpeechDetector,
    recording: bool,
    heard_speech: bool,
    store: Arc<S>,
    transcriber: Arc<T>,
    events_tx: mpsc::UnboundedSender<EditorEvent>,
    events_rx: mpsc::UnboundedReceiver<EditorEvent>,
    notices: broadcast::Sender<EditorNotice>,
    archive_batch: Debouncer<DatabaseId>,
    scene_batch: Debouncer<(DatabaseId, String)>,
    inflight: JoinSet<()>,
    taps: Vec<Arc<dyn EventTap>>,
}

impl<S: ClipStore, T: Transcriber> Editor<S, T> {
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn clips(&self) -> &ClipTimeline {
        &self.clips
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn silence(&self) -> SilenceState {
        self.speech.state()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            clips: self.clips.clone(),
            playback: self.playback.clone(),
            silence: self.speech.state(),
            recording: self.recording,
        }
    }

    /// Processes events until [`EditorEvent::Shutdown`], then flushes pending
    /// batches, waits for in-flight effects and returns the final state.
    pub async fn run(mut self) -> EditorSnapshot {
        tracing::info!(video_id = %self.video_id, clips = self.clips.len(), "Editor started");
        self.resume_transcriptions();

        loop {
            let deadline = self.next_deadline();
            let step = tokio::select! {
                event = self.events_rx.recv() => Step::Event(event),
                Some(joined) = self.inflight.join_next(), if !self.inflight.is_empty() => Step::Joined(joined),
                _ = sleep_until_opt(deadline) => Step::Flush,
            };
            match step {
                Step::Event(None) | Step::Event(Some(EditorEvent::Shutdown)) => break,
                Step::Event(Some(event)) => self.dispatch(event),
                Step::Joined(result) => log_join(result),
                Step::Flush => self.flush_due(Instant::now()),
            }
        }

        self.flush_pending().await;
        while let Some(result) = self.inflight.join_next().await {
            log_join(result);
        }
        tracing::info!(video_id = %self.video_id, "Editor stopped");
        self.snapshot()
    }

    /// Dispatches queued events and waits for in-flight effects until
    /// nothing is left. Debounced batches are not flushed.
    pub async fn settle(&mut self) {
        loop {
            while let Ok(event) = self.events_rx.try_recv() {
                self.dispatch(event);
            }
            match self.inflight.join_next().await {
                Some(result) => log_join(result),
                None => break,
            }
        }
    }

    /// Requests transcripts for clips loaded without one.
    pub fn resume_transcriptions(&mut self) {
        let awaiting = self.clips.awaiting_transcription();
        let ids: Vec<DatabaseId> = self
            .clips
            .persisted()
            .filter(|clip| awaiting.contains(&clip.frontend_id))
            .map(|clip| clip.database_id.clone())
            .collect();
        if !ids.is_empty() {
            self.spawn_transcription(ids);
        }
    }

    pub fn dispatch(&mut self, event: EditorEvent) {
        for tap in &self.taps {
            tap.on_event(&event);
        }

        let changed = match event {
            EditorEvent::Clip(event) => self.apply_clip_event(event),
            EditorEvent::Playback(event) => self.apply_playback_event(event),
            EditorEvent::Speech(event) => self.apply_speech_event(event),
            EditorEvent::Recording(signal) => self.apply_recording_signal(signal),
            EditorEvent::SceneChanged { scene } => {
                tracing::debug!(%scene, "Scene changed");
                self.scene = scene;
                false
            }
            EditorEvent::MediaDurationKnown {
                video_filename,
                duration,
            } => {
                tracing::debug!(%video_filename, duration, "Media duration known");
                self.media_durations.insert(video_filename, duration);
                false
            }
            EditorEvent::Player(report) => self.apply_player_report(report),
            EditorEvent::EffectFailed { effect, message } => {
                tracing::warn!(%effect, %message, "Effect failed");
                self.notify(EditorNotice::EffectFailed { effect, message });
                false
            }
            EditorEvent::Shutdown => false,
        };

        if changed {
            self.notify(EditorNotice::StateChanged(Arc::new(self.snapshot())));
        }
    }

    fn notify(&self, notice: EditorNotice) {
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }

    fn apply_clip_event(&mut self, event: ClipEvent) -> bool {
        let ids_before = self.clips.visible_ids();
        let transition = match &event {
            ClipEvent::DatabaseClipsArrived { clips } => {
                let durations = &self.media_durations;
                self.clips
                    .receive_rows(&self.ids, clips, |row| check_row(durations, row))
            }
            _ => self.clips.reduce(&self.ids, &event),
        };
        let (next, effects) = transition.into_parts();
        let mut changed = next != self.clips;
        self.clips = next;

        for effect in effects {
            self.run_clip_effect(effect);
        }

        let ids_after = self.clips.visible_ids();
        if ids_after != ids_before {
            changed |= self.apply_playback_event(PlaybackEvent::ClipsUpdatedFromExternalSource {
                ids: ids_after,
            });
        }
        changed
    }

    fn apply_playback_event(&mut self, event: PlaybackEvent) -> bool {
        let ids = self.clips.visible_ids();
        let (next, effects) = self.playback.reduce(&ids, &event).into_parts();
        let mut changed = next != self.playback;
        self.playback = next;

        for effect in effects {
            match effect {
                PlaybackEffect::ArchiveClips { frontend_ids } => {
                    tracing::info!(count = frontend_ids.len(), "Deleting selected clips");
                    changed |= self.apply_clip_event(ClipEvent::ClipsDeleted { frontend_ids });
                }
            }
        }
        changed
    }

    fn apply_speech_event(&mut self, event: SpeechEvent) -> bool {
        let measured = matches!(
            event,
            SpeechEvent::AudioFrame { .. } | SpeechEvent::VolumeMeasured { .. }
        );
        let (next, effects) = self.speech.reduce(&(), &event).into_parts();
        let mut changed = next.state() != self.speech.state();
        self.speech = next;

        // A measurement that leaves the detector out of silence was loud.
        if measured && self.speech.state() == SilenceState::NoSilenceDetected {
            self.heard_speech = true;
        }

        for effect in effects {
            match effect {
                SpeechEffect::SpeechResumed { at_ms } => {
                    tracing::trace!(at_ms, "Speech resumed");
                }
                SpeechEffect::SilenceSettled { since_ms } => {
                    if self.recording && self.heard_speech {
                        self.heard_speech = false;
                        tracing::info!(since_ms, scene = %self.scene, "Pause after speech, marking clip boundary");
                        changed |= self.apply_clip_event(ClipEvent::OptimisticClipDetected {
                            scene: self.scene.clone(),
                        });
                    }
                }
            }
        }
        changed
    }

    fn apply_recording_signal(&mut self, signal: RecordingSignal) -> bool {
        match signal {
            RecordingSignal::Started => {
                tracing::info!(video_id = %self.video_id, "Recording started");
                self.recording = true;
                self.heard_speech = false;
                self.apply_speech_event(SpeechEvent::RecordingStarted);
                true
            }
            RecordingSignal::Stopped => {
                tracing::info!(video_id = %self.video_id, "Recording stopped");
                self.recording = false;
                true
            }
            RecordingSignal::ClipsCaptured(captured) => {
                let total = captured.len();
                let fresh = dedupe_captured(self.clips.persisted(), captured);
                if fresh.len() < total {
                    tracing::debug!(skipped = total - fresh.len(), "Ignoring clips that already exist");
                }
                if !fresh.is_empty() {
                    self.spawn_append(fresh);
                }
                false
            }
        }
    }

    fn apply_player_report(&mut self, report: PlayerReport) -> bool {
        let current = self.playback.current_clip();
        match report {
            PlayerReport::Elapsed { clip_id, secs } if Some(clip_id) == current => {
                // Progress ticks arrive every frame; the view polls time itself.
                self.apply_playback_event(PlaybackEvent::UpdateClipCurrentTime { secs });
                false
            }
            PlayerReport::Finished { clip_id } if Some(clip_id) == current => {
                self.apply_playback_event(PlaybackEvent::ClipFinished)
            }
            _ => false,
        }
    }

    fn run_clip_effect(&mut self, effect: ClipEffect) {
        let now = Instant::now();
        match effect {
            ClipEffect::ScrollToBottom => self.notify(EditorNotice::ScrollToBottom),
            ClipEffect::ArchiveClips { database_ids } => self.archive_batch.push(database_ids, now),
            ClipEffect::UpdateClipsScene { entries } => self.scene_batch.push(entries, now),
            ClipEffect::TranscribeClips { database_ids } => self.spawn_transcription(database_ids),
            ClipEffect::RowsRejected { database_ids } => self.notify(EditorNotice::RowsRejected {
                count: database_ids.len(),
            }),
        }
    }

    fn spawn_transcription(&mut self, ids: Vec<DatabaseId>) {
        tracing::info!(count = ids.len(), "Requesting transcription");
        let transcriber = Arc::clone(&self.transcriber);
        let events = self.events_tx.clone();
        self.inflight.spawn(async move {
            let event = match transcriber.transcribe(&ids).await {
                Ok(entries) => EditorEvent::Clip(ClipEvent::ClipsTranscribed { entries }),
                Err(err) => EditorEvent::EffectFailed {
                    effect: EffectKind::Transcribe,
                    message: format!("{err:#}"),
                },
            };
            let _ = events.send(event);
        });
    }

    fn spawn_append(&mut self, clips: Vec<CapturedClip>) {
        tracing::info!(count = clips.len(), "Storing captured clips");
        let store = Arc::clone(&self.store);
        let video_id = self.video_id.clone();
        let events = self.events_tx.clone();
        self.inflight.spawn(async move {
            let rows = match store.append_clips(&video_id, clips).await {
                Ok(rows) => rows,
                Err(err) => {
                    let _ = events.send(EditorEvent::EffectFailed {
                        effect: EffectKind::AppendClips,
                        message: format!("{err:#}"),
                    });
                    return;
                }
            };
            // Durations go first so the rows are checked against them.
            let files: BTreeSet<&str> = rows.iter().map(|row| row.video_filename.as_str()).collect();
            for (video_filename, duration) in lookup_durations(store.as_ref(), files).await {
                let _ = events.send(EditorEvent::MediaDurationKnown {
                    video_filename,
                    duration,
                });
            }
            let _ = events.send(EditorEvent::Clip(ClipEvent::DatabaseClipsArrived { clips: rows }));
        });
    }

    fn spawn_archive(&mut self, ids: Vec<DatabaseId>) {
        tracing::info!(count = ids.len(), "Archiving clips");
        let store = Arc::clone(&self.store);
        let events = self.events_tx.clone();
        self.inflight.spawn(async move {
            if let Err(err) = store.archive_clips(&ids).await {
                let _ = events.send(EditorEvent::EffectFailed {
                    effect: EffectKind::Archive,
                    message: format!("{err:#}"),
                });
            }
        });
    }

    fn spawn_scene_update(&mut self, entries: Vec<(DatabaseId, String)>) {
        tracing::info!(count = entries.len(), "Updating clip scenes");
        let store = Arc::clone(&self.store);
        let events = self.events_tx.clone();
        self.inflight.spawn(async move {
            if let Err(err) = store.update_clip_scenes(&entries).await {
                let _ = events.send(EditorEvent::EffectFailed {
                    effect: EffectKind::UpdateScenes,
                    message: format!("{err:#}"),
                });
            }
        });
    }

    fn next_deadline(&self) -> Option<Instant> {
        match (self.archive_batch.deadline(), self.scene_batch.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn flush_due(&mut self, now: Instant) {
        if let Some(ids) = self.archive_batch.take_due(now) {
            self.spawn_archive(ids);
        }
        if let Some(entries) = self.scene_batch.take_due(now) {
            self.spawn_scene_update(entries);
        }
    }

    /// Sends debounced batches now and waits for the store to accept them.
    pub async fn flush_pending(&mut self) {
        let archive = self.archive_batch.take();
        let scenes = self.scene_batch.take();
        let store = &self.store;

        let (archived, updated) = futures::future::join(
            async {
                match &archive {
                    Some(ids) => store.archive_clips(ids).await,
                    None => Ok(()),
                }
            },
            async {
                match &scenes {
                    Some(entries) => store.update_clip_scenes(entries).await,
                    None => Ok(()),
                }
            },
        )
        .await;

        for (effect, result) in [
            (EffectKind::Archive, archived),
            (EffectKind::UpdateScenes, updated),
        ] {
            if let Err(err) = result {
                let message = format!("{err:#}");
                tracing::warn!(%effect, %message, "Effect failed during flush");
                self.notify(EditorNotice::EffectFailed { effect, message });
            }
        }
    }
}

fn check_row(durations: &HashMap<String, f64>, row: &PersistedClipRow) -> Result<(), ReelError> {
    match durations.get(&row.video_filename) {
        Some(&duration) => row.validate_within(duration),
        None => row.validate(),
    }
}

/// Looks up source durations the store knows. Lookup failures only cost the
/// duration check, so they are logged and skipped.
async fn lookup_durations<S: ClipStore + ?Sized>(
    store: &S,
    files: BTreeSet<&str>,
) -> Vec<(String, f64)> {
    let mut durations = Vec::new();
    for video_filename in files {
        match store.media_duration(video_filename).await {
            Ok(Some(duration)) => durations.push((video_filename.to_string(), duration)),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(%video_filename, error = %format!("{err:#}"), "Media duration lookup failed");
            }
        }
    }
    durations
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(err) = result {
        tracing::error!(error = %err, "Effect task did not complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_kinds_have_stable_names() {
        assert_eq!(EffectKind::Archive.to_string(), "archive");
        assert_eq!(EffectKind::AppendClips.to_string(), "append-clips");
    }

    #[test]
    fn rows_are_checked_against_known_durations() {
        let durations = HashMap::from([("a.mkv".to_string(), 10.0)]);
        let mut row = PersistedClipRow {
            id: DatabaseId::from("1"),
            video_filename: "a.mkv".to_string(),
            source_start_time: 8.0,
            source_end_time: 12.0,
            text: String::new(),
            transcribed_at: None,
            scene: None,
        };
        assert!(matches!(
            check_row(&durations, &row),
            Err(ReelError::WindowBeyondMedia { .. })
        ));

        row.video_filename = "b.mkv".to_string();
        assert!(check_row(&durations, &row).is_ok(), "unknown duration");
    }

    #[test]
    fn events_convert_from_machine_events() {
        let event: EditorEvent = PlaybackEvent::PressSpaceBar.into();
        assert_eq!(event, EditorEvent::Playback(PlaybackEvent::PressSpaceBar));
        let event: EditorEvent = RecordingSignal::Started.into();
        assert_eq!(event, EditorEvent::Recording(RecordingSignal::Started));
    }
}
