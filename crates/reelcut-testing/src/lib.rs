//! Testing utilities for Reelcut.
//!
//! In-memory implementations of the editor's collaborators, a fake media
//! element driven by the tokio clock, and row fixtures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use reelcut_core::{
    CapturedClip, ClipStore, DatabaseId, EditorNotice, FrontendId, Lesson, LibraryStore,
    MediaCommand, MediaElement, MediaFactory, PersistedClipRow, Repo, Section, Transcriber, Video,
};
use tokio::sync::broadcast;
use tokio::time::Instant;
use uuid::Uuid;

// ============================================================================
// Fixtures
// ============================================================================

pub fn fid(n: u128) -> FrontendId {
    FrontendId::from_u128(n)
}

/// An untranscribed row from `recording.mkv`.
pub fn row(id: &str, start: f64, end: f64) -> PersistedClipRow {
    PersistedClipRow {
        id: DatabaseId::from(id),
        video_filename: "recording.mkv".to_string(),
        source_start_time: start,
        source_end_time: end,
        text: String::new(),
        transcribed_at: None,
        scene: None,
    }
}

pub fn transcribed_row(id: &str, start: f64, end: f64, text: &str) -> PersistedClipRow {
    PersistedClipRow {
        text: text.to_string(),
        transcribed_at: Some(Utc::now()),
        ..row(id, start, end)
    }
}

pub fn captured(video_filename: &str, start: f64, end: f64) -> CapturedClip {
    CapturedClip {
        video_filename: video_filename.to_string(),
        source_start_time: start,
        source_end_time: end,
        segments: Vec::new(),
    }
}

/// Waits for the first notice matching `pred`, skipping the rest.
pub async fn wait_for_notice<F>(
    notices: &mut broadcast::Receiver<EditorNotice>,
    timeout: Duration,
    mut pred: F,
) -> Result<EditorNotice>
where
    F: FnMut(&EditorNotice) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            match notices.recv().await {
                Ok(notice) if pred(&notice) => return Ok(notice),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => bail!("editor closed its notices"),
            }
        }
    })
    .await
    .map_err(|_| anyhow!("no matching notice within {timeout:?}"))?
}

// ============================================================================
// InMemoryClipStore
// ============================================================================

#[derive(Debug, Clone)]
struct StoredClip {
    video_id: String,
    seq: u64,
    row: PersistedClipRow,
    archived: bool,
}

/// Clip persistence backed by a concurrent map. Ids are sequential numbers
/// rendered as strings.
#[derive(Debug, Default)]
pub struct InMemoryClipStore {
    clips: DashMap<DatabaseId, StoredClip>,
    next_seq: AtomicU64,
    media_durations: DashMap<String, f64>,
    fail_writes: AtomicBool,
    archive_batches: Mutex<Vec<Vec<DatabaseId>>>,
    scene_batches: Mutex<Vec<Vec<(DatabaseId, String)>>>,
}

impl InMemoryClipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores rows directly, as if an earlier session had created them.
    pub fn seed(&self, video_id: &str, rows: impl IntoIterator<Item = PersistedClipRow>) {
        for row in rows {
            let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
            self.clips.insert(
                row.id.clone(),
                StoredClip {
                    video_id: video_id.to_string(),
                    seq,
                    row,
                    archived: false,
                },
            );
        }
    }

    pub fn set_media_duration(&self, video_filename: &str, secs: f64) {
        self.media_durations.insert(video_filename.to_string(), secs);
    }

    /// Makes every write fail until switched back.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn is_archived(&self, id: &DatabaseId) -> bool {
        self.clips.get(id).is_some_and(|clip| clip.archived)
    }

    pub fn scene_of(&self, id: &DatabaseId) -> Option<String> {
        self.clips.get(id).and_then(|clip| clip.row.scene.clone())
    }

    /// Every `archive_clips` call, in order.
    pub fn archive_batches(&self) -> Vec<Vec<DatabaseId>> {
        self.archive_batches
            .lock()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }

    pub fn scene_batches(&self) -> Vec<Vec<(DatabaseId, String)>> {
        self.scene_batches
            .lock()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("clip store is unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl ClipStore for InMemoryClipStore {
    async fn list_clips(&self, video_id: &str) -> Result<Vec<PersistedClipRow>> {
        let mut clips: Vec<StoredClip> = self
            .clips
            .iter()
            .filter(|entry| entry.video_id == video_id && !entry.archived)
            .map(|entry| entry.value().clone())
            .collect();
        clips.sort_by_key(|clip| clip.seq);
        Ok(clips.into_iter().map(|clip| clip.row).collect())
    }

    async fn append_clips(
        &self,
        video_id: &str,
        clips: Vec<CapturedClip>,
    ) -> Result<Vec<PersistedClipRow>> {
        self.check_writable()?;
        let mut rows = Vec::with_capacity(clips.len());
        for clip in clips {
            let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
            let text = clip.transcript();
            let row = PersistedClipRow {
                id: DatabaseId::new((seq + 1).to_string()),
                transcribed_at: (!text.is_empty()).then(Utc::now),
                text,
                video_filename: clip.video_filename,
                source_start_time: clip.source_start_time,
                source_end_time: clip.source_end_time,
                scene: None,
            };
            self.clips.insert(
                row.id.clone(),
                StoredClip {
                    video_id: video_id.to_string(),
                    seq,
                    row: row.clone(),
                    archived: false,
                },
            );
            rows.push(row);
        }
        Ok(rows)
    }

    async fn archive_clips(&self, ids: &[DatabaseId]) -> Result<()> {
        self.check_writable()?;
        for id in ids {
            let Some(mut clip) = self.clips.get_mut(id) else {
                bail!("clip {id} does not exist");
            };
            clip.archived = true;
        }
        if let Ok(mut batches) = self.archive_batches.lock() {
            batches.push(ids.to_vec());
        }
        Ok(())
    }

    async fn update_clip_scenes(&self, entries: &[(DatabaseId, String)]) -> Result<()> {
        self.check_writable()?;
        for (id, scene) in entries {
            if let Some(mut clip) = self.clips.get_mut(id) {
                clip.row.scene = Some(scene.clone());
            }
        }
        if let Ok(mut batches) = self.scene_batches.lock() {
            batches.push(entries.to_vec());
        }
        Ok(())
    }

    async fn media_duration(&self, video_filename: &str) -> Result<Option<f64>> {
        Ok(self.media_durations.get(video_filename).map(|secs| *secs))
    }
}

// ============================================================================
// ScriptedTranscriber
// ============================================================================

/// Returns canned transcripts. Ids without a scripted text get
/// `"transcript of <id>"`; withheld ids are left out of the response.
#[derive(Debug, Default)]
pub struct ScriptedTranscriber {
    texts: DashMap<DatabaseId, String>,
    withheld: DashMap<DatabaseId, ()>,
    failing: AtomicBool,
    calls: Mutex<Vec<Vec<DatabaseId>>>,
}

impl ScriptedTranscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, id: impl Into<DatabaseId>, text: impl Into<String>) -> Self {
        self.texts.insert(id.into(), text.into());
        self
    }

    pub fn withhold(self, id: impl Into<DatabaseId>) -> Self {
        self.withheld.insert(id.into(), ());
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Vec<DatabaseId>> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, ids: &[DatabaseId]) -> Result<Vec<(DatabaseId, String)>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ids.to_vec());
        }
        if self.failing.load(Ordering::SeqCst) {
            bail!("transcription service unavailable");
        }
        Ok(ids
            .iter()
            .filter(|id| !self.withheld.contains_key(*id))
            .map(|id| {
                let text = self
                    .texts
                    .get(id)
                    .map(|text| text.clone())
                    .unwrap_or_else(|| format!("transcript of {id}"));
                (id.clone(), text)
            })
            .collect())
    }
}

// ============================================================================
// InMemoryLibraryStore
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryLibraryStore {
    repos: DashMap<String, Repo>,
    sections: DashMap<String, Section>,
    lessons: DashMap<String, Lesson>,
    videos: DashMap<String, (u64, Video)>,
    next_order: AtomicU64,
}

impl InMemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_order(&self) -> u64 {
        self.next_order.fetch_add(1, Ordering::SeqCst)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[async_trait]
impl LibraryStore for InMemoryLibraryStore {
    async fn create_repo(&self, name: &str, file_path: &str) -> Result<Repo> {
        let repo = Repo {
            id: new_id(),
            name: name.to_string(),
            file_path: file_path.to_string(),
            created_at: Utc::now(),
        };
        self.repos.insert(repo.id.clone(), repo.clone());
        Ok(repo)
    }

    async fn list_repos(&self) -> Result<Vec<Repo>> {
        let mut repos: Vec<Repo> = self.repos.iter().map(|entry| entry.value().clone()).collect();
        repos.sort_by_key(|repo| repo.created_at);
        Ok(repos)
    }

    /// Removes the repo with its sections, lessons and videos.
    async fn delete_repo(&self, repo_id: &str) -> Result<()> {
        if self.repos.remove(repo_id).is_none() {
            bail!("repo {repo_id} does not exist");
        }
        let section_ids: Vec<String> = self
            .sections
            .iter()
            .filter(|entry| entry.repo_id == repo_id)
            .map(|entry| entry.id.clone())
            .collect();
        let lesson_ids: Vec<String> = self
            .lessons
            .iter()
            .filter(|entry| section_ids.contains(&entry.section_id))
            .map(|entry| entry.id.clone())
            .collect();
        self.videos
            .retain(|_, (_, video)| !lesson_ids.contains(&video.lesson_id));
        self.lessons.retain(|id, _| !lesson_ids.contains(id));
        self.sections.retain(|id, _| !section_ids.contains(id));
        Ok(())
    }

    async fn create_section(&self, repo_id: &str, path: &str) -> Result<Section> {
        if !self.repos.contains_key(repo_id) {
            bail!("repo {repo_id} does not exist");
        }
        let order = self.sections.iter().filter(|s| s.repo_id == repo_id).count() as u32;
        let section = Section {
            id: new_id(),
            repo_id: repo_id.to_string(),
            path: path.to_string(),
            order,
        };
        self.sections.insert(section.id.clone(), section.clone());
        Ok(section)
    }

    async fn list_sections(&self, repo_id: &str) -> Result<Vec<Section>> {
        let mut sections: Vec<Section> = self
            .sections
            .iter()
            .filter(|entry| entry.repo_id == repo_id)
            .map(|entry| entry.value().clone())
            .collect();
        sections.sort_by_key(|section| section.order);
        Ok(sections)
    }

    async fn create_lesson(&self, section_id: &str, path: &str) -> Result<Lesson> {
        if !self.sections.contains_key(section_id) {
            bail!("section {section_id} does not exist");
        }
        let order = self.lessons.iter().filter(|l| l.section_id == section_id).count() as u32;
        let lesson = Lesson {
            id: new_id(),
            section_id: section_id.to_string(),
            path: path.to_string(),
            order,
        };
        self.lessons.insert(lesson.id.clone(), lesson.clone());
        Ok(lesson)
    }

    async fn list_lessons(&self, section_id: &str) -> Result<Vec<Lesson>> {
        let mut lessons: Vec<Lesson> = self
            .lessons
            .iter()
            .filter(|entry| entry.section_id == section_id)
            .map(|entry| entry.value().clone())
            .collect();
        lessons.sort_by_key(|lesson| lesson.order);
        Ok(lessons)
    }

    async fn create_video(&self, lesson_id: &str, path: &str) -> Result<Video> {
        if !self.lessons.contains_key(lesson_id) {
            bail!("lesson {lesson_id} does not exist");
        }
        let video = Video {
            id: new_id(),
            lesson_id: lesson_id.to_string(),
            path: path.to_string(),
            archived: false,
        };
        self.videos
            .insert(video.id.clone(), (self.next_order(), video.clone()));
        Ok(video)
    }

    async fn list_videos(&self, lesson_id: &str) -> Result<Vec<Video>> {
        let mut videos: Vec<(u64, Video)> = self
            .videos
            .iter()
            .filter(|entry| entry.1.lesson_id == lesson_id && !entry.1.archived)
            .map(|entry| entry.value().clone())
            .collect();
        videos.sort_by_key(|(order, _)| *order);
        Ok(videos.into_iter().map(|(_, video)| video).collect())
    }

    async fn rename_video(&self, video_id: &str, path: &str) -> Result<Video> {
        let Some(mut entry) = self.videos.get_mut(video_id) else {
            bail!("video {video_id} does not exist");
        };
        entry.1.path = path.to_string();
        Ok(entry.1.clone())
    }

    async fn archive_video(&self, video_id: &str) -> Result<()> {
        let Some(mut entry) = self.videos.get_mut(video_id) else {
            bail!("video {video_id} does not exist");
        };
        entry.1.archived = true;
        Ok(())
    }
}

// ============================================================================
// Fake media
// ============================================================================

#[derive(Debug)]
struct MediaState {
    position: f64,
    playing_since: Option<Instant>,
    rate: f64,
    muted: bool,
    commands: Vec<MediaCommand>,
}

impl MediaState {
    fn now_at(&self) -> f64 {
        match self.playing_since {
            Some(since) => self.position + since.elapsed().as_secs_f64() * self.rate,
            None => self.position,
        }
    }

    fn settle(&mut self) {
        self.position = self.now_at();
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }
}

/// A media element whose time advances with the tokio clock while playing,
/// so tests with a paused clock control playback precisely.
#[derive(Debug, Clone)]
pub struct FakeMedia {
    video_filename: String,
    state: Arc<Mutex<MediaState>>,
}

impl FakeMedia {
    pub fn new(video_filename: &str) -> Self {
        Self {
            video_filename: video_filename.to_string(),
            state: Arc::new(Mutex::new(MediaState {
                position: 0.0,
                playing_since: None,
                rate: 1.0,
                muted: false,
                commands: Vec::new(),
            })),
        }
    }

    pub fn video_filename(&self) -> &str {
        &self.video_filename
    }

    pub fn is_playing(&self) -> bool {
        self.with_state(|state| state.playing_since.is_some())
    }

    pub fn is_muted(&self) -> bool {
        self.with_state(|state| state.muted)
    }

    pub fn commands(&self) -> Vec<MediaCommand> {
        self.with_state(|state| state.commands.clone())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MediaState) -> R) -> R {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state)
    }
}

impl MediaElement for FakeMedia {
    fn current_time(&self) -> f64 {
        self.with_state(|state| state.now_at())
    }

    fn seek(&mut self, secs: f64) {
        self.with_state(|state| {
            state.commands.push(MediaCommand::Seek(secs));
            state.position = secs;
            if state.playing_since.is_some() {
                state.playing_since = Some(Instant::now());
            }
        });
    }

    fn play(&mut self) {
        self.with_state(|state| {
            state.commands.push(MediaCommand::Play);
            if state.playing_since.is_none() {
                state.playing_since = Some(Instant::now());
            }
        });
    }

    fn pause(&mut self) {
        self.with_state(|state| {
            state.commands.push(MediaCommand::Pause);
            state.position = state.now_at();
            state.playing_since = None;
        });
    }

    fn set_muted(&mut self, muted: bool) {
        self.with_state(|state| {
            state.commands.push(MediaCommand::SetMuted(muted));
            state.muted = muted;
        });
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.with_state(|state| {
            state.commands.push(MediaCommand::SetRate(rate));
            state.settle();
            state.rate = rate;
        });
    }
}

/// Hands out [`FakeMedia`] and remembers every element it opened.
#[derive(Debug, Clone, Default)]
pub struct FakeMediaFactory {
    opened: Arc<Mutex<Vec<FakeMedia>>>,
}

impl FakeMediaFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<FakeMedia> {
        self.opened
            .lock()
            .map(|opened| opened.clone())
            .unwrap_or_default()
    }

    /// Opened elements grouped by source file.
    pub fn opened_by_file(&self) -> HashMap<String, Vec<FakeMedia>> {
        let mut grouped: HashMap<String, Vec<FakeMedia>> = HashMap::new();
        for media in self.opened() {
            grouped
                .entry(media.video_filename.clone())
                .or_default()
                .push(media);
        }
        grouped
    }
}

impl MediaFactory for FakeMediaFactory {
    type Element = FakeMedia;

    fn open(&self, video_filename: &str) -> FakeMedia {
        let media = FakeMedia::new(video_filename);
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(media.clone());
        }
        media
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_assigns_sequential_ids_and_lists_in_order() {
        let store = InMemoryClipStore::new();
        let rows = store
            .append_clips(
                "video",
                vec![captured("a.mkv", 0.0, 1.0), captured("a.mkv", 1.0, 2.0)],
            )
            .await
            .unwrap();
        assert_eq!(rows[0].id, DatabaseId::from("1"));
        assert_eq!(rows[1].id, DatabaseId::from("2"));

        store.archive_clips(&[DatabaseId::from("1")]).await.unwrap();
        let listed = store.list_clips("video").await.unwrap();
        assert_eq!(listed, vec![rows[1].clone()]);
    }

    #[tokio::test]
    async fn library_children_list_in_creation_order() {
        let library = InMemoryLibraryStore::new();
        let repo: Repo = library.create_repo("course", "/courses/rust").await.unwrap();
        let section: Section = library.create_section(&repo.id, "01-intro").await.unwrap();
        let first: Lesson = library.create_lesson(&section.id, "01.01-hello").await.unwrap();
        let second = library.create_lesson(&section.id, "01.02-borrowing").await.unwrap();
        let video: Video = library.create_video(&first.id, "explainer").await.unwrap();

        let lessons = library.list_lessons(&section.id).await.unwrap();
        assert_eq!(lessons, vec![first.clone(), second]);
        assert_eq!(library.list_videos(&first.id).await.unwrap(), vec![video]);

        library.delete_repo(&repo.id).await.unwrap();
        assert!(library.list_sections(&repo.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn withheld_ids_are_left_out() {
        let transcriber = ScriptedTranscriber::new()
            .with_text("1", "hello")
            .withhold("2");
        let out = transcriber
            .transcribe(&[DatabaseId::from("1"), DatabaseId::from("2"), DatabaseId::from("3")])
            .await
            .unwrap();
        assert_eq!(
            out,
            vec![
                (DatabaseId::from("1"), "hello".to_string()),
                (DatabaseId::from("3"), "transcript of 3".to_string()),
            ]
        );
    }
}
