//! Replays a short scripted recording session through the editor.
//!
//! Usage: `recording-session [config.json]`. Set `RUST_LOG=debug` (or
//! `trace` to see every event) for more detail.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reelcut_core::{
    CapturedClip, Clip, EditorBuilder, EditorConfig, EditorEvent, EditorNotice, LibraryStore,
    PlayableClip, PlaybackEvent, PreloadManager, RecordingSignal, SpeechEvent, TracingTap,
    TranscriptSegment,
};
use reelcut_testing::{
    FakeMediaFactory, InMemoryClipStore, InMemoryLibraryStore, ScriptedTranscriber,
};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing_subscriber::EnvFilter;

const FRAME_MS: u64 = 50;
const SPEECH_FRAMES: u64 = 24;
const SILENCE_FRAMES: u64 = 20;

const TAKES: [&str; 3] = [
    "Borrowing lets a function use a value without taking ownership.",
    "Um, let me start that again.",
    "A shared reference can be copied as often as you like.",
];

fn tone(amplitude: f32) -> Vec<f32> {
    (0..480).map(|i| amplitude * (i as f32 * 0.13).sin()).collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EditorConfig::from_path(path)?,
        None => EditorConfig::default(),
    };

    let library = InMemoryLibraryStore::new();
    let repo = library.create_repo("rust-course", "/courses/rust").await?;
    let section = library.create_section(&repo.id, "01-ownership").await?;
    let lesson = library.create_lesson(&section.id, "01.02-borrowing").await?;
    let video = library.create_video(&lesson.id, "explainer").await?;
    tracing::info!(repo = %repo.name, lesson = %lesson.path, video = %video.path, "Recording into library");

    let store = Arc::new(InMemoryClipStore::new());
    store.set_media_duration("explainer.mkv", 60.0);
    let transcriber = TAKES
        .iter()
        .enumerate()
        .fold(ScriptedTranscriber::new(), |transcriber, (n, text)| {
            transcriber.with_text((n + 1).to_string(), *text)
        });
    let (editor, handle) = EditorBuilder::new(store.clone(), Arc::new(transcriber))
        .with_config(config.clone())
        .for_video(video.id.clone())
        .with_scene("Camera")
        .with_tap(TracingTap)
        .load_existing()
        .await?
        .build()?;
    let editor = tokio::spawn(editor.run());

    let (reports_tx, reports_rx) = mpsc::unbounded_channel();
    let forwarder = handle.forward_player_reports(reports_rx);
    let mut preload = PreloadManager::new(
        FakeMediaFactory::new(),
        config.player_timing(),
        config.poll_interval(),
        config.final_clip_padding_secs,
        reports_tx,
    );

    let mut notices = handle.subscribe();
    let viewer = tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(EditorNotice::StateChanged(snapshot)) => {
                    let clips = PlayableClip::from_timeline(&snapshot.clips);
                    let slots = preload.sync(&snapshot.playback, &clips);
                    tracing::debug!(mounted = slots.len(), "Preload synced");
                }
                Ok(EditorNotice::ScrollToBottom) => tracing::info!("Scrolled to newest clip"),
                Ok(EditorNotice::RowsRejected { count }) => {
                    tracing::warn!(count, "Store sent unplayable clips");
                }
                Ok(EditorNotice::EffectFailed { effect, message }) => {
                    tracing::warn!(%effect, %message, "Editor effect failed");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Viewer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
        preload.clear();
    });

    handle.emit(RecordingSignal::Started)?;
    let mut clock_ms = 0;
    let mut take_start = 0.0;
    for (take, words) in TAKES.iter().enumerate() {
        for _ in 0..SPEECH_FRAMES {
            handle.emit(SpeechEvent::AudioFrame {
                samples: tone(0.3),
                at_ms: clock_ms,
            })?;
            clock_ms += FRAME_MS;
        }
        let take_end = clock_ms as f64 / 1000.0;
        for _ in 0..SILENCE_FRAMES {
            handle.emit(SpeechEvent::AudioFrame {
                samples: tone(0.001),
                at_ms: clock_ms,
            })?;
            clock_ms += FRAME_MS;
        }

        handle.emit(RecordingSignal::ClipsCaptured(vec![CapturedClip {
            video_filename: "explainer.mkv".to_string(),
            source_start_time: take_start,
            source_end_time: take_end,
            segments: vec![TranscriptSegment {
                start: take_start,
                end: take_end,
                text: words.to_string(),
            }],
        }]))?;
        take_start = clock_ms as f64 / 1000.0;

        if take == 0 {
            handle.emit(EditorEvent::SceneChanged {
                scene: "Screen".to_string(),
            })?;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    handle.emit(RecordingSignal::Stopped)?;

    // Drop the false start, then watch the lesson from the top.
    for key in [
        PlaybackEvent::PressHome,
        PlaybackEvent::PressArrowDown,
        PlaybackEvent::PressDelete,
        PlaybackEvent::PressHome,
        PlaybackEvent::PressEnter,
    ] {
        handle.emit(key)?;
    }
    tokio::time::sleep(Duration::from_secs(6)).await;

    handle.shutdown()?;
    let snapshot = editor.await?;
    drop(handle);
    viewer.await?;
    forwarder.abort();

    for clip in snapshot.clips.clips() {
        match clip {
            Clip::Persisted(clip) => tracing::info!(
                database_id = %clip.database_id,
                scene = clip.scene.as_deref().unwrap_or("-"),
                window = %format!("{:.2}..{:.2}", clip.source_start_time, clip.source_end_time),
                text = %clip.text,
                "Clip"
            ),
            Clip::Optimistic(pending) => {
                tracing::info!(frontend_id = %pending.frontend_id, "Clip never stored");
            }
        }
    }
    tracing::info!(
        archived = ?store.archive_batches(),
        current = ?snapshot.playback.current_clip(),
        "Session finished"
    );
    Ok(())
}
