//! # Reelcut
//!
//! The core of a personal video-lesson editor: a timeline of clips cut from
//! raw recordings, keyboard-driven playback over that timeline, gapless
//! preloading of upcoming clips and a silence detector that marks clip
//! boundaries while recording.
//!
//! ## Core Concepts
//!
//! Every piece of editor state is owned by a pure [`Machine`]:
//! - [`ClipTimeline`] reconciles optimistic clips with rows from the store
//! - [`PlaybackState`] tracks the current clip, selection and preload set
//! - [`SpeechDetector`] turns volume samples into silence transitions
//!
//! A machine takes an event and returns the next state plus a list of
//! effects. It never performs IO. The [`Editor`] host runs the machines in
//! event order and carries out their effects.
//!
//! ## Architecture
//!
//! ```text
//! Recorder / View / ClipPlayers
//!     │
//!     ▼ EditorHandle::emit()
//! Editor.run() loop
//!     │
//!     ├─► ClipTimeline.reduce()   ─► ScrollToBottom, Archive, Transcribe, UpdateScene
//!     │
//!     ├─► PlaybackState.reduce()  ─► ArchiveClips (becomes ClipsDeleted)
//!     │
//!     └─► SpeechDetector.reduce() ─► SilenceSettled (becomes OptimisticClipDetected)
//!                │
//!                ▼
//!     Debouncer / JoinSet ─► ClipStore, Transcriber
//!                │
//!                └─► completion event back into the loop
//!
//! PreloadManager.sync(PlaybackState) ─► ClipPlayer per preloaded clip
//!                                         │ polled by a tokio interval
//!                                         └─► PlayerReport back into the loop
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Clip order is stable** - Optimistic clips become persisted clips in
//!    place, keeping their frontend id
//! 2. **Deletes are soft while pending** - Optimistic clips are flagged, not
//!    removed, so their row can be archived once it arrives
//! 3. **Preloading only grows** - Clips stay mounted until an explicit reset
//! 4. **Reducers are pure** - The same state and event give the same result
//!
//! ## Example
//!
//! ```ignore
//! use reelcut_core::{EditorBuilder, EditorConfig, PlaybackEvent, RecordingSignal};
//!
//! let (editor, handle) = EditorBuilder::new(store, transcriber)
//!     .with_config(EditorConfig::from_path("editor.json")?)
//!     .for_video("video-1")
//!     .load_existing()
//!     .await?
//!     .build()?;
//!
//! let running = tokio::spawn(editor.run());
//! let mut notices = handle.subscribe();
//!
//! handle.emit(RecordingSignal::Started)?;
//! handle.emit(PlaybackEvent::PressSpaceBar)?;
//! handle.shutdown()?;
//! let final_state = running.await?;
//! ```

mod capture;
mod clip;
mod config;
mod debounce;
mod editor;
mod error;
mod library;
mod machine;
mod media;
mod playback;
mod player;
mod poller;
mod preload;
mod reconcile;
mod services;
mod speech;
mod tap;

pub use capture::{dedupe_captured, CapturedClip, RecordingSignal, TranscriptSegment};
pub use clip::{
    Clip, DatabaseId, FrontendId, IdAllocator, OptimisticClip, PersistedClip, PersistedClipRow,
};
pub use config::EditorConfig;
pub use debounce::Debouncer;
pub use editor::{
    Editor, EditorBuilder, EditorEvent, EditorHandle, EditorNotice, EditorSnapshot, EffectKind,
};
pub use error::ReelError;
pub use library::{Lesson, LibraryStore, Repo, Section, Video};
pub use machine::{Effects, Machine, Transition};
pub use media::ByteRange;
pub use playback::{
    PlaybackEffect, PlaybackEvent, PlaybackRate, PlaybackState, RunningState,
    DEFAULT_PRELOAD_LOOKAHEAD,
};
pub use player::{
    ClipPlayer, ClipWindow, Directive, MediaCommand, MediaCommands, PlayerPhase, PlayerReport,
    PlayerTiming, TickOutput,
};
pub use poller::{spawn_player, MediaElement, MediaFactory, PollHandle};
pub use preload::{plan, PlayableClip, PreloadManager, PreloadSlot};
pub use reconcile::{ClipEffect, ClipEvent, ClipTimeline};
pub use services::{ClipStore, Transcriber};
pub use speech::{
    rms, volume_db, SilenceState, SpeechDetector, SpeechEffect, SpeechEvent,
    DEFAULT_LONG_SILENCE_MS, DEFAULT_SILENCE_THRESHOLD_DB,
};
pub use tap::{EventTap, TracingTap};
