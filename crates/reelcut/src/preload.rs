//! Turns the playback machine's preload set into mounted clip players.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::clip::FrontendId;
use crate::playback::PlaybackState;
use crate::player::{ClipPlayer, ClipWindow, Directive, PlayerReport, PlayerTiming};
use crate::poller::{spawn_player, MediaFactory, PollHandle};
use crate::reconcile::ClipTimeline;

/// A persisted clip reduced to what playback needs.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayableClip {
    pub id: FrontendId,
    pub video_filename: String,
    pub start: f64,
    pub end: f64,
}

impl PlayableClip {
    /// Persisted clips of `timeline`, in timeline order.
    pub fn from_timeline(timeline: &ClipTimeline) -> Vec<Self> {
        timeline
            .persisted()
            .map(|clip| Self {
                id: clip.frontend_id,
                video_filename: clip.video_filename.clone(),
                start: clip.source_start_time,
                end: clip.source_end_time,
            })
            .collect()
    }
}

/// One player the view should keep mounted.
#[derive(Clone, Debug, PartialEq)]
pub struct PreloadSlot {
    pub clip_id: FrontendId,
    pub video_filename: String,
    pub window: ClipWindow,
    /// Only the current clip is shown and heard.
    pub visible: bool,
}

/// Slots for every preloaded clip, in timeline order. The last clip of the
/// timeline gets `final_padding` seconds added to its end so trailing speech
/// is not cut off.
pub fn plan(
    preloaded: &BTreeSet<FrontendId>,
    current: Option<FrontendId>,
    clips: &[PlayableClip],
    final_padding: f64,
) -> Vec<PreloadSlot> {
    let last_index = clips.len().checked_sub(1);
    clips
        .iter()
        .enumerate()
        .filter(|(_, clip)| preloaded.contains(&clip.id) || Some(clip.id) == current)
        .map(|(index, clip)| {
            let padding = if Some(index) == last_index {
                final_padding
            } else {
                0.0
            };
            PreloadSlot {
                clip_id: clip.id,
                video_filename: clip.video_filename.clone(),
                window: ClipWindow {
                    start: clip.start,
                    end: clip.end + padding,
                },
                visible: Some(clip.id) == current,
            }
        })
        .collect()
}

struct MountedPlayer {
    window: ClipWindow,
    directive: watch::Sender<Directive>,
    end: watch::Sender<f64>,
    _poll: PollHandle,
}

/// Keeps one polling player per planned slot and tears players down when
/// their clip leaves the plan. A slot whose window only changed at the end
/// keeps its player; a moved start means a fresh mount.
pub struct PreloadManager<F: MediaFactory> {
    factory: F,
    timing: PlayerTiming,
    poll_interval: Duration,
    final_padding: f64,
    mounted: HashMap<FrontendId, MountedPlayer>,
    reports: mpsc::UnboundedSender<PlayerReport>,
}

impl<F: MediaFactory> PreloadManager<F> {
    pub fn new(
        factory: F,
        timing: PlayerTiming,
        poll_interval: Duration,
        final_padding: f64,
        reports: mpsc::UnboundedSender<PlayerReport>,
    ) -> Self {
        Self {
            factory,
            timing,
            poll_interval,
            final_padding,
            mounted: HashMap::new(),
            reports,
        }
    }

    pub fn mounted_ids(&self) -> BTreeSet<FrontendId> {
        self.mounted.keys().copied().collect()
    }

    /// Brings mounted players in line with `playback`. Must run inside a
    /// tokio runtime because new players spawn polling tasks.
    pub fn sync(&mut self, playback: &PlaybackState, clips: &[PlayableClip]) -> Vec<PreloadSlot> {
        let slots = plan(
            playback.preloaded(),
            playback.current_clip(),
            clips,
            self.final_padding,
        );

        self.mounted.retain(|id, mounted| {
            let keep = slots
                .iter()
                .any(|slot| slot.clip_id == *id && slot.window.start == mounted.window.start);
            if !keep {
                tracing::debug!(clip_id = %id, "Unmounting clip player");
            }
            keep
        });

        for slot in &slots {
            let directive = Directive {
                visible: slot.visible,
                running: playback.running(),
                rate: playback.rate(),
            };
            match self.mounted.get_mut(&slot.clip_id) {
                Some(mounted) => {
                    if mounted.window.end != slot.window.end {
                        tracing::debug!(clip_id = %slot.clip_id, end = slot.window.end, "Moving clip end");
                        mounted.end.send_replace(slot.window.end);
                        mounted.window = slot.window;
                    }
                    mounted.directive.send_replace(directive);
                }
                None => {
                    let (directive_tx, directive_rx) = watch::channel(directive);
                    let (end_tx, end_rx) = watch::channel(slot.window.end);
                    let player = ClipPlayer::new(slot.clip_id, slot.window, self.timing);
                    let media = self.factory.open(&slot.video_filename);
                    let poll = spawn_player(
                        player,
                        media,
                        self.poll_interval,
                        directive_rx,
                        end_rx,
                        self.reports.clone(),
                    );
                    tracing::debug!(clip_id = %slot.clip_id, visible = slot.visible, "Mounted clip player");
                    self.mounted.insert(
                        slot.clip_id,
                        MountedPlayer {
                            window: slot.window,
                            directive: directive_tx,
                            end: end_tx,
                            _poll: poll,
                        },
                    );
                }
            }
        }

        slots
    }

    /// Drops every player, cancelling its polling.
    pub fn clear(&mut self) {
        self.mounted.clear();
    }
}
