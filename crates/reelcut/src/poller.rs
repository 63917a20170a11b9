//! Cancelable frame polling for mounted clip players.
//!
//! Each mounted player gets one tokio task that samples its media element on
//! a fixed period. The task lives exactly as long as its [`PollHandle`];
//! dropping the handle aborts it.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::player::{ClipPlayer, Directive, MediaCommand, PlayerReport};

/// The playback surface a [`ClipPlayer`] drives, e.g. a decoder-backed video
/// element.
pub trait MediaElement: Send + 'static {
    fn current_time(&self) -> f64;
    fn seek(&mut self, secs: f64);
    fn play(&mut self);
    fn pause(&mut self);
    fn set_muted(&mut self, muted: bool);
    fn set_playback_rate(&mut self, rate: f64);

    fn apply(&mut self, command: MediaCommand) {
        match command {
            MediaCommand::Seek(secs) => self.seek(secs),
            MediaCommand::Play => self.play(),
            MediaCommand::Pause => self.pause(),
            MediaCommand::SetMuted(muted) => self.set_muted(muted),
            MediaCommand::SetRate(rate) => self.set_playback_rate(rate),
        }
    }
}

/// Opens media elements for source files.
pub trait MediaFactory {
    type Element: MediaElement;

    fn open(&self, video_filename: &str) -> Self::Element;
}

/// Owner of a polling task. Dropping it cancels the task.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Mounts `player` on `media` and polls it every `period` until the handle is
/// dropped or the report receiver goes away. New values on `ends` move the
/// end of the player's window without remounting it.
///
/// Must be called from within a tokio runtime.
pub fn spawn_player<M: MediaElement>(
    mut player: ClipPlayer,
    mut media: M,
    period: Duration,
    mut directives: watch::Receiver<Directive>,
    mut ends: watch::Receiver<f64>,
    reports: mpsc::UnboundedSender<PlayerReport>,
) -> PollHandle {
    let task = tokio::spawn(async move {
        for command in player.mount() {
            media.apply(command);
        }

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if ends.has_changed().unwrap_or(false) {
                player.set_end(*ends.borrow_and_update());
            }
            let directive = *directives.borrow_and_update();
            let out = player.tick(media.current_time(), directive);
            for command in out.commands {
                media.apply(command);
            }
            for report in out.reports {
                if reports.send(report).is_err() {
                    tracing::debug!(clip_id = %player.clip_id(), "Report receiver gone, stopping poll");
                    return;
                }
            }
        }
    });
    PollHandle { task }
}
