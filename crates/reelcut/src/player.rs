//! Per-clip playback controller.
//!
//! A player first primes its media element: muted playback from a little
//! before the clip's start until the start is reached, then pause and unmute.
//! The decoder then holds a frame at the exact cut point, so switching to
//! the clip shows no seek delay. Once primed it mirrors the editor's
//! play/pause state while visible and reports progress on every poll.
//!
//! The controller is synchronous. It turns a media timestamp and the current
//! [`Directive`] into commands for the media element and reports for the
//! editor; [`crate::poller`] drives it.

use smallvec::SmallVec;

use crate::clip::FrontendId;
use crate::playback::{PlaybackRate, RunningState};

/// Source window a player is responsible for, in seconds of the source file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipWindow {
    pub start: f64,
    pub end: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerTiming {
    /// How far before the clip start priming begins.
    pub priming_lead: f64,
    /// Completion fires this far before the window end so playback never
    /// runs into the next clip's footage.
    pub end_guard: f64,
}

impl Default for PlayerTiming {
    fn default() -> Self {
        Self {
            priming_lead: 1.0,
            end_guard: 0.1,
        }
    }
}

/// What the editor currently wants from one player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Directive {
    pub visible: bool,
    pub running: RunningState,
    pub rate: PlaybackRate,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MediaCommand {
    Seek(f64),
    Play,
    Pause,
    SetMuted(bool),
    SetRate(f64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerReport {
    Elapsed { clip_id: FrontendId, secs: f64 },
    Finished { clip_id: FrontendId },
}

pub type MediaCommands = SmallVec<[MediaCommand; 4]>;

#[derive(Debug, Default, PartialEq)]
pub struct TickOutput {
    pub commands: MediaCommands,
    pub reports: SmallVec<[PlayerReport; 2]>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerPhase {
    Unmounted,
    Priming,
    Ready,
}

#[derive(Debug)]
pub struct ClipPlayer {
    clip_id: FrontendId,
    window: ClipWindow,
    timing: PlayerTiming,
    phase: PlayerPhase,
    playing: bool,
    rate: f64,
    /// Set after completion; cleared once the editor stops asking for
    /// playback, so a late directive cannot replay the finished clip.
    holding_after_finish: bool,
}

impl ClipPlayer {
    pub fn new(clip_id: FrontendId, window: ClipWindow, timing: PlayerTiming) -> Self {
        Self {
            clip_id,
            window,
            timing,
            phase: PlayerPhase::Unmounted,
            playing: false,
            rate: 1.0,
            holding_after_finish: false,
        }
    }

    pub fn clip_id(&self) -> FrontendId {
        self.clip_id
    }

    pub fn window(&self) -> ClipWindow {
        self.window
    }

    /// Moves the end of the window, e.g. when the clip stops being the last
    /// one and loses its padding. Priming is unaffected.
    pub fn set_end(&mut self, end: f64) {
        self.window.end = end;
    }

    pub fn phase(&self) -> PlayerPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Starts priming.
    pub fn mount(&mut self) -> MediaCommands {
        self.phase = PlayerPhase::Priming;
        self.playing = false;
        let prime_from = (self.window.start - self.timing.priming_lead).max(0.0);
        smallvec::smallvec![
            MediaCommand::SetMuted(true),
            MediaCommand::Seek(prime_from),
            MediaCommand::Play,
        ]
    }

    pub fn tick(&mut self, media_time: f64, directive: Directive) -> TickOutput {
        let mut out = TickOutput::default();
        match self.phase {
            PlayerPhase::Unmounted => {}
            PlayerPhase::Priming => {
                if media_time >= self.window.start {
                    out.commands.push(MediaCommand::Pause);
                    out.commands.push(MediaCommand::Seek(self.window.start));
                    out.commands.push(MediaCommand::SetMuted(false));
                    self.phase = PlayerPhase::Ready;
                }
            }
            PlayerPhase::Ready => self.follow(media_time, directive, &mut out),
        }
        out
    }

    fn follow(&mut self, media_time: f64, directive: Directive, out: &mut TickOutput) {
        let wants_playing = directive.visible && directive.running == RunningState::Playing;
        if !wants_playing {
            self.holding_after_finish = false;
        }

        let rate = directive.rate.multiplier();
        if (rate - self.rate).abs() > f64::EPSILON {
            out.commands.push(MediaCommand::SetRate(rate));
            self.rate = rate;
        }

        if wants_playing && !self.playing && !self.holding_after_finish {
            out.commands.push(MediaCommand::Play);
            self.playing = true;
        } else if !wants_playing && self.playing {
            out.commands.push(MediaCommand::Pause);
            self.playing = false;
        }

        if directive.visible {
            out.reports.push(PlayerReport::Elapsed {
                clip_id: self.clip_id,
                secs: (media_time - self.window.start).max(0.0),
            });
        }

        if self.playing && media_time >= self.window.end - self.timing.end_guard {
            out.commands.push(MediaCommand::Pause);
            out.commands.push(MediaCommand::Seek(self.window.start));
            out.reports.push(PlayerReport::Finished {
                clip_id: self.clip_id,
            });
            self.playing = false;
            self.holding_after_finish = true;
        }
    }
}
