//! Playback, selection and preload state for the timeline editor.
//!
//! This machine owns ids only. The caller supplies the ordered clip ids on
//! every reduction; an id the caller no longer lists is treated as gone and
//! any event naming it leaves the state untouched.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::clip::FrontendId;
use crate::machine::{Machine, Transition};

/// Number of clips after the current one kept primed for gapless playback.
pub const DEFAULT_PRELOAD_LOOKAHEAD: usize = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunningState {
    Playing,
    #[default]
    Paused,
}

impl RunningState {
    fn toggled(self) -> Self {
        match self {
            RunningState::Playing => RunningState::Paused,
            RunningState::Paused => RunningState::Playing,
        }
    }
}

/// The two playback speeds the editor offers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackRate {
    #[default]
    Normal,
    Double,
}

impl PlaybackRate {
    pub fn multiplier(self) -> f64 {
        match self {
            PlaybackRate::Normal => 1.0,
            PlaybackRate::Double => 2.0,
        }
    }
}

/// Keyboard, pointer and media events consumed by [`PlaybackState`].
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    ClickClip {
        clip_id: FrontendId,
        shift: bool,
        ctrl: bool,
    },
    PressArrowLeft,
    PressArrowUp,
    PressArrowRight,
    PressArrowDown,
    PressHome,
    PressEnd,
    PressSpaceBar,
    PressEnter,
    PressDelete,
    /// Normal speed. Pressing again at normal speed toggles play/pause.
    PressK,
    /// Double speed. Pressing again at double speed toggles play/pause.
    PressL,
    /// The current clip's media reached its end.
    ClipFinished,
    /// Elapsed time inside the current clip, as reported by its player.
    UpdateClipCurrentTime { secs: f64 },
    /// The clip list changed underneath the editor.
    ClipsUpdatedFromExternalSource { ids: Vec<FrontendId> },
    TimelineViewKeyDown,
    TimelineViewKeyUp,
    /// Forget every preloaded clip, e.g. when switching to another video.
    ResetPreloaded,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackEffect {
    ArchiveClips { frontend_ids: Vec<FrontendId> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    preloaded: BTreeSet<FrontendId>,
    running: RunningState,
    current_clip: Option<FrontendId>,
    current_time: f64,
    selected: BTreeSet<FrontendId>,
    /// Anchor for shift-click ranges and arrow navigation. Always a member of
    /// `selected` when set.
    last_selected: Option<FrontendId>,
    rate: PlaybackRate,
    force_view_timeline: bool,
    lookahead: usize,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

fn position(ids: &[FrontendId], id: FrontendId) -> Option<usize> {
    ids.iter().position(|candidate| *candidate == id)
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            preloaded: BTreeSet::new(),
            running: RunningState::Paused,
            current_clip: None,
            current_time: 0.0,
            selected: BTreeSet::new(),
            last_selected: None,
            rate: PlaybackRate::Normal,
            force_view_timeline: false,
            lookahead: DEFAULT_PRELOAD_LOOKAHEAD,
        }
    }

    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Starts with `clip_id` current and paused, preloading around it.
    pub fn starting_at(self, ids: &[FrontendId], clip_id: FrontendId) -> Self {
        if position(ids, clip_id).is_none() {
            return self;
        }
        let mut next = self;
        next.current_clip = Some(clip_id);
        next.current_time = 0.0;
        next.preload_pass(ids)
    }

    pub fn preloaded(&self) -> &BTreeSet<FrontendId> {
        &self.preloaded
    }

    pub fn running(&self) -> RunningState {
        self.running
    }

    pub fn is_playing(&self) -> bool {
        self.running == RunningState::Playing
    }

    pub fn current_clip(&self) -> Option<FrontendId> {
        self.current_clip
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn selected(&self) -> &BTreeSet<FrontendId> {
        &self.selected
    }

    pub fn last_selected(&self) -> Option<FrontendId> {
        self.last_selected
    }

    pub fn rate(&self) -> PlaybackRate {
        self.rate
    }

    pub fn force_view_timeline(&self) -> bool {
        self.force_view_timeline
    }

    /// Marks the current clip, the clips right after it and every selected
    /// clip as preloaded. Never removes anything.
    fn preload_pass(mut self, ids: &[FrontendId]) -> Self {
        if let Some(index) = self.current_clip.and_then(|id| position(ids, id)) {
            let end = (index + 1 + self.lookahead).min(ids.len());
            self.preloaded.extend(ids[index..end].iter().copied());
        }
        let selected: Vec<FrontendId> = self
            .selected
            .iter()
            .copied()
            .filter(|id| ids.contains(id))
            .collect();
        self.preloaded.extend(selected);
        self
    }

    fn select_only(&mut self, id: FrontendId) {
        self.selected.clear();
        self.selected.insert(id);
        self.last_selected = Some(id);
    }

    fn play_from_start(&mut self, id: FrontendId) {
        self.current_clip = Some(id);
        self.current_time = 0.0;
        self.running = RunningState::Playing;
    }

    fn toggle(&self) -> Self {
        let mut next = self.clone();
        next.running = next.running.toggled();
        next
    }

    fn click(&self, ids: &[FrontendId], clip_id: FrontendId, shift: bool, ctrl: bool) -> Self {
        if position(ids, clip_id).is_none() {
            tracing::debug!(%clip_id, "Click on a clip that is no longer listed");
            return self.clone();
        }
        let mut next = self.clone();

        if ctrl {
            if next.selected.remove(&clip_id) {
                if next.last_selected == Some(clip_id) {
                    // Fall back to the selected clip latest in the sequence.
                    next.last_selected = ids
                        .iter()
                        .rev()
                        .find(|id| next.selected.contains(*id))
                        .copied();
                }
            } else {
                next.selected.insert(clip_id);
                next.last_selected = Some(clip_id);
            }
        } else if shift {
            match self.last_selected.and_then(|anchor| position(ids, anchor)) {
                Some(anchor) => {
                    let target = position(ids, clip_id).unwrap_or(anchor);
                    let (lo, hi) = (anchor.min(target), anchor.max(target));
                    next.selected = ids[lo..=hi].iter().copied().collect();
                    next.last_selected = Some(clip_id);
                }
                None => next.select_only(clip_id),
            }
        } else if self.selected.len() == 1 && self.selected.contains(&clip_id) {
            next.play_from_start(clip_id);
        } else {
            next.select_only(clip_id);
        }

        next.preload_pass(ids)
    }

    fn step(&self, ids: &[FrontendId], forward: bool) -> Self {
        if self.selected.is_empty() {
            let Some(current) = self.current_clip.filter(|id| ids.contains(id)) else {
                return self.clone();
            };
            let mut next = self.clone();
            next.select_only(current);
            return next.preload_pass(ids);
        }

        let Some(index) = self.last_selected.and_then(|id| position(ids, id)) else {
            return self.clone();
        };
        let target = if forward {
            index.checked_add(1)
        } else {
            index.checked_sub(1)
        };
        let Some(&id) = target.and_then(|target| ids.get(target)) else {
            return self.clone();
        };

        let mut next = self.clone();
        next.select_only(id);
        next.preload_pass(ids)
    }

    fn jump(&self, ids: &[FrontendId], id: Option<&FrontendId>) -> Self {
        let Some(&id) = id else {
            return self.clone();
        };
        let mut next = self.clone();
        next.select_only(id);
        next.preload_pass(ids)
    }

    fn enter(&self, ids: &[FrontendId]) -> Self {
        if self.selected.is_empty() {
            return self.toggle();
        }
        let Some(target) = self.last_selected.filter(|id| ids.contains(id)) else {
            return self.clone();
        };
        if self.current_clip == Some(target) {
            return self.toggle();
        }

        let mut next = self.clone();
        next.play_from_start(target);
        next.select_only(target);
        next.preload_pass(ids)
    }

    fn rate_key(&self, rate: PlaybackRate) -> Self {
        if self.rate == rate {
            return self.toggle();
        }
        let mut next = self.clone();
        next.rate = rate;
        next.running = RunningState::Playing;
        next
    }

    fn finished(&self, ids: &[FrontendId]) -> Self {
        let Some(index) = self.current_clip.and_then(|id| position(ids, id)) else {
            return self.clone();
        };
        let mut next = self.clone();
        match ids.get(index + 1) {
            Some(&upcoming) => {
                next.current_clip = Some(upcoming);
                next.current_time = 0.0;
                let end = (index + 1 + self.lookahead).min(ids.len());
                next.preloaded.extend(ids[index + 1..end].iter().copied());
            }
            None => next.running = RunningState::Paused,
        }
        next
    }

    fn delete(&self, ids: &[FrontendId]) -> Transition<Self, PlaybackEffect> {
        let deleted: Vec<FrontendId> = ids
            .iter()
            .copied()
            .filter(|id| self.selected.contains(id))
            .collect();
        let (Some(&first), Some(&last)) = (deleted.first(), deleted.last()) else {
            return Transition::to(self.clone());
        };
        let lo = position(ids, first).unwrap_or(0);
        let hi = position(ids, last).unwrap_or(lo);

        let survivor = ids
            .get(hi + 1)
            .or_else(|| lo.checked_sub(1).and_then(|before| ids.get(before)))
            .or_else(|| ids.iter().find(|id| !self.selected.contains(*id)))
            .copied();

        let mut next = self.clone();
        next.selected.clear();
        next.last_selected = None;
        if let Some(survivor) = survivor {
            next.select_only(survivor);
        }
        if self.current_clip.is_some_and(|current| deleted.contains(&current)) {
            next.current_clip = survivor;
            next.current_time = 0.0;
            next.running = RunningState::Paused;
        }

        let remaining: Vec<FrontendId> = ids
            .iter()
            .copied()
            .filter(|id| !deleted.contains(id))
            .collect();
        let next = next.preload_pass(&remaining);

        Transition::with_effects(
            next,
            smallvec::smallvec![PlaybackEffect::ArchiveClips {
                frontend_ids: deleted
            }],
        )
    }

    fn clips_updated(&self, ids: &[FrontendId]) -> Self {
        let mut next = self.clone();
        next.selected.retain(|id| ids.contains(id));
        if next.last_selected.is_some_and(|id| !next.selected.contains(&id)) {
            next.last_selected = ids
                .iter()
                .rev()
                .find(|id| next.selected.contains(*id))
                .copied();
        }
        if next.current_clip.is_some_and(|id| !ids.contains(&id)) {
            next.current_clip = None;
            next.current_time = 0.0;
            next.running = RunningState::Paused;
        }
        if next.current_clip.is_none() {
            if let Some(&first) = ids.first() {
                next.current_clip = Some(first);
                next.current_time = 0.0;
            }
        }
        next.preload_pass(ids)
    }
}

impl Machine for PlaybackState {
    type Event = PlaybackEvent;
    type Effect = PlaybackEffect;
    type Context = [FrontendId];

    fn reduce(&self, ids: &[FrontendId], event: &PlaybackEvent) -> Transition<Self, PlaybackEffect> {
        let next = match event {
            PlaybackEvent::ClickClip {
                clip_id,
                shift,
                ctrl,
            } => self.click(ids, *clip_id, *shift, *ctrl),
            PlaybackEvent::PressArrowLeft | PlaybackEvent::PressArrowUp => self.step(ids, false),
            PlaybackEvent::PressArrowRight | PlaybackEvent::PressArrowDown => self.step(ids, true),
            PlaybackEvent::PressHome => self.jump(ids, ids.first()),
            PlaybackEvent::PressEnd => self.jump(ids, ids.last()),
            PlaybackEvent::PressSpaceBar => self.toggle(),
            PlaybackEvent::PressEnter => self.enter(ids),
            PlaybackEvent::PressDelete => return self.delete(ids),
            PlaybackEvent::PressK => self.rate_key(PlaybackRate::Normal),
            PlaybackEvent::PressL => self.rate_key(PlaybackRate::Double),
            PlaybackEvent::ClipFinished => self.finished(ids),
            PlaybackEvent::UpdateClipCurrentTime { secs } => {
                let mut next = self.clone();
                if next.current_clip.is_some() {
                    next.current_time = *secs;
                }
                next
            }
            PlaybackEvent::ClipsUpdatedFromExternalSource { ids } => self.clips_updated(ids),
            PlaybackEvent::TimelineViewKeyDown => Self {
                force_view_timeline: true,
                ..self.clone()
            },
            PlaybackEvent::TimelineViewKeyUp => Self {
                force_view_timeline: false,
                ..self.clone()
            },
            PlaybackEvent::ResetPreloaded => Self {
                preloaded: BTreeSet::new(),
                ..self.clone()
            }
            .preload_pass(ids),
        };
        Transition::to(next)
    }
}
