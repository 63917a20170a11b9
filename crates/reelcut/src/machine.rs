//! The pure state-machine contract shared by every editor engine.
//!
//! A machine is a value. Reducing it with an event never mutates it; the
//! result is a fresh state plus the effects the host should run.

use smallvec::SmallVec;

/// Effects produced by one reduction. Most events produce zero to four.
pub type Effects<E> = SmallVec<[E; 4]>;

/// Outcome of reducing one event.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<S, E> {
    pub state: S,
    pub effects: Effects<E>,
}

impl<S, E> Transition<S, E> {
    /// New state, no effects.
    pub fn to(state: S) -> Self {
        Self {
            state,
            effects: Effects::new(),
        }
    }

    pub fn with_effects(state: S, effects: Effects<E>) -> Self {
        Self { state, effects }
    }

    pub fn into_parts(self) -> (S, Effects<E>) {
        (self.state, self.effects)
    }
}

/// A deterministic reducer: `(state, event) -> (state', effects)`.
///
/// Machines do no IO and never fail. `Context` carries read-only inputs the
/// machine does not own, such as the caller's ordered clip ids.
pub trait Machine: Clone + PartialEq + Sized {
    type Event;
    type Effect;
    type Context: ?Sized;

    fn reduce(&self, ctx: &Self::Context, event: &Self::Event) -> Transition<Self, Self::Effect>;
}
