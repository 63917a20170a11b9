//! Silence tracking over a live microphone feed.
//!
//! ```text
//!                 volume < threshold
//! NoSilenceDetected ─────────────────► InitialSilenceDetected { since }
//!        ▲                                    │
//!        │ volume >= threshold                │ below threshold for
//!        │ (from either silence state)        │ long_silence_ms
//!        │                                    ▼
//!        └─────────────────────────── LongEnoughSilenceDetected { since }
//! ```

use serde::{Deserialize, Serialize};

use crate::machine::{Effects, Machine, Transition};

pub const DEFAULT_SILENCE_THRESHOLD_DB: f32 = -40.0;
pub const DEFAULT_LONG_SILENCE_MS: u64 = 800;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SilenceState {
    #[default]
    NoSilenceDetected,
    InitialSilenceDetected {
        since_ms: u64,
    },
    LongEnoughSilenceDetected {
        since_ms: u64,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpeechEvent {
    /// Raw mono samples in `[-1, 1]` captured at `at_ms` on the stream clock.
    AudioFrame { samples: Vec<f32>, at_ms: u64 },
    /// A volume already computed by the capture side.
    VolumeMeasured { db: f32, at_ms: u64 },
    /// External recording started; forget any silence in progress.
    RecordingStarted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeechEffect {
    /// Volume rose above the threshold after a silence.
    SpeechResumed { at_ms: u64 },
    /// Silence has lasted long enough to count as a pause between takes.
    SilenceSettled { since_ms: u64 },
}

/// Root-mean-square amplitude of a frame.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Frame volume in dBFS. Digital silence maps to negative infinity.
pub fn volume_db(samples: &[f32]) -> f32 {
    let amplitude = rms(samples);
    if amplitude <= 0.0 {
        return f32::NEG_INFINITY;
    }
    20.0 * amplitude.log10()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeechDetector {
    state: SilenceState,
    threshold_db: f32,
    long_silence_ms: u64,
}

impl Default for SpeechDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SILENCE_THRESHOLD_DB, DEFAULT_LONG_SILENCE_MS)
    }
}

impl SpeechDetector {
    pub fn new(threshold_db: f32, long_silence_ms: u64) -> Self {
        Self {
            state: SilenceState::NoSilenceDetected,
            threshold_db,
            long_silence_ms,
        }
    }

    pub fn state(&self) -> SilenceState {
        self.state
    }

    fn with_state(&self, state: SilenceState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }

    fn measure(&self, db: f32, at_ms: u64) -> Transition<Self, SpeechEffect> {
        let silent = db < self.threshold_db;

        match (self.state, silent) {
            (SilenceState::NoSilenceDetected, true) => Transition::to(
                self.with_state(SilenceState::InitialSilenceDetected { since_ms: at_ms }),
            ),
            (SilenceState::InitialSilenceDetected { since_ms }, true)
                if at_ms.saturating_sub(since_ms) >= self.long_silence_ms =>
            {
                Transition::with_effects(
                    self.with_state(SilenceState::LongEnoughSilenceDetected { since_ms }),
                    smallvec::smallvec![SpeechEffect::SilenceSettled { since_ms }],
                )
            }
            (
                SilenceState::InitialSilenceDetected { .. }
                | SilenceState::LongEnoughSilenceDetected { .. },
                false,
            ) => Transition::with_effects(
                self.with_state(SilenceState::NoSilenceDetected),
                smallvec::smallvec![SpeechEffect::SpeechResumed { at_ms }],
            ),
            _ => Transition::to(self.clone()),
        }
    }
}

impl Machine for SpeechDetector {
    type Event = SpeechEvent;
    type Effect = SpeechEffect;
    type Context = ();

    fn reduce(&self, _: &(), event: &SpeechEvent) -> Transition<Self, SpeechEffect> {
        match event {
            SpeechEvent::AudioFrame { samples, at_ms } => self.measure(volume_db(samples), *at_ms),
            SpeechEvent::VolumeMeasured { db, at_ms } => self.measure(*db, *at_ms),
            SpeechEvent::RecordingStarted => Transition::with_effects(
                self.with_state(SilenceState::NoSilenceDetected),
                Effects::new(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(detector: SpeechDetector, frames: &[(f32, u64)]) -> (SpeechDetector, Vec<SpeechEffect>) {
        let mut effects = Vec::new();
        let detector = frames.iter().fold(detector, |detector, &(db, at_ms)| {
            let (next, emitted) = detector
                .reduce(&(), &SpeechEvent::VolumeMeasured { db, at_ms })
                .into_parts();
            effects.extend(emitted);
            next
        });
        (detector, effects)
    }

    #[test]
    fn rms_and_db_of_known_signals() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[0.5, -0.5, 0.5, -0.5]) - 0.5).abs() < 1e-6);
        assert_eq!(volume_db(&[0.0; 64]), f32::NEG_INFINITY);
        assert!((volume_db(&[1.0, -1.0]) - 0.0).abs() < 1e-6);
        assert!((volume_db(&[0.1, -0.1]) + 20.0).abs() < 1e-4);
    }

    #[test]
    fn silence_becomes_long_enough_after_threshold_duration() {
        let (detector, effects) = feed(
            SpeechDetector::default(),
            &[(-60.0, 1_000), (-60.0, 1_500), (-60.0, 1_799)],
        );
        assert_eq!(
            detector.state(),
            SilenceState::InitialSilenceDetected { since_ms: 1_000 }
        );
        assert!(effects.is_empty());

        let (detector, effects) = feed(detector, &[(-60.0, 1_800)]);
        assert_eq!(
            detector.state(),
            SilenceState::LongEnoughSilenceDetected { since_ms: 1_000 }
        );
        assert_eq!(effects, vec![SpeechEffect::SilenceSettled { since_ms: 1_000 }]);

        let (_, effects) = feed(detector, &[(-60.0, 5_000)]);
        assert!(effects.is_empty(), "settled silence is reported once");
    }

    #[test]
    fn loud_frame_returns_to_no_silence_from_either_state() {
        let (detector, _) = feed(SpeechDetector::default(), &[(-60.0, 0), (-10.0, 100)]);
        assert_eq!(detector.state(), SilenceState::NoSilenceDetected);

        let (detector, effects) = feed(
            SpeechDetector::default(),
            &[(-60.0, 0), (-60.0, 900), (-10.0, 1_000)],
        );
        assert_eq!(detector.state(), SilenceState::NoSilenceDetected);
        assert_eq!(effects.last(), Some(&SpeechEffect::SpeechResumed { at_ms: 1_000 }));
    }

    #[test]
    fn speaking_stays_in_no_silence() {
        let (detector, effects) = feed(SpeechDetector::default(), &[(-12.0, 0), (-20.0, 2_000)]);
        assert_eq!(detector.state(), SilenceState::NoSilenceDetected);
        assert!(effects.is_empty());
    }

    #[test]
    fn recording_start_resets() {
        let (detector, _) = feed(SpeechDetector::default(), &[(-60.0, 0)]);
        let detector = detector.reduce(&(), &SpeechEvent::RecordingStarted).state;
        assert_eq!(detector.state(), SilenceState::NoSilenceDetected);
    }

    #[test]
    fn audio_frames_are_measured_by_rms() {
        let detector = SpeechDetector::default();
        let quiet = detector
            .reduce(
                &(),
                &SpeechEvent::AudioFrame {
                    samples: vec![0.001; 480],
                    at_ms: 10,
                },
            )
            .state;
        assert_eq!(quiet.state(), SilenceState::InitialSilenceDetected { since_ms: 10 });

        let loud = quiet
            .reduce(
                &(),
                &SpeechEvent::AudioFrame {
                    samples: vec![0.3; 480],
                    at_ms: 20,
                },
            )
            .state;
        assert_eq!(loud.state(), SilenceState::NoSilenceDetected);
    }
}
