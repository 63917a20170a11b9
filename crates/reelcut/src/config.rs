//! Editor tuning knobs.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ReelError;
use crate::player::PlayerTiming;
use crate::speech::{DEFAULT_LONG_SILENCE_MS, DEFAULT_SILENCE_THRESHOLD_DB};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub silence_threshold_db: f32,
    pub long_silence_ms: u64,
    pub preload_lookahead: usize,
    pub priming_lead_secs: f64,
    pub end_guard_secs: f64,
    pub final_clip_padding_secs: f64,
    pub poll_interval_ms: u64,
    pub archive_debounce_ms: u64,
    pub scene_debounce_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            silence_threshold_db: DEFAULT_SILENCE_THRESHOLD_DB,
            long_silence_ms: DEFAULT_LONG_SILENCE_MS,
            preload_lookahead: crate::playback::DEFAULT_PRELOAD_LOOKAHEAD,
            priming_lead_secs: 1.0,
            end_guard_secs: 0.1,
            final_clip_padding_secs: 0.5,
            poll_interval_ms: 16,
            archive_debounce_ms: 500,
            scene_debounce_ms: 500,
        }
    }
}

impl EditorConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ReelError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReelError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ReelError> {
        if self.poll_interval_ms == 0 {
            return Err(ReelError::InvalidConfig(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.long_silence_ms == 0 {
            return Err(ReelError::InvalidConfig(
                "long_silence_ms must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("priming_lead_secs", self.priming_lead_secs),
            ("end_guard_secs", self.end_guard_secs),
            ("final_clip_padding_secs", self.final_clip_padding_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ReelError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !self.silence_threshold_db.is_finite() {
            return Err(ReelError::InvalidConfig(
                "silence_threshold_db must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn player_timing(&self) -> PlayerTiming {
        PlayerTiming {
            priming_lead: self.priming_lead_secs,
            end_guard: self.end_guard_secs,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn archive_debounce(&self) -> Duration {
        Duration::from_millis(self.archive_debounce_ms)
    }

    pub fn scene_debounce(&self) -> Duration {
        Duration::from_millis(self.scene_debounce_ms)
    }
}
