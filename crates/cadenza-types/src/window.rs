use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tempo::BeatDuration;
use crate::time::TimeUs;

/// Tolerance around a slot's expected time, in beats.
///
/// A press with signed error `err` matches when
/// `-early_beats * beat <= err <= late_beats * beat`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitWindow {
    pub early_beats: f64,
    pub late_beats: f64,
}

impl Default for HitWindow {
    fn default() -> Self {
        Self {
            early_beats: 0.5,
            late_beats: 0.5,
        }
    }
}

impl HitWindow {
    pub const fn new(early_beats: f64, late_beats: f64) -> Self {
        Self {
            early_beats,
            late_beats,
        }
    }

    pub fn early_us(&self, beat: BeatDuration) -> TimeUs {
        beat.beats_to_us(self.early_beats)
    }

    pub fn late_us(&self, beat: BeatDuration) -> TimeUs {
        beat.beats_to_us(self.late_beats)
    }

    /// Whether a signed error (press minus expected) falls inside the window.
    pub fn contains(&self, error_us: TimeUs, beat: BeatDuration) -> bool {
        error_us >= -self.early_us(beat) && error_us <= self.late_us(beat)
    }

    pub fn validate(&self, slot: u32) -> Result<(), ConfigError> {
        let ok = |v: f64| v.is_finite() && v >= 0.0;
        if !ok(self.early_beats) || !ok(self.late_beats) {
            return Err(ConfigError::InvalidWindow {
                slot,
                early: self.early_beats,
                late: self.late_beats,
            });
        }
        Ok(())
    }
}
