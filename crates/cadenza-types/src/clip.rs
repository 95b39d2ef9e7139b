use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::time::{MICROS_PER_SEC, TimeUs};

/// Length of an audio clip in sample frames.
///
/// Loop boundaries are derived from these two integers rather than from a
/// rounded duration so repeated loops never accumulate rounding error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipInfo {
    /// Sample frames per channel.
    pub sample_count: u64,
    pub sample_rate: u32,
}

impl ClipInfo {
    pub fn new(sample_count: u64, sample_rate: u32) -> Result<Self, ConfigError> {
        let clip = Self {
            sample_count,
            sample_rate,
        };
        clip.validate()?;
        Ok(clip)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_count == 0 || self.sample_rate == 0 {
            return Err(ConfigError::InvalidClip);
        }
        Ok(())
    }

    /// Single-loop duration, rounded to the nearest microsecond.
    pub fn duration_us(&self) -> TimeUs {
        self.loop_offset_us(1)
    }

    pub fn duration_secs(&self) -> f64 {
        self.sample_count as f64 / self.sample_rate as f64
    }

    /// Offset of the end of loop `loops` from the clip's first start:
    /// `round(loops * sample_count / sample_rate)` in microseconds.
    pub fn loop_offset_us(&self, loops: u64) -> TimeUs {
        let rate = self.sample_rate.max(1) as u128;
        let frames = loops as u128 * self.sample_count as u128;
        ((frames * MICROS_PER_SEC as u128 + rate / 2) / rate) as TimeUs
    }
}
