use crate::error::ConfigError;
use crate::time::{MICROS_PER_SEC, TimeUs};

/// Length of one beat in microseconds (`60 / bpm` seconds).
///
/// Held as `f64` so that tempos that do not divide a second evenly do not
/// drift: beat `k` always lands at `round(k * duration)` from the anchor
/// instead of accumulating a rounded per-beat step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatDuration {
    us: f64,
}

impl BeatDuration {
    /// Build from a tempo. Rejects zero, negative and non-finite BPM.
    pub fn from_bpm(bpm: f64) -> Result<Self, ConfigError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(ConfigError::InvalidTempo(bpm));
        }
        Ok(Self {
            us: 60.0 * MICROS_PER_SEC as f64 / bpm,
        })
    }

    pub fn as_us(self) -> f64 {
        self.us
    }

    pub fn bpm(self) -> f64 {
        60.0 * MICROS_PER_SEC as f64 / self.us
    }

    /// Offset of a (possibly fractional) beat position from the anchor.
    pub fn beats_to_us(self, beats: f64) -> TimeUs {
        (beats * self.us).round() as TimeUs
    }

    /// Index of the beat containing `elapsed` microseconds after the anchor.
    ///
    /// Consistent with [`beats_to_us`](Self::beats_to_us): the returned index
    /// `k` always satisfies `beats_to_us(k) <= elapsed < beats_to_us(k + 1)`.
    pub fn beat_index_at(self, elapsed: TimeUs) -> i64 {
        let mut index = (elapsed as f64 / self.us).floor() as i64;
        if self.beats_to_us((index + 1) as f64) <= elapsed {
            index += 1;
        } else if self.beats_to_us(index as f64) > elapsed {
            index -= 1;
        }
        index
    }
}
