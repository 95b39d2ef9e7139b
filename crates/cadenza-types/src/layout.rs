use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of beats in a cycle.
pub const DEFAULT_BEATS_PER_CYCLE: u32 = 4;

/// Default number of input slots at the start of each cycle.
pub const DEFAULT_SLOT_COUNT: u32 = 3;

/// Shape of a cycle: `beats_per_cycle` beats, the first `slot_count` of which
/// accept input. The beat right after the last slot is the cast beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleLayout {
    pub beats_per_cycle: u32,
    pub slot_count: u32,
}

impl Default for CycleLayout {
    fn default() -> Self {
        Self {
            beats_per_cycle: DEFAULT_BEATS_PER_CYCLE,
            slot_count: DEFAULT_SLOT_COUNT,
        }
    }
}

impl CycleLayout {
    pub const fn new(beats_per_cycle: u32, slot_count: u32) -> Self {
        Self {
            beats_per_cycle,
            slot_count,
        }
    }

    /// Beat within the cycle at which the combo is finalized.
    pub fn cast_beat(&self) -> u32 {
        self.slot_count
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.beats_per_cycle == 0 {
            return Err(ConfigError::EmptyCycle);
        }
        if self.slot_count == 0 {
            return Err(ConfigError::NoSlots);
        }
        if self.cast_beat() >= self.beats_per_cycle {
            return Err(ConfigError::CastBeatOutsideCycle {
                cast_beat: self.cast_beat(),
                beats_per_cycle: self.beats_per_cycle,
            });
        }
        Ok(())
    }

    /// Beat position within its cycle for an absolute beat index.
    pub fn beat_in_cycle(&self, abs_beat: i64) -> u32 {
        abs_beat.rem_euclid(self.beats_per_cycle as i64) as u32
    }

    /// Cycle containing an absolute beat index (may be negative).
    pub fn cycle_of(&self, abs_beat: i64) -> i64 {
        abs_beat.div_euclid(self.beats_per_cycle as i64)
    }

    /// Absolute beat index of `beat` within `cycle`.
    pub fn abs_beat(&self, cycle: i64, beat: u32) -> i64 {
        cycle * self.beats_per_cycle as i64 + beat as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_casts_on_beat_three() {
        let layout = CycleLayout::default();
        assert_eq!(layout.cast_beat(), 3);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn cast_beat_must_fit_in_cycle() {
        assert_eq!(
            CycleLayout::new(3, 3).validate(),
            Err(ConfigError::CastBeatOutsideCycle {
                cast_beat: 3,
                beats_per_cycle: 3
            })
        );
        assert_eq!(CycleLayout::new(0, 0).validate(), Err(ConfigError::EmptyCycle));
        assert_eq!(CycleLayout::new(4, 0).validate(), Err(ConfigError::NoSlots));
    }

    #[test]
    fn beat_and_cycle_split_handles_negative_indices() {
        let layout = CycleLayout::default();
        assert_eq!(layout.beat_in_cycle(5), 1);
        assert_eq!(layout.cycle_of(5), 1);
        assert_eq!(layout.beat_in_cycle(-1), 3);
        assert_eq!(layout.cycle_of(-1), -1);
        assert_eq!(layout.abs_beat(2, 3), 11);
    }
}
