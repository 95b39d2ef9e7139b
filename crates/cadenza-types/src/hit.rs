use serde::{Deserialize, Serialize};

use crate::binding::{ActionType, Direction, InputBinding};
use crate::time::{TimeUs, us_to_ms};

/// Zero-based cycle counter since the clock anchor.
pub type CycleIndex = u64;

/// Input slot within a cycle, `0..slot_count`.
pub type SlotIndex = u32;

/// Glyph shown for a slot with no input.
pub const MISS_GLYPH: char = '_';

/// One beat boundary reported by the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatEvent {
    /// Beat index counted from the anchor.
    pub abs_beat_index: i64,
    pub beat_in_cycle: u32,
    pub cycle_index: CycleIndex,
    /// Absolute domain time at which the beat starts.
    pub beat_start_us: TimeUs,
}

/// A resolved press, or a miss placeholder when `has_input` is false.
///
/// Placeholders carry zero press/expected times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub has_input: bool,
    pub cycle: CycleIndex,
    pub slot: SlotIndex,
    pub input_id: Option<String>,
    pub glyph: char,
    pub action: ActionType,
    pub direction: Direction,
    pub press_time_us: TimeUs,
    pub expected_time_us: TimeUs,
    /// `press_time_us - expected_time_us`. Negative = early.
    pub signed_error_us: TimeUs,
}

impl Hit {
    pub fn miss(cycle: CycleIndex, slot: SlotIndex) -> Self {
        Self {
            has_input: false,
            cycle,
            slot,
            input_id: None,
            glyph: MISS_GLYPH,
            action: ActionType::default(),
            direction: Direction::default(),
            press_time_us: 0,
            expected_time_us: 0,
            signed_error_us: 0,
        }
    }

    pub fn pressed(
        cycle: CycleIndex,
        slot: SlotIndex,
        binding: &InputBinding,
        press_time_us: TimeUs,
        expected_time_us: TimeUs,
    ) -> Self {
        Self {
            has_input: true,
            cycle,
            slot,
            input_id: Some(binding.input_id.clone()),
            glyph: binding.glyph,
            action: binding.action,
            direction: binding.direction,
            press_time_us,
            expected_time_us,
            signed_error_us: press_time_us - expected_time_us,
        }
    }

    pub fn signed_error_ms(&self) -> f64 {
        us_to_ms(self.signed_error_us)
    }
}

/// Every slot of one cycle, filled or missed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboRecord {
    pub cycle_index: CycleIndex,
    pub pattern_name: String,
    pub hits: Vec<Hit>,
}

impl ComboRecord {
    /// A record with every slot set to a miss placeholder.
    pub fn new(cycle_index: CycleIndex, pattern_name: impl Into<String>, slot_count: u32) -> Self {
        Self {
            cycle_index,
            pattern_name: pattern_name.into(),
            hits: (0..slot_count).map(|s| Hit::miss(cycle_index, s)).collect(),
        }
    }

    pub fn hit(&self, slot: SlotIndex) -> Option<&Hit> {
        self.hits.get(slot as usize)
    }

    pub fn is_filled(&self, slot: SlotIndex) -> bool {
        self.hit(slot).is_some_and(|h| h.has_input)
    }

    pub fn filled_count(&self) -> usize {
        self.hits.iter().filter(|h| h.has_input).count()
    }

    pub fn is_complete(&self) -> bool {
        self.hits.iter().all(|h| h.has_input)
    }

    /// Glyph per slot, `_` for misses, e.g. `"AR_"`.
    pub fn word_string(&self) -> String {
        self.hits
            .iter()
            .map(|h| if h.has_input { h.glyph } else { MISS_GLYPH })
            .collect()
    }
}
