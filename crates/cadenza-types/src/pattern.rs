use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::hit::SlotIndex;
use crate::layout::{CycleLayout, DEFAULT_SLOT_COUNT};

/// Per-slot expected position, as a fraction of a beat after the slot's
/// nominal beat start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct TimingPattern {
    pub name: String,
    pub offsets: Vec<f64>,
}

impl Default for TimingPattern {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            offsets: vec![0.0; DEFAULT_SLOT_COUNT as usize],
        }
    }
}

impl TimingPattern {
    pub fn new(name: impl Into<String>, offsets: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            offsets,
        }
    }

    /// Expected offset in beats for `slot`. Slots past the end read as 0.
    pub fn expected_offset(&self, slot: SlotIndex) -> f64 {
        self.offsets.get(slot as usize).copied().unwrap_or(0.0)
    }

    pub fn slot_count(&self) -> u32 {
        self.offsets.len() as u32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.offsets.is_empty() {
            return Err(ConfigError::NoSlots);
        }
        for (slot, &offset) in self.offsets.iter().enumerate() {
            if !(0.0..1.0).contains(&offset) {
                return Err(ConfigError::OffsetOutOfRange {
                    slot: slot as u32,
                    offset,
                });
            }
        }
        Ok(())
    }

    /// Validate and check the slot count against a cycle layout.
    pub fn validate_for(&self, layout: &CycleLayout) -> Result<(), ConfigError> {
        self.validate()?;
        if self.slot_count() != layout.slot_count {
            return Err(ConfigError::SlotCountMismatch {
                what: "timing pattern",
                expected: layout.slot_count,
                found: self.slot_count(),
            });
        }
        Ok(())
    }
}
