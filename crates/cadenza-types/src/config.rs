use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::binding::InputBindingMap;
use crate::error::ConfigError;
use crate::hit::CycleIndex;
use crate::layout::{CycleLayout, DEFAULT_BEATS_PER_CYCLE, DEFAULT_SLOT_COUNT};
use crate::time::{TimeUs, secs_to_us};
use crate::window::HitWindow;

/// Judgment rules: cycle shape, per-slot windows, cast gating and retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct RhythmConfig {
    pub beats_per_cycle: u32,
    /// One window per input slot; the slot count is the length of this list.
    pub windows: Vec<HitWindow>,
    /// Cast incomplete combos with miss placeholders instead of withholding them.
    pub allow_cast_with_missing_inputs: bool,
    /// Every n-th cycle is an input cycle (1 = all of them).
    pub cast_every_n_cycles: u32,
    /// Shift applied before the modulus: cycle `offset` is the first input cycle.
    pub cast_cycle_offset: u32,
    /// Records older than this many cycles are evicted at each cast beat.
    pub retention_cycles: u32,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            beats_per_cycle: DEFAULT_BEATS_PER_CYCLE,
            windows: vec![HitWindow::default(); DEFAULT_SLOT_COUNT as usize],
            allow_cast_with_missing_inputs: true,
            cast_every_n_cycles: 2,
            cast_cycle_offset: 0,
            retention_cycles: 2,
        }
    }
}

impl RhythmConfig {
    pub fn layout(&self) -> CycleLayout {
        CycleLayout::new(self.beats_per_cycle, self.windows.len() as u32)
    }

    /// `(cycle - offset) mod n == 0`, with the remainder taken as non-negative.
    pub fn is_input_cycle(&self, cycle: CycleIndex) -> bool {
        let n = self.cast_every_n_cycles.max(1) as i64;
        (cycle as i64 - self.cast_cycle_offset as i64).rem_euclid(n) == 0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout().validate()?;
        for (slot, window) in self.windows.iter().enumerate() {
            window.validate(slot as u32)?;
        }
        if self.cast_every_n_cycles == 0 {
            return Err(ConfigError::ZeroCastPeriod);
        }
        if self.retention_cycles == 0 {
            return Err(ConfigError::ZeroRetention);
        }
        Ok(())
    }
}

/// Timing of audio scheduling and re-arming, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct SyncConfig {
    /// Lead between deciding to start music and its scheduled start.
    pub schedule_lead_secs: f64,
    /// Wait before scheduling music on the first load.
    pub initial_intro_delay_secs: f64,
    /// Wait before scheduling music when switching songs mid-game.
    pub midgame_intro_delay_secs: f64,
    /// A loop boundary counts as reached this long before it.
    pub loop_epsilon_secs: f64,
    /// A rhythm start further in the past than this is clamped forward.
    pub late_rearm_tolerance_secs: f64,
    /// Distance past `now` that a clamped start is moved to.
    pub rearm_epsilon_secs: f64,
    /// Input re-arms this long before the rhythm start, so a press landing
    /// exactly on beat 0 is never dropped. The default of 1 ms opens input
    /// slightly ahead of `now >= rhythm start`; set 0 to arm exactly on it.
    pub arm_lead_secs: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            schedule_lead_secs: 0.05,
            initial_intro_delay_secs: 3.0,
            midgame_intro_delay_secs: 0.5,
            loop_epsilon_secs: 0.001,
            late_rearm_tolerance_secs: 0.02,
            rearm_epsilon_secs: 0.001,
            arm_lead_secs: 0.001,
        }
    }
}

impl SyncConfig {
    pub fn schedule_lead_us(&self) -> TimeUs {
        secs_to_us(self.schedule_lead_secs)
    }

    pub fn intro_delay_us(&self, initial: bool) -> TimeUs {
        if initial {
            secs_to_us(self.initial_intro_delay_secs)
        } else {
            secs_to_us(self.midgame_intro_delay_secs)
        }
    }

    pub fn loop_epsilon_us(&self) -> TimeUs {
        secs_to_us(self.loop_epsilon_secs)
    }

    pub fn late_rearm_tolerance_us(&self) -> TimeUs {
        secs_to_us(self.late_rearm_tolerance_secs)
    }

    pub fn rearm_epsilon_us(&self) -> TimeUs {
        secs_to_us(self.rearm_epsilon_secs)
    }

    pub fn arm_lead_us(&self) -> TimeUs {
        secs_to_us(self.arm_lead_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("scheduleLeadSecs", self.schedule_lead_secs),
            ("initialIntroDelaySecs", self.initial_intro_delay_secs),
            ("midgameIntroDelaySecs", self.midgame_intro_delay_secs),
            ("loopEpsilonSecs", self.loop_epsilon_secs),
            ("lateRearmToleranceSecs", self.late_rearm_tolerance_secs),
            ("rearmEpsilonSecs", self.rearm_epsilon_secs),
            ("armLeadSecs", self.arm_lead_secs),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDuration { field, value });
            }
        }
        Ok(())
    }
}

/// Scheduled-cue pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct CueConfig {
    /// Maximum number of cues scheduled ahead; the oldest is overwritten.
    pub pool_size: usize,
    /// Cues due within this window of `now` fire immediately.
    pub immediate_threshold_secs: f64,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            immediate_threshold_secs: 0.001,
        }
    }
}

impl CueConfig {
    pub fn immediate_threshold_us(&self) -> TimeUs {
        secs_to_us(self.immediate_threshold_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::EmptyCuePool);
        }
        if !self.immediate_threshold_secs.is_finite() || self.immediate_threshold_secs < 0.0 {
            return Err(ConfigError::InvalidDuration {
                field: "immediateThresholdSecs",
                value: self.immediate_threshold_secs,
            });
        }
        Ok(())
    }
}

/// Per-category log switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct DebugLogConfig {
    pub log_beats: bool,
    pub log_inputs: bool,
    pub log_misses: bool,
    pub log_ignored_extra_inputs: bool,
    pub log_skipped_cycles: bool,
    pub log_cast: bool,
}

impl Default for DebugLogConfig {
    fn default() -> Self {
        Self {
            log_beats: true,
            log_inputs: true,
            log_misses: true,
            log_ignored_extra_inputs: false,
            log_skipped_cycles: true,
            log_cast: true,
        }
    }
}

/// Engine configuration document (`cadenza.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct EngineConfig {
    pub rhythm: RhythmConfig,
    pub sync: SyncConfig,
    pub cues: CueConfig,
    pub debug: DebugLogConfig,
    pub bindings: InputBindingMap,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rhythm.validate()?;
        self.sync.validate()?;
        self.cues.validate()?;
        self.bindings.validate()?;
        Ok(())
    }

    /// Read and validate a config from a JSON file.
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write config to a JSON file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.rhythm.beats_per_cycle, 4);
        assert_eq!(c.rhythm.windows.len(), 3);
        assert!(c.rhythm.allow_cast_with_missing_inputs);
        assert_eq!(c.rhythm.cast_every_n_cycles, 2);
        assert_eq!(c.rhythm.retention_cycles, 2);
        assert_eq!(c.sync.schedule_lead_us(), 50_000);
        assert_eq!(c.sync.intro_delay_us(true), 3_000_000);
        assert_eq!(c.sync.intro_delay_us(false), 500_000);
        assert_eq!(c.cues.pool_size, 8);
        assert!(!c.debug.log_ignored_extra_inputs);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn input_cycle_gating() {
        let mut rhythm = RhythmConfig::default();
        assert!(rhythm.is_input_cycle(0));
        assert!(!rhythm.is_input_cycle(1));
        assert!(rhythm.is_input_cycle(2));

        rhythm.cast_cycle_offset = 1;
        assert!(!rhythm.is_input_cycle(0));
        assert!(rhythm.is_input_cycle(1));
        assert!(rhythm.is_input_cycle(3));

        rhythm.cast_every_n_cycles = 1;
        assert!((0..10).all(|c| rhythm.is_input_cycle(c)));
    }

    #[test]
    fn zero_period_and_retention_rejected() {
        let rhythm = RhythmConfig {
            cast_every_n_cycles: 0,
            ..Default::default()
        };
        assert_eq!(rhythm.validate(), Err(ConfigError::ZeroCastPeriod));
        let rhythm = RhythmConfig {
            retention_cycles: 0,
            ..Default::default()
        };
        assert_eq!(rhythm.validate(), Err(ConfigError::ZeroRetention));
    }

    #[test]
    fn too_many_slots_for_cycle() {
        let rhythm = RhythmConfig {
            windows: vec![HitWindow::default(); 4],
            ..Default::default()
        };
        assert!(matches!(
            rhythm.validate(),
            Err(ConfigError::CastBeatOutsideCycle { .. })
        ));
    }

    #[test]
    fn negative_sync_duration_rejected() {
        let sync = SyncConfig {
            schedule_lead_secs: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            sync.validate(),
            Err(ConfigError::InvalidDuration {
                field: "scheduleLeadSecs",
                ..
            })
        ));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let json = r#"{"rhythm":{"castEveryNCycles":1},"sync":{"initialIntroDelaySecs":0.0}}"#;
        let c: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.rhythm.cast_every_n_cycles, 1);
        assert_eq!(c.rhythm.beats_per_cycle, 4);
        assert_eq!(c.sync.intro_delay_us(true), 0);
        assert_eq!(c.bindings, InputBindingMap::default());
    }

    #[test]
    fn read_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cadenza.json");
        let mut config = EngineConfig::default();
        config.rhythm.allow_cast_with_missing_inputs = false;
        config.write(&path).unwrap();
        let read = EngineConfig::read(&path).unwrap();
        assert_eq!(read, config);
    }

    #[test]
    fn read_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"rhythm":{"beatsPerCycle":3}}"#).unwrap();
        let err = EngineConfig::read(&path).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }
}
