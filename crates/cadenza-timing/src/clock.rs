//! Beat clock.
//!
//! Converts elapsed domain time into absolute beat indices and reports every
//! beat boundary crossed since the previous tick, in order. A host that ticks
//! at 10 Hz still sees each beat exactly once.

use log::debug;
use serde::{Deserialize, Serialize};

use cadenza_types::{BeatDuration, BeatEvent, ConfigError, CycleLayout, TimeUs};

/// Which time base `now` is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClockDomain {
    /// Free-running wall time.
    #[default]
    Wall,
    /// Audio transport time, anchored by the sync controller.
    Audio,
}

/// Sentinel for "no beat processed yet".
const NO_BEAT: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockState {
    pub domain: ClockDomain,
    pub anchor_us: TimeUs,
    pub running: bool,
    /// Highest absolute beat index already reported.
    pub last_processed_beat: i64,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            domain: ClockDomain::Wall,
            anchor_us: 0,
            running: false,
            last_processed_beat: NO_BEAT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BeatClock {
    beat: BeatDuration,
    /// Tempo requested by `set_tempo`, applied on the next tick.
    pending_beat: Option<BeatDuration>,
    layout: CycleLayout,
    state: ClockState,
    current: Option<BeatEvent>,
}

impl BeatClock {
    pub fn new(bpm: f64, beats_per_cycle: u32) -> Result<Self, ConfigError> {
        if beats_per_cycle == 0 {
            return Err(ConfigError::EmptyCycle);
        }
        Ok(Self {
            beat: BeatDuration::from_bpm(bpm)?,
            pending_beat: None,
            // Only beats_per_cycle matters to the clock.
            layout: CycleLayout::new(beats_per_cycle, 0),
            state: ClockState::default(),
            current: None,
        })
    }

    /// Anchor beat 0 at `anchor_us` and start running.
    ///
    /// When the anchor is already behind `now_us`, the beat containing `now_us`
    /// is reported on the next tick and earlier beats are skipped. When it is
    /// ahead, ticks are no-ops until it is reached.
    pub fn start_at(&mut self, domain: ClockDomain, anchor_us: TimeUs, now_us: TimeUs) {
        if let Some(beat) = self.pending_beat.take() {
            self.beat = beat;
        }
        let last_processed_beat = if now_us >= anchor_us {
            self.beat.beat_index_at(now_us - anchor_us) - 1
        } else {
            NO_BEAT
        };
        self.state = ClockState {
            domain,
            anchor_us,
            running: true,
            last_processed_beat,
        };
        self.current = None;
        debug!(
            "BeatClock: start domain={domain:?} anchor={anchor_us}us bpm={:.2}",
            self.beat.bpm()
        );
    }

    /// Stop reporting beats. Per-cycle state elsewhere is left untouched.
    pub fn stop(&mut self) {
        if self.state.running {
            debug!("BeatClock: stop at beat {}", self.state.last_processed_beat);
        }
        self.state.running = false;
    }

    /// Request a tempo change. It takes effect on the next tick.
    pub fn set_tempo(&mut self, bpm: f64) -> Result<(), ConfigError> {
        self.pending_beat = Some(BeatDuration::from_bpm(bpm)?);
        Ok(())
    }

    /// Report every beat boundary in `(last_processed, beat_at(now)]`.
    pub fn tick(&mut self, now_us: TimeUs) -> Vec<BeatEvent> {
        if let Some(beat) = self.pending_beat.take() {
            self.beat = beat;
        }
        if !self.state.running {
            return Vec::new();
        }
        let elapsed = now_us - self.state.anchor_us;
        if elapsed < 0 {
            return Vec::new();
        }
        let abs_beat = self.beat.beat_index_at(elapsed);
        if abs_beat <= self.state.last_processed_beat {
            return Vec::new();
        }

        let events: Vec<BeatEvent> = (self.state.last_processed_beat + 1..=abs_beat)
            .map(|index| self.beat_event(index))
            .collect();
        self.state.last_processed_beat = abs_beat;
        self.current = events.last().copied();
        events
    }

    fn beat_event(&self, abs_beat: i64) -> BeatEvent {
        BeatEvent {
            abs_beat_index: abs_beat,
            beat_in_cycle: self.layout.beat_in_cycle(abs_beat),
            cycle_index: self.layout.cycle_of(abs_beat).max(0) as u64,
            beat_start_us: self.beat_start_us(abs_beat),
        }
    }

    /// Absolute start time of beat `abs_beat`.
    pub fn beat_start_us(&self, abs_beat: i64) -> TimeUs {
        self.state.anchor_us + self.beat.beats_to_us(abs_beat as f64)
    }

    /// Whether the anchor has been reached.
    pub fn has_started(&self, now_us: TimeUs) -> bool {
        self.state.running && now_us >= self.state.anchor_us
    }

    pub fn beat_duration(&self) -> BeatDuration {
        self.beat
    }

    pub fn beats_per_cycle(&self) -> u32 {
        self.layout.beats_per_cycle
    }

    pub fn anchor_us(&self) -> TimeUs {
        self.state.anchor_us
    }

    pub fn domain(&self) -> ClockDomain {
        self.state.domain
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Most recent beat reported by `tick`.
    pub fn current_beat(&self) -> Option<BeatEvent> {
        self.current
    }

    pub fn current_beat_in_cycle(&self) -> Option<u32> {
        self.current.map(|b| b.beat_in_cycle)
    }

    pub fn current_cycle(&self) -> Option<u64> {
        self.current.map(|b| b.cycle_index)
    }
}
