//! Per-cycle combo aggregation.
//!
//! Each cycle owns one record, created on first touch (the cycle's first beat
//! or an early hit). Records move `Filling -> Cast` and are evicted once they
//! fall `retention_cycles` behind the cycle being cast. Evicted cycles stay
//! closed: the eviction watermark only moves forward until a full reset.

use std::collections::BTreeMap;

use log::{debug, info};

use cadenza_types::{
    BeatEvent, ComboRecord, CycleIndex, CycleLayout, DebugLogConfig, EventQueue, Hit,
    InputBinding, RejectReason, RhythmConfig, RhythmEvent, TimeUs,
};

use crate::resolver::SlotMatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordPhase {
    Filling,
    Cast,
}

/// Result of feeding a resolved press to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitOutcome {
    Recorded {
        hit: Hit,
        /// False on action-only cycles.
        surfaced: bool,
        /// The hit completed a withheld record and cast it.
        cast: bool,
    },
    Rejected(RejectReason),
}

impl HitOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

#[derive(Debug, Clone)]
struct CycleRecord {
    record: ComboRecord,
    phase: RecordPhase,
    /// Cast beat passed with empty slots and missing inputs are not allowed.
    withheld: bool,
}

#[derive(Debug, Clone)]
pub struct ComboAggregator {
    rhythm: RhythmConfig,
    layout: CycleLayout,
    pattern_name: String,
    records: BTreeMap<CycleIndex, CycleRecord>,
    /// Cycles below this index have been evicted.
    watermark: CycleIndex,
    recording_enabled: bool,
    casting_enabled: bool,
    last_combo: Option<ComboRecord>,
    debug: DebugLogConfig,
}

impl ComboAggregator {
    pub fn new(rhythm: RhythmConfig, pattern_name: impl Into<String>, debug: DebugLogConfig) -> Self {
        Self {
            layout: rhythm.layout(),
            rhythm,
            pattern_name: pattern_name.into(),
            records: BTreeMap::new(),
            watermark: 0,
            recording_enabled: true,
            casting_enabled: true,
            last_combo: None,
            debug,
        }
    }

    /// Name stamped on records created from now on.
    pub fn set_pattern_name(&mut self, name: impl Into<String>) {
        self.pattern_name = name.into();
    }

    pub fn set_input_enabled(&mut self, recording: bool, casting: bool) {
        self.recording_enabled = recording;
        self.casting_enabled = casting;
    }

    pub fn set_casting_enabled(&mut self, casting: bool) {
        self.casting_enabled = casting;
    }

    pub fn recording_enabled(&self) -> bool {
        self.recording_enabled
    }

    pub fn casting_enabled(&self) -> bool {
        self.casting_enabled
    }

    /// Drop every record, rewind the watermark and disable input.
    pub fn reset_all_state(&mut self) {
        self.records.clear();
        self.watermark = 0;
        self.last_combo = None;
        self.set_input_enabled(false, false);
        debug!("ComboAggregator: state reset");
    }

    pub fn on_beat(&mut self, beat: &BeatEvent, events: &mut EventQueue) {
        let cycle = beat.cycle_index;
        if beat.beat_in_cycle == 0 {
            self.touch(cycle);
        }
        if beat.beat_in_cycle == self.layout.cast_beat() {
            self.on_cast_beat(cycle, events);
            self.evict_before(cycle);
        }
    }

    pub fn record_hit(
        &mut self,
        slot_match: &SlotMatch,
        binding: &InputBinding,
        press_us: TimeUs,
        events: &mut EventQueue,
    ) -> HitOutcome {
        if !self.recording_enabled {
            return HitOutcome::Rejected(RejectReason::InputDisabled);
        }
        let SlotMatch {
            cycle,
            slot,
            expected_us,
            ..
        } = *slot_match;
        if cycle < self.watermark {
            return HitOutcome::Rejected(RejectReason::CycleEvicted);
        }
        let input_cycle = self.rhythm.is_input_cycle(cycle);
        let log_ignored = self.debug.log_ignored_extra_inputs;
        let entry = self.touch(cycle);
        if entry.phase == RecordPhase::Cast {
            if log_ignored {
                debug!("Cycle {cycle}: '{}' after cast ignored", binding.input_id);
            }
            return HitOutcome::Rejected(RejectReason::AlreadyCast);
        }
        if entry.record.is_filled(slot) {
            if log_ignored {
                debug!(
                    "Cycle {cycle} slot {slot}: extra input '{}' ignored",
                    binding.input_id
                );
            }
            return HitOutcome::Rejected(RejectReason::DuplicateSlot);
        }

        let hit = Hit::pressed(cycle, slot, binding, press_us, expected_us);
        if let Some(target) = entry.record.hits.get_mut(slot as usize) {
            *target = hit.clone();
        }
        let complete = entry.record.is_complete();
        let withheld = entry.withheld;

        if self.debug.log_inputs {
            debug!(
                "Cycle {cycle} slot {slot}: '{}' {:+.1}ms{}",
                hit.glyph,
                hit.signed_error_ms(),
                if input_cycle { "" } else { " (action cycle)" }
            );
        }
        if input_cycle {
            events.push(RhythmEvent::HitRecorded(hit.clone()));
        }

        let mut cast = false;
        if withheld && complete && input_cycle && self.casting_enabled {
            self.cast(cycle, events);
            cast = true;
        }
        HitOutcome::Recorded {
            hit,
            surfaced: input_cycle,
            cast,
        }
    }

    fn touch(&mut self, cycle: CycleIndex) -> &mut CycleRecord {
        let slot_count = self.layout.slot_count;
        let pattern_name = &self.pattern_name;
        self.records.entry(cycle).or_insert_with(|| CycleRecord {
            record: ComboRecord::new(cycle, pattern_name.clone(), slot_count),
            phase: RecordPhase::Filling,
            withheld: false,
        })
    }

    fn on_cast_beat(&mut self, cycle: CycleIndex, events: &mut EventQueue) {
        if cycle < self.watermark {
            return;
        }
        if !self.rhythm.is_input_cycle(cycle) {
            if self.debug.log_skipped_cycles {
                debug!("Cycle {cycle}: action cycle, no cast");
            }
            return;
        }
        if !self.casting_enabled {
            if self.debug.log_skipped_cycles {
                debug!("Cycle {cycle}: casting disabled, no cast");
            }
            return;
        }
        let allow_missing = self.rhythm.allow_cast_with_missing_inputs;
        let log_cast = self.debug.log_cast;
        let entry = self.touch(cycle);
        if entry.phase == RecordPhase::Cast {
            return;
        }
        if !allow_missing && !entry.record.is_complete() {
            entry.withheld = true;
            if log_cast {
                debug!(
                    "Cycle {cycle}: cast withheld, {} of {} slots filled",
                    entry.record.filled_count(),
                    entry.record.hits.len()
                );
            }
            return;
        }
        self.cast(cycle, events);
    }

    fn cast(&mut self, cycle: CycleIndex, events: &mut EventQueue) {
        let Some(entry) = self.records.get_mut(&cycle) else {
            return;
        };
        entry.phase = RecordPhase::Cast;
        entry.withheld = false;
        let snapshot = entry.record.clone();

        if self.debug.log_misses {
            for hit in snapshot.hits.iter().filter(|h| !h.has_input) {
                debug!("Cycle {cycle} slot {}: miss", hit.slot);
            }
        }
        if self.debug.log_cast {
            info!("Cycle {cycle}: cast '{}'", snapshot.word_string());
        }
        self.last_combo = Some(snapshot.clone());
        events.push(RhythmEvent::ComboReady(snapshot));
    }

    /// Evict every record `retention_cycles` or more behind `current`.
    fn evict_before(&mut self, current: CycleIndex) {
        let floor = (current + 1).saturating_sub(self.rhythm.retention_cycles as CycleIndex);
        if floor <= self.watermark {
            return;
        }
        self.records = self.records.split_off(&floor);
        self.watermark = floor;
    }

    pub fn phase(&self, cycle: CycleIndex) -> Option<RecordPhase> {
        self.records.get(&cycle).map(|r| r.phase)
    }

    pub fn record(&self, cycle: CycleIndex) -> Option<&ComboRecord> {
        self.records.get(&cycle).map(|r| &r.record)
    }

    /// Most recently cast combo.
    pub fn last_combo(&self) -> Option<&ComboRecord> {
        self.last_combo.as_ref()
    }

    pub fn live_cycles(&self) -> impl Iterator<Item = CycleIndex> + '_ {
        self.records.keys().copied()
    }

    pub fn eviction_watermark(&self) -> CycleIndex {
        self.watermark
    }

    pub fn is_evicted(&self, cycle: CycleIndex) -> bool {
        cycle < self.watermark
    }
}
