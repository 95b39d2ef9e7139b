//! Rhythm judge.
//!
//! Owns the resolver, the aggregator and the binding map. Presses come in as
//! raw `(input_id, time)` pairs; every rejection is reported as an
//! `InputRejected` event and counted in [`JudgeStats`].

use log::debug;

use cadenza_timing::BeatClock;
use cadenza_types::{
    BeatEvent, ComboRecord, ConfigError, EngineConfig, EventQueue, InputBindingMap,
    RejectReason, RhythmEvent, TimeUs, TimingPattern,
};

use crate::aggregator::{ComboAggregator, HitOutcome};
use crate::resolver::{HitResolver, Resolution};
use crate::stats::JudgeStats;

#[derive(Debug, Clone)]
pub struct RhythmJudge {
    resolver: HitResolver,
    aggregator: ComboAggregator,
    bindings: InputBindingMap,
    stats: JudgeStats,
    log_beats: bool,
    log_inputs: bool,
}

impl RhythmJudge {
    /// Build a judge for `clock`. Fails if the configuration is inconsistent
    /// or the clock counts a different number of beats per cycle.
    pub fn new(
        config: &EngineConfig,
        pattern: TimingPattern,
        clock: &BeatClock,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let rhythm = &config.rhythm;
        let resolver = HitResolver::new(rhythm.layout(), pattern, rhythm.windows.clone())?;
        resolver.check_clock(clock.beats_per_cycle())?;
        let aggregator =
            ComboAggregator::new(rhythm.clone(), resolver.pattern().name.clone(), config.debug.clone());
        Ok(Self {
            resolver,
            aggregator,
            bindings: config.bindings.clone(),
            stats: JudgeStats::default(),
            log_beats: config.debug.log_beats,
            log_inputs: config.debug.log_inputs,
        })
    }

    pub fn on_beat(&mut self, beat: &BeatEvent, events: &mut EventQueue) {
        if self.log_beats {
            debug!(
                "Beat {} (cycle {} beat {}) at {}us",
                beat.abs_beat_index, beat.cycle_index, beat.beat_in_cycle, beat.beat_start_us
            );
        }
        let before = events.len();
        self.aggregator.on_beat(beat, events);
        self.count_casts(events, before);
    }

    pub fn on_press(
        &mut self,
        input_id: &str,
        press_us: TimeUs,
        clock: &BeatClock,
        events: &mut EventQueue,
    ) -> HitOutcome {
        let before = events.len();
        let outcome = self.judge_press(input_id, press_us, clock, events);
        match &outcome {
            HitOutcome::Recorded { hit, .. } => self.stats.record_hit(hit),
            HitOutcome::Rejected(reason) => {
                self.stats.record_rejection(*reason);
                if self.log_inputs {
                    debug!("Input '{input_id}' at {press_us}us rejected: {reason:?}");
                }
                events.push(RhythmEvent::InputRejected {
                    input_id: input_id.to_string(),
                    time_us: press_us,
                    reason: *reason,
                });
            }
        }
        self.count_casts(events, before);
        outcome
    }

    fn judge_press(
        &mut self,
        input_id: &str,
        press_us: TimeUs,
        clock: &BeatClock,
        events: &mut EventQueue,
    ) -> HitOutcome {
        let Some(binding) = self.bindings.lookup(input_id) else {
            return HitOutcome::Rejected(RejectReason::UnboundInput);
        };
        if !self.aggregator.recording_enabled() {
            return HitOutcome::Rejected(RejectReason::InputDisabled);
        }
        if !clock.is_running() {
            return HitOutcome::Rejected(RejectReason::ClockStopped);
        }
        match self
            .resolver
            .resolve(press_us, clock.anchor_us(), clock.beat_duration())
        {
            Resolution::Matched(slot_match) => {
                self.aggregator
                    .record_hit(&slot_match, binding, press_us, events)
            }
            Resolution::Unmatched => HitOutcome::Rejected(RejectReason::NoWindow),
            Resolution::NegativeCycle { .. } => HitOutcome::Rejected(RejectReason::NegativeCycle),
        }
    }

    fn count_casts(&mut self, events: &EventQueue, before: usize) {
        let cast = events
            .iter()
            .skip(before)
            .filter(|e| matches!(e, RhythmEvent::ComboReady(_)))
            .count();
        for _ in 0..cast {
            self.stats.record_cast();
        }
    }

    /// Swap the timing pattern; records created afterwards carry its name.
    pub fn set_pattern(&mut self, pattern: TimingPattern) -> Result<(), ConfigError> {
        let name = pattern.name.clone();
        self.resolver.set_pattern(pattern)?;
        self.aggregator.set_pattern_name(name);
        Ok(())
    }

    pub fn reset_all_state(&mut self) {
        self.aggregator.reset_all_state();
    }

    pub fn enable_input(&mut self) {
        self.aggregator.set_input_enabled(true, true);
    }

    pub fn set_input_enabled(&mut self, recording: bool, casting: bool) {
        self.aggregator.set_input_enabled(recording, casting);
    }

    pub fn set_casting_enabled(&mut self, casting: bool) {
        self.aggregator.set_casting_enabled(casting);
    }

    pub fn last_combo(&self) -> Option<&ComboRecord> {
        self.aggregator.last_combo()
    }

    pub fn stats(&self) -> &JudgeStats {
        &self.stats
    }

    pub fn resolver(&self) -> &HitResolver {
        &self.resolver
    }

    pub fn aggregator(&self) -> &ComboAggregator {
        &self.aggregator
    }
}

#[cfg(test)]
mod tests {
    use cadenza_timing::ClockDomain;

    use super::*;

    fn setup() -> (RhythmJudge, BeatClock) {
        let clock = BeatClock::new(120.0, 4).unwrap();
        let judge = RhythmJudge::new(&EngineConfig::default(), TimingPattern::default(), &clock).unwrap();
        (judge, clock)
    }

    fn reasons(events: &mut EventQueue) -> Vec<RejectReason> {
        events
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                RhythmEvent::InputRejected { reason, .. } => Some(reason),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn clock_layout_mismatch_is_fatal() {
        let clock = BeatClock::new(120.0, 5).unwrap();
        let err = RhythmJudge::new(&EngineConfig::default(), TimingPattern::default(), &clock).unwrap_err();
        assert_eq!(
            err,
            ConfigError::BeatsPerCycleMismatch {
                clock: 5,
                resolver: 4
            }
        );
    }

    #[test]
    fn press_resolves_against_clock_anchor() {
        let (mut judge, mut clock) = setup();
        let mut events = EventQueue::new();
        clock.start_at(ClockDomain::Audio, 1_000_000, 0);
        let outcome = judge.on_press("KeyJ", 1_550_000, &clock, &mut events);
        match outcome {
            HitOutcome::Recorded { hit, surfaced, .. } => {
                assert!(surfaced);
                assert_eq!((hit.cycle, hit.slot), (0, 1));
                assert_eq!(hit.signed_error_us, 50_000);
                assert_eq!(hit.glyph, 'A');
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(judge.stats().matched, 1);
    }

    #[test]
    fn rejection_reasons_reported() {
        let (mut judge, mut clock) = setup();
        let mut events = EventQueue::new();

        judge.on_press("KeyJ", 0, &clock, &mut events);
        clock.start_at(ClockDomain::Wall, 0, 0);
        judge.on_press("KeyZ", 0, &clock, &mut events);
        judge.on_press("KeyJ", 1_500_000, &clock, &mut events);
        judge.on_press("KeyJ", -1_000_000, &clock, &mut events);
        judge.on_press("KeyJ", 0, &clock, &mut events);
        judge.on_press("KeyK", 10_000, &clock, &mut events);
        judge.set_input_enabled(false, false);
        judge.on_press("KeyJ", 500_000, &clock, &mut events);

        assert_eq!(
            reasons(&mut events),
            vec![
                RejectReason::ClockStopped,
                RejectReason::UnboundInput,
                RejectReason::NoWindow,
                RejectReason::NegativeCycle,
                RejectReason::DuplicateSlot,
                RejectReason::InputDisabled,
            ]
        );
        let stats = judge.stats();
        assert_eq!(stats.rejected(), 6);
        assert_eq!(stats.matched, 1);
    }

    #[test]
    fn casts_are_counted() {
        let (mut judge, mut clock) = setup();
        let mut events = EventQueue::new();
        clock.start_at(ClockDomain::Wall, 0, 0);
        for beat in clock.tick(4_100_000) {
            judge.on_beat(&beat, &mut events);
        }
        // Cycles 0 and 2 are input cycles; cycle 2 has not reached its cast beat.
        assert_eq!(judge.stats().combos_cast, 1);
        assert_eq!(judge.last_combo().unwrap().word_string(), "___");
    }

    #[test]
    fn set_pattern_renames_new_records() {
        let (mut judge, mut clock) = setup();
        let mut events = EventQueue::new();
        judge
            .set_pattern(TimingPattern::new("Offbeat", vec![0.5, 0.5, 0.5]))
            .unwrap();
        clock.start_at(ClockDomain::Wall, 0, 0);
        let outcome = judge.on_press("KeyJ", 250_000, &clock, &mut events);
        assert!(outcome.is_recorded());
        assert_eq!(
            judge.aggregator().record(0).unwrap().pattern_name,
            "Offbeat"
        );
    }
}
