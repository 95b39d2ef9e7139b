//! Press-to-slot resolution.
//!
//! A press is compared against every slot of the guessed cycle and its two
//! neighbours. The candidate with the smallest absolute error wins; ties go to
//! the lower cycle, then the lower slot. The last slot of a cycle stops
//! accepting presses at the cycle's cast boundary.

use cadenza_types::{
    BeatDuration, ConfigError, CycleIndex, CycleLayout, HitWindow, SlotIndex, TimeUs,
    TimingPattern,
};

/// A press matched to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotMatch {
    pub cycle: CycleIndex,
    pub slot: SlotIndex,
    pub expected_us: TimeUs,
    /// `press - expected`; negative is early.
    pub error_us: TimeUs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Matched(SlotMatch),
    /// No window contains the press.
    Unmatched,
    /// The best window belongs to a cycle before beat 0.
    NegativeCycle { cycle: i64 },
}

#[derive(Debug, Clone)]
pub struct HitResolver {
    layout: CycleLayout,
    pattern: TimingPattern,
    windows: Vec<HitWindow>,
}

impl HitResolver {
    pub fn new(
        layout: CycleLayout,
        pattern: TimingPattern,
        windows: Vec<HitWindow>,
    ) -> Result<Self, ConfigError> {
        layout.validate()?;
        pattern.validate_for(&layout)?;
        if windows.len() != layout.slot_count as usize {
            return Err(ConfigError::SlotCountMismatch {
                what: "hit windows",
                expected: layout.slot_count,
                found: windows.len() as u32,
            });
        }
        for (slot, window) in windows.iter().enumerate() {
            window.validate(slot as u32)?;
        }
        Ok(Self {
            layout,
            pattern,
            windows,
        })
    }

    /// Fails when the clock counts cycles differently from this resolver.
    pub fn check_clock(&self, clock_beats_per_cycle: u32) -> Result<(), ConfigError> {
        if clock_beats_per_cycle != self.layout.beats_per_cycle {
            return Err(ConfigError::BeatsPerCycleMismatch {
                clock: clock_beats_per_cycle,
                resolver: self.layout.beats_per_cycle,
            });
        }
        Ok(())
    }

    /// Swap the timing pattern. The slot count must not change.
    pub fn set_pattern(&mut self, pattern: TimingPattern) -> Result<(), ConfigError> {
        pattern.validate_for(&self.layout)?;
        self.pattern = pattern;
        Ok(())
    }

    pub fn pattern(&self) -> &TimingPattern {
        &self.pattern
    }

    pub fn layout(&self) -> CycleLayout {
        self.layout
    }

    pub fn window(&self, slot: SlotIndex) -> Option<HitWindow> {
        self.windows.get(slot as usize).copied()
    }

    /// Ideal press time for `(cycle, slot)`.
    pub fn expected_time_us(
        &self,
        anchor_us: TimeUs,
        beat: BeatDuration,
        cycle: i64,
        slot: SlotIndex,
    ) -> TimeUs {
        let beats = self.layout.abs_beat(cycle, slot) as f64 + self.pattern.expected_offset(slot);
        anchor_us + beat.beats_to_us(beats)
    }

    /// Start of the cast beat of `cycle`.
    pub fn cast_time_us(&self, anchor_us: TimeUs, beat: BeatDuration, cycle: i64) -> TimeUs {
        let cast_beat = self.layout.abs_beat(cycle, self.layout.cast_beat());
        anchor_us + beat.beats_to_us(cast_beat as f64)
    }

    pub fn resolve(&self, press_us: TimeUs, anchor_us: TimeUs, beat: BeatDuration) -> Resolution {
        let cycle_us = beat.as_us() * self.layout.beats_per_cycle as f64;
        let guess = ((press_us - anchor_us) as f64 / cycle_us).floor() as i64;
        let last_slot = self.layout.slot_count - 1;

        // (cycle, slot, expected, error)
        let mut best: Option<(i64, SlotIndex, TimeUs, TimeUs)> = None;
        for cycle in guess - 1..=guess + 1 {
            for (slot, window) in self.windows.iter().enumerate() {
                let slot = slot as SlotIndex;
                if slot == last_slot && press_us >= self.cast_time_us(anchor_us, beat, cycle) {
                    continue;
                }
                let expected = self.expected_time_us(anchor_us, beat, cycle, slot);
                let error = press_us - expected;
                if !window.contains(error, beat) {
                    continue;
                }
                let better = match best {
                    Some((_, _, _, best_error)) => error.abs() < best_error.abs(),
                    None => true,
                };
                if better {
                    best = Some((cycle, slot, expected, error));
                }
            }
        }

        match best {
            None => Resolution::Unmatched,
            Some((cycle, _, _, _)) if cycle < 0 => Resolution::NegativeCycle { cycle },
            Some((cycle, slot, expected_us, error_us)) => Resolution::Matched(SlotMatch {
                cycle: cycle as CycleIndex,
                slot,
                expected_us,
                error_us,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat() -> BeatDuration {
        BeatDuration::from_bpm(120.0).unwrap()
    }

    fn resolver() -> HitResolver {
        HitResolver::new(
            CycleLayout::default(),
            TimingPattern::default(),
            vec![HitWindow::default(); 3],
        )
        .unwrap()
    }

    fn matched(r: Resolution) -> SlotMatch {
        match r {
            Resolution::Matched(m) => m,
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn press_after_second_beat_resolves_to_slot_one() {
        let m = matched(resolver().resolve(550_000, 0, beat()));
        assert_eq!((m.cycle, m.slot), (0, 1));
        assert_eq!(m.expected_us, 500_000);
        assert_eq!(m.error_us, 50_000);
    }

    #[test]
    fn anchor_offset_is_respected() {
        let m = matched(resolver().resolve(10_000_000 + 2_000_000 + 1_010_000, 10_000_000, beat()));
        assert_eq!((m.cycle, m.slot), (1, 2));
        assert_eq!(m.error_us, 10_000);
    }

    #[test]
    fn cast_beat_is_unmatched() {
        // Beat 3 is the cast beat; slot 2's window ends at its boundary.
        assert_eq!(resolver().resolve(1_500_000, 0, beat()), Resolution::Unmatched);
        assert_eq!(resolver().resolve(1_600_000, 0, beat()), Resolution::Unmatched);
        let m = matched(resolver().resolve(1_250_000, 0, beat()));
        assert_eq!((m.cycle, m.slot), (0, 2));
    }

    #[test]
    fn last_slot_closes_at_cast_boundary() {
        let r = HitResolver::new(
            CycleLayout::default(),
            TimingPattern::default(),
            vec![HitWindow::default(), HitWindow::default(), HitWindow::new(0.5, 2.0)],
        )
        .unwrap();
        let m = matched(r.resolve(1_499_999, 0, beat()));
        assert_eq!(m.slot, 2);
        assert_eq!(r.resolve(1_500_000, 0, beat()), Resolution::Unmatched);
    }

    #[test]
    fn tie_goes_to_lower_slot() {
        let r = HitResolver::new(
            CycleLayout::default(),
            TimingPattern::default(),
            vec![HitWindow::new(1.0, 1.0); 3],
        )
        .unwrap();
        let m = matched(r.resolve(250_000, 0, beat()));
        assert_eq!(m.slot, 0);
        assert_eq!(m.error_us, 250_000);

        // One microsecond later slot 1 is strictly closer.
        let m = matched(r.resolve(250_001, 0, beat()));
        assert_eq!(m.slot, 1);
    }

    #[test]
    fn early_press_before_anchor_goes_to_cycle_zero() {
        let m = matched(resolver().resolve(-100_000, 0, beat()));
        assert_eq!((m.cycle, m.slot), (0, 0));
        assert_eq!(m.error_us, -100_000);
    }

    #[test]
    fn negative_cycle_rejected() {
        // Slot 2 of cycle -1 sits at -1.0 s.
        assert_eq!(
            resolver().resolve(-1_000_000, 0, beat()),
            Resolution::NegativeCycle { cycle: -1 }
        );
    }

    #[test]
    fn pattern_offsets_shift_expected_time() {
        let mut r = resolver();
        r.set_pattern(TimingPattern::new("Swing", vec![0.0, 0.5, 0.0]))
            .unwrap();
        let m = matched(r.resolve(760_000, 0, beat()));
        assert_eq!(m.slot, 1);
        assert_eq!(m.expected_us, 750_000);
        assert_eq!(m.error_us, 10_000);
        assert_eq!(r.pattern().name, "Swing");
    }

    #[test]
    fn set_pattern_rejects_wrong_slot_count() {
        let mut r = resolver();
        let err = r
            .set_pattern(TimingPattern::new("Two", vec![0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::SlotCountMismatch { .. }));
        assert_eq!(r.pattern().name, "Default");
    }

    #[test]
    fn construction_errors() {
        let err = HitResolver::new(
            CycleLayout::default(),
            TimingPattern::default(),
            vec![HitWindow::default(); 2],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::SlotCountMismatch {
                what: "hit windows",
                expected: 3,
                found: 2
            }
        );
        assert_eq!(
            resolver().check_clock(5),
            Err(ConfigError::BeatsPerCycleMismatch {
                clock: 5,
                resolver: 4
            })
        );
        assert!(resolver().check_clock(4).is_ok());
    }
}
