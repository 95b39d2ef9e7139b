use serde::Serialize;

use cadenza_types::{Hit, RejectReason};

/// Cumulative judgment counters for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeStats {
    /// Presses that landed in a slot, surfaced or not.
    pub matched: u32,
    pub early_count: u32,
    pub late_count: u32,
    pub unmatched: u32,
    pub negative_cycle: u32,
    pub duplicate: u32,
    pub evicted: u32,
    pub after_cast: u32,
    pub disabled: u32,
    pub unbound: u32,
    pub clock_stopped: u32,
    pub combos_cast: u32,
    error_sum_us: i64,
}

impl JudgeStats {
    pub fn record_hit(&mut self, hit: &Hit) {
        self.matched += 1;
        self.error_sum_us += hit.signed_error_us;
        match hit.signed_error_us {
            e if e < 0 => self.early_count += 1,
            e if e > 0 => self.late_count += 1,
            _ => {}
        }
    }

    pub fn record_rejection(&mut self, reason: RejectReason) {
        let counter = match reason {
            RejectReason::NoWindow => &mut self.unmatched,
            RejectReason::NegativeCycle => &mut self.negative_cycle,
            RejectReason::DuplicateSlot => &mut self.duplicate,
            RejectReason::CycleEvicted => &mut self.evicted,
            RejectReason::AlreadyCast => &mut self.after_cast,
            RejectReason::InputDisabled => &mut self.disabled,
            RejectReason::UnboundInput => &mut self.unbound,
            RejectReason::ClockStopped => &mut self.clock_stopped,
        };
        *counter += 1;
    }

    pub fn record_cast(&mut self) {
        self.combos_cast += 1;
    }

    pub fn rejected(&self) -> u32 {
        self.unmatched
            + self.negative_cycle
            + self.duplicate
            + self.evicted
            + self.after_cast
            + self.disabled
            + self.unbound
            + self.clock_stopped
    }

    /// Mean `press - expected` over matched presses, in microseconds.
    pub fn mean_signed_error_us(&self) -> Option<f64> {
        if self.matched == 0 {
            return None;
        }
        Some(self.error_sum_us as f64 / self.matched as f64)
    }
}
