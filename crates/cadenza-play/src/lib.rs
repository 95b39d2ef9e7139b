//! Input judgment: slot resolution, per-cycle combo aggregation and the judge
//! that ties them to the input binding map.

pub mod aggregator;
pub mod judge;
pub mod resolver;
pub mod stats;

pub use aggregator::{ComboAggregator, HitOutcome, RecordPhase};
pub use judge::RhythmJudge;
pub use resolver::{HitResolver, Resolution, SlotMatch};
pub use stats::JudgeStats;
