//! Beat clock and time sources.
//!
//! [`BeatClock`] turns domain time into beat/cycle boundaries. It owns no time
//! source itself: callers pass `now` from a [`TimeProvider`] (wall domain) or
//! from the audio transport (audio domain).

pub mod clock;
pub mod time;

pub use clock::{BeatClock, ClockDomain, ClockState};
pub use time::{MockTimeProvider, SystemTimeProvider, TimeProvider};
