//! Session wiring: one beat clock, one judge and one audio-sync controller,
//! driven by a single `tick` per host frame.

pub mod session;

pub use session::{RhythmSession, clip_for};
