//! Raw input plumbing.
//!
//! Platform key capture lives outside the engine; it hands over
//! `(input_id, timestamp)` pairs through an [`InputSource`]. This crate
//! provides the trait, a scripted source for replays and simulations, and an
//! input logger for recording sessions.

pub mod input_log;
pub mod source;

pub use input_log::{InputLogger, RawInput};
pub use source::{InputSource, RecordingSource, ScriptedInput};
