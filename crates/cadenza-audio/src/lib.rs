//! Audio-side timing: the transport abstraction, clip probing, cue scheduling
//! and the controller that keeps the beat clock phase-locked to a looping
//! backing track.

pub mod clip_probe;
pub mod cues;
pub mod sync;
pub mod transport;

pub use clip_probe::probe_wav;
pub use cues::CueScheduler;
pub use sync::{AudioSyncController, RhythmTarget};
pub use transport::{AudioTransport, ManualTransport};
