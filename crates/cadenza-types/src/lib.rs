//! Shared data model for the cadenza rhythm engine.
//!
//! Holds the configuration documents (engine config, songs, timing patterns,
//! input bindings), the per-cycle judgment records and the outbound event
//! types. Everything here is plain data; behaviour lives in the timing, play,
//! audio and session crates.

pub mod binding;
pub mod clip;
pub mod config;
pub mod error;
pub mod event;
pub mod hit;
pub mod layout;
pub mod pattern;
pub mod song;
pub mod tempo;
pub mod time;
pub mod window;

pub use binding::{ActionType, Direction, InputBinding, InputBindingMap};
pub use clip::ClipInfo;
pub use config::{CueConfig, DebugLogConfig, EngineConfig, RhythmConfig, SyncConfig};
pub use error::ConfigError;
pub use event::{AudioCue, CueKind, EventQueue, RejectReason, RhythmEvent};
pub use hit::{BeatEvent, ComboRecord, CycleIndex, Hit, MISS_GLYPH, SlotIndex};
pub use layout::CycleLayout;
pub use pattern::TimingPattern;
pub use song::{SongData, SongLibrary};
pub use tempo::BeatDuration;
pub use time::{MICROS_PER_SEC, TimeUs, secs_to_us, us_to_ms};
pub use window::HitWindow;
