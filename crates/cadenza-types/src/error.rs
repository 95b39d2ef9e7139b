use thiserror::Error;

/// Structural misconfiguration. Any of these refuses to start the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("tempo must be a positive finite BPM, got {0}")]
    InvalidTempo(f64),

    #[error("a cycle must contain at least one beat")]
    EmptyCycle,

    #[error("a cycle needs at least one input slot")]
    NoSlots,

    #[error("cast beat {cast_beat} does not fit in a {beats_per_cycle}-beat cycle")]
    CastBeatOutsideCycle { cast_beat: u32, beats_per_cycle: u32 },

    #[error("beats per cycle mismatch: clock runs {clock}, resolver expects {resolver}")]
    BeatsPerCycleMismatch { clock: u32, resolver: u32 },

    #[error("{what} defines {found} slots, layout expects {expected}")]
    SlotCountMismatch {
        what: &'static str,
        expected: u32,
        found: u32,
    },

    #[error("expected offset for slot {slot} must be in [0, 1), got {offset}")]
    OffsetOutOfRange { slot: u32, offset: f64 },

    #[error("hit window for slot {slot} must be non-negative, got early={early} late={late}")]
    InvalidWindow { slot: u32, early: f64, late: f64 },

    #[error("cast period must be at least one cycle")]
    ZeroCastPeriod,

    #[error("retention must keep at least one cycle")]
    ZeroRetention,

    #[error("input binding has an empty input id")]
    EmptyInputId,

    #[error("input id {0} is bound more than once")]
    DuplicateBinding(String),

    #[error("glyph {glyph:?} for input {input_id} is blank or reserved")]
    InvalidGlyph { input_id: String, glyph: char },

    #[error("{field} must be a non-negative number of seconds, got {value}")]
    InvalidDuration { field: &'static str, value: f64 },

    #[error("cue pool must hold at least one cue")]
    EmptyCuePool,

    #[error("song title must not be empty")]
    EmptySongTitle,

    #[error("clip needs a positive sample rate and sample count")]
    InvalidClip,

    #[error("song {0:?} is not in the library")]
    UnknownSong(String),
}
