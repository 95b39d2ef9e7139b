use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::clip::ClipInfo;
use crate::error::ConfigError;
use crate::pattern::TimingPattern;
use crate::tempo::BeatDuration;
use crate::time::{TimeUs, secs_to_us};

/// One playable song: backing clip, tempo, beat-0 offset and pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct SongData {
    pub title: String,
    /// WAV file for the backing track, relative to the song document.
    pub clip: Option<PathBuf>,
    /// Clip length given inline; takes precedence over probing `clip`.
    pub clip_info: Option<ClipInfo>,
    pub looped: bool,
    pub bpm: f64,
    /// Seconds after music start at which beat 0 begins.
    pub beat0_offset_secs: f64,
    pub pattern: TimingPattern,
    /// Leading cycles that accept input but never cast, on first play only.
    pub tutorial_cycles: u32,
}

impl Default for SongData {
    fn default() -> Self {
        Self {
            title: String::new(),
            clip: None,
            clip_info: None,
            looped: true,
            bpm: 120.0,
            beat0_offset_secs: 0.0,
            pattern: TimingPattern::default(),
            tutorial_cycles: 0,
        }
    }
}

impl SongData {
    pub fn beat_duration(&self) -> Result<BeatDuration, ConfigError> {
        BeatDuration::from_bpm(self.bpm)
    }

    pub fn beat0_offset_us(&self) -> TimeUs {
        secs_to_us(self.beat0_offset_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::EmptySongTitle);
        }
        self.beat_duration()?;
        if !self.beat0_offset_secs.is_finite() || self.beat0_offset_secs < 0.0 {
            return Err(ConfigError::InvalidDuration {
                field: "beat0OffsetSecs",
                value: self.beat0_offset_secs,
            });
        }
        if let Some(clip) = &self.clip_info {
            clip.validate()?;
        }
        self.pattern.validate()
    }

    /// Read and validate a song from a JSON file. A relative `clip` path is
    /// resolved against the file's directory.
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut song: SongData = serde_json::from_str(&data)?;
        song.validate()?;
        if let Some(base) = path.parent() {
            song.resolve_clip_path(base);
        }
        Ok(song)
    }

    fn resolve_clip_path(&mut self, base: &Path) {
        let resolved = match &self.clip {
            Some(clip) if clip.is_relative() => Some(base.join(clip)),
            _ => None,
        };
        if resolved.is_some() {
            self.clip = resolved;
        }
    }
}

/// A set of songs plus the one to auto-load at start-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct SongLibrary {
    pub default_song: Option<String>,
    pub songs: Vec<SongData>,
}

impl SongLibrary {
    pub fn find(&self, title: &str) -> Result<&SongData, ConfigError> {
        self.songs
            .iter()
            .find(|s| s.title == title)
            .ok_or_else(|| ConfigError::UnknownSong(title.to_string()))
    }

    /// The configured default song, or the first song when none is named.
    pub fn default_song(&self) -> Option<&SongData> {
        match &self.default_song {
            Some(title) => self.songs.iter().find(|s| &s.title == title),
            None => self.songs.first(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for song in &self.songs {
            song.validate()?;
        }
        if let Some(title) = &self.default_song {
            self.find(title)?;
        }
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut library: SongLibrary = serde_json::from_str(&data)?;
        library.validate()?;
        if let Some(base) = path.parent() {
            for song in &mut library.songs {
                song.resolve_clip_path(base);
            }
        }
        Ok(library)
    }
}
