// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Application configuration.
//!
//! Settings are loaded from a TOML file. Every field has a default, so a
//! missing file or a partial one is fine.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::keyboard::KeyRange;
use crate::sequencer::{
    EngineSettings, CHORD_TIME_THRESHOLD, COMPLETION_GRACE, LOOKAHEAD_TIME, MASTERY_IDLE_DURATION,
};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "keystep.toml";

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TutorConfig {
    /// tracing filter level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub sound: SoundConfig,
}

impl TutorConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml(&contents)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse TOML configuration")
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Engine parameters from the playback section
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            chord_threshold: chord_threshold(self.playback.chord_threshold),
            lookahead: self.playback.lookahead.max(0.0),
            mastery_idle: self.playback.mastery_idle.max(0.0),
            completion_grace: self.playback.completion_grace.max(0.0),
            ..EngineSettings::default()
        }
        .with_speed(self.playback.speed)
    }

    /// On-screen keyboard range
    pub fn key_range(&self) -> KeyRange {
        KeyRange::octaves(self.keyboard.lowest_note, self.keyboard.octaves)
    }
}

/// Non-positive or non-finite thresholds would split every chord
fn chord_threshold(configured: f64) -> f64 {
    if configured.is_finite() && configured > 0.0 {
        configured
    } else {
        warn!("Invalid chord_threshold {}, using {}", configured, CHORD_TIME_THRESHOLD);
        CHORD_TIME_THRESHOLD
    }
}

/// Playback tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackConfig {
    /// Automatic playback speed multiplier
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Step grouping threshold in seconds
    #[serde(default = "default_chord_threshold")]
    pub chord_threshold: f64,
    /// Automatic lookahead window in seconds
    #[serde(default = "default_lookahead")]
    pub lookahead: f64,
    /// Mastery idle time before hints, in seconds
    #[serde(default = "default_mastery_idle")]
    pub mastery_idle: f64,
    /// Delay before teardown after a practice completion, in seconds
    #[serde(default = "default_completion_grace")]
    pub completion_grace: f64,
    /// UI frames per second
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

fn default_speed() -> f64 {
    1.0
}
fn default_chord_threshold() -> f64 {
    CHORD_TIME_THRESHOLD
}
fn default_lookahead() -> f64 {
    LOOKAHEAD_TIME
}
fn default_mastery_idle() -> f64 {
    MASTERY_IDLE_DURATION
}
fn default_completion_grace() -> f64 {
    COMPLETION_GRACE
}
fn default_frame_rate() -> u32 {
    60
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            chord_threshold: default_chord_threshold(),
            lookahead: default_lookahead(),
            mastery_idle: default_mastery_idle(),
            completion_grace: default_completion_grace(),
            frame_rate: default_frame_rate(),
        }
    }
}

/// On-screen keyboard and note keys
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyboardConfig {
    /// Lowest displayed key
    #[serde(default = "default_lowest_note")]
    pub lowest_note: u8,
    /// Number of displayed octaves
    #[serde(default = "default_octaves")]
    pub octaves: u8,
    /// Octave of the `a` note key (4 = middle C)
    #[serde(default = "default_base_octave")]
    pub base_octave: u8,
}

fn default_lowest_note() -> u8 {
    24
}
fn default_octaves() -> u8 {
    5
}
fn default_base_octave() -> u8 {
    4
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            lowest_note: default_lowest_note(),
            octaves: default_octaves(),
            base_octave: default_base_octave(),
        }
    }
}

/// File locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    /// Directory holding `song_<id>.mid` and `song_<id>.yaml` files
    #[serde(default = "default_songs_dir")]
    pub songs_dir: PathBuf,
    /// Progress store
    #[serde(default = "default_progress_file")]
    pub progress_file: PathBuf,
    /// Log output
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

fn default_songs_dir() -> PathBuf {
    PathBuf::from("songs")
}
fn default_progress_file() -> PathBuf {
    PathBuf::from("progress.yaml")
}
fn default_log_file() -> PathBuf {
    PathBuf::from("keystep.log")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            songs_dir: default_songs_dir(),
            progress_file: default_progress_file(),
            log_file: default_log_file(),
        }
    }
}

/// External input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct InputConfig {
    /// MIDI source index to connect to
    #[serde(default)]
    pub midi_source: Option<usize>,
}

/// Key feedback synth
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoundConfig {
    /// Per-voice gain (0.0 - 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 {
    0.2
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            playback: PlaybackConfig::default(),
            keyboard: KeyboardConfig::default(),
            paths: PathsConfig::default(),
            input: InputConfig::default(),
            sound: SoundConfig::default(),
        }
    }
}
