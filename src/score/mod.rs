// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note scores.
//!
//! A [`Score`] is the immutable, time-sorted list of notes a playback
//! session replays. Scores come from a [`ScoreSource`]; the crate reads
//! Standard MIDI Files and a YAML score format, and ships a
//! directory-backed song library.

pub mod file;
pub mod library;
pub mod smf;

pub use file::{ScoreFile, TimeUnit};
pub use library::{parse_song_id, ScoreLibrary, SongEntry, SONG_EXTENSIONS};
pub use smf::{load_smf, parse_smf, TempoMap};

use std::fmt;
use std::ops::Index;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Highest valid MIDI note number
pub const MAX_PITCH: u8 = 127;

/// Identifier of a song in a score source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SongId(pub u32);

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised while obtaining a score
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("score not found: {0}")]
    NotFound(String),
    #[error("failed to read score {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse score: {0}")]
    Parse(String),
    #[error("invalid note #{index}: {reason}")]
    InvalidNote { index: usize, reason: String },
}

/// A single timed note
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// MIDI note number (0-127)
    pub pitch: u8,
    /// Onset in seconds from the start of the piece
    pub start_time: f64,
    /// Length in seconds
    pub duration: f64,
}

impl Note {
    pub fn new(pitch: u8, start_time: f64, duration: f64) -> Self {
        Self {
            pitch,
            start_time,
            duration,
        }
    }

    /// Time at which the note is released
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    fn validate(&self, index: usize) -> Result<(), ScoreError> {
        let invalid = |reason: String| ScoreError::InvalidNote { index, reason };
        if self.pitch > MAX_PITCH {
            return Err(invalid(format!("pitch {} out of range", self.pitch)));
        }
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(invalid(format!("start time {} is not a valid time", self.start_time)));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(invalid(format!("duration {} is not a valid length", self.duration)));
        }
        Ok(())
    }
}

/// An ordered, immutable sequence of notes
///
/// Notes are kept sorted ascending by start time. Construction sorts
/// defensively with a stable sort, so notes sharing an onset keep their
/// source order (the order guided mode asks the player to follow).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    title: String,
    notes: Vec<Note>,
}

impl Score {
    /// Build a score, validating and sorting the notes
    pub fn new(title: impl Into<String>, mut notes: Vec<Note>) -> Result<Self, ScoreError> {
        for (index, note) in notes.iter().enumerate() {
            note.validate(index)?;
        }
        notes.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        Ok(Self {
            title: title.into(),
            notes,
        })
    }

    /// Build an untitled score from `(pitch, start_time)` pairs with a fixed duration
    pub fn from_onsets(onsets: &[(u8, f64)], duration: f64) -> Result<Self, ScoreError> {
        let notes = onsets
            .iter()
            .map(|&(pitch, start)| Note::new(pitch, start, duration))
            .collect();
        Self::new("Untitled", notes)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    /// Time at which the last note is released
    pub fn duration(&self) -> f64 {
        self.notes
            .iter()
            .map(Note::end_time)
            .fold(0.0, f64::max)
    }
}

impl Index<usize> for Score {
    type Output = Note;

    fn index(&self, index: usize) -> &Note {
        &self.notes[index]
    }
}

/// Something that can produce a score for a song id
pub trait ScoreSource {
    fn load(&self, id: SongId) -> Result<Score, ScoreError>;
}

/// Load a score file, picking the format from the extension
///
/// `.yaml`/`.yml` files are score documents; anything else is read as a
/// Standard MIDI File.
pub fn load_score<P: AsRef<Path>>(path: P) -> Result<Score, ScoreError> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => ScoreFile::load(path)?.to_score(),
        _ => load_smf(path),
    }
}
