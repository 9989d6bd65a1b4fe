// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! YAML score files.
//!
//! ```yaml
//! title: "Ode to Joy"
//! tempo: 100
//! time_unit: beats
//! notes:
//!   - { pitch: 64, start: 0, duration: 1 }
//!   - { pitch: 64, start: 1, duration: 1 }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Note, Score, ScoreError};

/// Unit used for note start times and durations in a score file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Times are already in seconds
    #[default]
    Seconds,
    /// Times are in quarter-note beats at the file's tempo
    Beats,
}

/// Root of a score file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreFile {
    /// Piece title
    #[serde(default = "default_title")]
    pub title: String,
    /// Tempo in BPM, used when `time_unit` is `beats`
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Unit of `start` and `duration`
    #[serde(default)]
    pub time_unit: TimeUnit,
    /// Notes in any order
    #[serde(default)]
    pub notes: Vec<NoteEntry>,
}

/// A note as written in a score file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NoteEntry {
    pub pitch: u8,
    pub start: f64,
    #[serde(default = "default_duration")]
    pub duration: f64,
}

fn default_title() -> String {
    "Untitled".to_string()
}
fn default_tempo() -> f64 {
    120.0
}
fn default_duration() -> f64 {
    1.0
}

impl ScoreFile {
    /// Read and parse a score file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScoreError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ScoreError::NotFound(path.display().to_string())
            } else {
                ScoreError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse a score file from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ScoreError> {
        serde_yaml::from_str(yaml).map_err(|e| ScoreError::Parse(e.to_string()))
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String, ScoreError> {
        serde_yaml::to_string(self).map_err(|e| ScoreError::Parse(e.to_string()))
    }

    /// Seconds per unit of `start`/`duration`
    fn seconds_per_unit(&self) -> Result<f64, ScoreError> {
        match self.time_unit {
            TimeUnit::Seconds => Ok(1.0),
            TimeUnit::Beats if self.tempo.is_finite() && self.tempo > 0.0 => Ok(60.0 / self.tempo),
            TimeUnit::Beats => Err(ScoreError::Parse(format!("invalid tempo {}", self.tempo))),
        }
    }

    /// Convert to a time-mapped, sorted [`Score`]
    pub fn to_score(&self) -> Result<Score, ScoreError> {
        let scale = self.seconds_per_unit()?;
        let notes = self
            .notes
            .iter()
            .map(|entry| Note::new(entry.pitch, entry.start * scale, entry.duration * scale))
            .collect();
        Score::new(self.title.clone(), notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds_score() {
        let yaml = r#"
title: "Scale"
notes:
  - { pitch: 60, start: 0.0, duration: 0.5 }
  - { pitch: 62, start: 0.5 }
"#;
        let file = ScoreFile::from_yaml(yaml).unwrap();
        assert_eq!(file.title, "Scale");
        assert_eq!(file.time_unit, TimeUnit::Seconds);
        assert_eq!(file.notes[1].duration, 1.0);

        let score = file.to_score().unwrap();
        assert_eq!(score.len(), 2);
        assert_eq!(score[1].start_time, 0.5);
    }

    #[test]
    fn test_beats_convert_to_seconds() {
        let yaml = r#"
title: "Slow"
tempo: 60
time_unit: beats
notes:
  - { pitch: 60, start: 2, duration: 1 }
  - { pitch: 64, start: 0, duration: 0.5 }
"#;
        let score = ScoreFile::from_yaml(yaml).unwrap().to_score().unwrap();
        // Sorted, and one beat at 60 BPM is one second
        assert_eq!(score[0].pitch, 64);
        assert_eq!(score[0].duration, 0.5);
        assert_eq!(score[1].start_time, 2.0);

        let fast = ScoreFile {
            tempo: 120.0,
            ..ScoreFile::from_yaml(yaml).unwrap()
        };
        let score = fast.to_score().unwrap();
        assert_eq!(score[1].start_time, 1.0);
    }

    #[test]
    fn test_zero_tempo_rejected() {
        let yaml = "tempo: 0\ntime_unit: beats\nnotes: [{ pitch: 60, start: 1 }]\n";
        let err = ScoreFile::from_yaml(yaml).unwrap().to_score().unwrap_err();
        assert!(matches!(err, ScoreError::Parse(_)));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = ScoreFile::from_yaml("notes: [ { pitch: sixty } ]").unwrap_err();
        assert!(matches!(err, ScoreError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = ScoreFile::load("/definitely/not/here/song.yaml").unwrap_err();
        assert!(matches!(err, ScoreError::NotFound(_)));
    }

    #[test]
    fn test_yaml_round_trip_keeps_notes() {
        let original = ScoreFile {
            title: "Round".to_string(),
            tempo: 90.0,
            time_unit: TimeUnit::Beats,
            notes: vec![NoteEntry { pitch: 67, start: 0.0, duration: 2.0 }],
        };
        let parsed = ScoreFile::from_yaml(&original.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, original);
    }
}
