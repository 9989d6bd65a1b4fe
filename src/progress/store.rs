// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! YAML-file progress store.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::score::SongId;

use super::{CompletionStatus, ProgressError, ProgressReporter};

/// Recorded progress for one song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub status: CompletionStatus,
    /// Number of recorded completions
    #[serde(default)]
    pub play_count: u32,
    /// Unix time of the last recorded completion
    #[serde(default)]
    pub last_played: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressFile {
    #[serde(default)]
    songs: BTreeMap<u32, ProgressEntry>,
}

/// Progress persisted to a YAML file, rewritten on every report
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    songs: BTreeMap<u32, ProgressEntry>,
}

impl ProgressStore {
    /// Open the store at `path`; a missing file starts empty
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ProgressError> {
        let path = path.as_ref().to_path_buf();
        let songs = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => {
                let file: ProgressFile = serde_yaml::from_str(&contents)
                    .map_err(|e| ProgressError::Parse(e.to_string()))?;
                file.songs
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No progress file at {:?}, starting empty", path);
                BTreeMap::new()
            }
            Err(source) => return Err(ProgressError::Io { path, source }),
        };
        Ok(Self { path, songs })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry(&self, song_id: SongId) -> Option<&ProgressEntry> {
        self.songs.get(&song_id.0)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Apply a completion in memory; returns false if it would downgrade
    pub fn record(&mut self, song_id: SongId, status: CompletionStatus, timestamp: u64) -> bool {
        let existing = self.songs.get(&song_id.0).map(|e| e.status);
        if !status.may_replace(existing) {
            debug!("Keeping {:?} for song {} over {}", existing, song_id, status);
            return false;
        }
        let entry = self.songs.entry(song_id.0).or_insert(ProgressEntry {
            status,
            play_count: 0,
            last_played: 0,
        });
        entry.status = status;
        entry.play_count += 1;
        entry.last_played = timestamp;
        true
    }

    /// Write the store back to its file
    pub fn save(&self) -> Result<(), ProgressError> {
        let file = ProgressFile {
            songs: self.songs.clone(),
        };
        let yaml = serde_yaml::to_string(&file).map_err(|e| ProgressError::Parse(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ProgressError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, yaml).map_err(|source| ProgressError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl ProgressReporter for ProgressStore {
    fn report_completion(
        &mut self,
        song_id: SongId,
        status: CompletionStatus,
    ) -> Result<(), ProgressError> {
        let previous = self.songs.get(&song_id.0).cloned();
        if !self.record(song_id, status, unix_now()) {
            return Ok(());
        }
        if let Err(e) = self.save() {
            // Memory follows the file
            match previous {
                Some(entry) => self.songs.insert(song_id.0, entry),
                None => self.songs.remove(&song_id.0),
            };
            return Err(e);
        }
        info!("Recorded {} for song {}", status, song_id);
        Ok(())
    }

    fn fetch_status(&self, song_id: SongId) -> Result<Option<CompletionStatus>, ProgressError> {
        Ok(self.entry(song_id).map(|e| e.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = ProgressStore::open(dir.path().join("progress.yaml")).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.fetch_status(SongId(1)).unwrap(), None);
    }

    #[test]
    fn test_report_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("progress.yaml");

        let mut store = ProgressStore::open(&path).unwrap();
        store
            .report_completion(SongId(3), CompletionStatus::CompletedGuided)
            .unwrap();
        store
            .report_completion(SongId(3), CompletionStatus::CompletedGuided)
            .unwrap();

        let reopened = ProgressStore::open(&path).unwrap();
        let entry = reopened.entry(SongId(3)).unwrap();
        assert_eq!(entry.status, CompletionStatus::CompletedGuided);
        assert_eq!(entry.play_count, 2);
        assert!(entry.last_played > 0);
    }

    #[test]
    fn test_guided_never_downgrades_free() {
        let dir = tempdir().unwrap();
        let mut store = ProgressStore::open(dir.path().join("p.yaml")).unwrap();

        assert!(store.record(SongId(1), CompletionStatus::CompletedFree, 10));
        assert!(!store.record(SongId(1), CompletionStatus::CompletedGuided, 20));
        let entry = store.entry(SongId(1)).unwrap();
        assert_eq!(entry.status, CompletionStatus::CompletedFree);
        assert_eq!(entry.play_count, 1);
        assert_eq!(entry.last_played, 10);

        // Free upgrades guided
        assert!(store.record(SongId(2), CompletionStatus::CompletedGuided, 10));
        assert!(store.record(SongId(2), CompletionStatus::CompletedFree, 11));
        assert_eq!(
            store.fetch_status(SongId(2)).unwrap(),
            Some(CompletionStatus::CompletedFree)
        );
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let mut store = ProgressStore::open(blocker.join("progress.yaml")).unwrap();
        assert!(store.record(SongId(1), CompletionStatus::CompletedGuided, 5));

        let result = store.report_completion(SongId(1), CompletionStatus::CompletedFree);
        assert!(matches!(result, Err(ProgressError::Io { .. })));
        let entry = store.entry(SongId(1)).unwrap();
        assert_eq!(entry.status, CompletionStatus::CompletedGuided);
        assert_eq!(entry.play_count, 1);

        assert!(store
            .report_completion(SongId(2), CompletionStatus::CompletedGuided)
            .is_err());
        assert_eq!(store.fetch_status(SongId(2)).unwrap(), None);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p.yaml");
        fs::write(&path, "songs: [not, a, map").unwrap();
        assert!(matches!(
            ProgressStore::open(&path),
            Err(ProgressError::Parse(_))
        ));
    }

    #[test]
    fn test_file_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p.yaml");
        let mut store = ProgressStore::open(&path).unwrap();
        store.record(SongId(7), CompletionStatus::CompletedFree, 1234);
        store.save().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("completed_free"));
        assert!(contents.contains("play_count: 1"));
        assert!(contents.contains("last_played: 1234"));
    }
}
