// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Directory-backed song library.
//!
//! Songs live in one directory as `song_<id>.mid` Standard MIDI Files or
//! `song_<id>.yaml` score files. When both exist the MIDI file wins.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{load_score, Score, ScoreError, ScoreSource, SongId};

/// Library file extensions, in lookup order
pub const SONG_EXTENSIONS: [&str; 3] = ["mid", "midi", "yaml"];

/// A song available in the library
#[derive(Debug, Clone, PartialEq)]
pub struct SongEntry {
    pub id: SongId,
    pub title: String,
    pub path: PathBuf,
}

/// Score source that resolves song ids to files in a directory
#[derive(Debug, Clone)]
pub struct ScoreLibrary {
    root: PathBuf,
}

impl ScoreLibrary {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a song id resolves to
    ///
    /// The first existing file in [`SONG_EXTENSIONS`] order, else the
    /// `.mid` path.
    pub fn path_for(&self, id: SongId) -> PathBuf {
        let candidate = |ext: &str| self.root.join(format!("song_{}.{}", id.0, ext));
        SONG_EXTENSIONS
            .iter()
            .map(|&ext| candidate(ext))
            .find(|path| path.is_file())
            .unwrap_or_else(|| candidate(SONG_EXTENSIONS[0]))
    }

    /// List songs in the library, sorted by id, one entry per id
    ///
    /// Files that do not follow the naming scheme are skipped; files that
    /// fail to parse are listed with their file name as title.
    pub fn list(&self) -> Result<Vec<SongEntry>, ScoreError> {
        let entries = fs::read_dir(&self.root).map_err(|source| ScoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let ids: BTreeSet<SongId> = entries
            .flatten()
            .filter_map(|entry| parse_song_id(&entry.path()))
            .collect();

        let mut songs = Vec::with_capacity(ids.len());
        for id in ids {
            let path = self.path_for(id);
            let title = match load_score(&path) {
                Ok(score) => score.title().to_string(),
                Err(e) => {
                    warn!("Unreadable score {:?}: {}", path, e);
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default()
                }
            };
            songs.push(SongEntry { id, title, path });
        }
        Ok(songs)
    }
}

impl ScoreSource for ScoreLibrary {
    fn load(&self, id: SongId) -> Result<Score, ScoreError> {
        let path = self.path_for(id);
        debug!("Loading song {} from {:?}", id, path);
        load_score(&path)
    }
}

/// Song id of a `song_<id>.<ext>` path with a library extension
pub fn parse_song_id(path: &Path) -> Option<SongId> {
    let ext = path.extension()?.to_str()?;
    if !SONG_EXTENSIONS.contains(&ext) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix("song_")?.parse().ok().map(SongId)
}
