// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Completion tracking.
//!
//! A session that reaches the end of its score produces one
//! [`CompletionRecord`]. Practice-mode completions are handed to a
//! [`ProgressReporter`]; automatic playback is never recorded.

pub mod store;

pub use store::{ProgressEntry, ProgressStore};

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::score::SongId;
use crate::sequencer::PlaybackMode;

/// Recorded completion level of a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionStatus {
    /// Played through in guided mode
    #[serde(rename = "completed_guided")]
    CompletedGuided,
    /// Played through in mastery mode
    #[serde(rename = "completed_free")]
    CompletedFree,
}

impl CompletionStatus {
    /// Status tag as stored and reported
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::CompletedGuided => "completed_guided",
            CompletionStatus::CompletedFree => "completed_free",
        }
    }

    /// Status earned by completing a song in `mode`
    pub fn for_mode(mode: PlaybackMode) -> Option<Self> {
        match mode {
            PlaybackMode::Automatic => None,
            PlaybackMode::GuidedStep => Some(CompletionStatus::CompletedGuided),
            PlaybackMode::MasteryHint => Some(CompletionStatus::CompletedFree),
        }
    }

    /// Whether recording `self` over `existing` is allowed
    ///
    /// A guided completion never replaces a free one.
    pub fn may_replace(&self, existing: Option<CompletionStatus>) -> bool {
        !(*self == CompletionStatus::CompletedGuided
            && existing == Some(CompletionStatus::CompletedFree))
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRecord {
    pub song_id: SongId,
    pub mode: PlaybackMode,
}

impl CompletionRecord {
    pub fn new(song_id: SongId, mode: PlaybackMode) -> Self {
        Self { song_id, mode }
    }

    /// Status to record, or None when the mode is not recorded
    pub fn status(&self) -> Option<CompletionStatus> {
        CompletionStatus::for_mode(self.mode)
    }
}

/// Errors raised by progress reporters
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("failed to access progress file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse progress data: {0}")]
    Parse(String),
    #[error("progress update rejected: {0}")]
    Rejected(String),
}

/// Destination for completion reports
pub trait ProgressReporter {
    /// Record that `song_id` was completed with `status`
    fn report_completion(
        &mut self,
        song_id: SongId,
        status: CompletionStatus,
    ) -> Result<(), ProgressError>;

    /// Currently recorded status of `song_id`
    fn fetch_status(&self, song_id: SongId) -> Result<Option<CompletionStatus>, ProgressError>;
}

/// Reporter that records nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn report_completion(
        &mut self,
        _song_id: SongId,
        _status: CompletionStatus,
    ) -> Result<(), ProgressError> {
        Ok(())
    }

    fn fetch_status(&self, _song_id: SongId) -> Result<Option<CompletionStatus>, ProgressError> {
        Ok(None)
    }
}
