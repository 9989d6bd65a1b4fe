// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note-sequencing engine.
//!
//! This module provides the playback core:
//! - Stepper grouping a score into chords by onset proximity
//! - Three playback policies (automatic, guided, mastery)
//! - Player session owning the active policy and its collaborators
//! - Input reconciler applying key events between frame ticks

pub mod automatic;
pub mod guided;
pub mod mastery;
pub mod pending;
pub mod player;
pub mod policy;
pub mod reconciler;
pub mod stepper;

pub use automatic::AutomaticPolicy;
pub use guided::GuidedPolicy;
pub use mastery::MasteryPolicy;
pub use pending::{MatchOrder, PendingStep};
pub use player::{Player, SessionState};
pub use policy::{create_policy, KeyOutcome, PlaybackPolicy};
pub use reconciler::{InputReconciler, InputSender, KeyEvent, ReconcileSummary};
pub use stepper::{Step, Stepper};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Onsets closer than this to a step's first note belong to the same step (seconds)
pub const CHORD_TIME_THRESHOLD: f64 = 0.05;
/// How far ahead automatic playback shows upcoming notes (seconds at speed 1.0)
pub const LOOKAHEAD_TIME: f64 = 2.0;
/// Mastery idle time before hints are shown (seconds)
pub const MASTERY_IDLE_DURATION: f64 = 5.0;
/// Delay between completion and teardown in practice modes (seconds)
pub const COMPLETION_GRACE: f64 = 2.0;

/// Playback mode of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// Plays the score on its own, no input
    Automatic,
    /// Waits for each note of each step, in order ("easy")
    GuidedStep,
    /// Waits for each step in any order, hints after idling ("mastery")
    MasteryHint,
}

impl PlaybackMode {
    /// Whether key presses drive this mode
    pub fn is_interactive(&self) -> bool {
        !matches!(self, PlaybackMode::Automatic)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlaybackMode::Automatic => "Automatic",
            PlaybackMode::GuidedStep => "Easy",
            PlaybackMode::MasteryHint => "Mastery",
        }
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PlaybackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "automatic" => Ok(PlaybackMode::Automatic),
            "easy" | "guided" | "guided_step" => Ok(PlaybackMode::GuidedStep),
            "mastery" | "free" | "mastery_hint" => Ok(PlaybackMode::MasteryHint),
            other => Err(format!("unknown playback mode: {}", other)),
        }
    }
}

/// Result of a policy tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing changed
    None,
    /// A new step became current
    AdvanceStep,
    /// The end of the score was reached
    Complete,
}

/// Tunable engine parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Automatic playback speed multiplier
    pub speed: f64,
    /// Step grouping threshold in seconds
    pub chord_threshold: f64,
    /// Automatic lookahead window in seconds
    pub lookahead: f64,
    /// Mastery idle time before hints
    pub mastery_idle: f64,
    /// Delay between completion and teardown in practice modes
    pub completion_grace: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            chord_threshold: CHORD_TIME_THRESHOLD,
            lookahead: LOOKAHEAD_TIME,
            mastery_idle: MASTERY_IDLE_DURATION,
            completion_grace: COMPLETION_GRACE,
        }
    }
}

impl EngineSettings {
    /// Set the playback speed, clamped to a usable range
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = if speed.is_finite() { speed.clamp(0.1, 4.0) } else { 1.0 };
        self
    }

    /// Teardown delay after completion in the given mode
    pub fn grace_for(&self, mode: PlaybackMode) -> f64 {
        match mode {
            PlaybackMode::Automatic => 0.0,
            PlaybackMode::GuidedStep | PlaybackMode::MasteryHint => self.completion_grace,
        }
    }
}

/// Position of a session in its score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackCursor {
    /// Index of the first score note not yet consumed
    pub current_index: usize,
    /// Mode of the owning session
    pub mode: PlaybackMode,
    /// Whether the end of the score was reached
    pub completed: bool,
}

impl PlaybackCursor {
    pub fn new(mode: PlaybackMode) -> Self {
        Self {
            current_index: 0,
            mode,
            completed: false,
        }
    }

    /// Move forward to `index`; the cursor never moves backwards
    pub fn advance_to(&mut self, index: usize) {
        if index < self.current_index {
            warn!(
                "Ignoring backwards cursor move from {} to {}",
                self.current_index, index
            );
            return;
        }
        self.current_index = index;
    }

    /// Mark the end of a score of `len` notes as reached
    pub fn complete(&mut self, len: usize) {
        self.advance_to(len);
        self.completed = true;
    }
}
