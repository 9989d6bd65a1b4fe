// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback policy trait.
//!
//! A policy decides when the cursor moves through the score. The host calls
//! [`PlaybackPolicy::tick`] once per frame and forwards key presses between
//! ticks; nothing in a policy blocks or sleeps.

use std::sync::Arc;

use crate::keyboard::Keyboard;
use crate::score::Score;

use super::{
    Action, AutomaticPolicy, EngineSettings, GuidedPolicy, MasteryPolicy, PendingStep,
    PlaybackCursor, PlaybackMode,
};

/// What a key press did to the pending step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The press was not expected, or no step was pending
    Ignored,
    /// The press matched and the step still expects more notes
    Matched,
    /// The press completed the pending step
    StepCompleted,
}

/// Trait for playback advancement policies
pub trait PlaybackPolicy {
    /// Mode this policy implements
    fn mode(&self) -> PlaybackMode;

    /// Current position in the score
    fn cursor(&self) -> &PlaybackCursor;

    /// Advance by one frame at session time `now` (seconds)
    fn tick(&mut self, now: f64, keyboard: &mut dyn Keyboard) -> Action;

    /// Whether key presses drive this policy
    fn accepts_input(&self) -> bool {
        self.mode().is_interactive()
    }

    /// Apply a key press at session time `now`
    fn on_key_down(&mut self, _pitch: u8, _now: f64, _keyboard: &mut dyn Keyboard) -> KeyOutcome {
        KeyOutcome::Ignored
    }

    /// Step currently waiting for input, if any
    fn pending(&self) -> Option<&PendingStep> {
        None
    }

    /// Pitches the player should be hearing or playing right now
    fn current_pitches(&self) -> Vec<u8> {
        self.pending()
            .map(|p| p.remaining().to_vec())
            .unwrap_or_default()
    }

    /// Whether mastery hints are showing
    fn hint_active(&self) -> bool {
        self.pending().is_some_and(PendingStep::hint_active)
    }
}

/// Build the policy for a playback mode
pub fn create_policy(
    mode: PlaybackMode,
    score: Arc<Score>,
    settings: &EngineSettings,
) -> Box<dyn PlaybackPolicy> {
    match mode {
        PlaybackMode::Automatic => Box::new(AutomaticPolicy::new(score, settings)),
        PlaybackMode::GuidedStep => Box::new(GuidedPolicy::new(score, settings)),
        PlaybackMode::MasteryHint => Box::new(MasteryPolicy::new(score, settings)),
    }
}
