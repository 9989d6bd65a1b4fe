// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Mastery playback.
//!
//! The player works from memory: nothing is highlighted while they keep
//! playing. Each step accepts its notes in any order. If no correct note
//! arrives for the idle duration, the remaining notes of the step are
//! revealed as hints until the step is done.

use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::keyboard::{Keyboard, VisualClass};
use crate::score::Score;

use super::{
    Action, EngineSettings, KeyOutcome, MatchOrder, PendingStep, PlaybackCursor, PlaybackMode,
    PlaybackPolicy, Stepper,
};

/// Input-gated, unordered playback policy with idle hints
pub struct MasteryPolicy {
    score: Arc<Score>,
    stepper: Stepper,
    cursor: PlaybackCursor,
    idle_duration: f64,
    pending: Option<PendingStep>,
    /// Score index just past the pending step, found when it was materialized
    next_index: usize,
    /// Session time of the last correct note (or of the session start)
    last_correct: f64,
    started: bool,
    /// A new step was materialized from input since the last tick
    advanced: bool,
    finished: bool,
    completion_sent: bool,
}

impl MasteryPolicy {
    pub fn new(score: Arc<Score>, settings: &EngineSettings) -> Self {
        Self {
            score,
            stepper: Stepper::new(settings.chord_threshold),
            cursor: PlaybackCursor::new(PlaybackMode::MasteryHint),
            idle_duration: settings.mastery_idle,
            pending: None,
            next_index: 0,
            last_correct: 0.0,
            started: false,
            advanced: false,
            finished: false,
            completion_sent: false,
        }
    }

    /// Seconds since the last correct note at session time `now`
    pub fn idle_time(&self, now: f64) -> f64 {
        now - self.last_correct
    }

    /// Find the step at the cursor and make it pending
    fn materialize(&mut self, keyboard: &dyn Keyboard) {
        match self
            .stepper
            .next_step(&self.score, self.cursor.current_index, keyboard)
        {
            Some(step) => {
                debug!(
                    "Mastery step {:?} (notes {}..{})",
                    step.pitches, step.start_index, step.end_index
                );
                self.cursor.advance_to(step.start_index);
                self.next_index = step.end_index;
                self.pending = Some(PendingStep::new(step, MatchOrder::Unordered));
            }
            None => {
                self.pending = None;
                self.cursor.complete(self.score.len());
                self.finished = true;
            }
        }
    }

    fn activate_hints(&mut self, keyboard: &mut dyn Keyboard) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if !pending.activate_hints() {
            return;
        }
        info!("Mastery: showing hints for {:?}", pending.remaining());
        for &pitch in pending.remaining() {
            keyboard.highlight(pitch, VisualClass::Hint);
        }
    }
}

impl PlaybackPolicy for MasteryPolicy {
    fn mode(&self) -> PlaybackMode {
        PlaybackMode::MasteryHint
    }

    fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    fn tick(&mut self, now: f64, keyboard: &mut dyn Keyboard) -> Action {
        if !self.started {
            self.started = true;
            self.last_correct = now;
            self.materialize(&*keyboard);
            self.advanced = !self.finished;
        }

        if self.finished {
            if self.completion_sent {
                return Action::None;
            }
            self.completion_sent = true;
            return Action::Complete;
        }

        let idle = self.idle_time(now) >= self.idle_duration;
        if idle && !self.hint_active() {
            self.activate_hints(keyboard);
        }

        if std::mem::take(&mut self.advanced) {
            Action::AdvanceStep
        } else {
            Action::None
        }
    }

    fn on_key_down(&mut self, pitch: u8, now: f64, keyboard: &mut dyn Keyboard) -> KeyOutcome {
        let Some(pending) = self.pending.as_mut() else {
            return KeyOutcome::Ignored;
        };
        if !pending.try_satisfy(pitch) {
            trace!("Mastery: ignoring {} while expecting {:?}", pitch, pending.remaining());
            return KeyOutcome::Ignored;
        }

        self.last_correct = now;
        if pending.hint_active() {
            keyboard.unhighlight(pitch);
        }
        if !pending.is_satisfied() {
            return KeyOutcome::Matched;
        }

        self.pending = None;
        self.cursor.advance_to(self.next_index);
        self.materialize(&*keyboard);
        self.advanced = !self.finished;
        KeyOutcome::StepCompleted
    }

    fn pending(&self) -> Option<&PendingStep> {
        self.pending.as_ref()
    }
}
