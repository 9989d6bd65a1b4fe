// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Guided ("easy") playback.
//!
//! Each step waits for its notes to be played one by one in score order.
//! The note to play next is shown distinctly from the rest of the chord;
//! presses of any other key are ignored.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::keyboard::{Keyboard, VisualClass};
use crate::score::Score;

use super::{
    Action, EngineSettings, KeyOutcome, MatchOrder, PendingStep, PlaybackCursor, PlaybackMode,
    PlaybackPolicy, Stepper,
};

/// Guided mode state
#[derive(Debug, Clone, PartialEq)]
pub enum GuidedState {
    /// No step materialized yet
    AwaitingStep,
    /// A step is shown and not yet fully played
    AwaitingInput(PendingStep),
    /// The score has been played through
    Completed,
}

/// Input-gated, ordered playback policy
pub struct GuidedPolicy {
    score: Arc<Score>,
    stepper: Stepper,
    cursor: PlaybackCursor,
    state: GuidedState,
}

impl GuidedPolicy {
    pub fn new(score: Arc<Score>, settings: &EngineSettings) -> Self {
        Self {
            score,
            stepper: Stepper::new(settings.chord_threshold),
            cursor: PlaybackCursor::new(PlaybackMode::GuidedStep),
            state: GuidedState::AwaitingStep,
        }
    }

    pub fn state(&self) -> &GuidedState {
        &self.state
    }
}

/// Show the head of `pitches` as next and the rest as chord notes
fn highlight_ordered(keyboard: &mut dyn Keyboard, pitches: &[u8]) {
    for (i, &pitch) in pitches.iter().enumerate() {
        let class = if i == 0 {
            VisualClass::Next
        } else {
            VisualClass::Chord
        };
        keyboard.highlight(pitch, class);
    }
}

impl PlaybackPolicy for GuidedPolicy {
    fn mode(&self) -> PlaybackMode {
        PlaybackMode::GuidedStep
    }

    fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    fn tick(&mut self, _now: f64, keyboard: &mut dyn Keyboard) -> Action {
        if self.state != GuidedState::AwaitingStep {
            return Action::None;
        }

        match self
            .stepper
            .next_step(&self.score, self.cursor.current_index, &*keyboard)
        {
            Some(step) => {
                debug!(
                    "Guided step {:?} (notes {}..{})",
                    step.pitches, step.start_index, step.end_index
                );
                self.cursor.advance_to(step.start_index);
                keyboard.reset_all_highlights();
                highlight_ordered(keyboard, &step.pitches);
                self.state = GuidedState::AwaitingInput(PendingStep::new(step, MatchOrder::Ordered));
                Action::AdvanceStep
            }
            None => {
                self.cursor.complete(self.score.len());
                self.state = GuidedState::Completed;
                Action::Complete
            }
        }
    }

    fn on_key_down(&mut self, pitch: u8, _now: f64, keyboard: &mut dyn Keyboard) -> KeyOutcome {
        let GuidedState::AwaitingInput(pending) = &mut self.state else {
            return KeyOutcome::Ignored;
        };

        if !pending.try_satisfy(pitch) {
            trace!("Guided: ignoring {} while expecting {:?}", pitch, pending.head());
            return KeyOutcome::Ignored;
        }
        keyboard.highlight(pitch, VisualClass::Played);

        if pending.is_satisfied() {
            let end = pending.step().end_index;
            self.cursor.advance_to(end);
            self.state = GuidedState::AwaitingStep;
            KeyOutcome::StepCompleted
        } else {
            highlight_ordered(keyboard, pending.remaining());
            KeyOutcome::Matched
        }
    }

    fn pending(&self) -> Option<&PendingStep> {
        match &self.state {
            GuidedState::AwaitingInput(pending) => Some(pending),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::{KeyRange, VirtualKeyboard};

    fn setup(onsets: &[(u8, f64)]) -> (GuidedPolicy, VirtualKeyboard) {
        let score = Arc::new(Score::from_onsets(onsets, 0.5).unwrap());
        (
            GuidedPolicy::new(score, &EngineSettings::default()),
            VirtualKeyboard::new(KeyRange::default()),
        )
    }

    #[test]
    fn test_materializes_step_with_head_highlight() {
        let (mut policy, mut kb) = setup(&[(64, 0.0), (60, 0.01), (67, 0.02), (72, 1.0)]);
        assert_eq!(policy.tick(0.0, &mut kb), Action::AdvanceStep);

        assert_eq!(kb.class_of(64), Some(VisualClass::Next));
        assert_eq!(kb.class_of(60), Some(VisualClass::Chord));
        assert_eq!(kb.class_of(67), Some(VisualClass::Chord));
        assert_eq!(kb.class_of(72), None);
        assert_eq!(policy.pending().map(|p| p.remaining().to_vec()), Some(vec![64, 60, 67]));

        // Waiting for input: further ticks do nothing
        assert_eq!(policy.tick(1.0, &mut kb), Action::None);
    }

    #[test]
    fn test_ordered_completion() {
        let (mut policy, mut kb) = setup(&[(64, 0.0), (60, 0.0), (67, 0.0), (72, 1.0)]);
        policy.tick(0.0, &mut kb);

        assert_eq!(policy.on_key_down(60, 0.1, &mut kb), KeyOutcome::Ignored);
        assert_eq!(policy.on_key_down(64, 0.2, &mut kb), KeyOutcome::Matched);
        assert_eq!(kb.class_of(64), Some(VisualClass::Played));
        assert_eq!(kb.class_of(60), Some(VisualClass::Next));
        assert_eq!(kb.class_of(67), Some(VisualClass::Chord));

        assert_eq!(policy.on_key_down(64, 0.3, &mut kb), KeyOutcome::Ignored);
        assert_eq!(policy.on_key_down(60, 0.4, &mut kb), KeyOutcome::Matched);
        assert_eq!(kb.class_of(67), Some(VisualClass::Next));
        assert_eq!(policy.on_key_down(67, 0.5, &mut kb), KeyOutcome::StepCompleted);

        assert_eq!(policy.cursor().current_index, 3);
        assert_eq!(policy.state(), &GuidedState::AwaitingStep);

        assert_eq!(policy.tick(0.6, &mut kb), Action::AdvanceStep);
        assert_eq!(kb.class_of(72), Some(VisualClass::Next));
        assert_eq!(kb.class_of(64), None);
    }

    #[test]
    fn test_completes_after_last_step() {
        let (mut policy, mut kb) = setup(&[(60, 0.0)]);
        policy.tick(0.0, &mut kb);
        assert_eq!(policy.on_key_down(60, 0.1, &mut kb), KeyOutcome::StepCompleted);
        assert_eq!(policy.tick(0.2, &mut kb), Action::Complete);
        assert!(policy.cursor().completed);
        assert_eq!(policy.tick(0.3, &mut kb), Action::None);
        assert_eq!(policy.on_key_down(60, 0.4, &mut kb), KeyOutcome::Ignored);
    }

    #[test]
    fn test_input_before_first_tick_ignored() {
        let (mut policy, mut kb) = setup(&[(60, 0.0)]);
        assert_eq!(policy.on_key_down(60, 0.0, &mut kb), KeyOutcome::Ignored);
        assert_eq!(policy.cursor().current_index, 0);
    }

    #[test]
    fn test_skips_unplayable_notes() {
        let (mut policy, mut kb) = setup(&[(10, 0.0), (60, 1.0), (100, 1.01), (62, 2.0)]);
        policy.tick(0.0, &mut kb);
        assert_eq!(policy.cursor().current_index, 1);
        assert_eq!(policy.on_key_down(60, 0.1, &mut kb), KeyOutcome::StepCompleted);
        assert_eq!(policy.cursor().current_index, 3);
        policy.tick(0.2, &mut kb);
        assert_eq!(policy.pending().map(|p| p.remaining().to_vec()), Some(vec![62]));
    }
}
