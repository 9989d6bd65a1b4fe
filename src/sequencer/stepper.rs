// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Step grouping.
//!
//! A step is a chord: the notes whose onsets fall within a fixed threshold
//! of the step's first playable note. Steps are found one at a time from a
//! score position and never materialized as a full list, since which notes
//! are playable is decided by the keyboard at the moment of the lookup.

use tracing::debug;

use crate::keyboard::Keyboard;
use crate::score::Score;

use super::CHORD_TIME_THRESHOLD;

/// A group of notes played together
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Index of the first score note of the step
    pub start_index: usize,
    /// Index just past the last score note the step consumes
    pub end_index: usize,
    /// Onset of the step's first note in seconds
    pub start_time: f64,
    /// Playable pitches in score order, without duplicates
    pub pitches: Vec<u8>,
}

impl Step {
    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn contains(&self, pitch: u8) -> bool {
        self.pitches.contains(&pitch)
    }

    /// Number of score notes consumed, playable or not
    pub fn span(&self) -> usize {
        self.end_index - self.start_index
    }
}

/// Finds steps in a score
#[derive(Debug, Clone, Copy)]
pub struct Stepper {
    threshold: f64,
}

impl Stepper {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Find the next step at or after `from_index`.
    ///
    /// Returns `None` once no playable note remains. Grouping is measured
    /// from the step's first note only: a note within the threshold of an
    /// intermediate note, but not of the first, starts the next step.
    pub fn next_step(&self, score: &Score, from_index: usize, keyboard: &dyn Keyboard) -> Option<Step> {
        let notes = score.notes();
        let index = (from_index..notes.len()).find(|&i| keyboard.has_target(notes[i].pitch))?;

        // The start note always belongs to its own step, whatever the threshold
        let start_time = notes[index].start_time;
        let mut pitches = vec![notes[index].pitch];
        let mut end = index + 1;

        while end < notes.len() && notes[end].start_time - start_time < self.threshold {
            let pitch = notes[end].pitch;
            if keyboard.has_target(pitch) {
                if pitches.contains(&pitch) {
                    debug!("Collapsing duplicate pitch {} in step at index {}", pitch, index);
                } else {
                    pitches.push(pitch);
                }
            }
            end += 1;
        }

        Some(Step {
            start_index: index,
            end_index: end,
            start_time,
            pitches,
        })
    }

    /// Iterate over every step of a score from the beginning
    pub fn steps<'a>(&self, score: &'a Score, keyboard: &'a dyn Keyboard) -> Steps<'a> {
        Steps {
            stepper: *self,
            score,
            keyboard,
            position: 0,
        }
    }
}

impl Default for Stepper {
    fn default() -> Self {
        Self::new(CHORD_TIME_THRESHOLD)
    }
}

/// Iterator over the steps of a score
pub struct Steps<'a> {
    stepper: Stepper,
    score: &'a Score,
    keyboard: &'a dyn Keyboard,
    position: usize,
}

impl Iterator for Steps<'_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        let step = self.stepper.next_step(self.score, self.position, self.keyboard)?;
        self.position = step.end_index;
        Some(step)
    }
}
