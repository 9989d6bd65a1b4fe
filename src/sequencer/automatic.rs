// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Automatic playback.
//!
//! Steps become current purely on elapsed time scaled by the speed
//! multiplier. Notes inside the lookahead window are shown as upcoming
//! before their step starts. Key presses are not consulted.

use std::sync::Arc;

use tracing::debug;

use crate::keyboard::{Keyboard, VisualClass};
use crate::score::Score;

use super::{Action, EngineSettings, PlaybackCursor, PlaybackMode, PlaybackPolicy, Step, Stepper};

/// Time-driven playback policy
pub struct AutomaticPolicy {
    score: Arc<Score>,
    stepper: Stepper,
    cursor: PlaybackCursor,
    speed: f64,
    lookahead: f64,
    /// Session time of the first tick
    started_at: Option<f64>,
    /// First note not yet shown as upcoming
    lookahead_index: usize,
    /// Next step to become current, found once and kept until due
    next: Option<Step>,
    /// Pitches of the step currently sounding
    current: Vec<u8>,
    finished: bool,
}

impl AutomaticPolicy {
    pub fn new(score: Arc<Score>, settings: &EngineSettings) -> Self {
        Self {
            score,
            stepper: Stepper::new(settings.chord_threshold),
            cursor: PlaybackCursor::new(PlaybackMode::Automatic),
            speed: settings.speed,
            lookahead: settings.lookahead,
            started_at: None,
            lookahead_index: 0,
            next: None,
            current: Vec::new(),
            finished: false,
        }
    }

    /// Position in the piece at session time `now`
    pub fn song_time(&self, now: f64) -> f64 {
        self.started_at
            .map(|start| (now - start) * self.speed)
            .unwrap_or(0.0)
    }

    fn show_upcoming(&mut self, song_time: f64, keyboard: &mut dyn Keyboard) {
        let horizon = song_time + self.lookahead / self.speed;
        let notes = self.score.notes();
        while self.lookahead_index < notes.len() && notes[self.lookahead_index].start_time <= horizon {
            let pitch = notes[self.lookahead_index].pitch;
            if keyboard.has_target(pitch) {
                keyboard.highlight(pitch, VisualClass::Upcoming);
            }
            self.lookahead_index += 1;
        }
    }

    /// Whether `pitch` is shown as upcoming for a note not yet played
    fn still_upcoming(&self, pitch: u8, from: usize) -> bool {
        let until = self.lookahead_index.max(from);
        self.score.notes()[from..until].iter().any(|n| n.pitch == pitch)
    }

    fn make_current(&mut self, step: Step, keyboard: &mut dyn Keyboard) {
        for &pitch in &self.current {
            if step.contains(pitch) {
                continue;
            }
            if self.still_upcoming(pitch, step.end_index) {
                keyboard.highlight(pitch, VisualClass::Upcoming);
            } else {
                keyboard.unhighlight(pitch);
            }
        }
        for &pitch in &step.pitches {
            keyboard.highlight(pitch, VisualClass::Current);
        }
        debug!(
            "Automatic step at {:.3}s: {:?} (notes {}..{})",
            step.start_time, step.pitches, step.start_index, step.end_index
        );
        self.cursor.advance_to(step.end_index);
        self.current = step.pitches;
    }
}

impl PlaybackPolicy for AutomaticPolicy {
    fn mode(&self) -> PlaybackMode {
        PlaybackMode::Automatic
    }

    fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    fn tick(&mut self, now: f64, keyboard: &mut dyn Keyboard) -> Action {
        if self.finished {
            return Action::None;
        }
        self.started_at.get_or_insert(now);
        let song_time = self.song_time(now);

        self.show_upcoming(song_time, keyboard);

        if self.next.is_none() {
            self.next = self
                .stepper
                .next_step(&self.score, self.cursor.current_index, &*keyboard);
        }

        match self.next.take() {
            None => {
                self.finished = true;
                self.cursor.complete(self.score.len());
                Action::Complete
            }
            Some(step) if song_time >= step.start_time => {
                self.make_current(step, keyboard);
                Action::AdvanceStep
            }
            Some(step) => {
                self.next = Some(step);
                Action::None
            }
        }
    }

    fn current_pitches(&self) -> Vec<u8> {
        self.current.clone()
    }
}
