// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Key event reconciliation.
//!
//! Key events may be produced on any thread (terminal, MIDI callback,
//! tests). They are queued through an [`InputSender`] and applied to the
//! player on the frame thread, between ticks, one event at a time.

use std::sync::mpsc::{self, Receiver, Sender};

use tracing::trace;

use crate::keyboard::Keyboard;

use super::{KeyOutcome, Player};

/// A physical key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Down(u8),
    Up(u8),
}

impl KeyEvent {
    pub fn pitch(&self) -> u8 {
        match *self {
            KeyEvent::Down(pitch) | KeyEvent::Up(pitch) => pitch,
        }
    }
}

/// Cloneable handle for queueing key events
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: Sender<KeyEvent>,
}

impl InputSender {
    /// Queue an event; returns false if the reconciler is gone
    pub fn send(&self, event: KeyEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn key_down(&self, pitch: u8) -> bool {
        self.send(KeyEvent::Down(pitch))
    }

    pub fn key_up(&self, pitch: u8) -> bool {
        self.send(KeyEvent::Up(pitch))
    }
}

/// Counts from one [`InputReconciler::apply_pending`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Events taken from the queue
    pub applied: usize,
    /// Presses that matched the pending step
    pub matched: usize,
    /// Presses that completed a step
    pub completed_steps: usize,
}

/// Queue of key events awaiting the frame thread
pub struct InputReconciler {
    tx: Sender<KeyEvent>,
    rx: Receiver<KeyEvent>,
}

impl InputReconciler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Handle for producers
    pub fn sender(&self) -> InputSender {
        InputSender {
            tx: self.tx.clone(),
        }
    }

    /// Apply a press immediately
    pub fn on_key_down<K: Keyboard>(&self, player: &mut Player<K>, pitch: u8, now: f64) -> KeyOutcome {
        let outcome = player.on_key_down(pitch, now);
        trace!("Key {} down: {:?}", pitch, outcome);
        outcome
    }

    /// Apply a release immediately
    pub fn on_key_up<K: Keyboard>(&self, player: &mut Player<K>, pitch: u8) {
        player.on_key_up(pitch);
    }

    /// Drain queued events into `player`, in arrival order
    pub fn apply_pending<K: Keyboard>(&self, player: &mut Player<K>, now: f64) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        while let Ok(event) = self.rx.try_recv() {
            summary.applied += 1;
            match event {
                KeyEvent::Down(pitch) => match self.on_key_down(player, pitch, now) {
                    KeyOutcome::Matched => summary.matched += 1,
                    KeyOutcome::StepCompleted => {
                        summary.matched += 1;
                        summary.completed_steps += 1;
                    }
                    KeyOutcome::Ignored => {}
                },
                KeyEvent::Up(pitch) => self.on_key_up(player, pitch),
            }
        }
        summary
    }
}

impl Default for InputReconciler {
    fn default() -> Self {
        Self::new()
    }
}
