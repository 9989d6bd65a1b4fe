// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Step awaiting completion by the player.

use super::stepper::Step;

/// How the pitches of a pending step must be played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOrder {
    /// Only the first remaining pitch is accepted
    Ordered,
    /// Any remaining pitch is accepted
    Unordered,
}

/// A step waiting for input
#[derive(Debug, Clone, PartialEq)]
pub struct PendingStep {
    step: Step,
    order: MatchOrder,
    remaining: Vec<u8>,
    satisfied: Vec<u8>,
    hint_active: bool,
}

impl PendingStep {
    pub fn new(step: Step, order: MatchOrder) -> Self {
        let remaining = step.pitches.clone();
        Self {
            step,
            order,
            remaining,
            satisfied: Vec::new(),
            hint_active: false,
        }
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn order(&self) -> MatchOrder {
        self.order
    }

    /// Pitches still expected, in score order
    pub fn remaining(&self) -> &[u8] {
        &self.remaining
    }

    /// Pitches already played, in the order they were played
    pub fn satisfied(&self) -> &[u8] {
        &self.satisfied
    }

    /// Next pitch an ordered step expects
    pub fn head(&self) -> Option<u8> {
        self.remaining.first().copied()
    }

    pub fn is_satisfied(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Accept `pitch` if the step expects it now; returns whether it matched
    pub fn try_satisfy(&mut self, pitch: u8) -> bool {
        let position = match self.order {
            MatchOrder::Ordered => (self.head() == Some(pitch)).then_some(0),
            MatchOrder::Unordered => self.remaining.iter().position(|&p| p == pitch),
        };

        match position {
            Some(i) => {
                self.remaining.remove(i);
                self.satisfied.push(pitch);
                true
            }
            None => false,
        }
    }

    pub fn hint_active(&self) -> bool {
        self.hint_active
    }

    /// Switch hints on; returns false if they already were
    pub fn activate_hints(&mut self) -> bool {
        !std::mem::replace(&mut self.hint_active, true)
    }
}
