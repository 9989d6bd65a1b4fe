// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! In-memory keyboard surface.
//!
//! Stores the requested visual state of every key plus which keys are
//! currently held. The terminal UI renders from this state.

use std::collections::{BTreeSet, HashMap};

use super::{Keyboard, KeyRange, VisualClass};

/// Keyboard surface backed by plain state
#[derive(Debug, Clone, Default)]
pub struct VirtualKeyboard {
    range: KeyRange,
    highlights: HashMap<u8, VisualClass>,
    pressed: BTreeSet<u8>,
}

impl VirtualKeyboard {
    pub fn new(range: KeyRange) -> Self {
        Self {
            range,
            highlights: HashMap::new(),
            pressed: BTreeSet::new(),
        }
    }

    pub fn range(&self) -> KeyRange {
        self.range
    }

    /// Current visual state of a key
    pub fn class_of(&self, pitch: u8) -> Option<VisualClass> {
        self.highlights.get(&pitch).copied()
    }

    /// Number of highlighted keys
    pub fn highlighted_count(&self) -> usize {
        self.highlights.len()
    }

    /// Pitches currently shown in the given state, ascending
    pub fn pitches_in(&self, class: VisualClass) -> Vec<u8> {
        let mut pitches: Vec<u8> = self
            .highlights
            .iter()
            .filter(|(_, c)| **c == class)
            .map(|(p, _)| *p)
            .collect();
        pitches.sort_unstable();
        pitches
    }

    /// Mark a key as held down
    pub fn press(&mut self, pitch: u8) {
        if self.range.contains(pitch) {
            self.pressed.insert(pitch);
        }
    }

    /// Mark a key as released
    pub fn release(&mut self, pitch: u8) {
        self.pressed.remove(&pitch);
    }

    pub fn is_pressed(&self, pitch: u8) -> bool {
        self.pressed.contains(&pitch)
    }
}

impl Keyboard for VirtualKeyboard {
    fn has_target(&self, pitch: u8) -> bool {
        self.range.contains(pitch)
    }

    fn highlight(&mut self, pitch: u8, class: VisualClass) {
        if self.range.contains(pitch) {
            self.highlights.insert(pitch, class);
        }
    }

    fn unhighlight(&mut self, pitch: u8) {
        self.highlights.remove(&pitch);
    }

    fn reset_all_highlights(&mut self) {
        self.highlights.clear();
    }

    fn set_pressed(&mut self, pitch: u8, pressed: bool) {
        if pressed {
            self.press(pitch);
        } else {
            self.release(pitch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_and_reset() {
        let mut keyboard = VirtualKeyboard::new(KeyRange::default());
        keyboard.highlight(60, VisualClass::Next);
        keyboard.highlight(64, VisualClass::Chord);
        keyboard.highlight(67, VisualClass::Chord);

        assert_eq!(keyboard.class_of(60), Some(VisualClass::Next));
        assert_eq!(keyboard.pitches_in(VisualClass::Chord), vec![64, 67]);

        keyboard.highlight(60, VisualClass::Played);
        assert_eq!(keyboard.class_of(60), Some(VisualClass::Played));

        keyboard.unhighlight(64);
        assert_eq!(keyboard.class_of(64), None);

        keyboard.reset_all_highlights();
        assert_eq!(keyboard.highlighted_count(), 0);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut keyboard = VirtualKeyboard::new(KeyRange::octaves(48, 1));
        assert!(!keyboard.has_target(20));
        keyboard.highlight(20, VisualClass::Hint);
        keyboard.press(20);
        assert_eq!(keyboard.highlighted_count(), 0);
        assert!(!keyboard.is_pressed(20));
    }

    #[test]
    fn test_press_release() {
        let mut keyboard = VirtualKeyboard::new(KeyRange::default());
        keyboard.press(60);
        assert!(keyboard.is_pressed(60));
        keyboard.release(60);
        assert!(!keyboard.is_pressed(60));

        keyboard.set_pressed(62, true);
        assert!(keyboard.is_pressed(62));
        // Held state survives a highlight reset
        keyboard.reset_all_highlights();
        assert!(keyboard.is_pressed(62));
        keyboard.set_pressed(62, false);
        assert!(!keyboard.is_pressed(62));
    }
}
