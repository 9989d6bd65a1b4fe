// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keyboard surface abstraction.
//!
//! The playback engine never draws anything itself. It asks a [`Keyboard`]
//! whether a note has a key and tells it how each key should be shown.

pub mod virtual_keys;

pub use virtual_keys::VirtualKeyboard;

/// Visual state requested for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualClass {
    /// Note coming up soon (automatic lookahead)
    Upcoming,
    /// Note sounding now (automatic playback)
    Current,
    /// Next note to press in a guided step
    Next,
    /// Other notes of the guided step
    Chord,
    /// Note of the step already pressed
    Played,
    /// Remaining note revealed after mastery idle timeout
    Hint,
}

/// Trait for keyboard surfaces driven by the playback engine.
///
/// Implementations must tolerate any call for a pitch they have no key for.
pub trait Keyboard {
    /// Whether a key exists for the pitch
    fn has_target(&self, pitch: u8) -> bool;

    /// Show the key for `pitch` in the given state
    fn highlight(&mut self, pitch: u8, class: VisualClass);

    /// Return the key for `pitch` to its idle look
    fn unhighlight(&mut self, pitch: u8);

    /// Return every key to its idle look
    fn reset_all_highlights(&mut self);

    /// Show whether the key for `pitch` is held down
    fn set_pressed(&mut self, _pitch: u8, _pressed: bool) {}
}

/// Contiguous range of playable keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    /// Lowest playable note
    pub lowest: u8,
    /// Number of keys
    pub count: u8,
}

impl KeyRange {
    pub fn new(lowest: u8, count: u8) -> Self {
        Self { lowest, count }
    }

    /// Range of whole octaves starting at `lowest`
    pub fn octaves(lowest: u8, octaves: u8) -> Self {
        let max_keys = 128u16.saturating_sub(lowest as u16);
        let count = (octaves as u16 * 12).min(max_keys) as u8;
        Self { lowest, count }
    }

    /// Highest playable note, if the range is non-empty
    pub fn highest(&self) -> Option<u8> {
        if self.count == 0 {
            None
        } else {
            Some(self.lowest + (self.count - 1))
        }
    }

    pub fn contains(&self, pitch: u8) -> bool {
        pitch >= self.lowest && (pitch as u16) < self.lowest as u16 + self.count as u16
    }

    /// Iterate over all pitches in the range
    pub fn pitches(&self) -> impl Iterator<Item = u8> {
        let lowest = self.lowest as u16;
        (lowest..lowest + self.count as u16).map(|p| p as u8)
    }
}

impl Default for KeyRange {
    /// Five octaves from C1, the default on-screen keyboard
    fn default() -> Self {
        Self::octaves(24, 5)
    }
}

/// Whether a pitch is a black key
pub fn is_black_key(pitch: u8) -> bool {
    matches!(pitch % 12, 1 | 3 | 6 | 8 | 10)
}

/// Convert MIDI note number to name
pub fn note_name(note: u8) -> String {
    const NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    let octave = (note / 12) as i8 - 1;
    let name = NAMES[(note % 12) as usize];
    format!("{}{}", name, octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_range() {
        let range = KeyRange::default();
        assert_eq!(range.lowest, 24);
        assert_eq!(range.count, 60);
        assert_eq!(range.highest(), Some(83));
        assert!(range.contains(24));
        assert!(range.contains(83));
        assert!(!range.contains(23));
        assert!(!range.contains(84));
    }

    #[test]
    fn test_range_clamped_to_midi() {
        let range = KeyRange::octaves(120, 2);
        assert_eq!(range.count, 8);
        assert_eq!(range.highest(), Some(127));
        assert!(range.contains(127));
        assert_eq!(range.pitches().count(), 8);
    }

    #[test]
    fn test_empty_range() {
        let range = KeyRange::new(60, 0);
        assert_eq!(range.highest(), None);
        assert!(!range.contains(60));
    }

    #[test]
    fn test_note_names() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(61), "C#4");
        assert_eq!(note_name(21), "A0");
        assert!(is_black_key(61));
        assert!(!is_black_key(64));
    }
}
