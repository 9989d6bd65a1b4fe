// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Computer keyboard to piano key mapping.
//!
//! The home row plays white keys and the row above plays black keys,
//! covering one octave plus the next C from the base octave.

/// Note keys in semitone order from C
const NOTE_KEYS: [char; 13] = ['a', 'w', 's', 'e', 'd', 'f', 't', 'g', 'y', 'h', 'u', 'j', 'k'];

/// Lowest and highest selectable base octave
const MIN_OCTAVE: u8 = 0;
const MAX_OCTAVE: u8 = 8;

/// Maps note characters to MIDI pitches relative to a base octave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteKeymap {
    base_octave: u8,
}

impl NoteKeymap {
    /// Octave 4 puts `a` on middle C (60)
    pub fn new(base_octave: u8) -> Self {
        Self {
            base_octave: base_octave.clamp(MIN_OCTAVE, MAX_OCTAVE),
        }
    }

    pub fn base_octave(&self) -> u8 {
        self.base_octave
    }

    /// Pitch of the `a` key
    pub fn base_pitch(&self) -> u8 {
        (self.base_octave + 1) * 12
    }

    /// Pitch played by `c`, if it is a note key
    pub fn pitch_for(&self, c: char) -> Option<u8> {
        let offset = NOTE_KEYS
            .iter()
            .position(|&k| k == c.to_ascii_lowercase())?;
        let pitch = self.base_pitch() as usize + offset;
        u8::try_from(pitch).ok().filter(|&p| p <= 127)
    }

    /// Move the base octave by `delta`, staying in range
    pub fn shift_octave(&mut self, delta: i8) {
        let octave = (self.base_octave as i16 + delta as i16)
            .clamp(MIN_OCTAVE as i16, MAX_OCTAVE as i16);
        self.base_octave = octave as u8;
    }

    /// Note key characters, lowest pitch first
    pub fn keys() -> &'static [char] {
        &NOTE_KEYS
    }
}

impl Default for NoteKeymap {
    fn default() -> Self {
        Self::new(4)
    }
}
