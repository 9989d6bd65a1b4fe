// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI keyboard input.
//!
//! This module parses raw MIDI bytes into note messages and, with the
//! `midi` feature, connects to a hardware port through midir.

#[cfg(feature = "midi")]
pub mod input;

#[cfg(feature = "midi")]
pub use input::{list_sources, print_sources, MidiKeyInput};

use crate::sequencer::KeyEvent;

/// Parsed MIDI message types
#[derive(Debug, Clone, PartialEq)]
pub enum MidiMessage {
    /// Note On: channel (0-15), note (0-127), velocity (1-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },
    /// Control Change: channel (0-15), controller (0-127), value (0-127)
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Anything else
    Other(Vec<u8>),
}

impl MidiMessage {
    /// Parse raw MIDI bytes into a MidiMessage
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&status, rest) = data.split_first()?;
        let channel = status & 0x0F;

        match (status & 0xF0, rest) {
            (messages::NOTE_OFF, &[note, velocity, ..]) => Some(MidiMessage::NoteOff {
                channel,
                note: note & 0x7F,
                velocity: velocity & 0x7F,
            }),
            // Note On with velocity 0 is equivalent to Note Off
            (messages::NOTE_ON, &[note, velocity, ..]) if velocity & 0x7F == 0 => {
                Some(MidiMessage::NoteOff {
                    channel,
                    note: note & 0x7F,
                    velocity: 0,
                })
            }
            (messages::NOTE_ON, &[note, velocity, ..]) => Some(MidiMessage::NoteOn {
                channel,
                note: note & 0x7F,
                velocity: velocity & 0x7F,
            }),
            (messages::CONTROL_CHANGE, &[controller, value, ..]) => {
                Some(MidiMessage::ControlChange {
                    channel,
                    controller: controller & 0x7F,
                    value: value & 0x7F,
                })
            }
            _ => Some(MidiMessage::Other(data.to_vec())),
        }
    }

    /// Key transition carried by this message, if any
    pub fn key_event(&self) -> Option<KeyEvent> {
        match *self {
            MidiMessage::NoteOn { note, .. } => Some(KeyEvent::Down(note)),
            MidiMessage::NoteOff { note, .. } => Some(KeyEvent::Up(note)),
            // Sustain pedal and the rest are not tracked
            _ => None,
        }
    }
}

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROL_CHANGE: u8 = 0xB0;
}
