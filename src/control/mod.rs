// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Control system for terminal keyboard input.
//!
//! This module provides:
//! - Shortcut handling for session and UI actions
//! - The note keymap turning letter keys into pitches

pub mod keyboard;
pub mod keymap;

pub use keyboard::{format_shortcut, KeyBinding, KeyboardController, Shortcut};
pub use keymap::NoteKeymap;

use crate::sequencer::PlaybackMode;

/// Action that can be triggered by a shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Pause or resume the session
    TogglePause,
    /// Stop the session
    Stop,
    /// Restart the current song in a mode
    Restart(PlaybackMode),
    /// Shift the note keys down an octave
    OctaveDown,
    /// Shift the note keys up an octave
    OctaveUp,
    /// Show or hide the help overlay
    ToggleHelp,
    /// Quit the application
    Quit,
}
