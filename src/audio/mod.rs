// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio feedback for played keys.
//!
//! This module provides:
//! - The [`AudioSink`] collaborator trait the player sends notes to
//! - A sine-voice synth
//! - Audio output via cpal (feature `audio`)

#[cfg(feature = "audio")]
pub mod output;
pub mod synth;

#[cfg(feature = "audio")]
pub use output::{AudioConfig, AudioOutput};
pub use synth::{frequency, SineSynth};

#[cfg(feature = "audio")]
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Audio error types
#[derive(Debug, Clone, Error)]
pub enum AudioError {
    /// No audio device available
    #[error("no audio device available")]
    NoDevice,
    /// Failed to build or start the output stream
    #[error("audio stream failed: {0}")]
    StreamFailed(String),
}

/// Fire-and-forget note output
pub trait AudioSink {
    fn note_on(&mut self, pitch: u8);
    fn note_off(&mut self, pitch: u8);

    /// Release every sounding note
    fn all_notes_off(&mut self) {}
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn note_on(&mut self, _pitch: u8) {}
    fn note_off(&mut self, _pitch: u8) {}
}

/// Sine synth playing through the default output device
#[cfg(feature = "audio")]
pub struct AudioEngine {
    synth: Arc<Mutex<SineSynth>>,
    _output: AudioOutput,
}

#[cfg(feature = "audio")]
impl AudioEngine {
    /// Open the default device and start the synth
    pub fn start(config: AudioConfig) -> Result<Self, AudioError> {
        let synth = Arc::new(Mutex::new(SineSynth::new(config.sample_rate)));
        let render = Arc::clone(&synth);
        let output = AudioOutput::new(config, move |buffer, channels| {
            if let Ok(mut synth) = render.lock() {
                synth.render(buffer, channels);
            }
        })?;
        Ok(Self {
            synth,
            _output: output,
        })
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_volume(&self, volume: f32) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.set_gain(volume);
        }
    }
}

#[cfg(feature = "audio")]
impl AudioSink for AudioEngine {
    fn note_on(&mut self, pitch: u8) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.note_on(pitch);
        }
    }

    fn note_off(&mut self, pitch: u8) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.note_off(pitch);
        }
    }

    fn all_notes_off(&mut self) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.all_notes_off();
        }
    }
}
