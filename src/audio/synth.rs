// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sine-voice monitor synth.
//!
//! One sine voice per held key. Released voices fade out linearly so
//! note-offs do not click.

use std::f32::consts::TAU;

/// Frequency of a MIDI note in Hz (A4 = 69 = 440 Hz)
pub fn frequency(pitch: u8) -> f32 {
    440.0 * 2f32.powf((pitch as f32 - 69.0) / 12.0)
}

/// Seconds a released voice takes to fade out
const RELEASE_TIME: f32 = 0.08;

#[derive(Debug, Clone)]
struct Voice {
    pitch: u8,
    phase: f32,
    step: f32,
    level: f32,
    releasing: bool,
}

/// Polyphonic sine synth rendering into interleaved f32 buffers
#[derive(Debug, Clone)]
pub struct SineSynth {
    sample_rate: u32,
    gain: f32,
    voices: Vec<Voice>,
}

impl SineSynth {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            gain: 0.2,
            voices: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Set the per-voice gain (0.0 - 1.0)
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Start a voice for `pitch`, restarting it if already sounding
    pub fn note_on(&mut self, pitch: u8) {
        self.voices.retain(|v| v.pitch != pitch);
        self.voices.push(Voice {
            pitch,
            phase: 0.0,
            step: TAU * frequency(pitch) / self.sample_rate as f32,
            level: 1.0,
            releasing: false,
        });
    }

    /// Release the voice for `pitch`
    pub fn note_off(&mut self, pitch: u8) {
        for voice in self.voices.iter_mut().filter(|v| v.pitch == pitch) {
            voice.releasing = true;
        }
    }

    /// Silence every voice immediately
    pub fn all_notes_off(&mut self) {
        self.voices.clear();
    }

    /// Number of voices still producing sound
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Pitches currently held (not releasing)
    pub fn held_pitches(&self) -> Vec<u8> {
        self.voices
            .iter()
            .filter(|v| !v.releasing)
            .map(|v| v.pitch)
            .collect()
    }

    /// Mix all voices into `buffer` (interleaved, `channels` wide)
    pub fn render(&mut self, buffer: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let release_step = 1.0 / (RELEASE_TIME * self.sample_rate as f32);

        for frame in buffer.chunks_mut(channels) {
            let mut sample = 0.0;
            for voice in &mut self.voices {
                if voice.releasing {
                    voice.level = (voice.level - release_step).max(0.0);
                }
                sample += voice.phase.sin() * voice.level * self.gain;
                voice.phase = (voice.phase + voice.step) % TAU;
            }
            for out in frame.iter_mut() {
                *out += sample;
            }
        }

        self.voices.retain(|v| v.level > 0.0);
    }
}

impl Default for SineSynth {
    fn default() -> Self {
        Self::new(44100)
    }
}
