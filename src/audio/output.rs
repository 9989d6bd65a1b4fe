// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio output via cpal.
//!
//! Opens the default output device and drives a render callback from the
//! device's audio thread.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use tracing::{error, info};

use super::AudioError;

/// Audio output configuration
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Buffer size in frames
    pub buffer_size: u32,
    /// Number of output channels
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 512,
            channels: 2,
        }
    }
}

impl AudioConfig {
    /// Buffer latency in milliseconds
    pub fn latency_ms(&self) -> f64 {
        (self.buffer_size as f64 / self.sample_rate as f64) * 1000.0
    }
}

/// Running output stream; audio stops when this is dropped
pub struct AudioOutput {
    _stream: Stream,
    config: AudioConfig,
}

impl AudioOutput {
    /// Open the default device and start rendering through `callback`
    pub fn new<F>(config: AudioConfig, mut callback: F) -> Result<Self, AudioError>
    where
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };
        let channels = config.channels as usize;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    data.fill(0.0);
                    callback(data, channels);
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::StreamFailed(format!("failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamFailed(format!("failed to start stream: {}", e)))?;

        info!(
            "Audio output started: {} Hz, {} frames ({:.1} ms)",
            config.sample_rate,
            config.buffer_size,
            config.latency_ms()
        );

        Ok(Self {
            _stream: stream,
            config,
        })
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }
}

/// Name of the default output device, if any
pub fn default_device_name() -> Option<String> {
    cpal::default_host()
        .default_output_device()
        .and_then(|d| d.name().ok())
}
