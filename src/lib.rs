// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! keystep - step-by-step piano tutor.
//!
//! Replays note scores in three modes: automatic playback, guided ("easy")
//! step-by-step practice and mastery practice with idle hints.

pub mod audio;
pub mod config;
pub mod control;
pub mod keyboard;
pub mod midi;
pub mod progress;
pub mod score;
pub mod sequencer;
pub mod timing;
pub mod ui;
