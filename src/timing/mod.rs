// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! This module provides the pausable session clock that produces the `now`
//! passed to playback policies.

pub mod clock;

pub use clock::{ClockState, HostClock, SessionClock};
