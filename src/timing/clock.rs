// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session clock.
//!
//! Playback policies only ever see a monotonically increasing `now` in
//! seconds. [`SessionClock`] turns host time into that session time and
//! subtracts every paused interval, so pausing neither advances automatic
//! playback nor counts toward the mastery idle timer.

use std::time::Instant;

/// Clock state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Running,
    Paused,
}

/// Pausable mapping from host seconds to session seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionClock {
    /// Host time at which the session started
    origin: f64,
    /// Host time at which the current pause began
    paused_at: Option<f64>,
    /// Sum of all completed pauses
    paused_total: f64,
}

impl SessionClock {
    /// Create a clock whose session time is zero at host time `host_now`
    pub fn new(host_now: f64) -> Self {
        Self {
            origin: host_now,
            paused_at: None,
            paused_total: 0.0,
        }
    }

    pub fn state(&self) -> ClockState {
        if self.paused_at.is_some() {
            ClockState::Paused
        } else {
            ClockState::Running
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Session time at host time `host_now`; frozen while paused
    pub fn session_time(&self, host_now: f64) -> f64 {
        let effective = self.paused_at.unwrap_or(host_now);
        (effective - self.origin - self.paused_total).max(0.0)
    }

    /// Freeze session time; returns false if already paused
    pub fn pause(&mut self, host_now: f64) -> bool {
        if self.paused_at.is_some() {
            return false;
        }
        self.paused_at = Some(host_now);
        true
    }

    /// Continue from where the pause froze; returns false if not paused
    pub fn resume(&mut self, host_now: f64) -> bool {
        match self.paused_at.take() {
            Some(at) => {
                self.paused_total += (host_now - at).max(0.0);
                true
            }
            None => false,
        }
    }

    /// Total time spent paused, including a pause in progress
    pub fn paused_duration(&self, host_now: f64) -> f64 {
        let current = self.paused_at.map(|at| (host_now - at).max(0.0)).unwrap_or(0.0);
        self.paused_total + current
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Host time source backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct HostClock {
    epoch: Instant,
}

impl HostClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Seconds since this clock was created
    pub fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}
