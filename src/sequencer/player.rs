// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback session.
//!
//! [`Player`] owns the collaborators (keyboard, audio, progress) and at most
//! one active policy. All times passed in are host seconds; the player maps
//! them through a [`SessionClock`] so pauses are invisible to the policy.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::audio::{AudioSink, NullAudio};
use crate::keyboard::Keyboard;
use crate::progress::{CompletionRecord, CompletionStatus, NullReporter, ProgressReporter};
use crate::score::{Score, ScoreError, ScoreSource, SongId};
use crate::timing::SessionClock;

use super::{create_policy, Action, EngineSettings, KeyOutcome, PlaybackCursor, PlaybackMode, PlaybackPolicy};

/// Lifecycle of the current session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    /// No session
    Idle,
    /// A policy is running
    Playing,
    /// Completed; teardown happens at session time `until`
    Finishing { until: f64 },
    /// Completed and torn down
    Finished,
}

/// A playback session and its collaborators
pub struct Player<K: Keyboard> {
    keyboard: K,
    audio: Box<dyn AudioSink>,
    reporter: Box<dyn ProgressReporter>,
    settings: EngineSettings,
    policy: Option<Box<dyn PlaybackPolicy>>,
    score: Option<Arc<Score>>,
    song_id: Option<SongId>,
    state: SessionState,
    clock: SessionClock,
    completion: Option<CompletionRecord>,
    /// Pitches sounded by automatic playback
    sounding: Vec<u8>,
}

impl<K: Keyboard> Player<K> {
    /// Create an idle player with silent audio and no progress reporting
    pub fn new(keyboard: K, settings: EngineSettings) -> Self {
        Self {
            keyboard,
            audio: Box::new(NullAudio),
            reporter: Box::new(NullReporter),
            settings,
            policy: None,
            score: None,
            song_id: None,
            state: SessionState::Idle,
            clock: SessionClock::default(),
            completion: None,
            sounding: Vec::new(),
        }
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Start a session, replacing any running one
    pub fn start(&mut self, score: Arc<Score>, song_id: SongId, mode: PlaybackMode, now: f64) {
        self.stop();
        info!(
            "Starting song {} ({:?}, {} notes) in {} mode",
            song_id,
            score.title(),
            score.len(),
            mode
        );
        self.policy = Some(create_policy(mode, Arc::clone(&score), &self.settings));
        self.score = Some(score);
        self.song_id = Some(song_id);
        self.clock = SessionClock::new(now);
        self.completion = None;
        self.state = SessionState::Playing;
    }

    /// Load `song_id` from `source` and start it
    ///
    /// The running session is stopped even if loading fails.
    pub fn start_from(
        &mut self,
        source: &dyn ScoreSource,
        song_id: SongId,
        mode: PlaybackMode,
        now: f64,
    ) -> Result<(), ScoreError> {
        self.stop();
        let score = source.load(song_id).map_err(|e| {
            error!("Failed to load song {}: {}", song_id, e);
            e
        })?;
        self.start(Arc::new(score), song_id, mode, now);
        Ok(())
    }

    /// Tear down the session; safe to call at any time
    pub fn stop(&mut self) {
        if self.policy.take().is_some() {
            info!("Stopping session");
        }
        self.keyboard.reset_all_highlights();
        self.audio.all_notes_off();
        self.sounding.clear();
        self.clock = SessionClock::default();
        self.state = SessionState::Idle;
    }

    /// Advance the session by one frame at host time `now`
    pub fn tick(&mut self, now: f64) -> Action {
        if self.clock.is_paused() {
            return Action::None;
        }
        let session_now = self.clock.session_time(now);

        match self.state {
            SessionState::Playing => {}
            SessionState::Finishing { until } => {
                if session_now >= until {
                    self.finish();
                }
                return Action::None;
            }
            SessionState::Idle | SessionState::Finished => return Action::None,
        }

        let Some(policy) = self.policy.as_mut() else {
            return Action::None;
        };
        let action = policy.tick(session_now, &mut self.keyboard);

        match action {
            Action::AdvanceStep if policy.mode() == PlaybackMode::Automatic => {
                let pitches = policy.current_pitches();
                self.sound_step(pitches);
            }
            Action::Complete => self.complete(session_now),
            _ => {}
        }
        action
    }

    /// Apply a key press at host time `now`
    ///
    /// The note is always sounded; it only reaches the policy when a session
    /// is playing, not paused, the key exists and the mode takes input.
    pub fn on_key_down(&mut self, pitch: u8, now: f64) -> KeyOutcome {
        self.audio.note_on(pitch);
        self.keyboard.set_pressed(pitch, true);

        if self.state != SessionState::Playing || self.clock.is_paused() {
            return KeyOutcome::Ignored;
        }
        if !self.keyboard.has_target(pitch) {
            return KeyOutcome::Ignored;
        }
        let session_now = self.clock.session_time(now);
        match self.policy.as_mut() {
            Some(policy) if policy.accepts_input() => {
                policy.on_key_down(pitch, session_now, &mut self.keyboard)
            }
            _ => KeyOutcome::Ignored,
        }
    }

    pub fn on_key_up(&mut self, pitch: u8) {
        self.audio.note_off(pitch);
        self.keyboard.set_pressed(pitch, false);
    }

    /// Freeze the session; returns false if nothing was paused
    pub fn pause(&mut self, now: f64) -> bool {
        if !matches!(self.state, SessionState::Playing | SessionState::Finishing { .. }) {
            return false;
        }
        if !self.clock.pause(now) {
            return false;
        }
        self.audio.all_notes_off();
        self.sounding.clear();
        info!("Paused");
        true
    }

    /// Continue a paused session; returns false if it was not paused
    pub fn resume(&mut self, now: f64) -> bool {
        let resumed = self.clock.resume(now);
        if resumed {
            info!("Resumed after {:.1}s", self.clock.paused_duration(now));
        }
        resumed
    }

    /// Pause if running, resume if paused
    pub fn toggle_pause(&mut self, now: f64) -> bool {
        if self.clock.is_paused() {
            self.resume(now)
        } else {
            self.pause(now)
        }
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> Option<PlaybackMode> {
        self.policy.as_ref().map(|p| p.mode())
    }

    pub fn cursor(&self) -> Option<PlaybackCursor> {
        self.policy.as_ref().map(|p| *p.cursor())
    }

    pub fn hint_active(&self) -> bool {
        self.policy.as_ref().is_some_and(|p| p.hint_active())
    }

    /// Pitches the current step still expects (or sounds, in automatic mode)
    pub fn pending_pitches(&self) -> Vec<u8> {
        self.policy
            .as_ref()
            .map(|p| p.current_pitches())
            .unwrap_or_default()
    }

    /// Completion of the last session, if it reached the end
    pub fn completion(&self) -> Option<CompletionRecord> {
        self.completion
    }

    pub fn score(&self) -> Option<&Arc<Score>> {
        self.score.as_ref()
    }

    pub fn song_id(&self) -> Option<SongId> {
        self.song_id
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Change settings; applies from the next session
    pub fn set_settings(&mut self, settings: EngineSettings) {
        self.settings = settings;
    }

    /// Session time at host time `now`
    pub fn session_time(&self, now: f64) -> f64 {
        self.clock.session_time(now)
    }

    pub fn keyboard(&self) -> &K {
        &self.keyboard
    }

    pub fn keyboard_mut(&mut self) -> &mut K {
        &mut self.keyboard
    }

    fn sound_step(&mut self, pitches: Vec<u8>) {
        for &pitch in &self.sounding {
            if !pitches.contains(&pitch) {
                self.audio.note_off(pitch);
            }
        }
        for &pitch in &pitches {
            self.audio.note_on(pitch);
        }
        self.sounding = pitches;
    }

    fn complete(&mut self, session_now: f64) {
        let (Some(song_id), Some(mode)) = (self.song_id, self.mode()) else {
            return;
        };
        let record = CompletionRecord::new(song_id, mode);
        info!("Song {} completed in {} mode", song_id, mode);
        self.completion = Some(record);

        if let Some(status) = record.status() {
            self.report(song_id, status);
        }

        let grace = self.settings.grace_for(mode);
        if grace > 0.0 {
            self.state = SessionState::Finishing {
                until: session_now + grace,
            };
        } else {
            self.finish();
        }
    }

    fn report(&mut self, song_id: SongId, status: CompletionStatus) {
        match self.reporter.fetch_status(song_id) {
            Ok(existing) if !status.may_replace(existing) => {
                info!("Song {} already {:?}, not recording {}", song_id, existing, status);
                return;
            }
            Ok(_) => {}
            Err(e) => warn!("Status lookup for song {} failed, reporting anyway: {}", song_id, e),
        }
        if let Err(e) = self.reporter.report_completion(song_id, status) {
            error!("Failed to record {} for song {}: {}", status, song_id, e);
        }
    }

    fn finish(&mut self) {
        self.stop();
        self.state = SessionState::Finished;
    }
}
