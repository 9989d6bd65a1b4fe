// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for keystep
//!
//! These tests drive whole sessions through the public API and check what
//! the keyboard, audio and progress collaborators observe.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;

use tempfile::tempdir;

use keystep::audio::AudioSink;
use keystep::config::TutorConfig;
use keystep::keyboard::{KeyRange, Keyboard, VirtualKeyboard, VisualClass};
use keystep::progress::{CompletionStatus, ProgressStore};
use keystep::score::{Score, ScoreError, ScoreLibrary, ScoreSource, SongId};
use keystep::sequencer::{
    Action, EngineSettings, InputReconciler, KeyOutcome, PlaybackMode, Player, SessionState,
    Stepper,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Highlight(u8, VisualClass),
    Unhighlight(u8),
    ResetAll,
}

/// Keyboard double that logs every call
struct RecordingKeyboard {
    range: KeyRange,
    calls: Vec<Call>,
    shown: HashMap<u8, VisualClass>,
}

impl RecordingKeyboard {
    fn new(range: KeyRange) -> Self {
        Self {
            range,
            calls: Vec::new(),
            shown: HashMap::new(),
        }
    }

    fn full() -> Self {
        Self::new(KeyRange::new(0, 128))
    }

    fn highlights_of(&self, class: VisualClass) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Highlight(pitch, c) if *c == class => Some(*pitch),
                _ => None,
            })
            .collect()
    }

    fn shown(&self, pitch: u8) -> Option<VisualClass> {
        self.shown.get(&pitch).copied()
    }

    fn clear_log(&mut self) {
        self.calls.clear();
    }
}

impl Keyboard for RecordingKeyboard {
    fn has_target(&self, pitch: u8) -> bool {
        self.range.contains(pitch)
    }

    fn highlight(&mut self, pitch: u8, class: VisualClass) {
        self.calls.push(Call::Highlight(pitch, class));
        self.shown.insert(pitch, class);
    }

    fn unhighlight(&mut self, pitch: u8) {
        self.calls.push(Call::Unhighlight(pitch));
        self.shown.remove(&pitch);
    }

    fn reset_all_highlights(&mut self) {
        self.calls.push(Call::ResetAll);
        self.shown.clear();
    }
}

/// Audio double that logs note events
#[derive(Clone, Default)]
struct RecordingAudio(Rc<RefCell<Vec<String>>>);

impl AudioSink for RecordingAudio {
    fn note_on(&mut self, pitch: u8) {
        self.0.borrow_mut().push(format!("on {}", pitch));
    }

    fn note_off(&mut self, pitch: u8) {
        self.0.borrow_mut().push(format!("off {}", pitch));
    }
}

fn score(onsets: &[(u8, f64)]) -> Arc<Score> {
    Arc::new(Score::from_onsets(onsets, 0.5).unwrap())
}

fn player(keyboard: RecordingKeyboard) -> Player<RecordingKeyboard> {
    Player::new(keyboard, EngineSettings::default())
}

#[test]
fn test_grouping_measured_from_first_note() {
    let score = score(&[(60, 0.00), (62, 0.02), (64, 0.06)]);
    let keyboard = RecordingKeyboard::full();
    let stepper = Stepper::new(0.05);

    let steps: Vec<Vec<u8>> = stepper
        .steps(&score, &keyboard)
        .map(|step| step.pitches)
        .collect();
    assert_eq!(steps, vec![vec![60, 62], vec![64]]);
}

#[test]
fn test_grouping_is_deterministic() {
    let score = score(&[(60, 0.0), (64, 0.01), (60, 0.03), (67, 0.5), (72, 0.52)]);
    let keyboard = RecordingKeyboard::full();
    let stepper = Stepper::default();

    for index in 0..score.len() {
        assert_eq!(
            stepper.next_step(&score, index, &keyboard),
            stepper.next_step(&score, index, &keyboard)
        );
    }
    // Repeated pitch in one step collapses to its first occurrence
    let first = stepper.next_step(&score, 0, &keyboard).unwrap();
    assert_eq!(first.pitches, vec![60, 64]);
    assert_eq!(first.end_index, 3);
}

#[test]
fn test_guided_ordering() {
    // Same onset, encounter order 64, 60, 67
    let mut player = player(RecordingKeyboard::full());
    player.start(
        score(&[(64, 0.0), (60, 0.0), (67, 0.0)]),
        SongId(1),
        PlaybackMode::GuidedStep,
        0.0,
    );
    assert_eq!(player.tick(0.0), Action::AdvanceStep);
    assert_eq!(player.keyboard().shown(64), Some(VisualClass::Next));
    assert_eq!(player.keyboard().shown(60), Some(VisualClass::Chord));
    assert_eq!(player.keyboard().shown(67), Some(VisualClass::Chord));

    assert_eq!(player.on_key_down(60, 0.1), KeyOutcome::Ignored);
    assert_eq!(player.pending_pitches(), vec![64, 60, 67]);

    assert_eq!(player.on_key_down(64, 0.2), KeyOutcome::Matched);
    assert_eq!(player.keyboard().shown(64), Some(VisualClass::Played));
    assert_eq!(player.keyboard().shown(60), Some(VisualClass::Next));

    // A second 64 has no effect
    assert_eq!(player.on_key_down(64, 0.3), KeyOutcome::Ignored);
    assert_eq!(player.pending_pitches(), vec![60, 67]);

    assert_eq!(player.on_key_down(60, 0.4), KeyOutcome::Matched);
    assert_eq!(player.on_key_down(67, 0.5), KeyOutcome::StepCompleted);
    assert_eq!(player.cursor().unwrap().current_index, 3);

    assert_eq!(player.tick(0.6), Action::Complete);
    assert!(matches!(player.state(), SessionState::Finishing { .. }));
    player.tick(2.5);
    assert!(matches!(player.state(), SessionState::Finishing { .. }));
    player.tick(2.7);
    assert_eq!(player.state(), SessionState::Finished);
}

#[test]
fn test_mastery_unordered_match() {
    let mut player = player(RecordingKeyboard::full());
    player.start(
        score(&[(60, 0.0), (64, 0.0), (67, 0.0), (72, 1.0)]),
        SongId(2),
        PlaybackMode::MasteryHint,
        0.0,
    );
    player.tick(0.0);
    // No highlight until hints activate
    assert!(player.keyboard().highlights_of(VisualClass::Hint).is_empty());

    assert_eq!(player.on_key_down(67, 0.5), KeyOutcome::Matched);
    assert_eq!(player.on_key_down(62, 0.6), KeyOutcome::Ignored);
    assert_eq!(player.on_key_down(60, 0.7), KeyOutcome::Matched);
    assert_eq!(player.on_key_down(64, 0.8), KeyOutcome::StepCompleted);

    assert_eq!(player.cursor().unwrap().current_index, 3);
    assert_eq!(player.pending_pitches(), vec![72]);
}

#[test]
fn test_mastery_hints_fire_once() {
    let mut player = player(RecordingKeyboard::full());
    player.start(
        score(&[(60, 0.0), (64, 0.0), (67, 1.0)]),
        SongId(3),
        PlaybackMode::MasteryHint,
        0.0,
    );
    player.tick(0.0);
    player.tick(4.9);
    assert!(!player.hint_active());

    player.tick(5.0);
    assert!(player.hint_active());
    let mut hinted = player.keyboard().highlights_of(VisualClass::Hint);
    hinted.sort_unstable();
    assert_eq!(hinted, vec![60, 64]);

    player.tick(6.0);
    player.tick(30.0);
    assert_eq!(player.keyboard().highlights_of(VisualClass::Hint).len(), 2);

    // A correct press clears that hint and keeps the rest
    player.on_key_down(64, 31.0);
    assert_eq!(player.keyboard().shown(64), None);
    assert_eq!(player.keyboard().shown(60), Some(VisualClass::Hint));
    assert!(player.hint_active());

    // The next step starts without hints
    player.on_key_down(60, 31.5);
    assert!(!player.hint_active());
    assert_eq!(player.pending_pitches(), vec![67]);
}

#[test]
fn test_automatic_end_to_end() {
    let audio = RecordingAudio::default();
    let mut player = player(RecordingKeyboard::full()).with_audio(Box::new(audio.clone()));
    player.start(
        score(&[(60, 0.0), (62, 1.0), (64, 2.0)]),
        SongId(4),
        PlaybackMode::Automatic,
        0.0,
    );

    assert_eq!(player.tick(0.0), Action::AdvanceStep);
    assert_eq!(player.cursor().unwrap().current_index, 1);
    assert_eq!(player.tick(0.5), Action::None);
    assert_eq!(player.tick(1.0), Action::AdvanceStep);
    assert_eq!(player.cursor().unwrap().current_index, 2);
    assert_eq!(player.tick(2.0), Action::AdvanceStep);
    assert_eq!(player.cursor().unwrap().current_index, 3);

    assert_eq!(player.tick(2.1), Action::Complete);
    assert_eq!(player.state(), SessionState::Finished);
    assert_eq!(player.tick(2.2), Action::None);

    let log = audio.0.borrow();
    assert!(log.contains(&"on 60".to_string()));
    assert!(log.contains(&"off 60".to_string()));
    assert!(log.contains(&"on 64".to_string()));
}

#[test]
fn test_automatic_ignores_presses() {
    let mut player = player(RecordingKeyboard::full());
    player.start(score(&[(60, 0.0), (62, 1.0)]), SongId(5), PlaybackMode::Automatic, 0.0);
    player.tick(0.0);
    assert_eq!(player.on_key_down(62, 0.1), KeyOutcome::Ignored);
    assert_eq!(player.cursor().unwrap().current_index, 1);
}

#[test]
fn test_stop_then_restart_leaves_nothing_behind() {
    let mut player = player(RecordingKeyboard::full());
    player.start(score(&[(60, 0.0), (64, 0.0)]), SongId(6), PlaybackMode::GuidedStep, 0.0);
    player.tick(0.0);
    player.on_key_down(60, 0.1);
    assert!(!player.keyboard().shown.is_empty());

    player.stop();
    assert_eq!(player.state(), SessionState::Idle);
    assert!(player.keyboard().shown.is_empty());
    assert!(player.pending_pitches().is_empty());

    player.keyboard_mut().clear_log();
    player.start(score(&[(72, 0.0)]), SongId(7), PlaybackMode::Automatic, 10.0);
    player.tick(10.0);

    let keyboard = player.keyboard();
    assert!(keyboard.highlights_of(VisualClass::Next).is_empty());
    assert!(keyboard.highlights_of(VisualClass::Chord).is_empty());
    assert!(keyboard.highlights_of(VisualClass::Played).is_empty());
    assert_eq!(keyboard.shown(60), None);
    assert_eq!(keyboard.shown(64), None);
    assert_eq!(keyboard.shown(72), Some(VisualClass::Current));
    assert!(player.pending_pitches() == vec![72]);
}

#[test]
fn test_unplayable_pitch_is_skipped() {
    // Keys 48..=83 only
    let keyboard = RecordingKeyboard::new(KeyRange::octaves(48, 3));
    let score = score(&[(60, 0.0), (10, 0.01), (64, 0.02), (100, 1.0), (67, 2.0)]);

    let stepper = Stepper::default();
    let steps: Vec<_> = stepper.steps(&score, &keyboard).collect();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].pitches, vec![60, 64]);
    assert_eq!(steps[0].end_index, 3);
    assert_eq!(steps[1].pitches, vec![67]);

    let mut player = player(keyboard);
    player.start(score, SongId(8), PlaybackMode::GuidedStep, 0.0);
    player.tick(0.0);
    assert_eq!(player.on_key_down(10, 0.1), KeyOutcome::Ignored);
    assert_eq!(player.on_key_down(60, 0.2), KeyOutcome::Matched);
    assert_eq!(player.on_key_down(64, 0.3), KeyOutcome::StepCompleted);

    player.tick(0.4);
    assert_eq!(player.pending_pitches(), vec![67]);
}

#[test]
fn test_pause_keeps_hints_away() {
    let mut player = player(RecordingKeyboard::full());
    player.start(score(&[(60, 0.0)]), SongId(9), PlaybackMode::MasteryHint, 0.0);
    player.tick(0.0);

    assert!(player.pause(1.0));
    assert_eq!(player.tick(10.0), Action::None);
    assert_eq!(player.on_key_down(60, 12.0), KeyOutcome::Ignored);
    assert!(player.resume(20.0));

    // Four seconds of play so far
    player.tick(23.0);
    assert!(!player.hint_active());

    player.tick(24.0);
    assert!(player.hint_active());
}

#[test]
fn test_reconciler_applies_events_from_other_threads() {
    let reconciler = InputReconciler::new();
    let mut player = player(RecordingKeyboard::full());
    player.start(
        score(&[(64, 0.0), (60, 0.0), (67, 0.0), (72, 1.0)]),
        SongId(10),
        PlaybackMode::GuidedStep,
        0.0,
    );
    player.tick(0.0);

    let sender = reconciler.sender();
    let handle = thread::spawn(move || {
        for pitch in [60, 64, 60, 67] {
            sender.key_down(pitch);
            sender.key_up(pitch);
        }
    });
    handle.join().unwrap();

    let summary = reconciler.apply_pending(&mut player, 0.5);
    assert_eq!(summary.applied, 8);
    assert_eq!(summary.matched, 3);
    assert_eq!(summary.completed_steps, 1);

    player.tick(0.6);
    assert_eq!(player.pending_pitches(), vec![72]);
}

#[test]
fn test_progress_never_downgrades() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.yaml");
    let song = score(&[(60, 0.0)]);

    // Free completion first
    let store = ProgressStore::open(&path).unwrap();
    let mut player = player(RecordingKeyboard::full()).with_reporter(Box::new(store));
    player.start(Arc::clone(&song), SongId(11), PlaybackMode::MasteryHint, 0.0);
    player.tick(0.0);
    player.on_key_down(60, 0.5);
    assert_eq!(player.tick(0.6), Action::Complete);

    let entry = ProgressStore::open(&path).unwrap().entry(SongId(11)).cloned().unwrap();
    assert_eq!(entry.status, CompletionStatus::CompletedFree);
    assert_eq!(entry.play_count, 1);

    // A later guided completion keeps the free status
    let store = ProgressStore::open(&path).unwrap();
    let mut player = player_with(store);
    player.start(Arc::clone(&song), SongId(11), PlaybackMode::GuidedStep, 0.0);
    player.tick(0.0);
    player.on_key_down(60, 0.5);
    assert_eq!(player.tick(0.6), Action::Complete);

    let entry = ProgressStore::open(&path).unwrap().entry(SongId(11)).cloned().unwrap();
    assert_eq!(entry.status, CompletionStatus::CompletedFree);
    assert_eq!(entry.play_count, 1);
}

fn player_with(store: ProgressStore) -> Player<RecordingKeyboard> {
    player(RecordingKeyboard::full()).with_reporter(Box::new(store))
}

#[test]
fn test_guided_completion_upgraded_by_free() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.yaml");
    let song = score(&[(60, 0.0)]);

    for mode in [PlaybackMode::GuidedStep, PlaybackMode::MasteryHint] {
        let mut player = player_with(ProgressStore::open(&path).unwrap());
        player.start(Arc::clone(&song), SongId(12), mode, 0.0);
        player.tick(0.0);
        player.on_key_down(60, 0.5);
        player.tick(0.6);
    }

    let entry = ProgressStore::open(&path).unwrap().entry(SongId(12)).cloned().unwrap();
    assert_eq!(entry.status, CompletionStatus::CompletedFree);
    assert_eq!(entry.play_count, 2);
}

#[test]
fn test_score_library_loading() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("song_3.yaml"),
        r#"
title: "Two Beats"
tempo: 120
time_unit: beats
notes:
  - { pitch: 64, start: 1, duration: 1 }
  - { pitch: 60, start: 0, duration: 1 }
"#,
    )
    .unwrap();
    fs::write(dir.path().join("song_4.yaml"), "notes: [ { pitch: sixty } ]").unwrap();

    let library = ScoreLibrary::new(dir.path());
    let score = library.load(SongId(3)).unwrap();
    assert_eq!(score.title(), "Two Beats");
    assert_eq!(score[0].pitch, 60);
    assert_eq!(score[1].start_time, 0.5);
    assert_eq!(score[1].duration, 0.5);

    assert!(matches!(library.load(SongId(99)), Err(ScoreError::NotFound(_))));
    assert!(matches!(library.load(SongId(4)), Err(ScoreError::Parse(_))));

    let ids: Vec<SongId> = library.list().unwrap().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![SongId(3), SongId(4)]);
}

#[test]
fn test_start_from_library() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("song_1.yaml"),
        "title: One\nnotes:\n  - { pitch: 60, start: 0.0 }\n",
    )
    .unwrap();
    let library = ScoreLibrary::new(dir.path());

    let mut player = Player::new(
        VirtualKeyboard::new(KeyRange::default()),
        EngineSettings::default(),
    );
    player
        .start_from(&library, SongId(1), PlaybackMode::GuidedStep, 0.0)
        .unwrap();
    player.tick(0.0);
    assert_eq!(player.keyboard().class_of(60), Some(VisualClass::Next));

    // A failed load still stops the running session
    let err = player
        .start_from(&library, SongId(2), PlaybackMode::GuidedStep, 1.0)
        .unwrap_err();
    assert!(matches!(err, ScoreError::NotFound(_)));
    assert_eq!(player.state(), SessionState::Idle);
    assert_eq!(player.keyboard().highlighted_count(), 0);
}

#[test]
fn test_config_drives_engine() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keystep.toml");
    assert_eq!(
        TutorConfig::load_or_default(&path).unwrap(),
        TutorConfig::default()
    );

    fs::write(&path, "[playback]\nmastery_idle = 1.0\n").unwrap();
    let config = TutorConfig::load(&path).unwrap();
    assert_eq!(config.playback.chord_threshold, 0.05);

    let mut player = Player::new(RecordingKeyboard::full(), config.engine_settings());
    player.start(score(&[(60, 0.0)]), SongId(1), PlaybackMode::MasteryHint, 0.0);
    player.tick(0.0);
    player.tick(1.0);
    assert!(player.hint_active());
}

#[test]
fn test_zero_chord_threshold_still_plays_every_note() {
    let config = TutorConfig::from_toml("[playback]\nchord_threshold = 0.0\n").unwrap();
    let mut player = Player::new(RecordingKeyboard::full(), config.engine_settings());
    player.start(
        score(&[(60, 0.0), (62, 1.0), (64, 2.0)]),
        SongId(1),
        PlaybackMode::GuidedStep,
        0.0,
    );
    assert_eq!(player.tick(0.0), Action::AdvanceStep);
    assert_eq!(player.state(), SessionState::Playing);
    assert!(player.completion().is_none());
    assert_eq!(player.pending_pitches(), vec![60]);

    // A zero threshold passed straight to the engine splits chords but keeps every note
    let settings = EngineSettings {
        chord_threshold: 0.0,
        ..EngineSettings::default()
    };
    let mut player = Player::new(RecordingKeyboard::full(), settings);
    player.start(score(&[(60, 0.0), (64, 0.0)]), SongId(1), PlaybackMode::GuidedStep, 0.0);
    assert_eq!(player.tick(0.0), Action::AdvanceStep);
    assert_eq!(player.pending_pitches(), vec![60]);
    assert_eq!(player.on_key_down(60, 0.1), KeyOutcome::StepCompleted);
    assert_eq!(player.tick(0.2), Action::AdvanceStep);
    assert_eq!(player.pending_pitches(), vec![64]);
    assert_eq!(player.on_key_down(64, 0.3), KeyOutcome::StepCompleted);
    assert_eq!(player.tick(0.4), Action::Complete);
}

#[test]
fn test_midi_song_library() {
    use midly::num::{u15, u24, u28, u4, u7};
    use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

    let midi = |delta: u32, key: u8, vel: u8| TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
        },
    };
    let meta = |delta: u32, message: MetaMessage<'static>| TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(message),
    };
    // C-E chord, then G two beats later after a switch to 60 BPM at beat 1
    let track = vec![
        meta(0, MetaMessage::Tempo(u24::new(500_000))),
        midi(0, 60, 80),
        midi(0, 64, 80),
        midi(96, 60, 0),
        midi(0, 64, 0),
        meta(0, MetaMessage::Tempo(u24::new(1_000_000))),
        midi(96, 67, 80),
        midi(96, 67, 0),
        meta(0, MetaMessage::EndOfTrack),
    ];
    let smf = Smf {
        header: Header::new(Format::SingleTrack, Timing::Metrical(u15::new(96))),
        tracks: vec![track],
    };

    let dir = tempdir().unwrap();
    smf.save(dir.path().join("song_8.mid")).unwrap();
    fs::write(dir.path().join("song_9.mid"), b"MThd").unwrap();
    let library = ScoreLibrary::new(dir.path());

    let loaded = library.load(SongId(8)).unwrap();
    let onsets: Vec<(u8, f64)> = loaded.notes().iter().map(|n| (n.pitch, n.start_time)).collect();
    assert_eq!(onsets, vec![(60, 0.0), (64, 0.0), (67, 1.5)]);
    assert!(matches!(library.load(SongId(9)), Err(ScoreError::Parse(_))));

    let mut player = player(RecordingKeyboard::full());
    player
        .start_from(&library, SongId(8), PlaybackMode::MasteryHint, 0.0)
        .unwrap();
    player.tick(0.0);
    assert_eq!(player.pending_pitches(), vec![60, 64]);
}
