// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI File scores.
//!
//! Notes are paired per channel and key from Note On / Note Off events
//! (Note On with velocity 0 is a Note Off). Tick positions are mapped to
//! seconds through the file's tempo map, merged across all tracks, so
//! tempo changes anywhere in the file shift every later note.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use tracing::{debug, warn};

use super::{Note, Score, ScoreError};

/// Tempo assumed until the first Set Tempo event (120 BPM)
pub const DEFAULT_TEMPO_US: u32 = 500_000;

/// Maps absolute ticks to seconds
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    /// Seconds per tick for timecode files, `None` for metrical ones
    fixed: Option<f64>,
    ticks_per_beat: f64,
    /// `(tick, seconds at tick, microseconds per beat)`, sorted by tick
    segments: Vec<(u64, f64, u32)>,
}

impl TempoMap {
    /// Tempo map for a metrical file with the given tempo changes
    pub fn metrical(ticks_per_beat: u16, mut changes: Vec<(u64, u32)>) -> Self {
        let ticks_per_beat = f64::from(ticks_per_beat.max(1));
        changes.sort_by_key(|&(tick, _)| tick);

        let mut segments = vec![(0, 0.0, DEFAULT_TEMPO_US)];
        for (tick, tempo) in changes {
            let Some(&(last_tick, last_secs, last_tempo)) = segments.last() else {
                continue;
            };
            let secs = last_secs + Self::span(tick - last_tick, last_tempo, ticks_per_beat);
            if tick == last_tick {
                // Later events at the same tick win
                segments.pop();
            }
            segments.push((tick, secs, tempo));
        }

        Self {
            fixed: None,
            ticks_per_beat,
            segments,
        }
    }

    /// Tempo map for an SMPTE timecode file
    pub fn timecode(frames_per_second: f32, ticks_per_frame: u8) -> Self {
        let ticks_per_second = f64::from(frames_per_second) * f64::from(ticks_per_frame.max(1));
        Self {
            fixed: Some(1.0 / ticks_per_second),
            ticks_per_beat: 1.0,
            segments: Vec::new(),
        }
    }

    fn span(ticks: u64, tempo: u32, ticks_per_beat: f64) -> f64 {
        ticks as f64 * f64::from(tempo) / 1_000_000.0 / ticks_per_beat
    }

    /// Seconds from the start of the file at `tick`
    pub fn seconds(&self, tick: u64) -> f64 {
        if let Some(per_tick) = self.fixed {
            return tick as f64 * per_tick;
        }
        let index = self.segments.partition_point(|&(start, _, _)| start <= tick);
        match index.checked_sub(1).and_then(|i| self.segments.get(i)) {
            Some(&(start, secs, tempo)) => {
                secs + Self::span(tick - start, tempo, self.ticks_per_beat)
            }
            None => Self::span(tick, DEFAULT_TEMPO_US, self.ticks_per_beat),
        }
    }
}

/// A note whose Note Off has not arrived yet
#[derive(Debug, Clone, Copy)]
struct OpenNote {
    pitch: u8,
    start_tick: u64,
    /// Position of the Note On in file order
    order: usize,
}

/// Parse a Standard MIDI File into a score
pub fn parse_smf(bytes: &[u8], fallback_title: &str) -> Result<Score, ScoreError> {
    let smf = Smf::parse(bytes).map_err(|e| ScoreError::Parse(format!("invalid MIDI file: {}", e)))?;

    let mut title: Option<String> = None;
    let mut tempo_changes = Vec::new();
    let mut spans: Vec<(OpenNote, u64)> = Vec::new();
    let mut next_order = 0;

    for (track_index, track) in smf.tracks.iter().enumerate() {
        let mut tick: u64 = 0;
        let mut open: HashMap<(u8, u8), Vec<OpenNote>> = HashMap::new();

        for event in track {
            tick += u64::from(event.delta.as_int());
            match event.kind {
                TrackEventKind::Midi { channel, message } => {
                    let channel = channel.as_int();
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            let pitch = key.as_int();
                            open.entry((channel, pitch)).or_default().push(OpenNote {
                                pitch,
                                start_tick: tick,
                                order: next_order,
                            });
                            next_order += 1;
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            let pitch = key.as_int();
                            // First in, first out for overlapping notes of one key
                            match open.get_mut(&(channel, pitch)) {
                                Some(stack) if !stack.is_empty() => {
                                    let note = stack.remove(0);
                                    spans.push((note, tick));
                                }
                                _ => debug!("Note Off without Note On for {} on track {}", pitch, track_index),
                            }
                        }
                        _ => {}
                    }
                }
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    let tempo = tempo.as_int();
                    if tempo > 0 {
                        tempo_changes.push((tick, tempo));
                    }
                }
                TrackEventKind::Meta(MetaMessage::TrackName(name)) if title.is_none() => {
                    let name = String::from_utf8_lossy(name).trim().to_string();
                    if !name.is_empty() {
                        title = Some(name);
                    }
                }
                _ => {}
            }
        }

        let dangling: usize = open.values().map(Vec::len).sum();
        if dangling > 0 {
            warn!("{} notes never released on track {}, ending them at track end", dangling, track_index);
            for note in open.into_values().flatten() {
                spans.push((note, tick));
            }
        }
    }

    let tempo_map = match smf.header.timing {
        Timing::Metrical(ticks) => TempoMap::metrical(ticks.as_int(), tempo_changes),
        Timing::Timecode(fps, subframes) => TempoMap::timecode(fps.as_f32(), subframes),
    };

    // Notes sharing an onset keep file order
    spans.sort_by_key(|(note, _)| (note.start_tick, note.order));
    let notes = spans
        .into_iter()
        .map(|(note, end)| {
            let start_time = tempo_map.seconds(note.start_tick);
            Note::new(note.pitch, start_time, tempo_map.seconds(end) - start_time)
        })
        .collect();

    Score::new(title.unwrap_or_else(|| fallback_title.to_string()), notes)
}

/// Read and parse a Standard MIDI File
pub fn load_smf<P: AsRef<Path>>(path: P) -> Result<Score, ScoreError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ScoreError::NotFound(path.display().to_string())
        } else {
            ScoreError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let fallback = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string());
    parse_smf(&bytes, &fallback)
}
