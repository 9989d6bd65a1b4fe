// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Terminal UI for the keystep tutor.
//!
//! Provides a ratatui-based terminal interface with a session status line,
//! the on-screen piano and a step progress gauge.

mod piano;
mod status;

pub use piano::{key_style, PianoWidget};
pub use status::{state_label, StatusWidget};

use std::collections::BTreeMap;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph},
    Frame, Terminal,
};
use tracing::debug;

use crate::control::{format_shortcut, ControlAction, KeyboardController, NoteKeymap};
use crate::keyboard::{Keyboard, VirtualKeyboard};
use crate::progress::CompletionRecord;
use crate::score::SongId;
use crate::sequencer::{PlaybackMode, Player, SessionState};

/// How long a note key counts as held without a release event
pub const NOTE_HOLD: Duration = Duration::from_millis(500);

/// How long a status message stays visible
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// UI-only state
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Help text visible
    pub show_help: bool,
    /// Status message
    pub status_message: Option<String>,
    /// Status message timestamp
    pub status_time: Option<Instant>,
    /// Letter keys to pitches
    pub keymap: NoteKeymap,
    /// Held note keys and when they lapse
    held: BTreeMap<u8, Instant>,
}

impl UiState {
    pub fn new(keymap: NoteKeymap) -> Self {
        Self {
            keymap,
            ..Default::default()
        }
    }

    /// Set a status message that will be displayed temporarily
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_time = Some(Instant::now());
    }

    /// Clear expired status message
    pub fn clear_expired_status(&mut self) {
        if let Some(time) = self.status_time {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_time = None;
            }
        }
    }

    /// Mark a note key as held at `now`
    ///
    /// Returns true for a fresh press; key repeats only extend the hold.
    pub fn hold(&mut self, pitch: u8, now: Instant) -> bool {
        self.held.insert(pitch, now + NOTE_HOLD).is_none()
    }

    /// Release a held note key; returns false if it was not held
    pub fn release(&mut self, pitch: u8) -> bool {
        self.held.remove(&pitch).is_some()
    }

    /// Release every hold that lapsed by `now`
    pub fn release_expired(&mut self, now: Instant) -> Vec<u8> {
        let expired: Vec<u8> = self
            .held
            .iter()
            .filter(|(_, until)| **until <= now)
            .map(|(pitch, _)| *pitch)
            .collect();
        for pitch in &expired {
            self.held.remove(pitch);
        }
        expired
    }

    /// Release every held note key
    pub fn release_all(&mut self) -> Vec<u8> {
        let held: Vec<u8> = self.held.keys().copied().collect();
        self.held.clear();
        held
    }

    pub fn is_held(&self, pitch: u8) -> bool {
        self.held.contains_key(&pitch)
    }
}

/// Snapshot of a player for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub title: Option<String>,
    pub song_id: Option<SongId>,
    pub mode: Option<PlaybackMode>,
    pub state: SessionState,
    pub paused: bool,
    /// Score notes consumed so far
    pub position: usize,
    /// Score notes in total
    pub total: usize,
    /// Pitches the current step expects or sounds
    pub expected: Vec<u8>,
    pub hint_active: bool,
    pub completion: Option<CompletionRecord>,
}

impl SessionView {
    pub fn capture<K: Keyboard>(player: &Player<K>) -> Self {
        let score = player.score();
        let total = score.map(|s| s.len()).unwrap_or(0);
        let position = match player.cursor() {
            Some(cursor) => cursor.current_index,
            None if player.completion().is_some() => total,
            None => 0,
        };
        Self {
            title: score.map(|s| s.title().to_string()),
            song_id: player.song_id(),
            mode: player.mode().or(player.completion().map(|c| c.mode)),
            state: player.state(),
            paused: player.is_paused(),
            position,
            total,
            expected: player.pending_pitches(),
            hint_active: player.hint_active(),
            completion: player.completion(),
        }
    }

    /// Fraction of the score consumed, 0.0 to 1.0
    pub fn progress_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.position.min(self.total) as f64 / self.total as f64
        }
    }
}

/// Key event result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    /// No action needed
    None,
    /// A note key was pressed
    Note(u8),
    /// A shortcut was pressed
    Control(ControlAction),
}

/// Resolve a terminal key to a shortcut or a note
///
/// Shortcuts win over note keys. Shift is ignored for character keys so
/// symbols such as `?` match on every keyboard layout.
pub fn map_key(
    controller: &KeyboardController,
    keymap: &NoteKeymap,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> KeyAction {
    if let Some(action) = controller.get_action(code, modifiers) {
        return KeyAction::Control(*action);
    }

    let KeyCode::Char(c) = code else {
        return KeyAction::None;
    };
    if modifiers != KeyModifiers::SHIFT {
        if !modifiers.is_empty() {
            return KeyAction::None;
        }
    } else if let Some(action) = controller.get_action(code, KeyModifiers::NONE) {
        return KeyAction::Control(*action);
    }

    match keymap.pitch_for(c) {
        Some(pitch) => KeyAction::Note(pitch),
        None => KeyAction::None,
    }
}

/// Terminal UI application
pub struct App {
    state: UiState,
    controller: KeyboardController,
    /// Terminal handle
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Target frame rate
    frame_rate: u32,
    /// Whether to continue running
    running: bool,
    /// Whether the terminal reports key releases
    release_events: bool,
}

impl App {
    /// Take over the terminal
    pub fn new(frame_rate: u32, keymap: NoteKeymap) -> io::Result<Self> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let release_events = supports_keyboard_enhancement().unwrap_or(false);
        if release_events {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        debug!("Key release events: {}", release_events);

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            state: UiState::new(keymap),
            controller: KeyboardController::with_defaults(),
            terminal,
            frame_rate: frame_rate.clamp(1, 120),
            running: true,
            release_events,
        })
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut UiState {
        &mut self.state
    }

    /// Set frame rate
    pub fn set_frame_rate(&mut self, fps: u32) {
        self.frame_rate = fps.clamp(1, 120);
    }

    /// Check if running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop the app
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Whether note keys get real release events
    pub fn has_release_events(&self) -> bool {
        self.release_events
    }

    /// Handle a key event
    ///
    /// UI actions (help, octave, quit) are applied here; session actions and
    /// notes are returned for the caller.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> KeyAction {
        let action = map_key(&self.controller, &self.state.keymap, code, modifiers);
        if let KeyAction::Control(control) = action {
            match control {
                ControlAction::Quit => self.quit(),
                ControlAction::ToggleHelp => self.state.show_help = !self.state.show_help,
                ControlAction::OctaveDown | ControlAction::OctaveUp => {
                    let delta = if control == ControlAction::OctaveDown { -1 } else { 1 };
                    self.state.keymap.shift_octave(delta);
                    let octave = self.state.keymap.base_octave();
                    self.state.set_status(format!("Note keys start at C{}", octave));
                }
                ControlAction::TogglePause | ControlAction::Stop | ControlAction::Restart(_) => {}
            }
        }
        action
    }

    /// Pitch of a note key without applying any shortcut
    pub fn note_for(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<u8> {
        match map_key(&self.controller, &self.state.keymap, code, modifiers) {
            KeyAction::Note(pitch) => Some(pitch),
            _ => None,
        }
    }

    /// Poll for events with timeout
    pub fn poll_event(&self) -> io::Result<Option<Event>> {
        let timeout = Duration::from_millis(1000 / self.frame_rate as u64);
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }

    /// Draw the UI
    pub fn draw(&mut self, keyboard: &VirtualKeyboard, view: &SessionView) -> io::Result<()> {
        self.state.clear_expired_status();
        let state = &self.state;
        let controller = &self.controller;

        self.terminal.draw(|frame| {
            let area = frame.area();

            // Main layout: session, keyboard, progress, status bar
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3), // Session
                    Constraint::Min(5),    // Keyboard
                    Constraint::Length(1), // Progress
                    Constraint::Length(1), // Status bar
                ])
                .split(area);

            frame.render_widget(
                StatusWidget::new(view).block(Block::default().borders(Borders::ALL).title(" Session ")),
                chunks[0],
            );

            frame.render_widget(
                PianoWidget::new(keyboard).block(Block::default().borders(Borders::ALL).title(" Keyboard ")),
                chunks[1],
            );

            render_progress(frame, chunks[2], view);
            render_status_bar(frame, chunks[3], state);

            // Help overlay
            if state.show_help {
                render_help_overlay(frame, area, controller);
            }
        })?;

        Ok(())
    }

    /// Cleanup terminal on drop
    fn cleanup(&mut self) -> io::Result<()> {
        if self.release_events {
            execute!(self.terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
        }
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Render the step progress gauge
fn render_progress(frame: &mut Frame, area: Rect, view: &SessionView) {
    let label = format!("{}/{} notes", view.position.min(view.total), view.total);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .ratio(view.progress_ratio())
        .label(label);
    frame.render_widget(gauge, area);
}

/// Render status bar
fn render_status_bar(frame: &mut Frame, area: Rect, state: &UiState) {
    let text = if let Some(ref msg) = state.status_message {
        Span::styled(msg.as_str(), Style::default().fg(Color::Yellow))
    } else {
        Span::styled(
            format!(
                " a-k: Notes (C{}) | Space: Pause | Esc: Stop | 1-3: Mode | z/x: Octave | ?: Help | q: Quit",
                state.keymap.base_octave()
            ),
            Style::default().fg(Color::DarkGray),
        )
    };

    frame.render_widget(Paragraph::new(text), area);
}

/// Help lines built from the shortcut table
fn help_lines(controller: &KeyboardController) -> Vec<Line<'static>> {
    let grouped = controller.bindings_by_category();
    let mut lines = Vec::new();

    for category in ["Session", "Keyboard", "UI"] {
        let Some(bindings) = grouped.get(category) else {
            continue;
        };
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            category.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for binding in bindings {
            lines.push(Line::from(format!(
                "  {:<11} {}",
                format_shortcut(&binding.shortcut),
                binding.description
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Notes",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    let keys: String = NoteKeymap::keys().iter().collect();
    lines.push(Line::from(format!("  {:<11} C to C, one octave", keys)));
    lines
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, area: Rect, controller: &KeyboardController) {
    let help_text = help_lines(controller);

    // Calculate centered area
    let width = 50.min(area.width.saturating_sub(4));
    let height = (help_text.len() as u16 + 2).min(area.height.saturating_sub(4));
    let x = (area.width - width) / 2;
    let y = (area.height - height) / 2;
    let help_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);
    frame.render_widget(Paragraph::new(help_text), inner);
}
