// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session status widget.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Paragraph, Widget},
};

use crate::keyboard::note_name;
use crate::sequencer::SessionState;

use super::SessionView;

/// Indicator text and style for a session
pub fn state_label(view: &SessionView) -> (&'static str, Style) {
    if view.paused {
        return ("❚❚ PAUSED", Style::default().fg(Color::Yellow));
    }
    match view.state {
        SessionState::Playing => (
            "▶ PLAYING",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        SessionState::Finishing { .. } | SessionState::Finished => (
            "✔ COMPLETE",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        SessionState::Idle => ("■ IDLE", Style::default().fg(Color::DarkGray)),
    }
}

/// Status widget for displaying the session
pub struct StatusWidget<'a> {
    view: &'a SessionView,
    block: Option<Block<'a>>,
}

impl<'a> StatusWidget<'a> {
    pub fn new(view: &'a SessionView) -> Self {
        Self { view, block: None }
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for StatusWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(12), // State indicator
                Constraint::Length(2),  // Spacer
                Constraint::Length(10), // Mode
                Constraint::Length(2),  // Spacer
                Constraint::Length(20), // Expected notes
                Constraint::Length(2),  // Spacer
                Constraint::Min(0),     // Title
            ])
            .split(area);

        let (indicator, style) = state_label(self.view);
        Paragraph::new(indicator).style(style).render(chunks[0], buf);

        let mode = self.view.mode.map(|m| m.label()).unwrap_or("-");
        Paragraph::new(mode)
            .style(Style::default().fg(Color::Magenta))
            .render(chunks[2], buf);

        let (notes, notes_style) = if self.view.hint_active {
            (
                format!("Hint: {}", pitch_list(&self.view.expected)),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )
        } else {
            (
                pitch_list(&self.view.expected),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )
        };
        Paragraph::new(notes).style(notes_style).render(chunks[4], buf);

        let mut title = match (&self.view.title, self.view.song_id) {
            (Some(title), Some(id)) => format!("#{} {}", id, title),
            (Some(title), None) => title.clone(),
            _ => "No song loaded".to_string(),
        };
        if let Some(status) = self.view.completion.and_then(|c| c.status()) {
            title.push_str(&format!(" [{}]", status));
        }
        Paragraph::new(title)
            .style(Style::default().fg(Color::White))
            .render(chunks[6], buf);
    }
}

/// Space separated note names
fn pitch_list(pitches: &[u8]) -> String {
    pitches
        .iter()
        .map(|&p| note_name(p))
        .collect::<Vec<_>>()
        .join(" ")
}
