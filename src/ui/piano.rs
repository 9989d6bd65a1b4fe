// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! On-screen piano widget.
//!
//! One column (or two, when the area is wide enough) per semitone. Black
//! keys fill the upper rows, white keys run the full height and the last
//! row labels every C.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Widget},
};

use crate::keyboard::{is_black_key, note_name, VirtualKeyboard, VisualClass};

/// Display color of a highlight
pub fn class_color(class: VisualClass) -> Color {
    match class {
        VisualClass::Upcoming => Color::Blue,
        VisualClass::Current => Color::Green,
        VisualClass::Next => Color::Yellow,
        VisualClass::Chord => Color::Cyan,
        VisualClass::Played => Color::Magenta,
        VisualClass::Hint => Color::Red,
    }
}

/// Style of a key given its highlight and held state
pub fn key_style(pitch: u8, class: Option<VisualClass>, pressed: bool) -> Style {
    let color = match class {
        Some(class) => class_color(class),
        None if is_black_key(pitch) => Color::DarkGray,
        None => Color::White,
    };
    let style = Style::default().bg(color);
    if pressed {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    }
}

/// Piano keyboard view of a [`VirtualKeyboard`]
pub struct PianoWidget<'a> {
    keyboard: &'a VirtualKeyboard,
    block: Option<Block<'a>>,
}

impl<'a> PianoWidget<'a> {
    pub fn new(keyboard: &'a VirtualKeyboard) -> Self {
        Self {
            keyboard,
            block: None,
        }
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for PianoWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };
        if area.width == 0 || area.height < 2 {
            return;
        }

        let range = self.keyboard.range();
        let col_width: u16 = if area.width >= range.count as u16 * 2 { 2 } else { 1 };
        let visible = (area.width / col_width).min(range.count as u16);

        let key_rows = area.height - 1;
        let black_rows = (key_rows / 2).max(1).min(key_rows);
        let label_y = area.y + key_rows;

        for (col, pitch) in range.pitches().take(visible as usize).enumerate() {
            let x = area.x + col as u16 * col_width;
            let style = key_style(
                pitch,
                self.keyboard.class_of(pitch),
                self.keyboard.is_pressed(pitch),
            );
            let fill = " ".repeat(col_width as usize);
            let black = is_black_key(pitch);

            for row in 0..key_rows {
                let y = area.y + row;
                if !black || row < black_rows {
                    buf.set_string(x, y, &fill, style);
                }
            }

            if pitch % 12 == 0 {
                let remaining = (area.right() - x) as usize;
                buf.set_stringn(
                    x,
                    label_y,
                    note_name(pitch),
                    remaining,
                    Style::default().fg(Color::DarkGray),
                );
            }
        }
    }
}
