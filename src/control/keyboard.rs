// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keyboard shortcut handling.
//!
//! Maps terminal key events to transport and session actions. Note keys
//! are handled separately by [`super::NoteKeymap`].

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyModifiers};

use crate::sequencer::PlaybackMode;

use super::ControlAction;

/// A keyboard shortcut definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    /// Key code
    pub code: KeyCode,
    /// Required modifiers
    pub modifiers: KeyModifiers,
}

impl Shortcut {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Create a shortcut with no modifiers
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Create a shortcut with Ctrl modifier
    pub fn ctrl(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::CONTROL)
    }

    /// Check if this shortcut matches a key event
    pub fn matches(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        self.code == code && self.modifiers == modifiers
    }
}

/// A keyboard binding (shortcut to action)
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub shortcut: Shortcut,
    pub action: ControlAction,
    /// Description for help display
    pub description: String,
    /// Category for grouping in help
    pub category: String,
}

impl KeyBinding {
    pub fn new(shortcut: Shortcut, action: ControlAction, description: impl Into<String>) -> Self {
        Self {
            shortcut,
            action,
            description: description.into(),
            category: "General".to_string(),
        }
    }

    /// Set the category
    pub fn category(mut self, cat: impl Into<String>) -> Self {
        self.category = cat.into();
        self
    }
}

/// Shortcut table
pub struct KeyboardController {
    bindings: HashMap<Shortcut, KeyBinding>,
}

impl KeyboardController {
    /// Create an empty keyboard controller
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Create a keyboard controller with default bindings
    pub fn with_defaults() -> Self {
        let mut controller = Self::new();
        controller.add_default_bindings();
        controller
    }

    fn add_default_bindings(&mut self) {
        // Session
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Char(' ')),
                ControlAction::TogglePause,
                "Pause/Resume",
            )
            .category("Session"),
        );
        self.add(
            KeyBinding::new(Shortcut::key(KeyCode::Esc), ControlAction::Stop, "Stop")
                .category("Session"),
        );

        let modes = [
            ('1', PlaybackMode::Automatic),
            ('2', PlaybackMode::GuidedStep),
            ('3', PlaybackMode::MasteryHint),
        ];
        for (c, mode) in modes {
            self.add(
                KeyBinding::new(
                    Shortcut::key(KeyCode::Char(c)),
                    ControlAction::Restart(mode),
                    format!("Restart in {} mode", mode),
                )
                .category("Session"),
            );
        }

        // Keyboard
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Char('z')),
                ControlAction::OctaveDown,
                "Octave down",
            )
            .category("Keyboard"),
        );
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Char('x')),
                ControlAction::OctaveUp,
                "Octave up",
            )
            .category("Keyboard"),
        );

        // UI
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Char('?')),
                ControlAction::ToggleHelp,
                "Toggle Help",
            )
            .category("UI"),
        );
        self.add(
            KeyBinding::new(Shortcut::key(KeyCode::Char('q')), ControlAction::Quit, "Quit")
                .category("UI"),
        );
        self.add(
            KeyBinding::new(Shortcut::ctrl(KeyCode::Char('c')), ControlAction::Quit, "Quit")
                .category("UI"),
        );
    }

    /// Add a key binding
    pub fn add(&mut self, binding: KeyBinding) {
        self.bindings.insert(binding.shortcut.clone(), binding);
    }

    /// Remove a key binding
    pub fn remove(&mut self, shortcut: &Shortcut) -> Option<KeyBinding> {
        self.bindings.remove(shortcut)
    }

    /// Get action for a key event
    pub fn get_action(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<&ControlAction> {
        self.bindings
            .get(&Shortcut::new(code, modifiers))
            .map(|b| &b.action)
    }

    /// Get bindings grouped by category, each sorted by description
    pub fn bindings_by_category(&self) -> HashMap<String, Vec<&KeyBinding>> {
        let mut grouped: HashMap<String, Vec<&KeyBinding>> = HashMap::new();
        for binding in self.bindings.values() {
            grouped
                .entry(binding.category.clone())
                .or_default()
                .push(binding);
        }
        for bindings in grouped.values_mut() {
            bindings.sort_by(|a, b| a.description.cmp(&b.description));
        }
        grouped
    }
}

impl Default for KeyboardController {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Format a shortcut for display
pub fn format_shortcut(shortcut: &Shortcut) -> String {
    let mut parts = Vec::new();

    if shortcut.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("Ctrl".to_string());
    }
    if shortcut.modifiers.contains(KeyModifiers::ALT) {
        parts.push("Alt".to_string());
    }
    if shortcut.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("Shift".to_string());
    }

    let key = match shortcut.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        _ => "?".to_string(),
    };

    parts.push(key);
    parts.join("+")
}
