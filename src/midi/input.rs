// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI input through midir.
//!
//! Incoming note messages are turned into key events and queued on an
//! [`InputSender`]; nothing else happens on the MIDI thread.

use anyhow::{anyhow, Context, Result};
use midir::{Ignore, MidiInput, MidiInputConnection};
use tracing::{info, trace, warn};

use crate::sequencer::InputSender;

use super::MidiMessage;

const CLIENT_NAME: &str = "keystep";

/// Live connection to a MIDI input port
pub struct MidiKeyInput {
    _connection: MidiInputConnection<()>,
    port_name: String,
}

impl MidiKeyInput {
    /// Connect to source `index` and forward its notes to `sender`
    pub fn connect(index: usize, sender: InputSender) -> Result<Self> {
        let mut midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI client")?;
        midi_in.ignore(Ignore::All);

        let ports = midi_in.ports();
        let port = ports
            .get(index)
            .ok_or_else(|| anyhow!("MIDI source {} not found ({} available)", index, ports.len()))?;
        let port_name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| format!("Source {}", index));

        let connection = midi_in
            .connect(
                port,
                "keystep-input",
                move |_stamp, data, _| {
                    let Some(event) = MidiMessage::parse(data).and_then(|m| m.key_event()) else {
                        return;
                    };
                    trace!("MIDI {:?}", event);
                    if !sender.send(event) {
                        warn!("Dropping MIDI event {:?}: input queue closed", event);
                    }
                },
                (),
            )
            .map_err(|e| anyhow!("Failed to connect to MIDI source {}: {}", index, e))?;

        info!("Connected to MIDI source {}: {}", index, port_name);
        Ok(Self {
            _connection: connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// Names of the available MIDI sources, by index
pub fn list_sources() -> Result<Vec<String>> {
    let midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI client")?;
    Ok(midi_in
        .ports()
        .iter()
        .enumerate()
        .map(|(i, port)| {
            midi_in
                .port_name(port)
                .unwrap_or_else(|_| format!("Source {}", i))
        })
        .collect())
}

/// Print the available MIDI sources
pub fn print_sources() -> Result<()> {
    let sources = list_sources()?;
    if sources.is_empty() {
        println!("No MIDI sources found");
        return Ok(());
    }
    println!("MIDI sources:");
    for (i, name) in sources.iter().enumerate() {
        println!("  [{}] {}", i, name);
    }
    Ok(())
}
