// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use crossterm::event::{Event, KeyEventKind};
use tracing::{info, warn, Level};

use keystep::config::{TutorConfig, DEFAULT_CONFIG_FILE};
use keystep::control::{ControlAction, NoteKeymap};
use keystep::keyboard::VirtualKeyboard;
use keystep::progress::ProgressStore;
use keystep::score::{load_score, parse_song_id, Score, ScoreLibrary, ScoreSource, SongId};
use keystep::sequencer::{Action, InputReconciler, InputSender, PlaybackMode, Player};
use keystep::timing::HostClock;
use keystep::ui::{App, KeyAction, SessionView};

fn print_usage() {
    println!("keystep - Step-by-step piano tutor");
    println!();
    println!("Usage: keystep [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --play <ID|PATH>        Play a song by library id, MIDI file or YAML score");
    println!("  --mode <MODE>           auto, easy or mastery (default easy)");
    println!("  --speed <X>             Automatic playback speed (default 1.0)");
    println!("  --list-songs            List songs in the library");
    println!("  --list-sources          List available MIDI sources (inputs)");
    println!("  --config <PATH>         Configuration file (default {})", DEFAULT_CONFIG_FILE);
    println!("  --verbose               Debug logging");
    println!("  --help                  Show this help message");
}

enum Command {
    Play(String),
    ListSongs,
    ListSources,
    Help,
}

struct Options {
    command: Command,
    mode: PlaybackMode,
    speed: Option<f64>,
    config: Option<PathBuf>,
    verbose: bool,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut command = None;
    let mut mode = PlaybackMode::GuidedStep;
    let mut speed = None;
    let mut config = None;
    let mut verbose = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow!("{} requires a value", flag))
        };
        match arg.as_str() {
            "--play" => command = Some(Command::Play(value("--play")?)),
            "--mode" => mode = value("--mode")?.parse().map_err(|e: String| anyhow!(e))?,
            "--speed" => {
                let raw = value("--speed")?;
                speed = Some(
                    raw.parse()
                        .map_err(|_| anyhow!("Invalid speed: {}", raw))?,
                );
            }
            "--config" => config = Some(PathBuf::from(value("--config")?)),
            "--list-songs" => command = Some(Command::ListSongs),
            "--list-sources" => command = Some(Command::ListSources),
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => command = Some(Command::Help),
            other => bail!("Unknown option: {}", other),
        }
    }

    let command = command.ok_or_else(|| anyhow!("Nothing to do"))?;
    Ok(Options {
        command,
        mode,
        speed,
        config,
        verbose,
    })
}

fn load_config(options: &Options) -> Result<TutorConfig> {
    let mut config = match &options.config {
        Some(path) => TutorConfig::load(path)?,
        None => TutorConfig::load_or_default(DEFAULT_CONFIG_FILE)?,
    };
    if let Some(speed) = options.speed {
        config.playback.speed = speed;
    }
    Ok(config)
}

fn init_logging(config: &TutorConfig, verbose: bool) -> Result<()> {
    let level = if verbose {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };
    let file = File::create(&config.paths.log_file)
        .with_context(|| format!("Failed to create log file: {:?}", config.paths.log_file))?;

    // The terminal UI owns stdout
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn list_songs(library: &ScoreLibrary) -> Result<()> {
    let songs = library
        .list()
        .with_context(|| format!("Failed to list songs in {:?}", library.root()))?;
    if songs.is_empty() {
        println!("No songs in {:?}", library.root());
        return Ok(());
    }
    println!("Songs in {:?}:", library.root());
    for song in songs {
        println!("  {:>4}  {}", song.id, song.title);
    }
    Ok(())
}

#[cfg(feature = "midi")]
fn list_sources() -> Result<()> {
    keystep::midi::print_sources()
}

#[cfg(not(feature = "midi"))]
fn list_sources() -> Result<()> {
    bail!("MIDI support not built; rebuild with --features midi")
}

/// Resolve `target` as a library id, else as a score file path
fn load_song(target: &str, library: &ScoreLibrary) -> Result<(Arc<Score>, SongId)> {
    if let Ok(id) = target.parse::<u32>() {
        let id = SongId(id);
        let score = library
            .load(id)
            .with_context(|| format!("Failed to load song {}", id))?;
        return Ok((Arc::new(score), id));
    }

    let path = Path::new(target);
    let score = load_score(path).with_context(|| format!("Failed to load score file {:?}", path))?;
    let id = parse_song_id(path).unwrap_or(SongId(0));
    Ok((Arc::new(score), id))
}

fn build_player(config: &TutorConfig) -> Player<VirtualKeyboard> {
    let keyboard = VirtualKeyboard::new(config.key_range());
    let mut player = Player::new(keyboard, config.engine_settings());

    match ProgressStore::open(&config.paths.progress_file) {
        Ok(store) => player = player.with_reporter(Box::new(store)),
        Err(e) => warn!("Progress will not be recorded: {}", e),
    }

    #[cfg(feature = "audio")]
    match keystep::audio::AudioEngine::start(keystep::audio::AudioConfig::default()) {
        Ok(engine) => {
            engine.set_volume(config.sound.volume);
            player = player.with_audio(Box::new(engine));
        }
        Err(e) => warn!("Audio disabled: {}", e),
    }

    player
}

/// Apply a session shortcut
fn apply_control(
    app: &mut App,
    player: &mut Player<VirtualKeyboard>,
    sender: &InputSender,
    action: ControlAction,
    now: f64,
) {
    match action {
        ControlAction::TogglePause => {
            if player.toggle_pause(now) {
                let message = if player.is_paused() { "Paused" } else { "Resumed" };
                app.state_mut().set_status(message);
            }
        }
        ControlAction::Stop => {
            player.stop();
            app.state_mut().set_status("Stopped");
        }
        ControlAction::Restart(mode) => {
            if let (Some(score), Some(id)) = (player.score().cloned(), player.song_id()) {
                player.start(score, id, mode, now);
                app.state_mut()
                    .set_status(format!("Restarted in {} mode", mode));
            }
        }
        ControlAction::OctaveDown | ControlAction::OctaveUp => {
            // Held keys would map to the new octave on release
            for pitch in app.state_mut().release_all() {
                sender.key_up(pitch);
            }
        }
        ControlAction::ToggleHelp | ControlAction::Quit => {}
    }
}

fn handle_event(
    app: &mut App,
    player: &mut Player<VirtualKeyboard>,
    sender: &InputSender,
    event: Event,
    now: f64,
) {
    let Event::Key(key) = event else {
        return;
    };

    if key.kind == KeyEventKind::Release {
        if let Some(pitch) = app.note_for(key.code, key.modifiers) {
            if app.state_mut().release(pitch) {
                sender.key_up(pitch);
            }
        }
        return;
    }

    match app.handle_key(key.code, key.modifiers) {
        KeyAction::Note(pitch) => {
            if app.state_mut().hold(pitch, Instant::now()) {
                sender.key_down(pitch);
            }
        }
        KeyAction::Control(action) => apply_control(app, player, sender, action, now),
        KeyAction::None => {}
    }
}

fn run(config: &TutorConfig, score: Arc<Score>, song_id: SongId, mode: PlaybackMode) -> Result<()> {
    let mut player = build_player(config);
    let reconciler = InputReconciler::new();
    let sender = reconciler.sender();

    #[cfg(feature = "midi")]
    let _midi = match config.input.midi_source {
        Some(index) => match keystep::midi::MidiKeyInput::connect(index, reconciler.sender()) {
            Ok(input) => Some(input),
            Err(e) => {
                warn!("MIDI input disabled: {:#}", e);
                None
            }
        },
        None => None,
    };

    let clock = HostClock::new();
    let mut app = App::new(
        config.playback.frame_rate,
        NoteKeymap::new(config.keyboard.base_octave),
    )
    .context("Failed to initialize terminal")?;

    player.start(score, song_id, mode, clock.now());

    while app.is_running() {
        if let Some(event) = app.poll_event()? {
            handle_event(&mut app, &mut player, &sender, event, clock.now());
        }

        if !app.has_release_events() {
            for pitch in app.state_mut().release_expired(Instant::now()) {
                sender.key_up(pitch);
            }
        }

        let now = clock.now();
        reconciler.apply_pending(&mut player, now);

        if player.tick(now) == Action::Complete {
            let message = match player.completion().and_then(|c| c.status()) {
                Some(status) => format!("Song complete ({})", status),
                None => "Song complete".to_string(),
            };
            app.state_mut().set_status(message);
        }

        let view = SessionView::capture(&player);
        app.draw(player.keyboard(), &view)?;
    }

    player.stop();
    info!("Exiting");
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        println!("keystep - Step-by-step piano tutor");
        println!("Run with --help for usage information");
        return Ok(());
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    if let Command::Help = options.command {
        print_usage();
        return Ok(());
    }

    let config = load_config(&options)?;
    init_logging(&config, options.verbose)?;
    let library = ScoreLibrary::new(&config.paths.songs_dir);

    match &options.command {
        Command::Play(target) => {
            let (score, song_id) = load_song(target, &library)?;
            run(&config, score, song_id, options.mode)?;
        }
        Command::ListSongs => list_songs(&library)?,
        Command::ListSources => list_sources()?,
        Command::Help => print_usage(),
    }

    Ok(())
}
