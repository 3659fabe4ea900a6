//! seqview - terminal viewer for pre-rendered image sequences
//!
//! Checkbox-style panels pick a dataset, a player steps or plays through its
//! frames, and the frame is drawn with half-block cells next to the panel.

mod assets;
mod config;
mod core;
mod data;
mod error;
mod frontend;

use anyhow::{Context, Result};
use assets::{DirectoryFrameSource, FrameSource};
use clap::{Parser as ClapParser, Subcommand};
use config::Config;
use frontend::{Frontend, Palette, TuiFrontend};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(ClapParser)]
#[command(name = "seqview")]
#[command(about = "Terminal viewer for pre-rendered image sequences", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Custom data directory (default: ~/.seqview)
    /// Can also be set via SEQVIEW_DIR environment variable
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Scene to open first
    #[arg(short, long, value_name = "NAME")]
    scene: Option<String>,

    /// Start playing immediately
    #[arg(long)]
    play: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scene configuration
    ValidateConfig {
        /// Config file to validate
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// List the datasets found for each scene
    ListDatasets {
        /// Only this scene
        #[arg(long, value_name = "NAME")]
        scene: Option<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging to file (use RUST_LOG env var to control level, e.g. RUST_LOG=debug)
    // TUI apps can't log to stdout, so we write to a file
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("seqview.log")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false) // No color codes in log file
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();
    let data_dir = cli.data_dir.as_deref();
    if let Some(dir) = data_dir {
        tracing::info!("Using custom data directory: {:?}", dir);
    } else if let Ok(env_dir) = std::env::var(config::DIR_ENV) {
        tracing::info!("Using data directory from {}: {}", config::DIR_ENV, env_dir);
    }

    // Handle subcommands
    if let Some(command) = cli.command {
        match command {
            Commands::ValidateConfig { file } => {
                let config_file = file.as_deref().or(cli.config.as_deref());
                if !validate_config(config_file, data_dir) {
                    std::process::exit(1);
                }
            }
            Commands::ListDatasets { scene } => {
                let config = Config::load_with_options(cli.config.as_deref(), data_dir)?;
                list_datasets(&config, scene.as_deref())?;
            }
        }
        return Ok(());
    }

    let config = Config::load_with_options(cli.config.as_deref(), data_dir)?;
    run_tui(config, cli.scene, cli.play)
}

/// Print a report for the config; returns false when it has errors
fn validate_config(config_file: Option<&Path>, data_dir: Option<&Path>) -> bool {
    match config_file {
        Some(path) => println!("Validating config file: {:?}", path),
        None => println!("Validating default config"),
    }

    let config = match Config::load_with_options(config_file, data_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Failed to load config: {:#}", e);
            return false;
        }
    };
    println!("✓ Config loaded successfully");

    let mut errors = 0;
    if let Err(e) = Palette::from_config(&config.colors) {
        eprintln!("✗ Error: {}", e);
        errors += 1;
    }

    match core::scene::build_models(&config) {
        Ok(models) => {
            for model in &models {
                println!(
                    "  {}: {} layouts",
                    model.name(),
                    model.layouts().len()
                );
            }
            for def in &config.scenes {
                let dir = config.dataset_dir(def);
                if !dir.is_dir() {
                    println!("⚠ Warning: scene '{}' dataset directory {:?} does not exist", def.name, dir);
                }
            }
        }
        Err(e) => {
            eprintln!("✗ Error: {}", e);
            errors += 1;
        }
    }

    if errors == 0 {
        println!("✓ Config is valid");
        true
    } else {
        eprintln!("\n✗ Found {} error(s)", errors);
        false
    }
}

fn list_datasets(config: &Config, scene: Option<&str>) -> Result<()> {
    let defs: Vec<&config::SceneDef> = match scene {
        Some(name) => vec![config
            .scene(name)
            .with_context(|| format!("Unknown scene '{}'", name))?],
        None => config.scenes.iter().collect(),
    };

    for def in defs {
        let dir = config.dataset_dir(def);
        println!("{} ({})", def.name, dir.display());
        let source = DirectoryFrameSource::new(&dir, config.frames_subdir(def));
        match source.dataset_keys() {
            Ok(keys) if keys.is_empty() => println!("  (no datasets)"),
            Ok(keys) => {
                for key in keys {
                    println!("  {}", key);
                }
            }
            Err(e) => println!("  ⚠ {}", e),
        }
    }
    Ok(())
}

/// Run TUI frontend
fn run_tui(config: Config, scene: Option<String>, play: bool) -> Result<()> {
    let palette = Palette::from_config(&config.colors).context("Invalid [colors] section")?;
    let scenes = core::session::load_scenes(&config)?;

    let initial = match &scene {
        Some(name) => scenes
            .iter()
            .position(|s| s.name().eq_ignore_ascii_case(name))
            .with_context(|| {
                let loaded: Vec<&str> = scenes.iter().map(|s| s.name()).collect();
                format!("Scene '{}' is not loaded (available: {})", name, loaded.join(", "))
            })?,
        None => 0,
    };
    let mut session = core::Session::new(scenes, initial)?;
    if play || config.player.autoplay {
        session.start_playing(Instant::now());
    }

    let mut frontend = TuiFrontend::new(palette, config.ui.panel_width)?;
    let result = run_loop(&mut frontend, &mut session, &config);
    frontend.cleanup()?;
    result
}

/// Poll, fold events into the session, tick timers, redraw when something changed
fn run_loop(frontend: &mut dyn Frontend, session: &mut core::Session, config: &Config) -> Result<()> {
    let poll_timeout = config.ui.poll_timeout();
    frontend.render(session)?;

    while session.is_running() {
        // Wake up in time for the next autoplay step or key repeat
        let timeout = session
            .next_deadline(Instant::now())
            .map_or(poll_timeout, |due| due.min(poll_timeout));
        frontend.set_poll_timeout(timeout);

        let events = frontend.poll_events()?;
        let now = Instant::now();
        for event in &events {
            session.handle_event(event, now);
            if !session.is_running() {
                break;
            }
        }
        if !session.is_running() {
            break;
        }

        let ticked = session.tick(now);
        if ticked || !events.is_empty() {
            frontend.render(session)?;
        }
    }

    tracing::info!("Viewer closed");
    Ok(())
}
