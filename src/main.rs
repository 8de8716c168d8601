//! `Island` - Volume, brightness and playback control for macOS
//!
//! Command line front end over the hardware control facade. The process'
//! main thread owns the main queue, so volume change callbacks registered by
//! `island watch` run here.

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Commands, ConfigCommands, LevelCommands, StatusArgs, WatchArgs};
use island::{
    HardwareControlFacade, IslandError, OutputLevel,
    config::{ConfigManager, IslandConfig},
    control::PlaybackCommand,
    error::get_user_friendly_error,
    monitor::MainQueue,
    utils,
};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{error, info};

/// How long `watch` blocks on the main queue before re-checking its exit condition
const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Serialize)]
struct StatusReport {
    volume: OutputLevel,
    brightness: OutputLevel,
    now_playing: &'static str,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            let message = if let Some(island_error) = e.downcast_ref::<IslandError>() {
                get_user_friendly_error(island_error)
            } else {
                format!("{e:#}")
            };
            eprintln!("island: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Logging settings live in the config, so read it first and report the
    // outcome once a subscriber exists
    let loaded = ConfigManager::read(&ConfigManager::get_config_path())
        .context("Failed to load configuration")?;
    utils::init_logging(&loaded.config.logging, cli.verbose)
        .context("Failed to initialize logging system")?;
    loaded.log_status();
    let config = loaded.config;

    let facade = HardwareControlFacade::system(PlaybackCommand::from(&config.playback));

    match cli.command {
        Commands::Volume(LevelCommands::Get) => println!("{}", facade.get_volume()),
        Commands::Volume(LevelCommands::Set { level }) => facade.set_volume(level),
        Commands::Brightness(LevelCommands::Get) => println!("{}", facade.get_brightness()),
        Commands::Brightness(LevelCommands::Set { level }) => facade.set_brightness(level),
        Commands::Toggle => facade.toggle_playback(),
        Commands::NowPlaying => println!("{}", facade.now_playing()),
        Commands::Status(args) => print_status(&facade, &args)?,
        Commands::Watch(args) => watch_volume(&facade, &args)?,
        Commands::Config(command) => run_config_command(&command)?,
    }

    Ok(())
}

fn print_status(facade: &HardwareControlFacade, args: &StatusArgs) -> Result<()> {
    let report = StatusReport {
        volume: facade.get_volume(),
        brightness: facade.get_brightness(),
        now_playing: facade.now_playing(),
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to encode status")?
        );
    } else {
        println!("Volume:      {}", report.volume);
        println!("Brightness:  {}", report.brightness);
        println!("Now playing: {}", report.now_playing);
    }
    Ok(())
}

fn watch_volume(facade: &HardwareControlFacade, args: &WatchArgs) -> Result<()> {
    let queue = MainQueue::new();
    let delivered = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&delivered);
    let subscription = facade.subscribe_volume_change(&queue.context(), move |level| {
        println!("{level}");
        counter.fetch_add(1, Ordering::Relaxed);
    });

    if !subscription.is_active() {
        bail!("Volume changes cannot be observed: no output device accepted a listener");
    }

    info!("Watching volume changes");
    println!("{}", facade.get_volume());

    while args
        .count
        .is_none_or(|limit| delivered.load(Ordering::Relaxed) < limit)
    {
        queue.run_one_timeout(WATCH_POLL_INTERVAL);
    }

    subscription.cancel();
    Ok(())
}

fn run_config_command(command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Path => println!("{}", ConfigManager::get_config_path().display()),
        ConfigCommands::Init { force } => {
            let path = ConfigManager::get_config_path();
            if path.exists() && !force {
                println!("{} already exists (use --force to overwrite)", path.display());
                return Ok(());
            }
            let path = ConfigManager::save(&IslandConfig::default())
                .context("Failed to write default configuration")?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
