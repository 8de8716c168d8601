//! Command line interface
//!
//! Stands in for the menu-bar panel: two sliders, a play/pause button and the
//! now-playing label, each mapped onto one facade call.

use clap::{Args, Parser, Subcommand};
use island::OutputLevel;

#[derive(Parser)]
#[command(name = "island")]
#[command(version)]
#[command(about = "Island - Volume, brightness and playback control for macOS")]
#[command(long_about = "Island - Volume, brightness and playback control for macOS

Levels are normalized: 0.0 is silent or darkest, 1.0 is loudest or brightest.
Reads that fail report 0.5; writes that fail change nothing. Details go to the log.

EXAMPLES:
    island status                 Show volume, brightness and now-playing text
    island volume set 0.35        Set output volume
    island brightness get         Print display brightness
    island toggle                 Send the play/pause media key
    island watch --count 3        Print the next three volume changes

ENVIRONMENT VARIABLES:
    RUST_LOG=island=debug   Override the configured log filter
    ISLAND_HOME=<dir>       Keep config and logs under <dir>/Island

FILES:
    ~/Library/Application Support/Island/config.json
    ~/Library/Application Support/Island/logs/island.log")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Also log to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Default output device volume
    #[command(subcommand)]
    Volume(LevelCommands),

    /// Primary display brightness
    #[command(subcommand)]
    Brightness(LevelCommands),

    /// Send the play/pause media key
    Toggle,

    /// Print the now-playing label
    NowPlaying,

    /// Show every control at once
    Status(StatusArgs),

    /// Print volume changes as they happen
    Watch(WatchArgs),

    /// Configuration file management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum LevelCommands {
    /// Print the current level
    Get,
    /// Set the level
    Set {
        /// Level between 0.0 and 1.0
        #[arg(value_parser = parse_level)]
        level: OutputLevel,
    },
}

#[derive(Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Exit after this many changes
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the configuration file path
    Path,
    /// Write the default configuration, keeping an existing file unless forced
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn parse_level(input: &str) -> Result<OutputLevel, String> {
    let value: f32 = input
        .trim()
        .parse()
        .map_err(|e| format!("'{input}' is not a number: {e}"))?;
    OutputLevel::try_from(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_level_accepts_bounds() {
        assert_eq!(parse_level("0").unwrap(), OutputLevel::MIN);
        assert_eq!(parse_level("1.0").unwrap(), OutputLevel::MAX);
        assert_eq!(parse_level(" 0.25 ").unwrap().value(), 0.25);
    }

    #[test]
    fn test_parse_level_rejects_out_of_range() {
        assert!(parse_level("1.5").is_err());
        assert!(parse_level("-0.1").is_err());
        assert!(parse_level("NaN").is_err());
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn test_set_subcommand_parses_level() {
        let cli = Cli::try_parse_from(["island", "volume", "set", "0.4"]).unwrap();
        match cli.command {
            Commands::Volume(LevelCommands::Set { level }) => assert_eq!(level.value(), 0.4),
            _ => panic!("expected volume set"),
        }
        assert!(Cli::try_parse_from(["island", "brightness", "set", "2"]).is_err());
    }
}
