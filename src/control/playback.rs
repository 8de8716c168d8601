//! Playback toggle via a scripted media-key press
//!
//! There is no public API for "toggle whatever is playing", so the facade
//! asks System Events to press the media key combination. The command is a
//! best-effort signal: nothing reports whether playback actually changed.

use crate::control::backend::ProcessLauncher;
use crate::error::{IslandError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Scripting interpreter that runs the key-press script
pub const DEFAULT_INTERPRETER: &str = "/usr/bin/osascript";

/// AppleScript that synthesizes the play/pause media key combination
pub const MEDIA_KEY_SCRIPT: &str =
    "tell application \"System Events\" to key code 16 using {command down, option down}";

/// The external command launched by `toggle_playback`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackCommand {
    interpreter: PathBuf,
    script: String,
}

impl PlaybackCommand {
    /// Command running `script` with `interpreter`
    pub fn new(interpreter: impl Into<PathBuf>, script: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
        }
    }

    /// Interpreter path
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// Script text
    pub fn script(&self) -> &str {
        &self.script
    }

    /// Interpreter arguments: the script passed inline with `-e`
    pub fn args(&self) -> Vec<String> {
        vec!["-e".to_string(), self.script.clone()]
    }
}

impl Default for PlaybackCommand {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETER, MEDIA_KEY_SCRIPT)
    }
}

/// Spawns real processes with `std::process::Command`
///
/// Output is discarded. The child is reaped on a short-lived thread so a
/// fire-and-forget launch does not leave a zombie behind.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessLauncher;

impl ProcessLauncher for SystemProcessLauncher {
    fn launch(&self, program: &Path, args: &[String]) -> Result<()> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| IslandError::PlaybackLaunchFailed(Box::new(e)))?;

        let pid = child.id();
        debug!("Launched {} (pid {pid})", program.display());

        let reaper = std::thread::Builder::new()
            .name("island-reaper".to_string())
            .spawn(move || match child.wait() {
                Ok(status) if status.success() => debug!("Helper {pid} exited successfully"),
                Ok(status) => warn!("Helper {pid} exited with {status}"),
                Err(e) => warn!("Failed to wait for helper {pid}: {e}"),
            });

        if let Err(e) = reaper {
            warn!("Failed to spawn reaper thread for helper {pid}: {e}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_media_key_script() {
        let command = PlaybackCommand::default();
        assert_eq!(command.interpreter(), Path::new("/usr/bin/osascript"));
        assert_eq!(
            command.args(),
            vec![
                "-e".to_string(),
                "tell application \"System Events\" to key code 16 using {command down, option down}"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_missing_program_reports_launch_failure() {
        let result = SystemProcessLauncher.launch(
            Path::new("/nonexistent/island-test-helper"),
            &["-e".to_string()],
        );
        assert!(matches!(result, Err(IslandError::PlaybackLaunchFailed(_))));
    }

    #[test]
    #[cfg(unix)]
    fn test_launch_returns_without_waiting() {
        let started = std::time::Instant::now();
        let result = SystemProcessLauncher.launch(Path::new("/bin/sleep"), &["2".to_string()]);
        assert!(result.is_ok());
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }
}
