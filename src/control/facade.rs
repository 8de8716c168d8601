//! Hardware control facade
//!
//! Translates normalized levels to and from platform device state and relays
//! the playback toggle. Every operation resolves its device afresh, so a
//! change of default output device between calls is always picked up.
//!
//! Failures never reach the caller. They are logged and reads report
//! [`OutputLevel::FALLBACK`] while writes become no-ops.

use crate::control::backend::{AudioHardware, DisplayHardware, ProcessLauncher};
use crate::control::coreaudio::CoreAudioHardware;
use crate::control::iokit::IoKitDisplay;
use crate::control::level::OutputLevel;
use crate::control::playback::{PlaybackCommand, SystemProcessLauncher};
use crate::error::Result;
use crate::monitor::{MainContext, VolumeSubscription};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Text shown before the now-playing label is first refreshed
pub const NOW_PLAYING_INITIAL: &str = "No Track Playing";

/// Placeholder now-playing text; no track metadata is ever retrieved
pub const NOW_PLAYING_PLACEHOLDER: &str = "Media Control Active";

/// Facade over output volume, display brightness and media playback
///
/// Cheap to clone; clones share the same backends.
#[derive(Clone)]
pub struct HardwareControlFacade {
    audio: Arc<dyn AudioHardware>,
    display: Arc<dyn DisplayHardware>,
    launcher: Arc<dyn ProcessLauncher>,
    playback: Arc<PlaybackCommand>,
}

impl HardwareControlFacade {
    /// Facade over explicit backends
    pub fn new(
        audio: Arc<dyn AudioHardware>,
        display: Arc<dyn DisplayHardware>,
        launcher: Arc<dyn ProcessLauncher>,
        playback: PlaybackCommand,
    ) -> Self {
        Self {
            audio,
            display,
            launcher,
            playback: Arc::new(playback),
        }
    }

    /// Facade over CoreAudio, IOKit and real process launches
    pub fn system(playback: PlaybackCommand) -> Self {
        Self::new(
            Arc::new(CoreAudioHardware::new()),
            Arc::new(IoKitDisplay::new()),
            Arc::new(SystemProcessLauncher),
            playback,
        )
    }

    pub(crate) fn audio(&self) -> &Arc<dyn AudioHardware> {
        &self.audio
    }

    /// Current output volume of the default output device, or 0.5 if it cannot be read
    pub fn get_volume(&self) -> OutputLevel {
        match self.read_volume() {
            Ok(level) => level,
            Err(e) => {
                warn!("Using fallback volume {}: {}", OutputLevel::FALLBACK, e);
                OutputLevel::FALLBACK
            }
        }
    }

    /// Set the output volume of the default output device
    ///
    /// The level is written as given; failures are logged and ignored.
    pub fn set_volume(&self, level: OutputLevel) {
        match self.write_volume(level) {
            Ok(()) => debug!("Volume set to {}", level),
            Err(e) => warn!("Volume left unchanged: {}", e),
        }
    }

    /// Current brightness of the primary display, or 0.5 if it cannot be read
    pub fn get_brightness(&self) -> OutputLevel {
        match self.read_brightness() {
            Ok(level) => level,
            Err(e) => {
                warn!("Using fallback brightness {}: {}", OutputLevel::FALLBACK, e);
                OutputLevel::FALLBACK
            }
        }
    }

    /// Set the brightness of the primary display
    pub fn set_brightness(&self, level: OutputLevel) {
        match self.write_brightness(level) {
            Ok(()) => debug!("Brightness set to {}", level),
            Err(e) => warn!("Brightness left unchanged: {}", e),
        }
    }

    /// Ask the system to flip play/pause
    ///
    /// Launches the helper once and returns immediately. Whether playback
    /// actually changed is never confirmed.
    pub fn toggle_playback(&self) {
        let args = self.playback.args();
        match self.launcher.launch(self.playback.interpreter(), &args) {
            Ok(()) => info!("Sent play/pause key"),
            Err(e) => warn!("Play/pause key not sent: {}", e),
        }
    }

    /// Now-playing label text
    pub fn now_playing(&self) -> &'static str {
        NOW_PLAYING_PLACEHOLDER
    }

    /// Call `callback` on `context`'s thread with the fresh volume whenever it changes
    ///
    /// Changes made through [`Self::set_volume`], hardware keys and other
    /// applications are all reported. If no listener can be registered the
    /// failure is logged and the returned subscription is inactive.
    pub fn subscribe_volume_change<F>(&self, context: &MainContext, callback: F) -> VolumeSubscription
    where
        F: FnMut(OutputLevel) + Send + 'static,
    {
        VolumeSubscription::register(self, context, callback)
    }

    fn read_volume(&self) -> Result<OutputLevel> {
        let device = self.audio.default_output_device()?;
        let raw = self.audio.volume(device)?;
        Ok(OutputLevel::clamped(raw))
    }

    fn write_volume(&self, level: OutputLevel) -> Result<()> {
        let device = self.audio.default_output_device()?;
        self.audio.set_volume(device, level.value())
    }

    fn read_brightness(&self) -> Result<OutputLevel> {
        let display = self.display.primary_display()?;
        let raw = self.display.brightness(&display)?;
        Ok(OutputLevel::clamped(raw))
    }

    fn write_brightness(&self, level: OutputLevel) -> Result<()> {
        let display = self.display.primary_display()?;
        self.display.set_brightness(&display, level.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::backend::MockProcessLauncher;
    use crate::control::playback::MEDIA_KEY_SCRIPT;
    use crate::control::simulated::{RecordingLauncher, SimulatedAudio, SimulatedDisplay};
    use std::path::Path;

    fn facade(audio: Arc<SimulatedAudio>, display: Arc<SimulatedDisplay>) -> HardwareControlFacade {
        HardwareControlFacade::new(
            audio,
            display,
            Arc::new(RecordingLauncher::default()),
            PlaybackCommand::default(),
        )
    }

    #[test]
    fn test_volume_round_trip() {
        let audio = SimulatedAudio::new(0.1);
        let facade = facade(Arc::clone(&audio), SimulatedDisplay::new(0.5));

        facade.set_volume(OutputLevel::clamped(0.6));
        assert!(facade.get_volume().approx_eq(OutputLevel::clamped(0.6), audio.tolerance()));
    }

    #[test]
    fn test_reads_fall_back_without_devices() {
        let facade = facade(SimulatedAudio::without_device(), SimulatedDisplay::without_display());

        assert_eq!(facade.get_volume(), OutputLevel::FALLBACK);
        assert_eq!(facade.get_brightness(), OutputLevel::FALLBACK);
    }

    #[test]
    fn test_writes_are_noops_without_devices() {
        let audio = SimulatedAudio::without_device();
        let display = SimulatedDisplay::without_display();
        let facade = facade(Arc::clone(&audio), Arc::clone(&display));

        facade.set_volume(OutputLevel::MAX);
        facade.set_brightness(OutputLevel::MAX);

        assert_eq!(audio.write_count(), 0);
        assert_eq!(display.write_count(), 0);
    }

    #[test]
    fn test_read_failure_falls_back() {
        let audio = SimulatedAudio::new(0.9);
        audio.fail_property_access(true);
        let facade = facade(Arc::clone(&audio), SimulatedDisplay::new(0.5));

        assert_eq!(facade.get_volume(), OutputLevel::FALLBACK);

        audio.fail_property_access(false);
        assert!(facade.get_volume().approx_eq(OutputLevel::clamped(0.9), audio.tolerance()));
    }

    #[test]
    fn test_device_resolved_on_every_call() {
        let audio = SimulatedAudio::new(0.2);
        let facade = facade(Arc::clone(&audio), SimulatedDisplay::new(0.5));

        audio.switch_default_device(0.8);
        assert!(facade.get_volume().approx_eq(OutputLevel::clamped(0.8), audio.tolerance()));
    }

    #[test]
    fn test_brightness_released_handle_each_call() {
        let display = SimulatedDisplay::new(0.4);
        let facade = facade(SimulatedAudio::new(0.5), Arc::clone(&display));

        facade.set_brightness(OutputLevel::clamped(0.7));
        let _ = facade.get_brightness();
        assert_eq!(display.open_handles(), 0);
    }

    #[test]
    fn test_toggle_playback_launches_once_with_fixed_script() {
        let mut launcher = MockProcessLauncher::new();
        launcher
            .expect_launch()
            .withf(|program, args| {
                program == Path::new("/usr/bin/osascript")
                    && args == ["-e".to_string(), MEDIA_KEY_SCRIPT.to_string()]
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let facade = HardwareControlFacade::new(
            SimulatedAudio::new(0.5),
            SimulatedDisplay::new(0.5),
            Arc::new(launcher),
            PlaybackCommand::default(),
        );
        facade.toggle_playback();
    }

    #[test]
    fn test_toggle_playback_swallows_launch_failure() {
        let mut launcher = MockProcessLauncher::new();
        launcher.expect_launch().times(2).returning(|_, _| {
            Err(crate::error::IslandError::PlaybackLaunchFailed(
                crate::error::StringError::new("not permitted"),
            ))
        });

        let facade = HardwareControlFacade::new(
            SimulatedAudio::new(0.5),
            SimulatedDisplay::new(0.5),
            Arc::new(launcher),
            PlaybackCommand::default(),
        );
        facade.toggle_playback();
        facade.toggle_playback();
    }

    #[test]
    fn test_now_playing_is_placeholder() {
        let facade = facade(SimulatedAudio::new(0.5), SimulatedDisplay::new(0.5));
        assert_eq!(facade.now_playing(), "Media Control Active");
    }
}
