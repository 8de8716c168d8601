//! Hardware control module
//!
//! Reads and writes system output volume and display brightness, and relays
//! a play/pause toggle to whatever media application is active.
//!
//! # Overview
//!
//! - **Volume** of the default output device through the CoreAudio HAL
//!   (virtual main volume, output scope)
//! - **Brightness** of the primary display through IOKit display parameters
//! - **Playback toggle** by launching `osascript` to press the media key
//! - **Change notification** for volume, delivered on the caller's main context
//!
//! # Architecture
//!
//! - `HardwareControlFacade`: the only type callers need; never returns errors
//! - `OutputLevel`: normalized level in [0.0, 1.0]
//! - `backend`: traits the facade uses to reach the platform
//! - `coreaudio` / `iokit`: macOS FFI backends
//! - `playback`: the media-key command and the real process launcher
//! - `simulated`: quantizing in-memory hardware for tests, compiled only
//!   with the `test-support` feature
//!
//! # Failure Policy
//!
//! Devices are resolved on every call. When resolution, a read or a write
//! fails, the facade logs a warning; reads return [`OutputLevel::FALLBACK`]
//! (0.5) and writes do nothing.
//!
//! # Example Usage
//!
//! ```no_run
//! use island::control::{HardwareControlFacade, OutputLevel, PlaybackCommand};
//!
//! let facade = HardwareControlFacade::system(PlaybackCommand::default());
//!
//! let volume = facade.get_volume();
//! println!("Volume: {volume}");
//!
//! facade.set_volume(OutputLevel::clamped(volume.value() + 0.1));
//! facade.set_brightness(OutputLevel::MAX);
//! facade.toggle_playback();
//! ```

pub mod backend;
pub mod coreaudio;
pub mod facade;
pub mod iokit;
pub mod level;
pub mod playback;
#[cfg(any(test, feature = "test-support"))]
pub mod simulated;

pub use backend::{AudioDeviceId, AudioHardware, DisplayHandle, DisplayHardware, ProcessLauncher};
pub use facade::{HardwareControlFacade, NOW_PLAYING_INITIAL, NOW_PLAYING_PLACEHOLDER};
pub use level::OutputLevel;
pub use playback::{PlaybackCommand, SystemProcessLauncher};
