//! `Island` - Hardware controls for a macOS menu-bar companion
//!
//! Reads and writes the system output volume and the primary display's
//! brightness as normalized levels, toggles media playback through the
//! system media key, and reports volume changes from any source on the
//! caller's main thread.
//!
//! # Requirements
//!
//! - macOS with CoreAudio (volume) and an `IODisplayConnect` service (brightness)
//! - `osascript` and Accessibility permission for the playback toggle
//!
//! Other platforms build and run; every hardware read reports the 0.5 fallback.

// Module declarations
pub mod config;
pub mod control;
pub mod error;
pub mod monitor;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use control::{HardwareControlFacade, OutputLevel};
pub use error::{IslandError, Result};
