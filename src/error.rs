//! Error types for `Island`
//!
//! Backends, configuration and logging return these errors. The hardware
//! control facade never hands them to its callers: it logs them and falls
//! back to a safe default instead.
//!
//! Error variants use `#[source]` to preserve error chains for diagnostics.

use std::fmt;
use thiserror::Error;

/// Simple error type for wrapping string messages while implementing `std::error::Error`
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

impl StringError {
    /// Create a new `StringError` from a string message
    pub fn new(msg: impl Into<String>) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Non-zero status code returned by a CoreAudio or IOKit call
///
/// CoreAudio reports most failures as four-character codes packed into an
/// `i32` (for example `'who?'` for an unknown object), so those are rendered
/// as text when every byte is printable ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsStatus(pub i32);

impl std::error::Error for OsStatus {}

impl fmt::Display for OsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            let code: String = bytes.iter().map(|&b| char::from(b)).collect();
            write!(f, "OSStatus '{code}' ({})", self.0)
        } else {
            write!(f, "OSStatus {}", self.0)
        }
    }
}

/// Hardware the facade resolves before reading or writing a level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// The default audio output device
    OutputDevice,
    /// The primary display service
    Display,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutputDevice => f.write_str("default output device"),
            Self::Display => f.write_str("display service"),
        }
    }
}

/// Hardware property read or written through a resolved device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    /// Virtual main output volume of an audio device
    Volume,
    /// Brightness parameter of a display
    Brightness,
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Volume => f.write_str("output volume"),
            Self::Brightness => f.write_str("display brightness"),
        }
    }
}

/// Main error type for `Island`
#[derive(Debug, Error)]
pub enum IslandError {
    /// No default output device or no display service could be resolved
    #[error("Failed to resolve {0}: {1}")]
    DeviceResolutionFailed(DeviceKind, #[source] Box<dyn std::error::Error + Send + Sync>),

    /// Reading a property from a resolved device failed
    #[error("Failed to read {0}: {1}")]
    PropertyReadFailed(Property, #[source] Box<dyn std::error::Error + Send + Sync>),

    /// Writing a property to a resolved device failed
    #[error("Failed to write {0}: {1}")]
    PropertyWriteFailed(Property, #[source] Box<dyn std::error::Error + Send + Sync>),

    /// Registering a property-change listener failed
    #[error("Failed to register volume listener: {0}")]
    ListenerRegistrationFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The playback helper process could not be launched
    #[error("Failed to launch playback helper: {0}")]
    PlaybackLaunchFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A level outside [0.0, 1.0] (or not a number) was supplied
    #[error("Level {0} is outside the range 0.0 to 1.0")]
    InvalidLevel(f32),

    /// The platform has no implementation of the requested hardware control
    #[error("{0} control is only available on macOS")]
    UnsupportedPlatform(DeviceKind),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for `Island` operations
pub type Result<T> = std::result::Result<T, IslandError>;

/// Convert an error to a message suitable for printing to the terminal
pub fn get_user_friendly_error(error: &IslandError) -> String {
    match error {
        IslandError::DeviceResolutionFailed(DeviceKind::OutputDevice, _) => {
            "No audio output device is available.\n\n\
             Check that an output device is selected in System Settings > Sound."
                .to_string()
        }
        IslandError::DeviceResolutionFailed(DeviceKind::Display, _) => {
            "No display with adjustable brightness was found.\n\n\
             External monitors usually do not expose brightness to macOS."
                .to_string()
        }
        IslandError::PropertyReadFailed(property, _)
        | IslandError::PropertyWriteFailed(property, _) => {
            format!("Unable to access the {property}.\n\nThe device may not support it.")
        }
        IslandError::ListenerRegistrationFailed(_) => {
            "Unable to watch for volume changes.\n\n\
             Volume will not refresh automatically."
                .to_string()
        }
        IslandError::PlaybackLaunchFailed(_) => "Unable to send the play/pause key.\n\n\
             Please ensure:\n\
             - /usr/bin/osascript is present\n\
             - The terminal is allowed to control System Events \
               (System Settings > Privacy & Security > Automation)"
            .to_string(),
        IslandError::InvalidLevel(level) => {
            format!("{level} is not a valid level.\n\nUse a value between 0.0 and 1.0.")
        }
        IslandError::UnsupportedPlatform(kind) => {
            format!("Controlling the {kind} is only supported on macOS.")
        }
        IslandError::ConfigError(_) => "Failed to load or save configuration.\n\n\
             Check that you have write permissions to the Island configuration directory."
            .to_string(),
        IslandError::IoError(e) => {
            format!(
                "A file system error occurred:\n\n{e}\n\n\
                 Please check file permissions and disk space."
            )
        }
        IslandError::JsonError(e) => {
            format!(
                "Configuration file is corrupted:\n\n{e}\n\n\
                 The application will use default settings."
            )
        }
    }
}
