//! Platform seams used by the hardware control facade
//!
//! The facade never talks to CoreAudio, IOKit or the process table directly.
//! It goes through these traits so the same policy runs against the real
//! macOS backends and against the simulated hardware in `control::simulated`
//! (enabled by the `test-support` feature).

use crate::error::Result;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// CoreAudio object id of an audio output device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioDeviceId(pub u32);

/// Handle to a display service, released when dropped
///
/// IOKit service handles carry a reference count, so the backend that
/// resolved the handle supplies the code that releases it.
pub struct DisplayHandle {
    raw: u32,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl DisplayHandle {
    /// Wrap a handle; `release` runs exactly once when the handle is dropped
    pub fn new(raw: u32, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            raw,
            release: Some(Box::new(release)),
        }
    }

    /// The raw platform handle
    pub fn raw(&self) -> u32 {
        self.raw
    }
}

impl fmt::Debug for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayHandle")
            .field("raw", &self.raw)
            .field("managed", &self.release.is_some())
            .finish()
    }
}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Callback a backend invokes from its own thread when the watched property changes
pub type ChangeNotifier = Arc<dyn Fn() + Send + Sync>;

/// Live property listener registration; the listener is removed on drop
pub struct ListenerGuard {
    remove: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerGuard {
    /// Guard that runs `remove` exactly once when dropped
    pub fn new(remove: impl FnOnce() + Send + 'static) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("registered", &self.remove.is_some())
            .finish()
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

/// Audio hardware abstraction layer
pub trait AudioHardware: Send + Sync {
    /// Resolve the device the system currently routes output to
    fn default_output_device(&self) -> Result<AudioDeviceId>;

    /// Read the virtual main volume of `device`
    fn volume(&self, device: AudioDeviceId) -> Result<f32>;

    /// Write the virtual main volume of `device`
    fn set_volume(&self, device: AudioDeviceId, volume: f32) -> Result<()>;

    /// Call `notify` whenever the volume of `device` changes, from any source
    fn add_volume_listener(
        &self,
        device: AudioDeviceId,
        notify: ChangeNotifier,
    ) -> Result<ListenerGuard>;

    /// Call `notify` whenever the system routes output to a different device
    fn add_default_device_listener(&self, notify: ChangeNotifier) -> Result<ListenerGuard>;
}

/// Display brightness control
pub trait DisplayHardware: Send + Sync {
    /// Resolve the primary display service
    fn primary_display(&self) -> Result<DisplayHandle>;

    /// Read the brightness of `display`
    fn brightness(&self, display: &DisplayHandle) -> Result<f32>;

    /// Write the brightness of `display`
    fn set_brightness(&self, display: &DisplayHandle, brightness: f32) -> Result<()>;
}

/// Launches helper processes without waiting for them
#[cfg_attr(test, mockall::automock)]
pub trait ProcessLauncher: Send + Sync {
    /// Start `program` with `args`; returns once the process is spawned
    fn launch(&self, program: &Path, args: &[String]) -> Result<()>;
}
