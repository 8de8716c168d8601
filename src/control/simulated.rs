//! In-memory hardware for tests and headless runs
//!
//! Models what the facade relies on: a default output device that can
//! disappear or change, volume and brightness quantized to a fixed number of
//! hardware steps, listeners that fire once per actual change, and property
//! access that can be made to fail.

use crate::control::backend::{
    AudioDeviceId, AudioHardware, ChangeNotifier, DisplayHandle, DisplayHardware, ListenerGuard,
    ProcessLauncher,
};
use crate::error::{DeviceKind, IslandError, Property, Result, StringError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// Discrete volume steps of the simulated output device
pub const VOLUME_STEPS: u32 = 64;

/// Discrete brightness steps of the simulated panel
pub const BRIGHTNESS_STEPS: u32 = 16;

#[expect(clippy::cast_precision_loss, reason = "step counts are small integers")]
fn quantize(value: f32, steps: u32) -> f32 {
    let steps = steps as f32;
    (value.clamp(0.0, 1.0) * steps).round() / steps
}

#[expect(clippy::cast_precision_loss, reason = "step counts are small integers")]
fn step_tolerance(steps: u32) -> f32 {
    0.5 / steps as f32 + f32::EPSILON
}

/// Property a simulated listener is attached to
#[derive(Clone, Copy, PartialEq, Eq)]
enum Watched {
    Volume(AudioDeviceId),
    DefaultDevice,
}

struct AudioState {
    default_device: Option<AudioDeviceId>,
    volumes: HashMap<AudioDeviceId, f32>,
    listeners: Vec<(u64, Watched, ChangeNotifier)>,
    next_listener: u64,
    next_device: u32,
    fail_access: bool,
    writes: usize,
}

/// Simulated CoreAudio output devices
pub struct SimulatedAudio {
    state: Arc<Mutex<AudioState>>,
}

impl SimulatedAudio {
    /// One default output device at `volume`
    pub fn new(volume: f32) -> Arc<Self> {
        let device = AudioDeviceId(40);
        let mut volumes = HashMap::new();
        volumes.insert(device, quantize(volume, VOLUME_STEPS));
        Arc::new(Self {
            state: Arc::new(Mutex::new(AudioState {
                default_device: Some(device),
                volumes,
                listeners: Vec::new(),
                next_listener: 1,
                next_device: 41,
                fail_access: false,
                writes: 0,
            })),
        })
    }

    /// No output device at all
    pub fn without_device() -> Arc<Self> {
        let audio = Self::new(0.0);
        {
            let mut state = audio.state.lock();
            state.default_device = None;
            state.volumes.clear();
        }
        audio
    }

    /// Largest difference between a written level and what reads back
    pub fn tolerance(&self) -> f32 {
        step_tolerance(VOLUME_STEPS)
    }

    /// Change the default device's volume from outside the facade,
    /// as hardware keys or another application would
    pub fn press_volume_button(&self, volume: f32) {
        let device = self.state.lock().default_device;
        if let Some(device) = device {
            self.store(device, volume);
        }
    }

    /// Route output to a new device whose volume is `volume`,
    /// as plugging in headphones would
    pub fn switch_default_device(&self, volume: f32) -> AudioDeviceId {
        let (device, notifiers) = {
            let mut state = self.state.lock();
            let device = AudioDeviceId(state.next_device);
            state.next_device += 1;
            state.volumes.insert(device, quantize(volume, VOLUME_STEPS));
            state.default_device = Some(device);
            (device, Self::notifiers_for(&state, Watched::DefaultDevice))
        };
        for notify in notifiers {
            notify();
        }
        device
    }

    /// Make every property read and write fail until reset
    pub fn fail_property_access(&self, fail: bool) {
        self.state.lock().fail_access = fail;
    }

    /// Number of registered volume listeners
    pub fn listener_count(&self) -> usize {
        self.state
            .lock()
            .listeners
            .iter()
            .filter(|(_, watched, _)| matches!(watched, Watched::Volume(_)))
            .count()
    }

    /// Number of registered default-device listeners
    pub fn device_listener_count(&self) -> usize {
        self.state
            .lock()
            .listeners
            .iter()
            .filter(|(_, watched, _)| *watched == Watched::DefaultDevice)
            .count()
    }

    /// Number of successful volume writes
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    fn store(&self, device: AudioDeviceId, volume: f32) {
        let notifiers: Vec<ChangeNotifier> = {
            let mut state = self.state.lock();
            let quantized = quantize(volume, VOLUME_STEPS);
            let previous = state.volumes.insert(device, quantized);
            if previous == Some(quantized) {
                return;
            }
            Self::notifiers_for(&state, Watched::Volume(device))
        };
        // Fire outside the lock, like a HAL notification thread.
        for notify in notifiers {
            notify();
        }
    }

    fn notifiers_for(state: &AudioState, watched: Watched) -> Vec<ChangeNotifier> {
        state
            .listeners
            .iter()
            .filter(|(_, listener, _)| *listener == watched)
            .map(|(_, _, notify)| Arc::clone(notify))
            .collect()
    }

    fn add_listener(&self, watched: Watched, notify: ChangeNotifier) -> ListenerGuard {
        let id = {
            let mut state = self.state.lock();
            let id = state.next_listener;
            state.next_listener += 1;
            state.listeners.push((id, watched, notify));
            id
        };

        // Weak so a forgotten guard never keeps the hardware alive.
        let state: Weak<Mutex<AudioState>> = Arc::downgrade(&self.state);
        ListenerGuard::new(move || {
            if let Some(state) = state.upgrade() {
                state.lock().listeners.retain(|(listener, _, _)| *listener != id);
            }
        })
    }
}

impl AudioHardware for SimulatedAudio {
    fn default_output_device(&self) -> Result<AudioDeviceId> {
        self.state.lock().default_device.ok_or_else(|| {
            IslandError::DeviceResolutionFailed(
                DeviceKind::OutputDevice,
                StringError::new("no default output device is set"),
            )
        })
    }

    fn volume(&self, device: AudioDeviceId) -> Result<f32> {
        let state = self.state.lock();
        if state.fail_access {
            return Err(IslandError::PropertyReadFailed(
                Property::Volume,
                StringError::new("simulated read failure"),
            ));
        }
        state.volumes.get(&device).copied().ok_or_else(|| {
            IslandError::PropertyReadFailed(Property::Volume, StringError::new("unknown device"))
        })
    }

    fn set_volume(&self, device: AudioDeviceId, volume: f32) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.fail_access || !state.volumes.contains_key(&device) {
                return Err(IslandError::PropertyWriteFailed(
                    Property::Volume,
                    StringError::new("simulated write failure"),
                ));
            }
            state.writes += 1;
        }
        self.store(device, volume);
        Ok(())
    }

    fn add_volume_listener(
        &self,
        device: AudioDeviceId,
        notify: ChangeNotifier,
    ) -> Result<ListenerGuard> {
        if !self.state.lock().volumes.contains_key(&device) {
            return Err(IslandError::ListenerRegistrationFailed(StringError::new(
                "unknown device",
            )));
        }
        Ok(self.add_listener(Watched::Volume(device), notify))
    }

    fn add_default_device_listener(&self, notify: ChangeNotifier) -> Result<ListenerGuard> {
        Ok(self.add_listener(Watched::DefaultDevice, notify))
    }
}

/// Simulated built-in display panel
pub struct SimulatedDisplay {
    brightness: Mutex<Option<f32>>,
    fail_access: AtomicBool,
    open_handles: Arc<AtomicUsize>,
    writes: AtomicUsize,
}

impl SimulatedDisplay {
    /// Raw handle handed out for the simulated panel
    pub const HANDLE: u32 = 0x1d0;

    /// A display at `brightness`
    pub fn new(brightness: f32) -> Arc<Self> {
        Arc::new(Self {
            brightness: Mutex::new(Some(quantize(brightness, BRIGHTNESS_STEPS))),
            fail_access: AtomicBool::new(false),
            open_handles: Arc::new(AtomicUsize::new(0)),
            writes: AtomicUsize::new(0),
        })
    }

    /// No display service
    pub fn without_display() -> Arc<Self> {
        let display = Self::new(0.0);
        *display.brightness.lock() = None;
        display
    }

    /// Largest difference between a written level and what reads back
    pub fn tolerance(&self) -> f32 {
        step_tolerance(BRIGHTNESS_STEPS)
    }

    /// Make every property read and write fail until reset
    pub fn fail_property_access(&self, fail: bool) {
        self.fail_access.store(fail, Ordering::SeqCst);
    }

    /// Handles resolved and not yet released
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    /// Number of successful brightness writes
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_access(
        &self,
        property_error: fn(Property, Box<StringError>) -> IslandError,
    ) -> Result<()> {
        if self.fail_access.load(Ordering::SeqCst) {
            Err(property_error(
                Property::Brightness,
                StringError::new("simulated display failure"),
            ))
        } else {
            Ok(())
        }
    }
}

impl DisplayHardware for SimulatedDisplay {
    fn primary_display(&self) -> Result<DisplayHandle> {
        if self.brightness.lock().is_none() {
            return Err(IslandError::DeviceResolutionFailed(
                DeviceKind::Display,
                StringError::new("no display service found"),
            ));
        }
        self.open_handles.fetch_add(1, Ordering::SeqCst);
        let open_handles = Arc::clone(&self.open_handles);
        Ok(DisplayHandle::new(Self::HANDLE, move || {
            open_handles.fetch_sub(1, Ordering::SeqCst);
        }))
    }

    fn brightness(&self, _display: &DisplayHandle) -> Result<f32> {
        self.check_access(|p, e| IslandError::PropertyReadFailed(p, e))?;
        self.brightness.lock().ok_or_else(|| {
            IslandError::PropertyReadFailed(Property::Brightness, StringError::new("display gone"))
        })
    }

    fn set_brightness(&self, _display: &DisplayHandle, brightness: f32) -> Result<()> {
        self.check_access(|p, e| IslandError::PropertyWriteFailed(p, e))?;
        let mut current = self.brightness.lock();
        match current.as_mut() {
            Some(value) => {
                *value = quantize(brightness, BRIGHTNESS_STEPS);
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(IslandError::PropertyWriteFailed(
                Property::Brightness,
                StringError::new("display gone"),
            )),
        }
    }
}

/// Process launcher that records launches instead of spawning anything
#[derive(Default)]
pub struct RecordingLauncher {
    launches: Mutex<Vec<(PathBuf, Vec<String>)>>,
    fail: AtomicBool,
}

impl RecordingLauncher {
    /// Every launch so far as (program, arguments)
    pub fn launches(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.launches.lock().clone()
    }

    /// Make subsequent launches fail after being recorded
    pub fn fail_launches(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn launch(&self, program: &Path, args: &[String]) -> Result<()> {
        self.launches
            .lock()
            .push((program.to_path_buf(), args.to_vec()));
        if self.fail.load(Ordering::SeqCst) {
            Err(IslandError::PlaybackLaunchFailed(StringError::new(
                "simulated launch failure",
            )))
        } else {
            Ok(())
        }
    }
}
