//! Volume change subscriptions
//!
//! One notification path: the audio backend's property listener fires on a
//! platform thread, posts an event onto the subscriber's [`MainContext`], and
//! the main thread re-reads the volume through the facade before invoking
//! the subscriber's callback. The hardware value is always read at delivery
//! time, so a burst of changes never hands out a stale level.
//!
//! A second listener watches which device the system routes output to. When
//! the default output device changes, the volume listener moves to the new
//! device and one event is posted, since the reported volume is now the new
//! device's.

use crate::control::backend::{AudioDeviceId, AudioHardware, ChangeNotifier, ListenerGuard};
use crate::control::{HardwareControlFacade, OutputLevel};
use crate::monitor::main_queue::MainContext;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Volume listener attached to one concrete output device
struct DeviceBinding {
    device: AudioDeviceId,
    _listener: ListenerGuard,
}

/// State shared between the subscription and the platform listeners
struct Shared {
    active: Arc<AtomicBool>,
    audio: Arc<dyn AudioHardware>,
    notify: ChangeNotifier,
    binding: Mutex<Option<DeviceBinding>>,
}

impl Shared {
    /// Attach the volume listener to `device`, replacing any previous binding
    fn bind(&self, binding: &mut Option<DeviceBinding>, device: AudioDeviceId) {
        // Release the old device before listening on the new one
        binding.take();
        match self.audio.add_volume_listener(device, Arc::clone(&self.notify)) {
            Ok(listener) => {
                info!("Watching volume of output device {}", device.0);
                *binding = Some(DeviceBinding {
                    device,
                    _listener: listener,
                });
            }
            Err(e) => warn!("Volume changes on device {} will not be reported: {}", device.0, e),
        }
    }

    /// Follow a default output device change; runs on a platform thread
    fn follow_default_device(&self) {
        let mut binding = self.binding.lock();
        if !self.active.load(Ordering::Acquire) {
            return;
        }

        match self.audio.default_output_device() {
            Ok(device) if binding.as_ref().is_some_and(|bound| bound.device == device) => return,
            Ok(device) => {
                debug!("Default output device changed to {}", device.0);
                self.bind(&mut binding, device);
            }
            Err(e) => {
                warn!("Default output device lost: {}", e);
                binding.take();
            }
        }
        drop(binding);

        (self.notify)();
    }
}

/// Live registration for volume change notifications
///
/// Dropping the subscription removes the platform listeners. Events that were
/// already posted to the main context but have not run yet are discarded.
#[must_use = "dropping the subscription stops volume notifications"]
pub struct VolumeSubscription {
    shared: Arc<Shared>,
    device_listener: Option<ListenerGuard>,
}

impl VolumeSubscription {
    pub(crate) fn register<F>(
        facade: &HardwareControlFacade,
        context: &MainContext,
        callback: F,
    ) -> Self
    where
        F: FnMut(OutputLevel) + Send + 'static,
    {
        let audio = Arc::clone(facade.audio());
        let device = match audio.default_output_device() {
            Ok(device) => device,
            Err(e) => {
                warn!("Volume changes will not be reported: {}", e);
                return Self::inert(audio);
            }
        };

        let active = Arc::new(AtomicBool::new(true));
        let shared = Arc::new(Shared {
            notify: Self::delivery(facade, context, &active, callback),
            active,
            audio: Arc::clone(&audio),
            binding: Mutex::new(None),
        });

        {
            let mut binding = shared.binding.lock();
            shared.bind(&mut binding, device);
            if binding.is_none() {
                drop(binding);
                return Self::inert(audio);
            }
        }

        let follower = Arc::clone(&shared);
        let on_switch: ChangeNotifier = Arc::new(move || follower.follow_default_device());
        let device_listener = match audio.add_default_device_listener(on_switch) {
            Ok(guard) => Some(guard),
            Err(e) => {
                warn!("Output device switches will not be followed: {}", e);
                None
            }
        };

        info!("Subscribed to volume changes on device {}", device.0);
        Self {
            shared,
            device_listener,
        }
    }

    /// Notifier that posts one delivery of the fresh volume onto `context`
    fn delivery<F>(
        facade: &HardwareControlFacade,
        context: &MainContext,
        active: &Arc<AtomicBool>,
        callback: F,
    ) -> ChangeNotifier
    where
        F: FnMut(OutputLevel) + Send + 'static,
    {
        let active = Arc::clone(active);
        let facade = facade.clone();
        let context = context.clone();
        let callback = Arc::new(Mutex::new(callback));
        Arc::new(move || {
            if !active.load(Ordering::Acquire) {
                return;
            }
            let active = Arc::clone(&active);
            let facade = facade.clone();
            let callback = Arc::clone(&callback);
            let posted = context.post(move || {
                if !active.load(Ordering::Acquire) {
                    debug!("Discarding volume change for cancelled subscription");
                    return;
                }
                let level = facade.get_volume();
                let mut deliver = callback.lock();
                (*deliver)(level);
            });
            if !posted {
                debug!("Main context full or closed, volume change dropped");
            }
        })
    }

    fn inert(audio: Arc<dyn AudioHardware>) -> Self {
        Self {
            shared: Arc::new(Shared {
                active: Arc::new(AtomicBool::new(false)),
                audio,
                notify: Arc::new(|| {}),
                binding: Mutex::new(None),
            }),
            device_listener: None,
        }
    }

    /// Whether the subscription was registered and has not been cancelled
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Device whose volume is currently watched, if any
    pub fn watched_device(&self) -> Option<AudioDeviceId> {
        self.shared.binding.lock().as_ref().map(|bound| bound.device)
    }

    /// Stop notifications now; equivalent to dropping the subscription
    pub fn cancel(self) {}
}

impl Drop for VolumeSubscription {
    fn drop(&mut self) {
        self.shared.active.store(false, Ordering::Release);
        // Stop following switches first so nothing rebinds after the take below
        self.device_listener.take();
        let binding = self.shared.binding.lock().take();
        if binding.is_some() {
            debug!("Volume subscription released");
        }
    }
}

impl std::fmt::Debug for VolumeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeSubscription")
            .field("active", &self.is_active())
            .field("watched_device", &self.watched_device())
            .finish_non_exhaustive()
    }
}
