//! CoreAudio hardware abstraction layer bindings
//!
//! Only the handful of `AudioObject*` calls and property selectors needed to
//! read, write and watch the default output device volume are declared here,
//! with `#[repr(C)]` layouts matching `<CoreAudio/AudioHardware.h>`.

#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

use crate::control::backend::{AudioDeviceId, AudioHardware, ChangeNotifier, ListenerGuard};
use crate::error::Result;
use parking_lot::Mutex;

#[cfg(target_os = "macos")]
use crate::error::{DeviceKind, IslandError, OsStatus, Property, StringError};
#[cfg(target_os = "macos")]
use std::ffi::c_void;
#[cfg(target_os = "macos")]
use tracing::{debug, warn};

/// CoreAudio object identifier
pub type AudioObjectID = u32;

/// Selector, scope and element that together name an audio object property
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioObjectPropertyAddress {
    /// Property selector
    pub mSelector: u32,
    /// Property scope
    pub mScope: u32,
    /// Property element
    pub mElement: u32,
}

const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*code)
}

/// The audio system object that owns device-independent properties
pub const kAudioObjectSystemObject: AudioObjectID = 1;
/// Returned in place of a device id when no device matches
pub const kAudioObjectUnknown: AudioObjectID = 0;
/// Default output device of the system object
pub const kAudioHardwarePropertyDefaultOutputDevice: u32 = fourcc(b"dOut");
/// Virtual main volume across all channels of a device
pub const kAudioHardwareServiceDeviceProperty_VirtualMainVolume: u32 = fourcc(b"vmvc");
/// Global scope
pub const kAudioObjectPropertyScopeGlobal: u32 = fourcc(b"glob");
/// Output scope of a device
pub const kAudioDevicePropertyScopeOutput: u32 = fourcc(b"outp");
/// Main element
pub const kAudioObjectPropertyElementMain: u32 = 0;

/// Address of the system default output device property
pub const DEFAULT_OUTPUT_DEVICE_ADDRESS: AudioObjectPropertyAddress = AudioObjectPropertyAddress {
    mSelector: kAudioHardwarePropertyDefaultOutputDevice,
    mScope: kAudioObjectPropertyScopeGlobal,
    mElement: kAudioObjectPropertyElementMain,
};

/// Address of a device's virtual main output volume
pub const VIRTUAL_MAIN_VOLUME_ADDRESS: AudioObjectPropertyAddress = AudioObjectPropertyAddress {
    mSelector: kAudioHardwareServiceDeviceProperty_VirtualMainVolume,
    mScope: kAudioDevicePropertyScopeOutput,
    mElement: kAudioObjectPropertyElementMain,
};

#[cfg(target_os = "macos")]
type AudioObjectPropertyListenerProc = unsafe extern "C" fn(
    AudioObjectID,
    u32,
    *const AudioObjectPropertyAddress,
    *mut c_void,
) -> i32;

#[cfg(target_os = "macos")]
#[link(name = "CoreAudio", kind = "framework")]
unsafe extern "C" {
    fn AudioObjectGetPropertyData(
        inObjectID: AudioObjectID,
        inAddress: *const AudioObjectPropertyAddress,
        inQualifierDataSize: u32,
        inQualifierData: *const c_void,
        ioDataSize: *mut u32,
        outData: *mut c_void,
    ) -> i32;

    fn AudioObjectSetPropertyData(
        inObjectID: AudioObjectID,
        inAddress: *const AudioObjectPropertyAddress,
        inQualifierDataSize: u32,
        inQualifierData: *const c_void,
        inDataSize: u32,
        inData: *const c_void,
    ) -> i32;

    fn AudioObjectAddPropertyListener(
        inObjectID: AudioObjectID,
        inAddress: *const AudioObjectPropertyAddress,
        inListener: AudioObjectPropertyListenerProc,
        inClientData: *mut c_void,
    ) -> i32;

    fn AudioObjectRemovePropertyListener(
        inObjectID: AudioObjectID,
        inAddress: *const AudioObjectPropertyAddress,
        inListener: AudioObjectPropertyListenerProc,
        inClientData: *mut c_void,
    ) -> i32;
}

/// Read a fixed-size property value.
///
/// # Safety
///
/// `T` must be the plain-data type CoreAudio stores for `address`
/// (`AudioObjectID` for device selectors, `f32` for volume scalars).
#[cfg(target_os = "macos")]
#[expect(unsafe_code, reason = "CoreAudio FFI")]
unsafe fn get_property<T: Copy + Default>(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
) -> std::result::Result<T, OsStatus> {
    let mut value = T::default();
    #[expect(
        clippy::cast_possible_truncation,
        reason = "property payloads are 4 bytes"
    )]
    let mut size = std::mem::size_of::<T>() as u32;
    let status = unsafe {
        AudioObjectGetPropertyData(
            object,
            address,
            0,
            std::ptr::null(),
            &raw mut size,
            (&raw mut value).cast::<c_void>(),
        )
    };
    if status == 0 {
        Ok(value)
    } else {
        Err(OsStatus(status))
    }
}

/// Write a fixed-size property value.
///
/// # Safety
///
/// Same contract as [`get_property`].
#[cfg(target_os = "macos")]
#[expect(unsafe_code, reason = "CoreAudio FFI")]
unsafe fn set_property<T: Copy>(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
    value: T,
) -> std::result::Result<(), OsStatus> {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "property payloads are 4 bytes"
    )]
    let size = std::mem::size_of::<T>() as u32;
    let status = unsafe {
        AudioObjectSetPropertyData(
            object,
            address,
            0,
            std::ptr::null(),
            size,
            (&raw const value).cast::<c_void>(),
        )
    };
    if status == 0 { Ok(()) } else { Err(OsStatus(status)) }
}

/// State handed to CoreAudio as listener client data
///
/// `AudioObjectRemovePropertyListener` does not wait for a callback already
/// running on the HAL notification thread, so the context is never freed.
/// Removal disarms it instead: the notifier (and everything it captures) is
/// dropped, and a late callback finds nothing to call. What stays behind is
/// one mutex-sized allocation per removed listener.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
struct ListenerContext {
    notify: Mutex<Option<ChangeNotifier>>,
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
impl ListenerContext {
    fn new(notify: ChangeNotifier) -> Self {
        Self {
            notify: Mutex::new(Some(notify)),
        }
    }

    fn notify(&self) {
        // Clone out so the notifier runs without holding the lock
        let notify = self.notify.lock().clone();
        if let Some(notify) = notify {
            notify();
        }
    }

    fn disarm(&self) {
        self.notify.lock().take();
    }
}

/// Runs on a CoreAudio notification thread.
#[cfg(target_os = "macos")]
#[expect(unsafe_code, reason = "CoreAudio listener callback")]
unsafe extern "C" fn property_listener(
    _object: AudioObjectID,
    _address_count: u32,
    _addresses: *const AudioObjectPropertyAddress,
    client_data: *mut c_void,
) -> i32 {
    // SAFETY: client_data is a ListenerContext leaked in add_listener and never freed.
    let context = unsafe { &*client_data.cast::<ListenerContext>() };
    context.notify();
    0
}

/// Listener registration that can cross threads inside a `ListenerGuard`
#[cfg(target_os = "macos")]
struct Registration {
    object: AudioObjectID,
    address: AudioObjectPropertyAddress,
    context: &'static ListenerContext,
}

#[cfg(target_os = "macos")]
impl Registration {
    #[expect(unsafe_code, reason = "CoreAudio FFI")]
    fn add(
        object: AudioObjectID,
        address: AudioObjectPropertyAddress,
        notify: ChangeNotifier,
    ) -> Result<Self> {
        let context: &'static ListenerContext = Box::leak(Box::new(ListenerContext::new(notify)));
        let status = unsafe {
            AudioObjectAddPropertyListener(
                object,
                &raw const address,
                property_listener,
                std::ptr::from_ref(context).cast_mut().cast::<c_void>(),
            )
        };

        if status != 0 {
            context.disarm();
            return Err(IslandError::ListenerRegistrationFailed(Box::new(OsStatus(
                status,
            ))));
        }

        debug!("Registered listener on audio object {object}");
        Ok(Self {
            object,
            address,
            context,
        })
    }

    #[expect(unsafe_code, reason = "CoreAudio FFI")]
    fn remove(self) {
        let status = unsafe {
            AudioObjectRemovePropertyListener(
                self.object,
                &raw const self.address,
                property_listener,
                std::ptr::from_ref(self.context).cast_mut().cast::<c_void>(),
            )
        };
        if status == 0 {
            debug!("Removed listener from audio object {}", self.object);
        } else {
            warn!(
                "Failed to remove listener from audio object {}: {}",
                self.object,
                OsStatus(status)
            );
        }
        self.context.disarm();
    }
}

/// Audio hardware backed by the CoreAudio HAL
///
/// On platforms other than macOS every call fails with
/// [`crate::error::IslandError::UnsupportedPlatform`] wrapped in the matching
/// resolution, read or write error.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoreAudioHardware;

impl CoreAudioHardware {
    /// Create the CoreAudio backend
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "macos")]
#[expect(unsafe_code, reason = "CoreAudio FFI")]
impl AudioHardware for CoreAudioHardware {
    fn default_output_device(&self) -> Result<AudioDeviceId> {
        // SAFETY: the default output device property holds an AudioObjectID.
        let device: AudioObjectID =
            unsafe { get_property(kAudioObjectSystemObject, &DEFAULT_OUTPUT_DEVICE_ADDRESS) }
                .map_err(|e| {
                    IslandError::DeviceResolutionFailed(DeviceKind::OutputDevice, Box::new(e))
                })?;

        if device == kAudioObjectUnknown {
            return Err(IslandError::DeviceResolutionFailed(
                DeviceKind::OutputDevice,
                StringError::new("no default output device is set"),
            ));
        }

        Ok(AudioDeviceId(device))
    }

    fn volume(&self, device: AudioDeviceId) -> Result<f32> {
        // SAFETY: the virtual main volume is a Float32 scalar.
        unsafe { get_property::<f32>(device.0, &VIRTUAL_MAIN_VOLUME_ADDRESS) }
            .map_err(|e| IslandError::PropertyReadFailed(Property::Volume, Box::new(e)))
    }

    fn set_volume(&self, device: AudioDeviceId, volume: f32) -> Result<()> {
        // SAFETY: the virtual main volume is a Float32 scalar.
        unsafe { set_property(device.0, &VIRTUAL_MAIN_VOLUME_ADDRESS, volume) }
            .map_err(|e| IslandError::PropertyWriteFailed(Property::Volume, Box::new(e)))
    }

    fn add_volume_listener(
        &self,
        device: AudioDeviceId,
        notify: ChangeNotifier,
    ) -> Result<ListenerGuard> {
        let registration = Registration::add(device.0, VIRTUAL_MAIN_VOLUME_ADDRESS, notify)?;
        Ok(ListenerGuard::new(move || registration.remove()))
    }

    fn add_default_device_listener(&self, notify: ChangeNotifier) -> Result<ListenerGuard> {
        let registration =
            Registration::add(kAudioObjectSystemObject, DEFAULT_OUTPUT_DEVICE_ADDRESS, notify)?;
        Ok(ListenerGuard::new(move || registration.remove()))
    }
}

#[cfg(not(target_os = "macos"))]
impl AudioHardware for CoreAudioHardware {
    fn default_output_device(&self) -> Result<AudioDeviceId> {
        Err(unsupported::resolution())
    }

    fn volume(&self, _device: AudioDeviceId) -> Result<f32> {
        Err(unsupported::read())
    }

    fn set_volume(&self, _device: AudioDeviceId, _volume: f32) -> Result<()> {
        Err(unsupported::write())
    }

    fn add_volume_listener(
        &self,
        _device: AudioDeviceId,
        _notify: ChangeNotifier,
    ) -> Result<ListenerGuard> {
        Err(crate::error::IslandError::ListenerRegistrationFailed(
            Box::new(unsupported::platform()),
        ))
    }

    fn add_default_device_listener(&self, _notify: ChangeNotifier) -> Result<ListenerGuard> {
        Err(crate::error::IslandError::ListenerRegistrationFailed(
            Box::new(unsupported::platform()),
        ))
    }
}

#[cfg(not(target_os = "macos"))]
mod unsupported {
    use crate::error::{DeviceKind, IslandError, Property};

    pub(super) fn platform() -> IslandError {
        IslandError::UnsupportedPlatform(DeviceKind::OutputDevice)
    }

    pub(super) fn resolution() -> IslandError {
        IslandError::DeviceResolutionFailed(DeviceKind::OutputDevice, Box::new(platform()))
    }

    pub(super) fn read() -> IslandError {
        IslandError::PropertyReadFailed(Property::Volume, Box::new(platform()))
    }

    pub(super) fn write() -> IslandError {
        IslandError::PropertyWriteFailed(Property::Volume, Box::new(platform()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_match_headers() {
        assert_eq!(kAudioHardwarePropertyDefaultOutputDevice, 0x644F_7574);
        assert_eq!(kAudioHardwareServiceDeviceProperty_VirtualMainVolume, 0x766D_7663);
        assert_eq!(kAudioObjectPropertyScopeGlobal, 0x676C_6F62);
        assert_eq!(kAudioDevicePropertyScopeOutput, 0x6F75_7470);
    }

    #[test]
    fn test_property_address_layout() {
        assert_eq!(std::mem::size_of::<AudioObjectPropertyAddress>(), 12);
        assert_eq!(VIRTUAL_MAIN_VOLUME_ADDRESS.mScope, kAudioDevicePropertyScopeOutput);
        assert_eq!(DEFAULT_OUTPUT_DEVICE_ADDRESS.mScope, kAudioObjectPropertyScopeGlobal);
    }

    #[test]
    fn test_disarmed_context_ignores_late_callbacks() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let notify: ChangeNotifier = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let context = ListenerContext::new(notify);

        context.notify();
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        context.disarm();
        context.notify();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        // The notifier and its captures are released at disarm time
        assert_eq!(Arc::strong_count(&fired), 1);
    }

    #[test]
    #[cfg(not(target_os = "macos"))]
    fn test_unsupported_platform_fails_resolution() {
        use crate::error::{DeviceKind, IslandError};

        let result = CoreAudioHardware::new().default_output_device();
        assert!(matches!(
            result,
            Err(IslandError::DeviceResolutionFailed(DeviceKind::OutputDevice, _))
        ));
    }
}
