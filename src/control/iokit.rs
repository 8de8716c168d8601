//! IOKit display brightness bindings
//!
//! Brightness is exposed by the `IODisplayConnect` service of the built-in
//! panel as the float display parameter named `brightness`.

#![allow(non_snake_case)]

use crate::control::backend::{DisplayHandle, DisplayHardware};
use crate::error::Result;

#[cfg(target_os = "macos")]
use crate::error::{DeviceKind, IslandError, OsStatus, Property, StringError};
#[cfg(target_os = "macos")]
use core_foundation::base::TCFType;
#[cfg(target_os = "macos")]
use core_foundation::string::{CFString, CFStringRef};
#[cfg(target_os = "macos")]
use std::ffi::{CStr, c_char, c_void};
#[cfg(target_os = "macos")]
use tracing::warn;

/// IOKit service class that carries display parameters
pub const DISPLAY_SERVICE_CLASS: &str = "IODisplayConnect";

/// Display parameter key for backlight brightness
pub const BRIGHTNESS_PARAMETER_KEY: &str = "brightness";

/// Default main port (`MACH_PORT_NULL`)
#[cfg(target_os = "macos")]
const kIOMainPortDefault: u32 = 0;

#[cfg(target_os = "macos")]
const DISPLAY_SERVICE_CLASS_C: &CStr = c"IODisplayConnect";

#[cfg(target_os = "macos")]
#[link(name = "IOKit", kind = "framework")]
unsafe extern "C" {
    fn IOServiceMatching(name: *const c_char) -> *mut c_void;
    fn IOServiceGetMatchingService(mainPort: u32, matching: *mut c_void) -> u32;
    fn IODisplayGetFloatParameter(
        service: u32,
        options: u32,
        parameterName: CFStringRef,
        value: *mut f32,
    ) -> i32;
    fn IODisplaySetFloatParameter(
        service: u32,
        options: u32,
        parameterName: CFStringRef,
        value: f32,
    ) -> i32;
    fn IOObjectRelease(object: u32) -> i32;
}

#[cfg(target_os = "macos")]
#[expect(unsafe_code, reason = "IOKit FFI")]
fn release_service(service: u32) {
    let status = unsafe { IOObjectRelease(service) };
    if status != 0 {
        warn!("Failed to release display service {service}: {}", OsStatus(status));
    }
}

/// Display brightness backed by IOKit display parameters
///
/// Apple silicon machines and external monitors often have no
/// `IODisplayConnect` service; resolution then fails and the facade falls
/// back. On platforms other than macOS every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct IoKitDisplay;

impl IoKitDisplay {
    /// Create the IOKit backend
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "macos")]
#[expect(unsafe_code, reason = "IOKit FFI")]
impl DisplayHardware for IoKitDisplay {
    fn primary_display(&self) -> Result<DisplayHandle> {
        // IOServiceGetMatchingService consumes the matching dictionary reference.
        let service = unsafe {
            let matching = IOServiceMatching(DISPLAY_SERVICE_CLASS_C.as_ptr());
            if matching.is_null() {
                return Err(IslandError::DeviceResolutionFailed(
                    DeviceKind::Display,
                    StringError::new("IOServiceMatching returned no dictionary"),
                ));
            }
            IOServiceGetMatchingService(kIOMainPortDefault, matching)
        };

        if service == 0 {
            return Err(IslandError::DeviceResolutionFailed(
                DeviceKind::Display,
                StringError::new(format!("no {DISPLAY_SERVICE_CLASS} service found")),
            ));
        }

        Ok(DisplayHandle::new(service, move || release_service(service)))
    }

    fn brightness(&self, display: &DisplayHandle) -> Result<f32> {
        let key = CFString::from_static_string(BRIGHTNESS_PARAMETER_KEY);
        let mut value = 0.0_f32;
        let status = unsafe {
            IODisplayGetFloatParameter(
                display.raw(),
                0,
                key.as_concrete_TypeRef(),
                &raw mut value,
            )
        };
        if status == 0 {
            Ok(value)
        } else {
            Err(IslandError::PropertyReadFailed(
                Property::Brightness,
                Box::new(OsStatus(status)),
            ))
        }
    }

    fn set_brightness(&self, display: &DisplayHandle, brightness: f32) -> Result<()> {
        let key = CFString::from_static_string(BRIGHTNESS_PARAMETER_KEY);
        let status = unsafe {
            IODisplaySetFloatParameter(display.raw(), 0, key.as_concrete_TypeRef(), brightness)
        };
        if status == 0 {
            Ok(())
        } else {
            Err(IslandError::PropertyWriteFailed(
                Property::Brightness,
                Box::new(OsStatus(status)),
            ))
        }
    }
}

#[cfg(not(target_os = "macos"))]
impl DisplayHardware for IoKitDisplay {
    fn primary_display(&self) -> Result<DisplayHandle> {
        use crate::error::{DeviceKind, IslandError};

        Err(IslandError::DeviceResolutionFailed(
            DeviceKind::Display,
            Box::new(IslandError::UnsupportedPlatform(DeviceKind::Display)),
        ))
    }

    fn brightness(&self, _display: &DisplayHandle) -> Result<f32> {
        use crate::error::{DeviceKind, IslandError, Property};

        Err(IslandError::PropertyReadFailed(
            Property::Brightness,
            Box::new(IslandError::UnsupportedPlatform(DeviceKind::Display)),
        ))
    }

    fn set_brightness(&self, _display: &DisplayHandle, _brightness: f32) -> Result<()> {
        use crate::error::{DeviceKind, IslandError, Property};

        Err(IslandError::PropertyWriteFailed(
            Property::Brightness,
            Box::new(IslandError::UnsupportedPlatform(DeviceKind::Display)),
        ))
    }
}
