//! Normalized output level shared by volume and brightness

use crate::error::IslandError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fractional hardware setting in the closed range [0.0, 1.0]
///
/// Used for both output volume and display brightness. A level is never
/// cached by the facade; it is read from or written to the hardware on every
/// call.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct OutputLevel(f32);

impl OutputLevel {
    /// Silent / fully dimmed
    pub const MIN: Self = Self(0.0);

    /// Full volume / full brightness
    pub const MAX: Self = Self(1.0);

    /// Value reported when the hardware cannot be read
    pub const FALLBACK: Self = Self(0.5);

    /// Build a level, clamping into [0.0, 1.0]. NaN maps to 0.0.
    pub fn clamped(value: f32) -> Self {
        if value.is_nan() {
            Self::MIN
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// The raw normalized value
    pub fn value(self) -> f32 {
        self.0
    }

    /// Whether `other` is within `tolerance` of this level
    pub fn approx_eq(self, other: Self, tolerance: f32) -> bool {
        (self.0 - other.0).abs() <= tolerance
    }
}

impl TryFrom<f32> for OutputLevel {
    type Error = IslandError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(IslandError::InvalidLevel(value))
        }
    }
}

impl From<OutputLevel> for f32 {
    fn from(level: OutputLevel) -> Self {
        level.0
    }
}

impl fmt::Display for OutputLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fallback_is_one_half() {
        assert!((OutputLevel::FALLBACK.value() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_try_from_rejects_out_of_range() {
        assert!(OutputLevel::try_from(0.0).is_ok());
        assert!(OutputLevel::try_from(1.0).is_ok());
        assert!(matches!(
            OutputLevel::try_from(1.01),
            Err(IslandError::InvalidLevel(_))
        ));
        assert!(OutputLevel::try_from(-0.1).is_err());
        assert!(OutputLevel::try_from(f32::NAN).is_err());
        assert!(OutputLevel::try_from(f32::INFINITY).is_err());
    }

    #[test]
    fn test_clamped_handles_nan_and_extremes() {
        assert_eq!(OutputLevel::clamped(f32::NAN), OutputLevel::MIN);
        assert_eq!(OutputLevel::clamped(-3.0), OutputLevel::MIN);
        assert_eq!(OutputLevel::clamped(7.0), OutputLevel::MAX);
        assert_eq!(OutputLevel::clamped(f32::NEG_INFINITY), OutputLevel::MIN);
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(OutputLevel::clamped(0.333).to_string(), "0.33");
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        let level: OutputLevel = serde_json::from_str("0.25").unwrap();
        assert!((level.value() - 0.25).abs() < f32::EPSILON);
        assert!(serde_json::from_str::<OutputLevel>("1.5").is_err());
    }

    proptest! {
        #[test]
        fn prop_clamped_always_in_range(value in proptest::num::f32::ANY) {
            let level = OutputLevel::clamped(value);
            prop_assert!((0.0..=1.0).contains(&level.value()));
        }

        #[test]
        fn prop_in_range_values_pass_through(value in 0.0f32..=1.0) {
            prop_assert_eq!(OutputLevel::try_from(value).unwrap().value(), value);
            prop_assert_eq!(OutputLevel::clamped(value).value(), value);
        }
    }
}
