//! Semantic unit types for the quantities that cross the mixture API
//!
//! Temperatures and volumes are wrapped so that a Celsius boiling point can
//! never be handed to a routine expecting Kelvin, and so a vessel volume in
//! liters cannot be confused with a concentration. Concentrations stay plain
//! `f64` (mol/L) because the tick engine does arithmetic on them constantly.
//!
//! # Usage
//! ```
//! use mixture_sim_core::core_types::units::{Celsius, Kelvin};
//!
//! let boiling: Kelvin = Celsius::new(100.0).into();
//! assert!((*boiling - 373.15).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Deref, Mul, Sub};

/// Compare f64 values with total ordering (NaN sorts above everything)
#[inline]
fn f64_total_cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

// ============================================================================
// TEMPERATURE
// ============================================================================

/// Temperature in degrees Celsius
///
/// Only used at the authoring boundary (boiling points are usually quoted in
/// Celsius); everything inside the engine runs in [`Kelvin`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Celsius(f64);

impl Eq for Celsius {}

impl PartialOrd for Celsius {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Celsius {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Celsius {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Celsius {
    /// Offset between the Celsius and Kelvin scales
    pub const CELSIUS_KELVIN_OFFSET: f64 = 273.15;

    /// Create a new Celsius temperature. Asserts value >= absolute zero.
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(
            value >= -Self::CELSIUS_KELVIN_OFFSET,
            "Celsius::new: value is below absolute zero (-273.15°C)"
        );
        Celsius(value)
    }

    /// Convert to Kelvin
    #[inline]
    #[must_use]
    pub fn to_kelvin(self) -> Kelvin {
        Kelvin::new(self.0 + Self::CELSIUS_KELVIN_OFFSET)
    }
}

impl From<Celsius> for Kelvin {
    fn from(c: Celsius) -> Self {
        c.to_kelvin()
    }
}

impl fmt::Display for Celsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°C", self.0)
    }
}

/// Temperature in Kelvin (absolute scale)
///
/// `Kelvin(f64::INFINITY)` is a valid value and is how "never boils" is
/// represented for species without a boiling point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kelvin(f64);

impl Eq for Kelvin {}

impl PartialOrd for Kelvin {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Kelvin {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Kelvin {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Kelvin {
    /// Absolute zero
    pub const ABSOLUTE_ZERO: Kelvin = Kelvin(0.0);

    /// Standard reference temperature used for fresh and deserialized mixtures
    pub const REFERENCE: Kelvin = Kelvin(298.0);

    /// Boiling point of species that never vaporize
    pub const NEVER: Kelvin = Kelvin(f64::INFINITY);

    /// Create a new Kelvin temperature. Asserts value >= absolute zero (0 K).
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(
            value >= 0.0,
            "Kelvin::new: value is below absolute zero (0 K)"
        );
        Kelvin(value)
    }

    /// Convert to Celsius
    #[inline]
    #[must_use]
    pub fn to_celsius(self) -> Celsius {
        Celsius::new(self.0 - Celsius::CELSIUS_KELVIN_OFFSET)
    }

    /// Whether this is a real, reachable temperature
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl From<Kelvin> for f64 {
    fn from(k: Kelvin) -> f64 {
        k.0
    }
}

impl fmt::Display for Kelvin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}K", self.0)
    }
}

// ============================================================================
// VOLUME
// ============================================================================

/// Volume in liters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Liters(f64);

impl Eq for Liters {}

impl PartialOrd for Liters {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Liters {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Liters {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Liters {
    /// Empty volume
    pub const ZERO: Liters = Liters(0.0);

    /// Create a new volume. Asserts value is non-negative.
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "Liters::new: volume cannot be negative");
        Liters(value)
    }
}

impl Add for Liters {
    type Output = Liters;
    fn add(self, rhs: Liters) -> Liters {
        Liters(self.0 + rhs.0)
    }
}

impl Sub for Liters {
    type Output = Liters;
    fn sub(self, rhs: Liters) -> Liters {
        Liters((self.0 - rhs.0).max(0.0))
    }
}

impl Mul<f64> for Liters {
    type Output = Liters;
    fn mul(self, rhs: f64) -> Liters {
        Liters((self.0 * rhs).max(0.0))
    }
}

impl fmt::Display for Liters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}L", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_celsius_kelvin_conversion() {
        let water: Kelvin = Celsius::new(100.0).into();
        assert!((*water - 373.15).abs() < 1e-9);
        assert!((*water.to_celsius() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_never_boiling_sorts_last() {
        let mut temps = vec![Kelvin::NEVER, Kelvin::new(350.0), Kelvin::REFERENCE];
        temps.sort();
        assert_eq!(temps[0], Kelvin::REFERENCE);
        assert_eq!(temps[2], Kelvin::NEVER);
        assert!(!Kelvin::NEVER.is_finite());
    }

    #[test]
    #[should_panic(expected = "below absolute zero")]
    fn test_kelvin_rejects_negative() {
        let _ = Kelvin::new(-1.0);
    }

    #[test]
    fn test_liters_saturate_at_zero() {
        assert_eq!(Liters::new(0.25) + Liters::new(0.5), Liters::new(0.75));
        assert_eq!(Liters::new(1.0) - Liters::new(2.0), Liters::ZERO);
    }
}
