//! Liquid/gas phase boundaries
//!
//! Heating a mixture stops at the nearest boiling point above the current
//! temperature until that species has vaporized; cooling stops at the nearest
//! boiling point below until it has condensed. This module finds those two
//! boundaries.

use crate::core_types::species::{Species, SpeciesId};

/// Lowest temperature a mixture may reach (K)
pub const TEMPERATURE_FLOOR: f64 = 0.0001;

/// A species whose boiling point bounds the current temperature
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PhaseBoundary {
    pub temperature: f64,
    pub species: SpeciesId,
}

/// Nearest boiling points above and below the mixture temperature
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct BoilingPoints {
    pub next_higher: Option<PhaseBoundary>,
    pub next_lower: Option<PhaseBoundary>,
}

impl BoilingPoints {
    /// Scan `(species, gas fraction)` pairs for the bounding boiling points
    ///
    /// A species boiling exactly at `temperature` bounds heating while any of
    /// it is still liquid, and cooling while any of it is gas.
    pub(crate) fn scan<'a>(
        states: impl IntoIterator<Item = (&'a Species, f64)>,
        temperature: f64,
    ) -> Self {
        let mut higher: Option<PhaseBoundary> = None;
        let mut lower: Option<PhaseBoundary> = None;

        for (s, gas_fraction) in states {
            let bp = *s.boiling_point();
            if !bp.is_finite() {
                continue;
            }
            let at_current = bp == temperature;

            let beats_higher = higher.as_ref().map_or(true, |h| bp < h.temperature);
            if beats_higher && (bp > temperature || (at_current && gas_fraction < 1.0)) {
                higher = Some(PhaseBoundary {
                    temperature: bp,
                    species: s.id().clone(),
                });
            }

            let beats_lower = lower.as_ref().map_or(true, |l| bp > l.temperature);
            if beats_lower && (bp < temperature || (at_current && gas_fraction > 0.0)) {
                lower = Some(PhaseBoundary {
                    temperature: bp,
                    species: s.id().clone(),
                });
            }
        }

        Self {
            next_higher: higher,
            next_lower: lower,
        }
    }
}

/// Energy exchanged with the surroundings in one tick (J)
///
/// # Arguments
/// * `heating_power` - W supplied by the vessel
/// * `ambient` - surrounding temperature (K)
/// * `temperature` - mixture temperature (K)
/// * `conductance` - W/K lost or gained through the walls
/// * `ticks_per_second` - simulation tick rate
pub(crate) fn heat_exchange_per_tick(
    heating_power: f64,
    ambient: f64,
    temperature: f64,
    conductance: f64,
    ticks_per_second: f64,
) -> f64 {
    if ticks_per_second <= 0.0 {
        return 0.0;
    }
    (heating_power + (ambient - temperature) * conductance) / ticks_per_second
}
