//! Heating, cooling and phase changes
//!
//! Temperature moves linearly with energy until it meets the nearest boiling
//! point in the direction of travel. There it holds while the energy goes
//! into vaporizing (or condensing) that species; anything left over once the
//! species has fully changed phase carries on to the next boundary.

use tracing::trace;

use crate::physics::phase::{BoilingPoints, TEMPERATURE_FLOOR};
use crate::simulation::Mixture;

impl Mixture {
    /// J/(L·K): Σ molar heat capacity × concentration
    pub fn volumetric_heat_capacity(&self) -> f64 {
        self.contents
            .values()
            .map(|c| c.species.molar_heat_capacity() * c.concentration)
            .sum()
    }

    /// J/L needed to bring the mixture from 0 K to its current state
    pub fn internal_energy(&self) -> f64 {
        self.contents
            .values()
            .map(|c| {
                let species = &c.species;
                species.molar_heat_capacity() * c.concentration * self.temperature
                    + species.latent_heat() * c.concentration * c.gas_fraction
            })
            .sum()
    }

    /// Add (or remove, if negative) `energy_density` J/L
    pub fn heat(&mut self, energy_density: f64) {
        if energy_density == 0.0 || !energy_density.is_finite() {
            return;
        }
        self.ensure_boiling_points();

        let mut remaining = energy_density;
        // Each full transition removes one boundary, so this always terminates
        for _ in 0..=self.contents.len() {
            match self.heat_until_boundary(remaining) {
                Some(left_over) => remaining = left_over,
                None => break,
            }
        }

        if self.temperature < TEMPERATURE_FLOOR {
            self.temperature = TEMPERATURE_FLOOR;
            self.rescan_boiling_points();
        }
    }

    /// Returns the energy left over if a species fully changed phase
    fn heat_until_boundary(&mut self, energy: f64) -> Option<f64> {
        let capacity = self.volumetric_heat_capacity();
        if capacity <= 0.0 || !capacity.is_finite() {
            return None;
        }
        let change = energy / capacity;

        if change > 0.0 {
            let boundary = self
                .boiling_points
                .next_higher
                .clone()
                .filter(|b| self.temperature + change >= b.temperature);
            let Some(boundary) = boundary else {
                self.temperature += change;
                return None;
            };

            let energy = energy - (boundary.temperature - self.temperature) * capacity;
            self.temperature = boundary.temperature;
            self.equilibrium = false;

            let constituent = self.contents.get_mut(&boundary.species)?;
            let latent = constituent.species.latent_heat();
            let to_vaporize = constituent.concentration * (1.0 - constituent.gas_fraction) * latent;

            if energy > to_vaporize || constituent.concentration * latent <= 0.0 {
                constituent.gas_fraction = 1.0;
                trace!("{} fully vaporized at {:.2} K", boundary.species, self.temperature);
                self.boiling = false;
                self.rescan_boiling_points();
                return Some(energy - to_vaporize);
            }

            constituent.gas_fraction =
                (constituent.gas_fraction + energy / (latent * constituent.concentration)).min(1.0);
            self.boiling = true;
            self.rescan_boiling_points();
            None
        } else if change < 0.0 {
            let boundary = self
                .boiling_points
                .next_lower
                .clone()
                .filter(|b| self.temperature + change < b.temperature);
            let Some(boundary) = boundary else {
                self.temperature += change;
                return None;
            };

            let energy = energy - (boundary.temperature - self.temperature) * capacity;
            self.temperature = boundary.temperature;
            self.equilibrium = false;

            let constituent = self.contents.get_mut(&boundary.species)?;
            let latent = constituent.species.latent_heat();
            let to_condense = constituent.concentration * constituent.gas_fraction * latent;

            if energy < -to_condense || constituent.concentration * latent <= 0.0 {
                constituent.gas_fraction = 0.0;
                trace!("{} fully condensed at {:.2} K", boundary.species, self.temperature);
                self.boiling = false;
                self.rescan_boiling_points();
                return Some(energy + to_condense);
            }

            constituent.gas_fraction =
                (constituent.gas_fraction + energy / (latent * constituent.concentration)).max(0.0);
            self.boiling = true;
            self.rescan_boiling_points();
            None
        } else {
            None
        }
    }

    fn rescan_boiling_points(&mut self) {
        self.boiling_points = BoilingPoints::scan(
            self.contents
                .values()
                .map(|c| (c.species.as_ref(), c.gas_fraction)),
            self.temperature,
        );
        self.boiling_points_stale = false;
    }

    pub(crate) fn ensure_boiling_points(&mut self) {
        if self.boiling_points_stale {
            self.rescan_boiling_points();
        }
    }
}
