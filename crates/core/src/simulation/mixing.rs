//! Combining, splitting and resizing mixtures
//!
//! Everything here conserves moles. Mixing also conserves energy: the
//! combined mixture starts all-liquid at 0 K and is heated by the pooled
//! internal energy, so phase changes come out of the same heat procedure.

use std::sync::Arc;

use tracing::debug;

use crate::core_types::items::ItemId;
use crate::core_types::result::{CompletedResult, ResultKey};
use crate::core_types::species::{Species, SpeciesId};
use crate::core_types::units::Liters;
use crate::physics::phase::TEMPERATURE_FLOOR;
use crate::simulation::mixture::{AccumulatedResult, DissolvedItem};
use crate::simulation::Mixture;
use crate::FxIndexMap;

/// The two phases of a mixture after [`Mixture::separate_phases`]
#[derive(Debug, Clone)]
pub struct PhaseSplit {
    pub gas: Mixture,
    pub gas_volume: Liters,
    pub liquid: Mixture,
    pub liquid_volume: Liters,
}

impl Mixture {
    /// Combine mixtures given with their volumes
    ///
    /// No inputs gives an empty mixture; a single input is returned as is.
    pub fn mix(mut mixtures: Vec<(Mixture, f64)>) -> Mixture {
        match mixtures.len() {
            0 => return Mixture::new(),
            1 => {
                if let Some((only, _)) = mixtures.pop() {
                    return only;
                }
            }
            _ => {}
        }

        let mut moles: FxIndexMap<SpeciesId, (Arc<Species>, f64)> = FxIndexMap::default();
        let mut results: FxIndexMap<ResultKey, AccumulatedResult> = FxIndexMap::default();
        let mut dissolved: FxIndexMap<ItemId, DissolvedItem> = FxIndexMap::default();
        let mut total_amount = 0.0;
        let mut total_energy = 0.0;

        for (mixture, amount) in &mixtures {
            let amount = amount.max(0.0);
            total_amount += amount;
            total_energy += mixture.internal_energy() * amount;

            for (id, constituent) in &mixture.contents {
                moles
                    .entry(id.clone())
                    .or_insert_with(|| (Arc::clone(&constituent.species), 0.0))
                    .1 += constituent.concentration * amount;
            }
            for (key, result) in &mixture.results {
                results
                    .entry(key.clone())
                    .or_insert_with(|| AccumulatedResult {
                        moles_per_liter: 0.0,
                        ..result.clone()
                    })
                    .moles_per_liter += result.moles_per_liter * amount;
            }
            for (id, item) in &mixture.dissolved {
                dissolved
                    .entry(id.clone())
                    .or_insert_with(|| DissolvedItem {
                        tags: item.tags.clone(),
                        amount: 0.0,
                    })
                    .amount += item.amount * amount;
            }
        }

        let first = &mixtures[0].0;
        let mut mixed = Mixture::with_config(first.config.clone());
        if mixtures.iter().all(|(m, _)| m.translation_key == first.translation_key) {
            mixed.translation_key.clone_from(&first.translation_key);
        }
        if total_amount <= 0.0 {
            return mixed;
        }

        mixed.temperature = 0.0;
        for (species, species_moles) in moles.into_values() {
            if species_moles > 0.0 {
                mixed.change_concentration(&species, species_moles / total_amount, false);
            }
        }
        for constituent in mixed.contents.values_mut() {
            constituent.gas_fraction = 0.0;
        }
        for (key, mut result) in results {
            result.moles_per_liter /= total_amount;
            mixed.results.insert(key, result);
        }
        for (id, mut item) in dissolved {
            item.amount /= total_amount;
            mixed.dissolved.insert(id, item);
        }

        mixed.composition_changed();
        mixed.heat(total_energy / total_amount);
        mixed.temperature = mixed.temperature.max(TEMPERATURE_FLOOR);
        mixed.equilibrium = false;
        debug!(
            "Mixed {} mixtures into {} species at {:.2} K",
            mixtures.len(),
            mixed.contents.len(),
            mixed.temperature
        );
        mixed
    }

    /// Correct concentrations for the volume the species actually occupy
    ///
    /// `initial_volume` is the volume the concentrations were naively
    /// computed for. Returns the true volume, or zero for an empty mixture.
    pub fn recalculate_volume(&mut self, initial_volume: Liters) -> Liters {
        if self.is_empty() {
            return Liters::ZERO;
        }
        let initial = *initial_volume;
        let volume: f64 = self
            .contents
            .values()
            .filter(|c| c.species.pure_concentration() > 0.0)
            .map(|c| c.concentration * initial / c.species.pure_concentration())
            .sum();
        if volume <= 0.0 || !volume.is_finite() {
            return initial_volume;
        }

        let factor = volume / initial;
        self.scale(factor);
        Liters::new(volume)
    }

    /// Split into gas and liquid phases
    ///
    /// The gas phase is given a nominal volume of one liter. Accumulated
    /// results are shared between the phases by volume; dissolved items stay
    /// in the liquid.
    pub fn separate_phases(&self, initial_volume: Liters) -> PhaseSplit {
        let initial = *initial_volume;
        let gas_volume = 1.0;
        let mut gas = Mixture::with_config(self.config.clone());
        let mut liquid = Mixture::with_config(self.config.clone());

        let mut liquid_volume = 0.0;
        let mut liquid_moles = Vec::new();
        for constituent in self.contents.values() {
            let total = constituent.concentration * initial;
            let in_liquid = total * (1.0 - constituent.gas_fraction);
            let in_gas = total * constituent.gas_fraction;
            if in_gas > 0.0 {
                gas.change_concentration(&constituent.species, in_gas / gas_volume, false);
            }
            if in_liquid > 0.0 {
                let pure = constituent.species.pure_concentration();
                if pure > 0.0 {
                    liquid_volume += in_liquid / pure;
                }
                liquid_moles.push((Arc::clone(&constituent.species), in_liquid));
            }
        }

        let liquid_divisor = if liquid_volume > 0.0 { liquid_volume } else { 1.0 };
        for (species, moles) in liquid_moles {
            liquid.change_concentration(&species, moles / liquid_divisor, false);
        }

        let shared = liquid_volume + gas_volume;
        for (key, result) in &self.results {
            let share = result.moles_per_liter * initial / shared;
            for phase in [&mut gas, &mut liquid] {
                phase.results.insert(
                    key.clone(),
                    AccumulatedResult {
                        moles_per_liter: share,
                        ..result.clone()
                    },
                );
            }
        }
        for (id, item) in &self.dissolved {
            liquid.dissolved.insert(
                id.clone(),
                DissolvedItem {
                    tags: item.tags.clone(),
                    amount: item.amount * initial / liquid_divisor,
                },
            );
        }

        for phase in [&mut gas, &mut liquid] {
            phase.temperature = self.temperature;
            phase.equilibrium = self.equilibrium;
            phase.translation_key.clone_from(&self.translation_key);
        }
        for constituent in gas.contents.values_mut() {
            constituent.gas_fraction = 1.0;
        }
        for constituent in liquid.contents.values_mut() {
            constituent.gas_fraction = 0.0;
        }

        PhaseSplit {
            gas,
            gas_volume: Liters::new(gas_volume),
            liquid,
            liquid_volume: Liters::new(liquid_volume),
        }
    }

    /// Pay out every result that has accumulated enough in `volume`
    ///
    /// One-off results pay once and are removed. Others pay
    /// floor(volume × accumulated / required) times, keeping the remainder.
    pub fn completed_results(&mut self, volume: Liters) -> Vec<CompletedResult> {
        let liters = *volume;
        let mut completed = Vec::new();
        let mut spent = Vec::new();

        for (key, accumulated) in &mut self.results {
            if accumulated.result.is_one_off() {
                completed.push(CompletedResult {
                    key: key.clone(),
                    result: Arc::clone(&accumulated.result),
                    times: 1,
                });
                spent.push(key.clone());
                continue;
            }

            let required = accumulated.result.required_moles();
            if required <= 0.0 || liters <= 0.0 {
                continue;
            }
            let times = (liters * accumulated.moles_per_liter / required).floor();
            if times < 1.0 {
                continue;
            }
            accumulated.moles_per_liter =
                (accumulated.moles_per_liter - times * required / liters).max(0.0);
            completed.push(CompletedResult {
                key: key.clone(),
                result: Arc::clone(&accumulated.result),
                times: times.min(f64::from(u32::MAX)) as u32,
            });
        }

        for key in spent {
            self.results.shift_remove(&key);
        }
        completed
    }
}
