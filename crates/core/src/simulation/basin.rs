//! Reacting a mixture to equilibrium in an open basin

use rayon::prelude::*;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::core_types::items::ItemStack;
use crate::core_types::result::CompletedResult;
use crate::core_types::units::Liters;
use crate::physics::phase::heat_exchange_per_tick;
use crate::simulation::{HeatExchange, Mixture, ReactionContext};

/// Heat exchanges smaller than this (J) are skipped
const NEGLIGIBLE_ENERGY: f64 = 1e-4;

/// What reacting to equilibrium produced
#[derive(Debug, Clone)]
pub struct BasinOutcome {
    pub ticks: u32,
    pub results: Vec<CompletedResult>,
    /// Volume after correcting for the final composition
    pub volume: Liters,
}

/// One independent mixture for [`react_batch`]
#[derive(Debug, Clone)]
pub struct Basin {
    pub mixture: Mixture,
    pub volume: Liters,
    pub items: Vec<ItemStack>,
    pub heating: Option<HeatExchange>,
}

impl Mixture {
    /// Tick until equilibrium or the configured tick cap
    ///
    /// Each tick exchanges heat with the surroundings (if `heating` is
    /// given), runs the dissolution pass over `items`, reacts, then lets
    /// dissolved items precipitate back into `items`. If no tick was needed
    /// the volume comes back unchanged with no results.
    pub fn react_to_equilibrium(
        &mut self,
        catalog: &Catalog,
        volume: Liters,
        items: &mut Vec<ItemStack>,
        heating: Option<HeatExchange>,
    ) -> BasinOutcome {
        let liters = *volume;
        let max_ticks = self.config.max_equilibrium_ticks;
        let mut ticks = 0;

        while !self.equilibrium && ticks < max_ticks {
            if let Some(exchange) = heating {
                let energy = heat_exchange_per_tick(
                    exchange.power,
                    *exchange.ambient,
                    self.temperature,
                    self.config.basin_conductance,
                    self.config.ticks_per_second,
                );
                if energy.abs() > NEGLIGIBLE_ENERGY && liters > 0.0 {
                    self.heat(energy / liters);
                }
            }

            self.dissolve_items(catalog, items, volume, 0.0, false);
            self.tick_once(catalog, &ReactionContext::with_items(items));
            self.precipitate(items, volume);
            ticks += 1;
        }

        if ticks == 0 {
            return BasinOutcome {
                ticks,
                results: Vec::new(),
                volume,
            };
        }

        let new_volume = self.recalculate_volume(volume);
        let results = self.completed_results(new_volume);
        if ticks >= max_ticks && !self.equilibrium {
            info!("Gave up reacting to equilibrium after {} ticks", ticks);
        } else {
            debug!(
                "Reached equilibrium in {} ticks ({} L -> {} L, {} results)",
                ticks,
                volume,
                new_volume,
                results.len()
            );
        }

        BasinOutcome {
            ticks,
            results,
            volume: new_volume,
        }
    }
}

/// React independent basins to equilibrium in parallel
///
/// Each basin's volume is updated to the corrected volume. Outcomes come
/// back in the same order as `basins`.
pub fn react_batch(catalog: &Catalog, basins: &mut [Basin]) -> Vec<BasinOutcome> {
    basins
        .par_iter_mut()
        .map(|basin| {
            let outcome = basin.mixture.react_to_equilibrium(
                catalog,
                basin.volume,
                &mut basin.items,
                basin.heating,
            );
            basin.volume = outcome.volume;
            outcome
        })
        .collect()
}
