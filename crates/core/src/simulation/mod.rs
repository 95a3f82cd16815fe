//! Mixtures and their kinetics
//!
//! A [`Mixture`] holds concentrations, temperature and phase state. Ticking
//! it against a [`Catalog`](crate::catalog::Catalog) applies every viable
//! reaction once:
//! - `tick`: rate ranking, limiting reagents, equilibrium detection
//! - `heat`: temperature and phase changes
//! - `items`: whole-item dissolution and the partially-dissolved pool
//! - `mixing`: mixing, volume correction, phase separation, result payouts
//! - `basin`: reacting to equilibrium, alone or in parallel batches
//! - `persistence`: records for saving and loading

pub mod basin;
pub mod config;
mod heat;
mod items;
mod mixing;
pub(crate) mod mixture;
pub mod persistence;
mod tick;

pub use basin::{react_batch, Basin, BasinOutcome};
pub use config::{EquilibriumTolerance, KineticsConfig, TICKS_PER_SECOND};
pub use mixing::PhaseSplit;
pub use mixture::Mixture;
pub use persistence::{ContentRecord, DissolvedRecord, MixtureRecord, ReactionRecord, ResultRecord};

use crate::core_types::items::ItemStack;
use crate::core_types::units::Kelvin;

/// Surroundings supplied to a tick
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactionContext<'a> {
    /// Whole item stacks available as catalysts
    pub items: &'a [ItemStack],
    /// UV intensity; reactions needing UV scale their rate by it
    pub uv_power: f64,
    pub electrolysing: bool,
}

impl<'a> ReactionContext<'a> {
    pub fn with_items(items: &'a [ItemStack]) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn with_uv(mut self, uv_power: f64) -> Self {
        self.uv_power = uv_power;
        self
    }

    pub fn electrolysing(mut self) -> Self {
        self.electrolysing = true;
        self
    }
}

/// Heat supplied to a basin and the temperature it loses heat towards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatExchange {
    /// W
    pub power: f64,
    pub ambient: Kelvin,
}
