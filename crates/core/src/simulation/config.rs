//! Kinetics tuning carried by every mixture

use serde::{Deserialize, Serialize};

/// Simulation ticks per real second
pub const TICKS_PER_SECOND: f64 = 20.0;

/// How close two concentrations must be to count as unchanged
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EquilibriumTolerance {
    /// Fixed difference in mol/L
    Absolute(f64),
    /// Fraction of the sum of both values
    Relative(f64),
}

impl EquilibriumTolerance {
    /// Legacy fixed tolerance
    pub const LEGACY: Self = EquilibriumTolerance::Absolute(1e-4);

    /// |a - b| <= (a + b) / 512 / 512
    pub const DEFAULT_RELATIVE: Self = EquilibriumTolerance::Relative(1.0 / (512.0 * 512.0));

    pub fn very_close(&self, a: f64, b: f64) -> bool {
        let difference = (a - b).abs();
        match *self {
            EquilibriumTolerance::Absolute(tolerance) => difference <= tolerance,
            EquilibriumTolerance::Relative(fraction) => difference <= (a + b).abs() * fraction,
        }
    }
}

impl Default for EquilibriumTolerance {
    fn default() -> Self {
        Self::DEFAULT_RELATIVE
    }
}

/// Kinetics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticsConfig {
    pub ticks_per_second: f64,

    /// Sub-cycles per tick; each cycle runs with rates divided by this
    pub cycles_per_tick: u32,

    /// Cap on ticks spent reacting to equilibrium in a basin
    pub max_equilibrium_ticks: u32,

    pub equilibrium_tolerance: EquilibriumTolerance,

    /// Ticks a zero-concentration species lingers before it is removed
    pub removal_grace_ticks: u32,

    /// W/K exchanged with the surroundings while reacting in a basin
    pub basin_conductance: f64,
}

impl Default for KineticsConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: TICKS_PER_SECOND,
            cycles_per_tick: 1,
            max_equilibrium_ticks: 600,
            equilibrium_tolerance: EquilibriumTolerance::default(),
            removal_grace_ticks: 10,
            basin_conductance: 100.0,
        }
    }
}

impl KineticsConfig {
    /// Cycles per tick, never zero
    pub(crate) fn cycles(&self) -> u32 {
        self.cycles_per_tick.max(1)
    }
}
