//! Physical relations shared by the kinetics
//!
//! - `arrhenius`: rate constants and per-tick rates
//! - `phase`: boiling-point bounds and heat exchange with the surroundings

pub mod arrhenius;
pub mod phase;

pub use arrhenius::{GAS_CONSTANT, REFERENCE_ACTIVATION_ENERGY};
pub use phase::TEMPERATURE_FLOOR;
