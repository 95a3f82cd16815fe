//! Mixture Kinetics Core Library
//!
//! Simulates chemical mixtures: sets of species at concentrations, a
//! temperature and a phase state, reacting tick by tick under Arrhenius
//! kinetics with limiting-reagent resolution, heat release and boiling.
//!
//! ## Layout
//!
//! - [`catalog`]: the species registry and reaction catalog, built once and
//!   passed by reference
//! - [`generic`]: reaction templates over functional groups, specialized per
//!   mixture
//! - [`simulation`]: the [`Mixture`] and everything that ticks, heats, mixes
//!   and persists it
//! - [`core_types`]: identifiers, units, items and results
//! - [`physics`]: rate laws and phase boundaries

// Core types and utilities
pub mod core_types;
pub mod error;

// Definitions
pub mod catalog;
pub mod generic;

// Simulation
pub mod physics;
pub mod simulation;

// Re-export the types hosts touch most
pub use catalog::{Catalog, ReactionBuilder, SpeciesBuilder, SpeciesRole};
pub use core_types::{
    Celsius, ItemId, ItemMatcher, ItemStack, Kelvin, Liters, Reaction, ReactionId, Species,
    SpeciesId,
};
pub use error::{ChemistryError, PersistenceError};
pub use generic::GenericReaction;
pub use simulation::{
    react_batch, BasinOutcome, HeatExchange, KineticsConfig, Mixture, MixtureRecord,
    ReactionContext,
};

/// Insertion-ordered map with the fast non-cryptographic hasher
pub(crate) type FxIndexMap<K, V> = indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>;
