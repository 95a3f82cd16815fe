//! Core types: species, reactions, items and units

pub mod items;
pub mod reaction;
pub mod result;
pub mod species;
pub mod structure;
pub mod units;

pub use items::{ItemId, ItemMatcher, ItemRequirement, ItemStack};
pub use reaction::{ItemProduct, RateOrder, Reaction, ReactionId, ReactionKey, Stoichiometry};
pub use result::{CompletedResult, NovelCompoundSynthesized, ReactionResult, ResultKey};
pub use species::{Species, SpeciesId, SpeciesTag};
pub use structure::{
    FunctionalGroup, GroupType, NoStructures, StructuralCode, StructureDescription,
    StructureInterpreter, StructureTable,
};
pub use units::{Celsius, Kelvin, Liters};
