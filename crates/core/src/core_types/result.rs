//! Reaction results: payouts once enough reaction has happened
//!
//! A mixture accumulates moles-per-liter of every reaction that carries a
//! result. The host asks for completed results after reacting and applies
//! them; the engine never performs the side effect itself.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::core_types::reaction::ReactionKey;
use crate::core_types::species::SpeciesId;

/// A payout attached to a reaction
pub trait ReactionResult: fmt::Debug + Send + Sync {
    /// Moles of reaction per liter needed for one payout
    fn required_moles(&self) -> f64;

    /// One-off results pay out once, however much reaction happened
    fn is_one_off(&self) -> bool {
        false
    }

    /// Perform the side effect `times` times
    fn apply(&self, times: u32);
}

/// What an accumulated result is keyed by inside a mixture
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResultKey {
    Reaction(ReactionKey),
    NovelCompound(SpeciesId),
}

/// A result that has paid out
#[derive(Debug, Clone)]
pub struct CompletedResult {
    pub key: ResultKey,
    pub result: Arc<dyn ReactionResult>,
    pub times: u32,
}

impl CompletedResult {
    /// Run the payout's side effect
    pub fn apply(&self) {
        self.result.apply(self.times);
    }
}

/// Emitted the first time a mixture synthesizes a novel species
#[derive(Debug, Clone, PartialEq)]
pub struct NovelCompoundSynthesized {
    pub species: SpeciesId,
}

impl ReactionResult for NovelCompoundSynthesized {
    fn required_moles(&self) -> f64 {
        0.0
    }

    fn is_one_off(&self) -> bool {
        true
    }

    fn apply(&self, _times: u32) {
        debug!("Novel compound synthesized: {}", self.species);
    }
}
