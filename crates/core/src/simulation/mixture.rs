//! Mixture state and concentration bookkeeping
//!
//! Every change to which species are present goes through
//! [`Mixture::composition_changed`], which marks the possible-reaction list
//! and the boiling-point bounds stale. Both are rebuilt lazily before their
//! next read.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::catalog::{Catalog, SpeciesRole};
use crate::core_types::items::ItemId;
use crate::core_types::reaction::{Reaction, ReactionId, ReactionKey};
use crate::core_types::result::{NovelCompoundSynthesized, ReactionResult, ResultKey};
use crate::core_types::species::{Species, SpeciesId};
use crate::core_types::structure::GroupType;
use crate::core_types::units::{Kelvin, Liters};
use crate::generic::{specialize, GroupOccurrence};
use crate::physics::phase::{BoilingPoints, TEMPERATURE_FLOOR};
use crate::simulation::config::KineticsConfig;
use crate::FxIndexMap;

/// A species present in a mixture
#[derive(Debug, Clone)]
pub(crate) struct Constituent {
    pub species: Arc<Species>,
    /// mol/L
    pub concentration: f64,
    /// 0 = all liquid, 1 = all gas
    pub gas_fraction: f64,
}

/// Progress towards a reaction result's payout
#[derive(Debug, Clone)]
pub(crate) struct AccumulatedResult {
    pub result: Arc<dyn ReactionResult>,
    /// Catalog reaction that carries the result, if any
    pub reaction: Option<ReactionId>,
    pub moles_per_liter: f64,
}

/// Items held in the partially-dissolved pool, in items per liter
#[derive(Debug, Clone)]
pub(crate) struct DissolvedItem {
    pub tags: Vec<String>,
    pub amount: f64,
}

/// A homogeneous solution of species at one temperature
#[derive(Debug, Clone)]
pub struct Mixture {
    pub(crate) translation_key: String,
    pub(crate) config: KineticsConfig,
    /// K
    pub(crate) temperature: f64,
    pub(crate) contents: FxIndexMap<SpeciesId, Constituent>,
    /// Ticks left before a zero-concentration species is dropped
    pub(crate) pending_removal: FxIndexMap<SpeciesId, u32>,
    pub(crate) functional_groups: FxIndexMap<GroupType, Vec<GroupOccurrence>>,
    pub(crate) results: FxIndexMap<ResultKey, AccumulatedResult>,
    pub(crate) dissolved: FxIndexMap<ItemId, DissolvedItem>,
    pub(crate) last_tick_reactions: FxIndexMap<ReactionKey, (Arc<Reaction>, f64)>,

    pub(crate) possible_reactions: Vec<Arc<Reaction>>,
    pub(crate) reactions_stale: bool,
    pub(crate) boiling_points: BoilingPoints,
    pub(crate) boiling_points_stale: bool,

    pub(crate) equilibrium: bool,
    pub(crate) boiling: bool,
}

impl Default for Mixture {
    fn default() -> Self {
        Self::with_config(KineticsConfig::default())
    }
}

impl Mixture {
    /// Empty mixture at the reference temperature
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: KineticsConfig) -> Self {
        Self {
            translation_key: String::new(),
            config,
            temperature: *Kelvin::REFERENCE,
            contents: FxIndexMap::default(),
            pending_removal: FxIndexMap::default(),
            functional_groups: FxIndexMap::default(),
            results: FxIndexMap::default(),
            dissolved: FxIndexMap::default(),
            last_tick_reactions: FxIndexMap::default(),
            possible_reactions: Vec::new(),
            reactions_stale: true,
            boiling_points: BoilingPoints::default(),
            boiling_points_stale: true,
            equilibrium: false,
            boiling: false,
        }
    }

    /// The pure species at its pure concentration
    ///
    /// Ions come paired with enough counter-ion to be neutral, at a
    /// concentration of 1 mol/L before the volume is corrected.
    pub fn pure(catalog: &Catalog, species: &Arc<Species>) -> Self {
        let mut mixture = Self::new();
        if !species.is_ion() {
            mixture.add_species(species, species.pure_concentration());
            return mixture;
        }

        let role = if species.charge() < 0 {
            SpeciesRole::SodiumCation
        } else {
            SpeciesRole::ChlorideAnion
        };
        mixture.add_species(species, 1.0);
        match catalog.role(role) {
            Some(counter_ion) => {
                mixture.add_species(counter_ion, f64::from(species.charge().unsigned_abs()));
            }
            None => debug!("No {:?} assigned; {} left unpaired", role, species.id()),
        }
        mixture.recalculate_volume(Liters::new(1.0));
        mixture
    }

    pub fn named(mut self, translation_key: &str) -> Self {
        self.translation_key = translation_key.to_string();
        self
    }

    pub fn translation_key(&self) -> &str {
        &self.translation_key
    }

    pub fn config(&self) -> &KineticsConfig {
        &self.config
    }

    // ========================================================================
    // CONTENTS
    // ========================================================================

    /// Add `concentration` mol/L of a species
    ///
    /// # Panics
    /// If `concentration` is negative and the species is not present.
    pub fn add_species(&mut self, species: &Arc<Species>, concentration: f64) -> &mut Self {
        self.change_concentration(species, concentration, false);
        self.equilibrium = false;
        self
    }

    /// mol/L of a species, 0 if absent
    pub fn concentration_of(&self, species: &SpeciesId) -> f64 {
        self.contents
            .get(species)
            .map_or(0.0, |c| c.concentration)
    }

    /// Species at positive concentration, in insertion order
    pub fn contents(&self, exclude_novel: bool) -> impl Iterator<Item = (&Arc<Species>, f64)> {
        self.contents
            .values()
            .filter(move |c| c.concentration > 0.0 && !(exclude_novel && c.species.is_novel()))
            .map(|c| (&c.species, c.concentration))
    }

    /// Every species tracked, including those waiting to be removed
    pub fn species(&self) -> impl Iterator<Item = &Arc<Species>> {
        self.contents.values().map(|c| &c.species)
    }

    pub fn contains(&self, species: &SpeciesId) -> bool {
        self.contents.contains_key(species)
    }

    pub fn is_empty(&self) -> bool {
        self.contents.values().all(|c| c.concentration <= 0.0)
    }

    /// Fraction of a species in the gas phase
    pub fn gas_fraction(&self, species: &SpeciesId) -> Option<f64> {
        self.contents.get(species).map(|c| c.gas_fraction)
    }

    /// Gas fraction of every tracked species
    pub fn states(&self) -> impl Iterator<Item = (&SpeciesId, f64)> {
        self.contents.iter().map(|(id, c)| (id, c.gas_fraction))
    }

    pub fn temperature(&self) -> Kelvin {
        Kelvin::new(self.temperature)
    }

    /// Jump to a temperature, putting every species in the phase it has there
    pub fn set_temperature(&mut self, temperature: impl Into<Kelvin>) -> &mut Self {
        let temperature: Kelvin = temperature.into();
        self.temperature = f64::from(temperature).max(TEMPERATURE_FLOOR);
        for constituent in self.contents.values_mut() {
            constituent.gas_fraction = constituent.species.equilibrium_gas_fraction(self.temperature);
        }
        self.boiling = false;
        self.boiling_points_stale = true;
        self.equilibrium = false;
        self
    }

    pub fn is_at_equilibrium(&self) -> bool {
        self.equilibrium
    }

    /// Force the next tick to react, e.g. after the surroundings changed
    pub fn disturb_equilibrium(&mut self) {
        self.equilibrium = false;
    }

    /// Whether some species is part way through changing phase
    pub fn is_boiling(&self) -> bool {
        self.boiling
    }

    /// Reactions applied during the last tick with their mol/L
    pub fn last_tick_reactions(&self) -> impl Iterator<Item = (&Arc<Reaction>, f64)> {
        self.last_tick_reactions.values().map(|(r, moles)| (r, *moles))
    }

    /// Partially-dissolved items, in items per liter
    pub fn dissolved_items(&self) -> impl Iterator<Item = (&ItemId, f64)> {
        self.dissolved.iter().map(|(id, d)| (id, d.amount))
    }

    /// mol/L accumulated towards each result
    pub fn accumulated_results(&self) -> impl Iterator<Item = (&ResultKey, f64)> {
        self.results.iter().map(|(key, r)| (key, r.moles_per_liter))
    }

    /// Group types present, in the order they first appeared
    pub fn group_types(&self) -> impl Iterator<Item = &GroupType> {
        self.functional_groups.keys()
    }

    pub fn group_occurrences(&self, group: &GroupType) -> &[GroupOccurrence] {
        self.functional_groups
            .get(group)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    // ========================================================================
    // BOOKKEEPING
    // ========================================================================

    /// Change a species' concentration by `change` mol/L
    ///
    /// Reaching zero schedules removal after the grace period; rising above
    /// zero cancels it. `synthesized` marks products of a reaction, which is
    /// when a novel species earns its one-off result.
    ///
    /// # Panics
    /// If the species is absent or already at zero and `change` is negative.
    pub(crate) fn change_concentration(
        &mut self,
        species: &Arc<Species>,
        change: f64,
        synthesized: bool,
    ) {
        let id = species.id();
        let Some(constituent) = self.contents.get_mut(id) else {
            assert!(
                change >= 0.0,
                "tried to remove {change} mol/L of {id}, which is not in the mixture"
            );
            if change > 0.0 {
                self.insert_species(species, change, synthesized);
            }
            return;
        };

        let current = constituent.concentration;
        assert!(
            !(current <= 0.0 && change < 0.0),
            "tried to remove {change} mol/L of {id}, which has none left"
        );

        let updated = (current + change).max(0.0);
        constituent.concentration = updated;

        if updated <= 0.0 {
            self.pending_removal
                .insert(id.clone(), self.config.removal_grace_ticks);
        } else if current <= 0.0 {
            // Back from zero: reactions filtered out meanwhile may apply again
            self.pending_removal.shift_remove(id);
            self.reactions_stale = true;
        }
    }

    fn insert_species(&mut self, species: &Arc<Species>, concentration: f64, synthesized: bool) {
        let id = species.id().clone();
        for group in species.functional_groups() {
            self.functional_groups
                .entry(group.group_type.clone())
                .or_default()
                .push(GroupOccurrence {
                    species: Arc::clone(species),
                    group: group.clone(),
                });
        }

        if synthesized && species.is_novel() {
            let key = ResultKey::NovelCompound(id.clone());
            if !self.results.contains_key(&key) {
                self.results.insert(
                    key,
                    AccumulatedResult {
                        result: Arc::new(NovelCompoundSynthesized {
                            species: id.clone(),
                        }),
                        reaction: None,
                        moles_per_liter: 0.0,
                    },
                );
            }
        }

        self.contents.insert(
            id,
            Constituent {
                species: Arc::clone(species),
                concentration,
                gas_fraction: species.equilibrium_gas_fraction(self.temperature),
            },
        );
        self.composition_changed();
        self.equilibrium = false;
    }

    fn remove_species(&mut self, id: &SpeciesId) {
        if self.contents.shift_remove(id).is_none() {
            return;
        }
        for occurrences in self.functional_groups.values_mut() {
            occurrences.retain(|o| o.species.id() != id);
        }
        self.functional_groups.retain(|_, occurrences| !occurrences.is_empty());
        self.composition_changed();
    }

    /// Count down pending removals and drop species whose grace ran out
    pub(crate) fn purge_removals(&mut self) {
        let mut expired = Vec::new();
        for (id, ticks) in &mut self.pending_removal {
            *ticks = ticks.saturating_sub(1);
            if *ticks == 0 {
                expired.push(id.clone());
            }
        }
        for id in expired {
            self.pending_removal.shift_remove(&id);
            trace!("Removing exhausted species {}", id);
            self.remove_species(&id);
        }
    }

    /// The single place species presence changes are announced
    pub(crate) fn composition_changed(&mut self) {
        self.reactions_stale = true;
        self.boiling_points_stale = true;
    }

    pub(crate) fn accumulate_result(&mut self, reaction: &Reaction, moles_per_liter: f64) {
        let Some(result) = reaction.result() else {
            return;
        };
        self.results
            .entry(ResultKey::Reaction(reaction.key().clone()))
            .or_insert_with(|| AccumulatedResult {
                result: Arc::clone(result),
                reaction: reaction.id().cloned(),
                moles_per_liter: 0.0,
            })
            .moles_per_liter += moles_per_liter;
    }

    // ========================================================================
    // POSSIBLE REACTIONS
    // ========================================================================

    /// Reactions that could run with the current contents, rebuilt if stale
    pub fn possible_reactions(&mut self, catalog: &Catalog) -> &[Arc<Reaction>] {
        if self.reactions_stale {
            self.refresh_possible_reactions(catalog);
        }
        &self.possible_reactions
    }

    fn refresh_possible_reactions(&mut self, catalog: &Catalog) {
        let mut found: FxIndexMap<ReactionKey, Arc<Reaction>> = specialize(catalog, self)
            .into_iter()
            .map(|r| (r.key().clone(), r))
            .collect();

        for id in self.contents.keys() {
            for reaction in catalog.reactant_reactions(id) {
                found
                    .entry(reaction.key().clone())
                    .or_insert_with(|| Arc::clone(reaction));
            }
        }

        found.retain(|_, reaction| {
            reaction
                .orders()
                .iter()
                .all(|o| self.concentration_of(o.species.id()) > 0.0)
        });

        debug!(
            "Rebuilt possible reactions: {} candidates for {} species",
            found.len(),
            self.contents.len()
        );
        self.possible_reactions = found.into_values().collect();
        self.reactions_stale = false;
    }

    /// Divide every concentration, result and dissolved item by `factor`
    pub fn scale(&mut self, factor: f64) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        for constituent in self.contents.values_mut() {
            constituent.concentration /= factor;
        }
        for result in self.results.values_mut() {
            result.moles_per_liter /= factor;
        }
        for item in self.dissolved.values_mut() {
            item.amount /= factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SpeciesBuilder;
    use crate::core_types::structure::{FunctionalGroup, StructuralCode};
    use approx::assert_relative_eq;

    fn species(name: &str) -> Arc<Species> {
        Arc::new(
            SpeciesBuilder::new("test")
                .id(name)
                .mass(50.0)
                .density(1000.0)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_add_and_read_back() {
        let a = species("a");
        let mut mixture = Mixture::new();
        mixture.add_species(&a, 0.5).add_species(&a, 0.25);
        assert_relative_eq!(mixture.concentration_of(a.id()), 0.75);
        assert!(!mixture.is_at_equilibrium());
        assert_eq!(mixture.contents(false).count(), 1);
    }

    #[test]
    fn test_zero_concentration_lingers_until_grace_expires() {
        let a = species("a");
        let mut mixture = Mixture::new();
        mixture.add_species(&a, 1.0);
        mixture.change_concentration(&a, -1.0, false);
        assert!(mixture.contains(a.id()));
        assert_eq!(mixture.contents(false).count(), 0);

        for _ in 0..mixture.config.removal_grace_ticks - 1 {
            mixture.purge_removals();
        }
        assert!(mixture.contains(a.id()));
        mixture.purge_removals();
        assert!(!mixture.contains(a.id()));
    }

    #[test]
    fn test_readding_cancels_pending_removal() {
        let a = species("a");
        let mut mixture = Mixture::new();
        mixture.add_species(&a, 1.0);
        mixture.change_concentration(&a, -2.0, false);
        assert_eq!(mixture.concentration_of(a.id()), 0.0);
        mixture.add_species(&a, 0.1);
        for _ in 0..50 {
            mixture.purge_removals();
        }
        assert_relative_eq!(mixture.concentration_of(a.id()), 0.1);
    }

    #[test]
    #[should_panic(expected = "not in the mixture")]
    fn test_removing_absent_species_panics() {
        let a = species("a");
        let mut mixture = Mixture::new();
        mixture.change_concentration(&a, -0.1, false);
    }

    #[test]
    #[should_panic(expected = "has none left")]
    fn test_removing_exhausted_species_panics() {
        let a = species("a");
        let mut mixture = Mixture::new();
        mixture.add_species(&a, 0.1);
        mixture.change_concentration(&a, -0.1, false);
        mixture.change_concentration(&a, -0.1, false);
    }

    #[test]
    fn test_group_index_follows_contents() {
        let alcohol = GroupType::new("alcohol");
        let ethanol = Arc::new(
            SpeciesBuilder::new("test")
                .id("ethanol")
                .mass(46.07)
                .functional_group(FunctionalGroup::new(&alcohol, [2]))
                .build()
                .unwrap(),
        );
        let mut mixture = Mixture::new();
        mixture.add_species(&ethanol, 1.0);
        assert_eq!(mixture.group_occurrences(&alcohol).len(), 1);

        mixture.change_concentration(&ethanol, -1.0, false);
        for _ in 0..mixture.config.removal_grace_ticks {
            mixture.purge_removals();
        }
        assert!(mixture.group_occurrences(&alcohol).is_empty());
        assert_eq!(mixture.group_types().count(), 0);
    }

    #[test]
    fn test_synthesized_novel_species_earns_one_off_result() {
        let code = StructuralCode::parse("test:linear:CCC").unwrap();
        let novel = Arc::new(
            SpeciesBuilder::new("test")
                .structure(code)
                .mass(44.1)
                .build()
                .unwrap(),
        );
        let mut mixture = Mixture::new();
        mixture.change_concentration(&novel, 0.1, true);
        mixture.change_concentration(&novel, 0.1, true);
        let keys: Vec<_> = mixture.accumulated_results().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![ResultKey::NovelCompound(novel.id().clone())]);
    }

    #[test]
    fn test_set_temperature_resets_phases() {
        let volatile = Arc::new(
            SpeciesBuilder::new("test")
                .id("volatile")
                .mass(30.0)
                .boiling_point(Kelvin::new(250.0))
                .build()
                .unwrap(),
        );
        let mut mixture = Mixture::new();
        mixture.add_species(&volatile, 1.0);
        assert_eq!(mixture.gas_fraction(volatile.id()), Some(1.0));
        mixture.set_temperature(Kelvin::new(200.0));
        assert_eq!(mixture.gas_fraction(volatile.id()), Some(0.0));
    }

    #[test]
    fn test_scale() {
        let a = species("a");
        let mut mixture = Mixture::new();
        mixture.add_species(&a, 1.0);
        mixture.scale(4.0);
        assert_relative_eq!(mixture.concentration_of(a.id()), 0.25);
        mixture.scale(0.0);
        assert_relative_eq!(mixture.concentration_of(a.id()), 0.25);
    }
}
