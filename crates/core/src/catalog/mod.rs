//! Species registry and reaction catalog
//!
//! The catalog is built once during a single-threaded definition phase and is
//! read-only afterwards; mixtures take it by reference whenever they need to
//! look something up. Several catalogs can coexist (one per test, say).
//!
//! Reaction membership ("which reactions can this species start?") lives in
//! per-species indices here rather than inside [`Species`], so species stay
//! plain immutable values.

mod reaction_builder;
mod species_builder;

pub use reaction_builder::{
    ReactionBuilder, DEFAULT_ACTIVATION_ENERGY, DEFAULT_PREEXPONENTIAL_FACTOR,
};
pub use species_builder::SpeciesBuilder;

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::core_types::reaction::{Reaction, ReactionId};
use crate::core_types::species::{Species, SpeciesId};
use crate::core_types::structure::{
    GroupType, NoStructures, StructuralCode, StructureInterpreter,
};
use crate::error::ChemistryError;
use crate::generic::GenericReaction;
use crate::physics::arrhenius::REFERENCE_ACTIVATION_ENERGY;
use crate::FxIndexMap;

/// Well-known species that helpers need to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeciesRole {
    /// H⁺, produced by acid dissociation
    Proton,
    /// Solvent catalysing acid dissociation
    Water,
    /// Counter-ion paired with pure anions
    SodiumCation,
    /// Counter-ion paired with pure cations
    ChlorideAnion,
}

/// Registry of species, reactions and generic reaction templates
pub struct Catalog {
    species: FxIndexMap<SpeciesId, Arc<Species>>,
    reactions: FxIndexMap<ReactionId, Arc<Reaction>>,
    reactant_reactions: FxHashMap<SpeciesId, Vec<Arc<Reaction>>>,
    product_reactions: FxHashMap<SpeciesId, Vec<Arc<Reaction>>>,
    generic_reactions: FxIndexMap<ReactionId, Arc<GenericReaction>>,
    generic_by_group: FxHashMap<GroupType, Vec<Arc<GenericReaction>>>,
    roles: FxHashMap<SpeciesRole, Arc<Species>>,
    interpreter: Arc<dyn StructureInterpreter>,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("species", &self.species.len())
            .field("reactions", &self.reactions.len())
            .field("generic_reactions", &self.generic_reactions.len())
            .field("interpreter", &self.interpreter)
            .finish()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Arc::new(NoStructures))
    }
}

impl Catalog {
    /// Empty catalog that resolves novel structures through `interpreter`
    pub fn new(interpreter: Arc<dyn StructureInterpreter>) -> Self {
        Self {
            species: FxIndexMap::default(),
            reactions: FxIndexMap::default(),
            reactant_reactions: FxHashMap::default(),
            product_reactions: FxHashMap::default(),
            generic_reactions: FxIndexMap::default(),
            generic_by_group: FxHashMap::default(),
            roles: FxHashMap::default(),
            interpreter,
        }
    }

    // ========================================================================
    // SPECIES
    // ========================================================================

    /// Add a catalog species
    pub fn register_species(&mut self, species: Species) -> Result<Arc<Species>, ChemistryError> {
        if self.species.contains_key(species.id()) {
            return Err(ChemistryError::DuplicateId {
                kind: "species",
                id: species.id().to_string(),
            });
        }
        let species = Arc::new(species);
        self.species
            .insert(species.id().clone(), Arc::clone(&species));
        Ok(species)
    }

    pub fn species(&self, id: &SpeciesId) -> Option<&Arc<Species>> {
        let found = self.species.get(id);
        if found.is_none() {
            warn!("No species registered as {}", id);
        }
        found
    }

    pub fn all_species(&self) -> impl Iterator<Item = &Arc<Species>> {
        self.species.values()
    }

    /// Resolve a persisted identifier: a catalog id or a structural code
    pub fn resolve_species(&self, id: &str) -> Option<Arc<Species>> {
        let resolved = match SpeciesId::parse(id) {
            Some(SpeciesId::Novel(code)) => self.novel_species(&code),
            Some(catalog_id) => self.species.get(&catalog_id).cloned(),
            None => None,
        };
        if resolved.is_none() {
            warn!("Could not find species '{}'", id);
        }
        resolved
    }

    /// Species for a structure, collapsed onto a catalog species when one
    /// is equivalent
    pub fn novel_species(&self, code: &StructuralCode) -> Option<Arc<Species>> {
        let description = self.interpreter.describe(code)?;
        match SpeciesBuilder::novel(code.clone(), &description).build() {
            Ok(species) => Some(self.find_equivalent(species)),
            Err(err) => {
                warn!("Could not build novel species {}: {}", code, err);
                None
            }
        }
    }

    /// The catalog species with the same mass and structure, or `species` itself
    pub fn find_equivalent(&self, species: Species) -> Arc<Species> {
        self.species
            .values()
            .find(|known| known.is_equivalent_to(&species))
            .cloned()
            .unwrap_or_else(|| Arc::new(species))
    }

    /// Designate a registered species for a role
    pub fn assign_role(&mut self, role: SpeciesRole, id: &SpeciesId) -> Result<(), ChemistryError> {
        let species = self
            .species
            .get(id)
            .cloned()
            .ok_or_else(|| ChemistryError::NotFound {
                kind: "species",
                id: id.to_string(),
            })?;
        self.roles.insert(role, species);
        Ok(())
    }

    pub fn role(&self, role: SpeciesRole) -> Option<&Arc<Species>> {
        self.roles.get(&role)
    }

    pub fn interpreter(&self) -> &Arc<dyn StructureInterpreter> {
        &self.interpreter
    }

    // ========================================================================
    // REACTIONS
    // ========================================================================

    /// Add a built reaction
    ///
    /// Generated reactions are handed back without being cataloged.
    pub fn register_reaction(&mut self, reaction: Reaction) -> Result<Arc<Reaction>, ChemistryError> {
        let Some(id) = reaction.id().cloned() else {
            return Ok(Arc::new(reaction));
        };
        if self.reactions.contains_key(&id) {
            return Err(ChemistryError::DuplicateId {
                kind: "reaction",
                id: id.to_string(),
            });
        }
        let reaction = Arc::new(reaction);
        for reactant in reaction.reactants() {
            self.reactant_reactions
                .entry(reactant.species.id().clone())
                .or_default()
                .push(Arc::clone(&reaction));
        }
        for product in reaction.products() {
            self.product_reactions
                .entry(product.species.id().clone())
                .or_default()
                .push(Arc::clone(&reaction));
        }
        debug!("Registered reaction {}: {}", id, reaction);
        self.reactions.insert(id, Arc::clone(&reaction));
        Ok(reaction)
    }

    /// Build and register a reaction with its reverse
    pub fn register_reversible(
        &mut self,
        builder: ReactionBuilder,
        modifier: impl FnOnce(ReactionBuilder) -> ReactionBuilder,
    ) -> Result<(Arc<Reaction>, Arc<Reaction>), ChemistryError> {
        let (forward, reverse) = builder.build_reversible(modifier)?;
        self.ensure_unregistered([&forward, &reverse])?;
        Ok((self.register_reaction(forward)?, self.register_reaction(reverse)?))
    }

    /// Register the dissociation/association pair of an acid
    ///
    /// `<acid>.dissociation`: acid → H⁺ + base, catalysed by water at order 0,
    /// with A = 10^−pKa. `<acid>.association`: base + H⁺ → acid with A = 1.
    /// Both share an activation energy chosen so that the equilibrium
    /// constant at 298 K is exactly 10^−pKa.
    pub fn register_acid(
        &mut self,
        namespace: &str,
        acid: &Arc<Species>,
        conjugate_base: &Arc<Species>,
        pka: f64,
    ) -> Result<(Arc<Reaction>, Arc<Reaction>), ChemistryError> {
        if conjugate_base.charge() + 1 != acid.charge() {
            return Err(ChemistryError::ChargeConservation {
                acid: acid.id().to_string(),
                acid_charge: acid.charge(),
                base: conjugate_base.id().to_string(),
                base_charge: conjugate_base.charge(),
            });
        }
        let proton = self
            .role(SpeciesRole::Proton)
            .cloned()
            .ok_or(ChemistryError::MissingRole(SpeciesRole::Proton))?;
        let water = self
            .role(SpeciesRole::Water)
            .cloned()
            .ok_or(ChemistryError::MissingRole(SpeciesRole::Water))?;

        let name = match acid.id() {
            SpeciesId::Catalog { name, .. } => name.clone(),
            SpeciesId::Novel(code) => code.body().to_string(),
        };

        let dissociation = ReactionBuilder::new(namespace)
            .id(&format!("{name}.dissociation"))
            .reactant(acid, 1)
            .catalyst(&water, 0)
            .product(&proton, 1)
            .product(conjugate_base, 1)
            .activation_energy(REFERENCE_ACTIVATION_ENERGY)
            .preexponential_factor(10f64.powf(-pka))
            .build()?;
        let association = ReactionBuilder::new(namespace)
            .id(&format!("{name}.association"))
            .reactant(conjugate_base, 1)
            .reactant(&proton, 1)
            .product(acid, 1)
            .activation_energy(REFERENCE_ACTIVATION_ENERGY)
            .preexponential_factor(1.0)
            .build()?;

        self.ensure_unregistered([&dissociation, &association])?;
        Ok((
            self.register_reaction(dissociation)?,
            self.register_reaction(association)?,
        ))
    }

    fn ensure_unregistered<'a>(
        &self,
        reactions: impl IntoIterator<Item = &'a Reaction>,
    ) -> Result<(), ChemistryError> {
        for reaction in reactions {
            if let Some(id) = reaction.id() {
                if self.reactions.contains_key(id) {
                    return Err(ChemistryError::DuplicateId {
                        kind: "reaction",
                        id: id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn reaction(&self, id: &ReactionId) -> Option<&Arc<Reaction>> {
        self.reactions.get(id)
    }

    /// Look a reaction up by its `namespace:path` string
    pub fn reaction_by_name(&self, id: &str) -> Option<&Arc<Reaction>> {
        ReactionId::parse(id).and_then(|id| self.reactions.get(&id))
    }

    pub fn all_reactions(&self) -> impl Iterator<Item = &Arc<Reaction>> {
        self.reactions.values()
    }

    /// Catalog reactions this species is a reactant of
    pub fn reactant_reactions(&self, species: &SpeciesId) -> &[Arc<Reaction>] {
        self.reactant_reactions
            .get(species)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Catalog reactions this species is a product of
    pub fn product_reactions(&self, species: &SpeciesId) -> &[Arc<Reaction>] {
        self.product_reactions
            .get(species)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    // ========================================================================
    // GENERIC REACTIONS
    // ========================================================================

    /// Add a generic reaction template
    pub fn register_generic(
        &mut self,
        generic: GenericReaction,
    ) -> Result<Arc<GenericReaction>, ChemistryError> {
        if self.generic_reactions.contains_key(generic.id()) {
            return Err(ChemistryError::DuplicateId {
                kind: "generic reaction",
                id: generic.id().to_string(),
            });
        }
        let generic = Arc::new(generic);
        for group in generic.group_types() {
            let templates = self.generic_by_group.entry(group.clone()).or_default();
            if !templates.iter().any(|t| Arc::ptr_eq(t, &generic)) {
                templates.push(Arc::clone(&generic));
            }
        }
        self.generic_reactions
            .insert(generic.id().clone(), Arc::clone(&generic));
        Ok(generic)
    }

    /// Templates involving a group type
    pub fn generic_reactions_for(&self, group: &GroupType) -> &[Arc<GenericReaction>] {
        self.generic_by_group
            .get(group)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn all_generic_reactions(&self) -> impl Iterator<Item = &Arc<GenericReaction>> {
        self.generic_reactions.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::structure::{StructureDescription, StructureTable};

    fn ion(name: &str, charge: i32, mass: f64) -> Species {
        SpeciesBuilder::new("test")
            .id(name)
            .charge(charge)
            .mass(mass)
            .build()
            .unwrap()
    }

    fn aqueous_catalog() -> Catalog {
        let mut catalog = Catalog::default();
        let water = catalog
            .register_species(
                SpeciesBuilder::new("test")
                    .id("water")
                    .mass(18.015)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let proton = catalog.register_species(ion("proton", 1, 1.008)).unwrap();
        catalog.assign_role(SpeciesRole::Water, water.id()).unwrap();
        catalog.assign_role(SpeciesRole::Proton, proton.id()).unwrap();
        catalog
    }

    #[test]
    fn test_duplicate_species_rejected() {
        let mut catalog = Catalog::default();
        catalog.register_species(ion("chloride", -1, 35.45)).unwrap();
        let err = catalog.register_species(ion("chloride", -1, 35.45)).unwrap_err();
        assert_eq!(
            err,
            ChemistryError::DuplicateId {
                kind: "species",
                id: "test:chloride".to_string()
            }
        );
    }

    #[test]
    fn test_lookup_miss_is_none() {
        let catalog = Catalog::default();
        assert!(catalog.resolve_species("test:unobtainium").is_none());
        assert!(catalog.resolve_species("not an id").is_none());
        assert!(catalog.resolve_species("test:linear:CCO").is_none());
    }

    #[test]
    fn test_reaction_back_references() {
        let mut catalog = aqueous_catalog();
        let a = catalog.register_species(ion("a", 0, 10.0)).unwrap();
        let b = catalog.register_species(ion("b", 0, 10.0)).unwrap();
        let reaction = ReactionBuilder::new("test")
            .id("a_to_b")
            .reactant(&a, 1)
            .product(&b, 1)
            .build()
            .unwrap();
        catalog.register_reaction(reaction.clone()).unwrap();

        assert_eq!(catalog.reactant_reactions(a.id()).len(), 1);
        assert_eq!(catalog.product_reactions(b.id()).len(), 1);
        assert!(catalog.reactant_reactions(b.id()).is_empty());
        assert!(catalog.reaction_by_name("test:a_to_b").is_some());
        assert!(matches!(
            catalog.register_reaction(reaction),
            Err(ChemistryError::DuplicateId { .. })
        ));
    }

    #[test]
    fn test_acid_pair() {
        let mut catalog = aqueous_catalog();
        let acetic = catalog.register_species(ion("acetic_acid", 0, 60.05)).unwrap();
        let acetate = catalog.register_species(ion("acetate", -1, 59.04)).unwrap();

        let (dissociation, association) = catalog
            .register_acid("test", &acetic, &acetate, 4.76)
            .unwrap();
        assert_eq!(dissociation.id().unwrap().path(), "acetic_acid.dissociation");
        assert_eq!(association.id().unwrap().path(), "acetic_acid.association");
        let water = catalog.role(SpeciesRole::Water).unwrap();
        assert_eq!(dissociation.order_of(water.id()), Some(0));

        // K = k_dissociation / k_association = 10^-pKa at 298 K
        let k = dissociation.rate_constant(298.0) / association.rate_constant(298.0);
        assert!((k.log10() + 4.76).abs() < 1e-9, "log K {}", k.log10());
    }

    #[test]
    fn test_acid_charge_check() {
        let mut catalog = aqueous_catalog();
        let acid = catalog.register_species(ion("weird_acid", 0, 60.0)).unwrap();
        let base = catalog.register_species(ion("weird_base", 1, 59.0)).unwrap();
        let err = catalog.register_acid("test", &acid, &base, 3.0).unwrap_err();
        assert!(matches!(err, ChemistryError::ChargeConservation { .. }));
    }

    #[test]
    fn test_novel_species_collapse_onto_catalog() {
        let code = StructuralCode::parse("test:linear:CCO").unwrap();
        let mut table = StructureTable::new();
        table.insert(code.clone(), StructureDescription::new(46.07));
        let mut catalog = Catalog::new(Arc::new(table));
        let ethanol = catalog
            .register_species(
                SpeciesBuilder::new("test")
                    .id("ethanol")
                    .structure(code.clone())
                    .mass(46.07)
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let resolved = catalog.resolve_species("test:linear:CCO").unwrap();
        assert!(Arc::ptr_eq(&resolved, &ethanol));
    }
}
