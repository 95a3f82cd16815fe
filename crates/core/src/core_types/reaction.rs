//! Concrete reactions
//!
//! A [`Reaction`] is fully parameterized and immutable. Catalog reactions are
//! built with [`crate::catalog::ReactionBuilder`]; generated reactions come
//! out of generic templates and are only ever held by the mixtures that
//! specialized them.

use std::fmt;
use std::sync::Arc;

use crate::core_types::items::{ItemId, ItemRequirement};
use crate::core_types::result::ReactionResult;
use crate::core_types::species::{Species, SpeciesId};
use crate::physics::arrhenius;

/// `namespace:path` name of a catalog reaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReactionId {
    namespace: String,
    path: String,
}

impl ReactionId {
    pub fn new(namespace: &str, path: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        let (namespace, path) = id.split_once(':')?;
        if namespace.is_empty() || path.is_empty() {
            return None;
        }
        Some(Self::new(namespace, path))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Id with a suffix appended to the path
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self::new(&self.namespace, &format!("{}{suffix}", self.path))
    }
}

impl fmt::Display for ReactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// Identity of a reaction for deduplication and deterministic ordering
///
/// Catalog reactions are keyed by full id. Generated reactions have no id
/// and are keyed by a canonical signature of their species and parameters,
/// so two templates producing the same transformation collapse into one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReactionKey(String);

impl ReactionKey {
    pub(crate) fn new(key: String) -> Self {
        ReactionKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReactionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A species with its stoichiometric ratio
#[derive(Debug, Clone)]
pub struct Stoichiometry {
    pub species: Arc<Species>,
    pub ratio: u32,
}

/// A species with its kinetic order in the rate law
#[derive(Debug, Clone)]
pub struct RateOrder {
    pub species: Arc<Species>,
    pub order: i32,
}

/// Items deposited into the mixture per mole of reaction
#[derive(Debug, Clone, PartialEq)]
pub struct ItemProduct {
    pub item: ItemId,
    pub tags: Vec<String>,
    pub per_mole: f64,
}

/// A concrete, fully-parameterized reaction
#[derive(Debug, Clone)]
pub struct Reaction {
    pub(crate) id: Option<ReactionId>,
    pub(crate) key: ReactionKey,
    pub(crate) reactants: Vec<Stoichiometry>,
    pub(crate) products: Vec<Stoichiometry>,
    pub(crate) orders: Vec<RateOrder>,
    pub(crate) item_requirements: Vec<ItemRequirement>,
    /// Moles of reaction per item consumed, shared by every item requirement
    pub(crate) moles_per_item: f64,
    pub(crate) item_products: Vec<ItemProduct>,
    pub(crate) requires_uv: bool,
    pub(crate) requires_electrolysis: bool,
    pub(crate) preexponential_factor: f64,
    /// kJ/mol
    pub(crate) activation_energy: f64,
    /// kJ/mol
    pub(crate) enthalpy_change: f64,
    pub(crate) result: Option<Arc<dyn ReactionResult>>,
    pub(crate) reverse: Option<ReactionId>,
    pub(crate) display_as_reversible: bool,
    pub(crate) generated: bool,
}

impl Reaction {
    pub fn id(&self) -> Option<&ReactionId> {
        self.id.as_ref()
    }

    pub fn key(&self) -> &ReactionKey {
        &self.key
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn reactants(&self) -> &[Stoichiometry] {
        &self.reactants
    }

    pub fn products(&self) -> &[Stoichiometry] {
        &self.products
    }

    pub fn orders(&self) -> &[RateOrder] {
        &self.orders
    }

    pub fn reactant_ratio(&self, species: &SpeciesId) -> Option<u32> {
        find_ratio(&self.reactants, species)
    }

    pub fn product_ratio(&self, species: &SpeciesId) -> Option<u32> {
        find_ratio(&self.products, species)
    }

    pub fn order_of(&self, species: &SpeciesId) -> Option<i32> {
        self.orders
            .iter()
            .find(|o| o.species.id() == species)
            .map(|o| o.order)
    }

    /// Species with an order that are not reactants
    pub fn catalysts(&self) -> impl Iterator<Item = &Arc<Species>> {
        self.orders
            .iter()
            .filter(|o| self.reactant_ratio(o.species.id()).is_none())
            .map(|o| &o.species)
    }

    pub fn item_requirements(&self) -> &[ItemRequirement] {
        &self.item_requirements
    }

    pub fn consumes_items(&self) -> bool {
        self.item_requirements.iter().any(|r| r.consumed)
    }

    pub fn moles_per_item(&self) -> f64 {
        self.moles_per_item
    }

    pub fn item_products(&self) -> &[ItemProduct] {
        &self.item_products
    }

    pub fn requires_uv(&self) -> bool {
        self.requires_uv
    }

    pub fn requires_electrolysis(&self) -> bool {
        self.requires_electrolysis
    }

    pub fn preexponential_factor(&self) -> f64 {
        self.preexponential_factor
    }

    pub fn activation_energy(&self) -> f64 {
        self.activation_energy
    }

    pub fn enthalpy_change(&self) -> f64 {
        self.enthalpy_change
    }

    pub fn result(&self) -> Option<&Arc<dyn ReactionResult>> {
        self.result.as_ref()
    }

    pub fn reverse_id(&self) -> Option<&ReactionId> {
        self.reverse.as_ref()
    }

    pub fn display_as_reversible(&self) -> bool {
        self.display_as_reversible
    }

    /// Arrhenius rate constant at `temperature` (K)
    pub fn rate_constant(&self, temperature: f64) -> f64 {
        arrhenius::rate_constant(
            self.preexponential_factor,
            self.activation_energy,
            temperature,
        )
    }
}

fn find_ratio(list: &[Stoichiometry], species: &SpeciesId) -> Option<u32> {
    list.iter()
        .find(|s| s.species.id() == species)
        .map(|s| s.ratio)
}

fn write_side(f: &mut fmt::Formatter<'_>, side: &[Stoichiometry]) -> fmt::Result {
    for (i, s) in side.iter().enumerate() {
        if i > 0 {
            f.write_str(" + ")?;
        }
        if s.ratio != 1 {
            write!(f, "{} ", s.ratio)?;
        }
        write!(f, "{}", s.species.id())?;
    }
    Ok(())
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_side(f, &self.reactants)?;
        f.write_str(if self.display_as_reversible { " <=> " } else { " => " })?;
        write_side(f, &self.products)
    }
}
