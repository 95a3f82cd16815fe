//! Chemical species: molecules and ions tracked by a mixture
//!
//! A species is immutable once built. Mixtures and reactions share species
//! through `Arc<Species>`; identity is the [`SpeciesId`], never the pointer.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::core_types::structure::{FunctionalGroup, StructuralCode};
use crate::core_types::units::Kelvin;

// ============================================================================
// PHYSICAL DEFAULTS
// ============================================================================

/// Molar heat capacity used when none is authored (J/(mol·K))
pub const DEFAULT_MOLAR_HEAT_CAPACITY: f64 = 100.0;

/// Pure-liquid density for species without an authored one (g/L)
pub const DEFAULT_DENSITY: f64 = 1000.0;

/// Trouton's rule: molar entropy of vaporization of most liquids (J/(mol·K))
pub const TROUTON_ENTROPY_OF_VAPORIZATION: f64 = 88.0;

/// Identity of a species
///
/// Catalog species are named `namespace:name`; novel species are identified
/// by their structural code, so equal structures are the same species.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpeciesId {
    Catalog { namespace: String, name: String },
    Novel(StructuralCode),
}

impl SpeciesId {
    pub fn catalog(namespace: &str, name: &str) -> Self {
        SpeciesId::Catalog {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// Parse either `namespace:name` or a three-part structural code
    pub fn parse(id: &str) -> Option<Self> {
        if StructuralCode::looks_like(id) {
            return StructuralCode::parse(id).ok().map(SpeciesId::Novel);
        }
        let (namespace, name) = id.split_once(':')?;
        if namespace.is_empty() || name.is_empty() || name.contains(':') {
            return None;
        }
        Some(SpeciesId::catalog(namespace, name))
    }

    pub fn is_novel(&self) -> bool {
        matches!(self, SpeciesId::Novel(_))
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeciesId::Catalog { namespace, name } => write!(f, "{namespace}:{name}"),
            SpeciesId::Novel(code) => write!(f, "{code}"),
        }
    }
}

/// Descriptive tags a species can carry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpeciesTag {
    /// Counted as the bulk medium rather than a reagent
    Solvent,
    /// Exists only inside the simulation
    Hypothetical,
    /// Ring structure
    Cyclic,
    Other(String),
}

/// A chemical species
#[derive(Debug, Clone)]
pub struct Species {
    pub(crate) id: SpeciesId,
    pub(crate) structure: Option<StructuralCode>,
    pub(crate) charge: i32,
    /// g/mol
    pub(crate) mass: f64,
    /// g/L of the pure liquid
    pub(crate) density: f64,
    pub(crate) boiling_point: Kelvin,
    /// Debye
    pub(crate) dipole_moment: f64,
    /// J/(mol·K)
    pub(crate) molar_heat_capacity: f64,
    /// J/mol
    pub(crate) latent_heat: f64,
    pub(crate) functional_groups: Vec<FunctionalGroup>,
    pub(crate) tags: BTreeSet<SpeciesTag>,
}

impl Species {
    pub fn id(&self) -> &SpeciesId {
        &self.id
    }

    pub fn is_novel(&self) -> bool {
        self.id.is_novel()
    }

    pub fn structure(&self) -> Option<&StructuralCode> {
        self.structure.as_ref()
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    pub fn is_ion(&self) -> bool {
        self.charge != 0
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    /// Concentration of the pure liquid (mol/L)
    pub fn pure_concentration(&self) -> f64 {
        if self.mass <= 0.0 {
            return 0.0;
        }
        self.density / self.mass
    }

    pub fn boiling_point(&self) -> Kelvin {
        self.boiling_point
    }

    pub fn dipole_moment(&self) -> f64 {
        self.dipole_moment
    }

    pub fn molar_heat_capacity(&self) -> f64 {
        self.molar_heat_capacity
    }

    pub fn latent_heat(&self) -> f64 {
        self.latent_heat
    }

    pub fn functional_groups(&self) -> &[FunctionalGroup] {
        &self.functional_groups
    }

    pub fn has_tag(&self, tag: &SpeciesTag) -> bool {
        self.tags.contains(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &SpeciesTag> {
        self.tags.iter()
    }

    pub fn is_hypothetical(&self) -> bool {
        self.has_tag(&SpeciesTag::Hypothetical)
    }

    pub fn is_cyclic(&self) -> bool {
        self.has_tag(&SpeciesTag::Cyclic)
    }

    /// Gas fraction a freshly added amount of this species settles at
    pub(crate) fn equilibrium_gas_fraction(&self, temperature: f64) -> f64 {
        if *self.boiling_point < temperature {
            1.0
        } else {
            0.0
        }
    }

    /// Same mass (within 0.001 g/mol) and same structure
    pub(crate) fn is_equivalent_to(&self, other: &Species) -> bool {
        (self.mass - other.mass).abs() <= 0.001
            && self.structure.is_some()
            && self.structure == other.structure
    }
}

impl PartialEq for Species {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Species {}

impl Hash for Species {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Latent heat of vaporization estimated from the boiling point (J/mol)
pub(crate) fn estimate_latent_heat(boiling_point: Kelvin) -> f64 {
    if boiling_point.is_finite() {
        TROUTON_ENTROPY_OF_VAPORIZATION * *boiling_point
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_id_parsing() {
        assert_eq!(
            SpeciesId::parse("lab:water"),
            Some(SpeciesId::catalog("lab", "water"))
        );
        let novel = SpeciesId::parse("lab:linear:CCO").unwrap();
        assert!(novel.is_novel());
        assert_eq!(novel.to_string(), "lab:linear:CCO");
        assert_eq!(SpeciesId::parse("water"), None);
        assert_eq!(SpeciesId::parse(":water"), None);
    }

    #[test]
    fn test_trouton_estimate() {
        let water = estimate_latent_heat(Kelvin::new(373.0));
        assert!((water - 32824.0).abs() < 1e-6, "latent heat {}", water);
        assert_eq!(estimate_latent_heat(Kelvin::NEVER), 0.0);
    }
}
