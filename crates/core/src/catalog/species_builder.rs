//! Builder for catalog and novel species

use std::collections::BTreeSet;

use crate::core_types::species::{
    estimate_latent_heat, Species, SpeciesId, SpeciesTag, DEFAULT_DENSITY,
    DEFAULT_MOLAR_HEAT_CAPACITY,
};
use crate::core_types::structure::{FunctionalGroup, StructuralCode, StructureDescription};
use crate::core_types::units::Kelvin;
use crate::error::ChemistryError;

/// Accumulates species properties, applying physical defaults on `build`
///
/// ```
/// use mixture_sim_core::catalog::SpeciesBuilder;
/// use mixture_sim_core::core_types::Celsius;
///
/// let water = SpeciesBuilder::new("lab")
///     .id("water")
///     .mass(18.015)
///     .density(1000.0)
///     .boiling_point(Celsius::new(100.0))
///     .molar_heat_capacity(75.3)
///     .build()
///     .unwrap();
/// assert!((water.pure_concentration() - 55.51).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct SpeciesBuilder {
    namespace: String,
    name: Option<String>,
    structure: Option<StructuralCode>,
    charge: i32,
    mass: Option<f64>,
    density: Option<f64>,
    boiling_point: Option<Kelvin>,
    dipole_moment: f64,
    molar_heat_capacity: Option<f64>,
    latent_heat: Option<f64>,
    functional_groups: Vec<FunctionalGroup>,
    tags: BTreeSet<SpeciesTag>,
}

impl SpeciesBuilder {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: None,
            structure: None,
            charge: 0,
            mass: None,
            density: None,
            boiling_point: None,
            dipole_moment: 0.0,
            molar_heat_capacity: None,
            latent_heat: None,
            functional_groups: Vec::new(),
            tags: BTreeSet::new(),
        }
    }

    /// Builder for a species known only by its structure
    pub fn novel(code: StructuralCode, description: &StructureDescription) -> Self {
        let mut builder = Self::new(code.namespace())
            .charge(description.charge)
            .mass(description.mass);
        if let Some(bp) = description.boiling_point {
            builder = builder.boiling_point(bp);
        }
        if let Some(density) = description.density {
            builder = builder.density(density);
        }
        for group in &description.functional_groups {
            builder = builder.functional_group(group.clone());
        }
        if description.cyclic {
            builder = builder.tag(SpeciesTag::Cyclic);
        }
        if description.hypothetical {
            builder = builder.tag(SpeciesTag::Hypothetical);
        }
        builder.structure(code)
    }

    pub fn id(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn structure(mut self, code: StructuralCode) -> Self {
        self.structure = Some(code);
        self
    }

    pub fn charge(mut self, charge: i32) -> Self {
        self.charge = charge;
        self
    }

    /// Molar mass (g/mol)
    pub fn mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Pure-liquid density (g/L)
    pub fn density(mut self, density: f64) -> Self {
        self.density = Some(density);
        self
    }

    pub fn boiling_point(mut self, boiling_point: impl Into<Kelvin>) -> Self {
        self.boiling_point = Some(boiling_point.into());
        self
    }

    pub fn dipole_moment(mut self, dipole_moment: f64) -> Self {
        self.dipole_moment = dipole_moment;
        self
    }

    /// J/(mol·K)
    pub fn molar_heat_capacity(mut self, heat_capacity: f64) -> Self {
        self.molar_heat_capacity = Some(heat_capacity);
        self
    }

    /// Latent heat of vaporization (J/mol)
    pub fn latent_heat(mut self, latent_heat: f64) -> Self {
        self.latent_heat = Some(latent_heat);
        self
    }

    pub fn functional_group(mut self, group: FunctionalGroup) -> Self {
        self.functional_groups.push(group);
        self
    }

    pub fn tag(mut self, tag: SpeciesTag) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn build(self) -> Result<Species, ChemistryError> {
        let id = match (&self.name, &self.structure) {
            (Some(name), _) => SpeciesId::catalog(&self.namespace, name),
            (None, Some(code)) => SpeciesId::Novel(code.clone()),
            (None, None) => {
                return Err(ChemistryError::SpeciesConstruction {
                    species: format!("{}:?", self.namespace),
                    message: "species needs either an id or a structure".to_string(),
                })
            }
        };

        let mass = match self.mass {
            Some(mass) if mass > 0.0 && mass.is_finite() => mass,
            _ => {
                return Err(ChemistryError::SpeciesConstruction {
                    species: id.to_string(),
                    message: "molar mass must be positive".to_string(),
                })
            }
        };

        let boiling_point = self.boiling_point.unwrap_or(Kelvin::NEVER);
        let density = self.density.filter(|d| *d > 0.0).unwrap_or(DEFAULT_DENSITY);
        let latent_heat = self
            .latent_heat
            .filter(|l| *l >= 0.0)
            .unwrap_or_else(|| estimate_latent_heat(boiling_point));

        Ok(Species {
            id,
            structure: self.structure,
            charge: self.charge,
            mass,
            density,
            boiling_point,
            dipole_moment: self.dipole_moment,
            molar_heat_capacity: self
                .molar_heat_capacity
                .filter(|c| *c > 0.0)
                .unwrap_or(DEFAULT_MOLAR_HEAT_CAPACITY),
            latent_heat,
            functional_groups: self.functional_groups,
            tags: self.tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::structure::GroupType;
    use crate::core_types::units::Celsius;

    #[test]
    fn test_defaults() {
        let sodium = SpeciesBuilder::new("lab")
            .id("sodium_ion")
            .charge(1)
            .mass(22.99)
            .build()
            .unwrap();
        assert_eq!(sodium.density(), DEFAULT_DENSITY);
        assert_eq!(sodium.boiling_point(), Kelvin::NEVER);
        assert_eq!(sodium.latent_heat(), 0.0);
        assert_eq!(sodium.molar_heat_capacity(), DEFAULT_MOLAR_HEAT_CAPACITY);
        assert!(sodium.is_ion());
    }

    #[test]
    fn test_missing_identity_or_mass() {
        assert!(SpeciesBuilder::new("lab").mass(1.0).build().is_err());
        assert!(SpeciesBuilder::new("lab").id("nothing").build().is_err());
    }

    #[test]
    fn test_novel_species_from_description() {
        let alcohol = GroupType::new("alcohol");
        let code = StructuralCode::parse("lab:linear:CCO").unwrap();
        let description = StructureDescription::new(46.07)
            .with_group(FunctionalGroup::new(&alcohol, [2]))
            .with_boiling_point(Celsius::new(78.4).into());
        let ethanol = SpeciesBuilder::novel(code.clone(), &description).build().unwrap();

        assert!(ethanol.is_novel());
        assert_eq!(ethanol.id(), &SpeciesId::Novel(code));
        assert_eq!(ethanol.functional_groups().len(), 1);
        assert!(ethanol.latent_heat() > 30_000.0);
    }
}
