//! Structural-formula collaborator types
//!
//! The engine does not parse molecular structures itself. It consumes:
//! - a canonical [`StructuralCode`] naming a structure (`namespace:topology:body`)
//! - the functional groups a structure contains
//! - a [`StructureInterpreter`] that turns a code into the physical
//!   description needed to build a novel species
//!
//! [`StructureTable`] is the in-memory interpreter used when no structural
//! parser is plugged in.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::core_types::units::Kelvin;
use crate::error::ChemistryError;

/// Canonical serialized structure of a molecule
///
/// Two species with equal codes are the same species.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StructuralCode {
    namespace: String,
    topology: String,
    body: String,
}

impl StructuralCode {
    /// Parse a three-part code
    pub fn parse(code: &str) -> Result<Self, ChemistryError> {
        let mut parts = code.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(topology), Some(body), None)
                if !namespace.is_empty() && !topology.is_empty() && !body.is_empty() =>
            {
                Ok(Self {
                    namespace: namespace.to_string(),
                    topology: topology.to_string(),
                    body: body.to_string(),
                })
            }
            _ => Err(ChemistryError::InvalidStructuralCode(code.to_string())),
        }
    }

    /// Whether an identifier string has the three-part structural shape
    pub fn looks_like(id: &str) -> bool {
        id.split(':').count() == 3
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn topology(&self) -> &str {
        &self.topology
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl fmt::Display for StructuralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.topology, self.body)
    }
}

impl FromStr for StructuralCode {
    type Err = ChemistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StructuralCode {
    type Error = ChemistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StructuralCode> for String {
    fn from(code: StructuralCode) -> String {
        code.to_string()
    }
}

/// Kind of reactive pattern found in a structure ("alcohol", "alkene", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupType(Arc<str>);

impl GroupType {
    pub fn new(name: &str) -> Self {
        GroupType(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One occurrence of a functional group inside a structure
///
/// `sites` are opaque atom indices; only generic reaction generators read them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionalGroup {
    pub group_type: GroupType,
    pub sites: Vec<u32>,
}

impl FunctionalGroup {
    pub fn new(group_type: &GroupType, sites: impl Into<Vec<u32>>) -> Self {
        Self {
            group_type: group_type.clone(),
            sites: sites.into(),
        }
    }
}

/// What a structural parser knows about one structure
#[derive(Debug, Clone, PartialEq)]
pub struct StructureDescription {
    /// Molar mass (g/mol)
    pub mass: f64,
    pub charge: i32,
    pub functional_groups: Vec<FunctionalGroup>,
    pub cyclic: bool,
    /// Structures that cannot exist outside the simulation
    pub hypothetical: bool,
    pub boiling_point: Option<Kelvin>,
    /// Pure-liquid density (g/L)
    pub density: Option<f64>,
}

impl StructureDescription {
    pub fn new(mass: f64) -> Self {
        Self {
            mass,
            charge: 0,
            functional_groups: Vec::new(),
            cyclic: false,
            hypothetical: false,
            boiling_point: None,
            density: None,
        }
    }

    pub fn with_group(mut self, group: FunctionalGroup) -> Self {
        self.functional_groups.push(group);
        self
    }

    pub fn with_charge(mut self, charge: i32) -> Self {
        self.charge = charge;
        self
    }

    pub fn with_boiling_point(mut self, boiling_point: Kelvin) -> Self {
        self.boiling_point = Some(boiling_point);
        self
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = Some(density);
        self
    }
}

/// Structural-formula subsystem as seen by the engine
pub trait StructureInterpreter: fmt::Debug + Send + Sync {
    /// Describe a structure, or `None` if it cannot be interpreted
    fn describe(&self, code: &StructuralCode) -> Option<StructureDescription>;
}

/// Interpreter that knows nothing; every novel structure is unresolvable
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStructures;

impl StructureInterpreter for NoStructures {
    fn describe(&self, _code: &StructuralCode) -> Option<StructureDescription> {
        None
    }
}

/// Lookup-table interpreter
#[derive(Debug, Default, Clone)]
pub struct StructureTable {
    entries: FxHashMap<StructuralCode, StructureDescription>,
}

impl StructureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a structure description
    pub fn insert(&mut self, code: StructuralCode, description: StructureDescription) -> &mut Self {
        self.entries.insert(code, description);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StructureInterpreter for StructureTable {
    fn describe(&self, code: &StructuralCode) -> Option<StructureDescription> {
        self.entries.get(code).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_code_round_trip() {
        let code = StructuralCode::parse("lab:linear:CCO").unwrap();
        assert_eq!(code.namespace(), "lab");
        assert_eq!(code.topology(), "linear");
        assert_eq!(code.body(), "CCO");
        assert_eq!(code.to_string(), "lab:linear:CCO");
        assert_eq!(code.to_string().parse::<StructuralCode>().unwrap(), code);
    }

    #[test]
    fn test_structural_code_rejects_wrong_shape() {
        assert!(StructuralCode::parse("lab:water").is_err());
        assert!(StructuralCode::parse("a:b:c:d").is_err());
        assert!(StructuralCode::parse("a::c").is_err());
        assert!(StructuralCode::looks_like("a:b:c"));
        assert!(!StructuralCode::looks_like("lab:water"));
    }

    #[test]
    fn test_structure_table_lookup() {
        let alcohol = GroupType::new("alcohol");
        let code = StructuralCode::parse("test:linear:CCO").unwrap();
        let mut table = StructureTable::new();
        table.insert(
            code.clone(),
            StructureDescription::new(46.07).with_group(FunctionalGroup::new(&alcohol, [2])),
        );

        let described = table.describe(&code).unwrap();
        assert_eq!(described.functional_groups.len(), 1);
        assert_eq!(described.functional_groups[0].group_type, alcohol);
        assert!(NoStructures.describe(&code).is_none());
    }
}
