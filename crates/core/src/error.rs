//! Error types for catalog construction and persisted-state handling
//!
//! Construction errors are author errors: they surface while species and
//! reactions are being defined and abort registration of the offending entry.
//! Runtime lookups never produce errors; they return `Option` and the caller
//! decides whether absence is worth a warning.

use thiserror::Error;

use crate::catalog::SpeciesRole;

/// Errors raised while defining species and reactions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChemistryError {
    /// The reaction definition is malformed
    #[error("invalid reaction {reaction}: {message}")]
    ReactionConstruction { reaction: String, message: String },

    /// The species definition is malformed
    #[error("invalid species {species}: {message}")]
    SpeciesConstruction { species: String, message: String },

    /// A species or reaction with this id is already registered
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    /// Forward and reverse parameters disagree with Hess's law
    #[error(
        "reaction {reaction} breaks Hess's law: reverse activation energy {reverse_activation_energy} kJ/mol \
         (expected {expected_activation_energy}), reverse enthalpy change {reverse_enthalpy_change} kJ/mol \
         (expected {expected_enthalpy_change})"
    )]
    ThermodynamicInconsistency {
        reaction: String,
        reverse_activation_energy: f64,
        expected_activation_energy: f64,
        reverse_enthalpy_change: f64,
        expected_enthalpy_change: f64,
    },

    /// Conjugate base charge must be one less than the acid's
    #[error("conjugate base {base} (charge {base_charge}) does not match acid {acid} (charge {acid_charge})")]
    ChargeConservation {
        acid: String,
        acid_charge: i32,
        base: String,
        base_charge: i32,
    },

    /// The id does not name anything known
    #[error("no {kind} with id '{id}'")]
    NotFound { kind: &'static str, id: String },

    /// Structural codes are exactly three ':'-separated parts
    #[error("invalid structural code '{0}'")]
    InvalidStructuralCode(String),

    /// A helper needed a species role nobody assigned
    #[error("no species assigned to role {0:?}")]
    MissingRole(SpeciesRole),
}

impl ChemistryError {
    pub(crate) fn construction(reaction: impl Into<String>, message: impl Into<String>) -> Self {
        ChemistryError::ReactionConstruction {
            reaction: reaction.into(),
            message: message.into(),
        }
    }
}

/// Errors reading or writing persisted mixtures
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The record could not be encoded
    #[error("failed to serialize mixture: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    /// The text is not a valid mixture record
    #[error("failed to parse mixture: {0}")]
    ParseFailed(#[source] serde_json::Error),
}
