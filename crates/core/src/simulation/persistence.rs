//! Saving and restoring mixtures
//!
//! A [`MixtureRecord`] names species and reactions by their string ids, so
//! restoring needs the catalog. Anything the catalog cannot resolve is
//! dropped with a warning and the rest of the mixture still loads.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::core_types::items::ItemId;
use crate::core_types::result::ResultKey;
use crate::core_types::units::Kelvin;
use crate::error::PersistenceError;
use crate::physics::phase::TEMPERATURE_FLOOR;
use crate::simulation::mixture::{AccumulatedResult, DissolvedItem};
use crate::simulation::Mixture;

/// Persisted form of a [`Mixture`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MixtureRecord {
    #[serde(default)]
    pub translation_key: String,
    /// K; the reference temperature when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub contents: Vec<ContentRecord>,
    #[serde(default)]
    pub at_equilibrium: bool,
    #[serde(default)]
    pub results: Vec<ResultRecord>,
    #[serde(default)]
    pub last_tick_reactions: Vec<ReactionRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dissolved_items: Vec<DissolvedRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentRecord {
    /// Catalog id or structural code
    pub molecule: String,
    pub concentration: f64,
    /// Gas fraction; guessed from the boiling point when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaseous: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultRecord {
    /// Id of the reaction carrying the result
    pub result: String,
    pub moles_per_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReactionRecord {
    pub reaction: String,
    pub moles_per_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DissolvedRecord {
    pub item: ItemId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub amount: f64,
}

impl Mixture {
    /// Snapshot the mixture for persistence
    ///
    /// Results and reactions without a catalog id (novel-compound payouts,
    /// generated reactions) cannot be restored and are left out.
    pub fn to_record(&self) -> MixtureRecord {
        let contents = self
            .contents
            .values()
            .filter(|c| c.concentration > 0.0)
            .map(|c| ContentRecord {
                molecule: c.species.id().to_string(),
                concentration: c.concentration,
                gaseous: Some(c.gas_fraction),
            })
            .collect();

        let results = self
            .results
            .values()
            .filter_map(|r| {
                let Some(reaction) = &r.reaction else {
                    debug!("Not persisting result {:?} without a reaction id", r.result);
                    return None;
                };
                Some(ResultRecord {
                    result: reaction.to_string(),
                    moles_per_volume: r.moles_per_liter,
                })
            })
            .collect();

        let last_tick_reactions = self
            .last_tick_reactions
            .values()
            .filter_map(|(reaction, moles)| {
                reaction.id().map(|id| ReactionRecord {
                    reaction: id.to_string(),
                    moles_per_volume: *moles,
                })
            })
            .collect();

        let dissolved_items = self
            .dissolved
            .iter()
            .map(|(id, d)| DissolvedRecord {
                item: id.clone(),
                tags: d.tags.clone(),
                amount: d.amount,
            })
            .collect();

        MixtureRecord {
            translation_key: self.translation_key.clone(),
            temperature: Some(self.temperature),
            contents,
            at_equilibrium: self.equilibrium,
            results,
            last_tick_reactions,
            dissolved_items,
        }
    }

    /// Rebuild a mixture, skipping anything the catalog does not know
    pub fn from_record(record: &MixtureRecord, catalog: &Catalog) -> Mixture {
        let mut mixture = Mixture::new().named(&record.translation_key);
        mixture.temperature = record
            .temperature
            .filter(|t| t.is_finite() && *t >= 0.0)
            .unwrap_or(*Kelvin::REFERENCE)
            .max(TEMPERATURE_FLOOR);

        for content in &record.contents {
            let Some(species) = catalog.resolve_species(&content.molecule) else {
                continue;
            };
            if content.concentration <= 0.0 || !content.concentration.is_finite() {
                warn!(
                    "Skipping {} with concentration {}",
                    content.molecule, content.concentration
                );
                continue;
            }
            mixture.change_concentration(&species, content.concentration, false);

            let gas_fraction = content.gaseous.map_or_else(
                || species.equilibrium_gas_fraction(mixture.temperature),
                |g| g.clamp(0.0, 1.0),
            );
            if let Some(constituent) = mixture.contents.get_mut(species.id()) {
                constituent.gas_fraction = gas_fraction;
            }
            if gas_fraction != 0.0 && gas_fraction != 1.0 {
                mixture.boiling = true;
            }
        }

        mixture.equilibrium = record.at_equilibrium;

        for entry in &record.results {
            let Some(reaction) = catalog.reaction_by_name(&entry.result) else {
                warn!("Skipping result of unknown reaction '{}'", entry.result);
                continue;
            };
            let Some(result) = reaction.result() else {
                warn!("Reaction '{}' has no result", entry.result);
                continue;
            };
            mixture.results.insert(
                ResultKey::Reaction(reaction.key().clone()),
                AccumulatedResult {
                    result: Arc::clone(result),
                    reaction: reaction.id().cloned(),
                    moles_per_liter: entry.moles_per_volume,
                },
            );
        }

        for entry in &record.last_tick_reactions {
            let Some(reaction) = catalog.reaction_by_name(&entry.reaction) else {
                warn!("Skipping last-tick entry of unknown reaction '{}'", entry.reaction);
                continue;
            };
            mixture.last_tick_reactions.insert(
                reaction.key().clone(),
                (Arc::clone(reaction), entry.moles_per_volume),
            );
        }

        for entry in &record.dissolved_items {
            if entry.amount > 0.0 {
                mixture.dissolved.insert(
                    entry.item.clone(),
                    DissolvedItem {
                        tags: entry.tags.clone(),
                        amount: entry.amount,
                    },
                );
            }
        }

        mixture.composition_changed();
        mixture
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        serde_json::to_string_pretty(&self.to_record()).map_err(PersistenceError::SerializeFailed)
    }

    pub fn from_json(json: &str, catalog: &Catalog) -> Result<Mixture, PersistenceError> {
        let record: MixtureRecord =
            serde_json::from_str(json).map_err(PersistenceError::ParseFailed)?;
        Ok(Mixture::from_record(&record, catalog))
    }
}
