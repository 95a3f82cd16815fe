//! Turning templates into concrete reactions for one mixture

use std::sync::Arc;

use tracing::trace;

use crate::catalog::Catalog;
use crate::core_types::reaction::{Reaction, ReactionKey};
use crate::generic::{GroupOccurrence, TemplateKind};
use crate::simulation::Mixture;
use crate::FxIndexMap;

/// Specialize every applicable template against the mixture's group index
///
/// Templates are looked up per group type present. A double-group template
/// only runs while its declared first group type is being iterated, so each
/// unordered pair is visited once. Pairs whose occurrences sit on the same
/// species are skipped. Reactions are deduplicated by key, first one wins.
pub fn specialize(catalog: &Catalog, mixture: &Mixture) -> Vec<Arc<Reaction>> {
    let mut found: FxIndexMap<ReactionKey, Arc<Reaction>> = FxIndexMap::default();

    for group_type in mixture.group_types() {
        for template in catalog.generic_reactions_for(group_type) {
            if !template.is_possible_in(mixture) {
                continue;
            }

            match template.kind() {
                TemplateKind::SingleGroup { group, generate } => {
                    if group != group_type {
                        continue;
                    }
                    for occurrence in mixture.group_occurrences(group) {
                        keep(&mut found, generate(catalog, occurrence));
                    }
                }
                TemplateKind::DoubleGroup {
                    first,
                    second,
                    generate,
                } => {
                    if first != group_type {
                        continue;
                    }
                    for a in mixture.group_occurrences(first) {
                        for b in mixture.group_occurrences(second) {
                            if same_species(a, b) {
                                continue;
                            }
                            keep(&mut found, generate(catalog, a, b));
                        }
                    }
                }
            }
        }
    }

    trace!("Specialized {} generic reactions", found.len());
    found.into_values().collect()
}

fn same_species(a: &GroupOccurrence, b: &GroupOccurrence) -> bool {
    a.species.id() == b.species.id()
}

fn keep(found: &mut FxIndexMap<ReactionKey, Arc<Reaction>>, reaction: Option<Reaction>) {
    if let Some(reaction) = reaction {
        found
            .entry(reaction.key().clone())
            .or_insert_with(|| Arc::new(reaction));
    }
}
