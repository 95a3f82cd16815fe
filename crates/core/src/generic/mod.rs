//! Generic reactions: templates over functional groups
//!
//! A template does not name species. It names one or two functional group
//! types and a generator that, given concrete occurrences of those groups,
//! either produces a concrete [`Reaction`] or declines with `None` ("not
//! chemically valid here"). Mixtures specialize the templates against the
//! groups they contain; see [`specializer`].

pub(crate) mod specializer;

use std::fmt;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::core_types::reaction::{Reaction, ReactionId};
use crate::core_types::species::Species;
use crate::core_types::structure::{FunctionalGroup, GroupType};
use crate::simulation::Mixture;

/// A functional group found on a particular species
#[derive(Debug, Clone)]
pub struct GroupOccurrence {
    pub species: Arc<Species>,
    pub group: FunctionalGroup,
}

/// Generator for single-group templates
pub type SingleGroupGenerator =
    Arc<dyn Fn(&Catalog, &GroupOccurrence) -> Option<Reaction> + Send + Sync>;

/// Generator for double-group templates; arguments are (first, second)
pub type DoubleGroupGenerator =
    Arc<dyn Fn(&Catalog, &GroupOccurrence, &GroupOccurrence) -> Option<Reaction> + Send + Sync>;

/// Global applicability check run before any occurrence is enumerated
pub type MixtureGate = Arc<dyn Fn(&Mixture) -> bool + Send + Sync>;

/// The shapes a template can take
#[derive(Clone)]
pub enum TemplateKind {
    /// One reaction per occurrence of `group`
    SingleGroup {
        group: GroupType,
        generate: SingleGroupGenerator,
    },
    /// One reaction per pair of occurrences on different species
    DoubleGroup {
        first: GroupType,
        second: GroupType,
        generate: DoubleGroupGenerator,
    },
}

/// A registered generic reaction
#[derive(Clone)]
pub struct GenericReaction {
    id: ReactionId,
    kind: TemplateKind,
    gate: Option<MixtureGate>,
}

impl GenericReaction {
    pub fn single_group(
        id: ReactionId,
        group: &GroupType,
        generate: impl Fn(&Catalog, &GroupOccurrence) -> Option<Reaction> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            kind: TemplateKind::SingleGroup {
                group: group.clone(),
                generate: Arc::new(generate),
            },
            gate: None,
        }
    }

    pub fn double_group(
        id: ReactionId,
        first: &GroupType,
        second: &GroupType,
        generate: impl Fn(&Catalog, &GroupOccurrence, &GroupOccurrence) -> Option<Reaction>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            id,
            kind: TemplateKind::DoubleGroup {
                first: first.clone(),
                second: second.clone(),
                generate: Arc::new(generate),
            },
            gate: None,
        }
    }

    /// Only specialize in mixtures passing `gate`
    pub fn only_when(mut self, gate: impl Fn(&Mixture) -> bool + Send + Sync + 'static) -> Self {
        self.gate = Some(Arc::new(gate));
        self
    }

    pub fn id(&self) -> &ReactionId {
        &self.id
    }

    pub fn kind(&self) -> &TemplateKind {
        &self.kind
    }

    /// Group types this template involves
    pub fn group_types(&self) -> Vec<&GroupType> {
        match &self.kind {
            TemplateKind::SingleGroup { group, .. } => vec![group],
            TemplateKind::DoubleGroup { first, second, .. } => vec![first, second],
        }
    }

    pub fn is_possible_in(&self, mixture: &Mixture) -> bool {
        self.gate.as_ref().map_or(true, |gate| gate(mixture))
    }
}

impl fmt::Debug for GenericReaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match &self.kind {
            TemplateKind::SingleGroup { group, .. } => format!("single({group})"),
            TemplateKind::DoubleGroup { first, second, .. } => format!("double({first}, {second})"),
        };
        f.debug_struct("GenericReaction")
            .field("id", &self.id)
            .field("kind", &shape)
            .field("gated", &self.gate.is_some())
            .finish()
    }
}

pub use specializer::specialize;
