//! The kinetic tick
//!
//! Each cycle snapshots the contents, ranks every viable reaction by rate
//! (ascending, ties by reaction key), clamps each to its limiting reagent in
//! that order and applies it. The fastest reaction goes last and sees the
//! pool the slower ones left behind. Equilibrium holds when no species moved
//! further than the configured tolerance.

use std::sync::Arc;

use tracing::trace;

use crate::catalog::Catalog;
use crate::core_types::reaction::Reaction;
use crate::core_types::species::SpeciesId;
use crate::physics::arrhenius;
use crate::simulation::{Mixture, ReactionContext};

impl Mixture {
    /// Advance the mixture by one tick
    pub fn tick_once(&mut self, catalog: &Catalog, context: &ReactionContext<'_>) {
        self.last_tick_reactions.clear();
        let cycles = self.config.cycles();

        for _ in 0..cycles {
            if self.equilibrium {
                break;
            }
            self.equilibrium = true;

            let before: Vec<(SpeciesId, f64)> = self
                .contents
                .iter()
                .map(|(id, c)| (id.clone(), c.concentration))
                .collect();

            for (reaction, rate) in self.ranked_reactions(catalog, context, cycles) {
                let moles = self.limiting_moles(&reaction, rate);
                if moles.is_nan() || moles <= 0.0 {
                    continue;
                }
                self.last_tick_reactions
                    .entry(reaction.key().clone())
                    .or_insert_with(|| (Arc::clone(&reaction), 0.0))
                    .1 += moles;
                if reaction.consumes_items() {
                    let items = moles / reaction.moles_per_item();
                    for requirement in reaction.item_requirements().iter().filter(|r| r.consumed) {
                        self.consume_dissolved(&requirement.matcher, items);
                    }
                }
                self.apply_reaction(&reaction, moles);
            }

            let tolerance = self.config.equilibrium_tolerance;
            let moved = before
                .iter()
                .any(|(id, old)| !tolerance.very_close(*old, self.concentration_of(id)));
            if moved {
                self.equilibrium = false;
            }
        }

        self.purge_removals();
    }

    /// Viable reactions with their per-cycle rates, slowest first
    fn ranked_reactions(
        &mut self,
        catalog: &Catalog,
        context: &ReactionContext<'_>,
        cycles: u32,
    ) -> Vec<(Arc<Reaction>, f64)> {
        let candidates = self.possible_reactions(catalog).to_vec();
        let mut ranked: Vec<(Arc<Reaction>, f64)> = candidates
            .into_iter()
            .filter(|r| self.is_viable(r, context))
            .map(|r| {
                let rate = self.rate_of(&r, context, cycles);
                (r, rate)
            })
            .filter(|(_, rate)| *rate > 0.0)
            .collect();

        ranked.sort_by(|(a, rate_a), (b, rate_b)| {
            rate_a.total_cmp(rate_b).then_with(|| a.key().cmp(b.key()))
        });
        ranked
    }

    /// Whether the reaction's species, items and apparatus are all present
    ///
    /// Consumed items must already be in the dissolved pool; whole stacks are
    /// handled by the dissolution pass.
    fn is_viable(&self, reaction: &Reaction, context: &ReactionContext<'_>) -> bool {
        if reaction.requires_electrolysis() && !context.electrolysing {
            return false;
        }
        if reaction.requires_uv() && context.uv_power <= 0.0 {
            return false;
        }
        if !reaction
            .orders()
            .iter()
            .all(|o| self.concentration_of(o.species.id()) > 0.0)
        {
            return false;
        }
        if reaction.consumes_items() && reaction.moles_per_item() <= 0.0 {
            return false;
        }
        reaction.item_requirements().iter().all(|requirement| {
            let dissolved = self
                .dissolved
                .iter()
                .any(|(id, d)| d.amount > 0.0 && requirement.matcher.matches(id, &d.tags));
            if requirement.consumed {
                dissolved
            } else {
                dissolved
                    || context
                        .items
                        .iter()
                        .any(|stack| !stack.is_empty() && requirement.matcher.matches_stack(stack))
            }
        })
    }

    /// Moles of reaction per liter this cycle, before clamping
    pub(crate) fn rate_of(
        &self,
        reaction: &Reaction,
        context: &ReactionContext<'_>,
        cycles: u32,
    ) -> f64 {
        let k = reaction.rate_constant(self.temperature);
        let terms = reaction
            .orders()
            .iter()
            .map(|o| (self.concentration_of(o.species.id()), o.order));
        let rate = arrhenius::rate_per_tick(k, terms, self.config.ticks_per_second, cycles);
        if reaction.requires_uv() {
            rate * context.uv_power
        } else {
            rate
        }
    }

    /// Clamp `rate` to what the reactants and dissolved items can supply
    fn limiting_moles(&self, reaction: &Reaction, rate: f64) -> f64 {
        let mut moles = rate;
        for reactant in reaction.reactants() {
            let available = self.concentration_of(reactant.species.id());
            let ratio = f64::from(reactant.ratio);
            if available < moles * ratio {
                moles = available / ratio;
            }
        }

        if reaction.consumes_items() {
            let per_item = reaction.moles_per_item();
            for requirement in reaction.item_requirements().iter().filter(|r| r.consumed) {
                let available = self.dissolved_matching(&requirement.matcher);
                if available * per_item < moles {
                    moles = available * per_item;
                }
            }
        }
        moles
    }

    /// Apply `moles_per_liter` of a reaction
    ///
    /// Consumed items are drawn by the caller, from whichever pool it
    /// clamped against. New products or reactants returning from zero mark
    /// the possible reactions stale through the usual bookkeeping.
    pub(crate) fn apply_reaction(&mut self, reaction: &Reaction, moles_per_liter: f64) {
        for reactant in reaction.reactants() {
            self.change_concentration(
                &reactant.species,
                -moles_per_liter * f64::from(reactant.ratio),
                false,
            );
        }

        for product in reaction.products() {
            self.change_concentration(
                &product.species,
                moles_per_liter * f64::from(product.ratio),
                true,
            );
        }

        self.heat(-reaction.enthalpy_change() * 1000.0 * moles_per_liter);
        self.accumulate_result(reaction, moles_per_liter);

        for product in reaction.item_products() {
            self.deposit_dissolved(
                &product.item,
                &product.tags,
                product.per_mole * moles_per_liter,
            );
        }
        trace!("Applied {} mol/L of {}", moles_per_liter, reaction.key());
    }
}
