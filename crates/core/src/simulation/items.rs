//! Discrete items in a mixture
//!
//! Whole stacks sit outside the solution and are only consumed a whole item
//! at a time by the dissolution pass. Items produced by reactions go into a
//! partially-dissolved pool (items per liter) that kinetic reactions can draw
//! on, and precipitate back out as whole items once there is enough.

use std::sync::Arc;

use tracing::trace;

use crate::catalog::Catalog;
use crate::core_types::items::{ItemId, ItemMatcher, ItemStack};
use crate::core_types::reaction::Reaction;
use crate::core_types::units::Liters;
use crate::simulation::mixture::DissolvedItem;
use crate::simulation::{Mixture, ReactionContext};

impl Mixture {
    /// Consume whole items from `items` in item-consuming reactions
    ///
    /// Reactions go in ascending rate order. Each repeatedly fires one item's
    /// worth of reaction while its molecular reactants suffice and every
    /// consumed requirement can claim a distinct unit from the stacks. Empty
    /// stacks are dropped afterwards. Returns how many times reactions fired.
    pub fn dissolve_items(
        &mut self,
        catalog: &Catalog,
        items: &mut Vec<ItemStack>,
        volume: Liters,
        uv_power: f64,
        electrolysing: bool,
    ) -> u32 {
        let liters = *volume;
        if liters <= 0.0 || items.iter().all(ItemStack::is_empty) {
            return 0;
        }

        let apparatus = ReactionContext {
            items: &[],
            uv_power,
            electrolysing,
        };
        let cycles = self.config.cycles();
        let consuming: Vec<Arc<Reaction>> = self
            .possible_reactions(catalog)
            .iter()
            .filter(|r| r.consumes_items() && r.moles_per_item() > 0.0)
            .filter(|r| !r.requires_electrolysis() || electrolysing)
            .filter(|r| !r.requires_uv() || uv_power > 0.0)
            .cloned()
            .collect();
        let mut candidates: Vec<(Arc<Reaction>, f64)> = consuming
            .into_iter()
            .map(|r| {
                let rate = self.rate_of(&r, &apparatus, cycles);
                (r, rate)
            })
            .collect();
        candidates.sort_by(|(a, rate_a), (b, rate_b)| {
            rate_a.total_cmp(rate_b).then_with(|| a.key().cmp(b.key()))
        });

        let mut fired = 0;
        for (reaction, _) in candidates {
            let moles = reaction.moles_per_item() / liters;
            loop {
                if !self.item_catalysts_present(&reaction, items) {
                    break;
                }
                let reactants_suffice = reaction.reactants().iter().all(|r| {
                    self.concentration_of(r.species.id()) >= moles * f64::from(r.ratio)
                });
                if !reactants_suffice {
                    break;
                }
                let Some(claimed) = claim_units(&reaction, items) else {
                    break;
                };
                for index in claimed {
                    items[index].shrink(1);
                }
                self.apply_reaction(&reaction, moles);
                fired += 1;
            }
        }

        items.retain(|stack| !stack.is_empty());
        if fired > 0 {
            trace!("Dissolution pass fired {} item reactions", fired);
        }
        fired
    }

    /// Move whole items' worth of the dissolved pool out into `items`
    pub fn precipitate(&mut self, items: &mut Vec<ItemStack>, volume: Liters) {
        let liters = *volume;
        if liters <= 0.0 {
            return;
        }
        for (id, dissolved) in &mut self.dissolved {
            let whole = (dissolved.amount * liters).floor();
            if whole < 1.0 {
                continue;
            }
            dissolved.amount = (dissolved.amount - whole / liters).max(0.0);
            let count = whole.min(f64::from(u32::MAX)) as u32;
            match items.iter_mut().find(|stack| stack.item == *id) {
                Some(stack) => stack.count = stack.count.saturating_add(count),
                None => items.push(ItemStack {
                    item: id.clone(),
                    count,
                    tags: dissolved.tags.clone(),
                }),
            }
            trace!("Precipitated {} × {}", count, id);
        }
        self.dissolved.retain(|_, d| d.amount > 0.0);
    }

    /// Items per liter in the pool satisfying `matcher`
    pub(crate) fn dissolved_matching(&self, matcher: &ItemMatcher) -> f64 {
        self.dissolved
            .iter()
            .filter(|(id, d)| matcher.matches(id, &d.tags))
            .map(|(_, d)| d.amount)
            .sum()
    }

    /// Take `items_per_liter` from the matching pool entries in proportion
    pub(crate) fn consume_dissolved(&mut self, matcher: &ItemMatcher, items_per_liter: f64) {
        let total = self.dissolved_matching(matcher);
        if total <= 0.0 || items_per_liter <= 0.0 {
            return;
        }
        let fraction = (items_per_liter / total).min(1.0);
        for (id, dissolved) in &mut self.dissolved {
            if matcher.matches(id, &dissolved.tags) {
                dissolved.amount -= dissolved.amount * fraction;
            }
        }
        self.dissolved.retain(|_, d| d.amount > 0.0);
    }

    pub(crate) fn deposit_dissolved(&mut self, item: &ItemId, tags: &[String], items_per_liter: f64) {
        if items_per_liter <= 0.0 || !items_per_liter.is_finite() {
            return;
        }
        self.dissolved
            .entry(item.clone())
            .or_insert_with(|| DissolvedItem {
                tags: tags.to_vec(),
                amount: 0.0,
            })
            .amount += items_per_liter;
    }

    fn item_catalysts_present(&self, reaction: &Reaction, items: &[ItemStack]) -> bool {
        reaction
            .item_requirements()
            .iter()
            .filter(|r| !r.consumed)
            .all(|requirement| {
                items
                    .iter()
                    .any(|stack| !stack.is_empty() && requirement.matcher.matches_stack(stack))
                    || self.dissolved_matching(&requirement.matcher) > 0.0
            })
    }
}

/// Indices of one unit per consumed requirement, all claimable at once
fn claim_units(reaction: &Reaction, items: &[ItemStack]) -> Option<Vec<usize>> {
    let mut remaining: Vec<u32> = items.iter().map(|stack| stack.count).collect();
    let mut claimed = Vec::new();
    for requirement in reaction.item_requirements().iter().filter(|r| r.consumed) {
        let index = items
            .iter()
            .enumerate()
            .position(|(i, stack)| remaining[i] > 0 && requirement.matcher.matches_stack(stack))?;
        remaining[index] -= 1;
        claimed.push(index);
    }
    Some(claimed)
}
