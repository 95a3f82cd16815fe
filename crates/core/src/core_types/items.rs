//! Discrete items that take part in heterogeneous reactions
//!
//! Items are opaque to the engine: an id, a set of tags and a count. Reactions
//! describe what they need with an [`ItemRequirement`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry name of an item type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: &str) -> Self {
        ItemId(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stack of identical items
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    pub item: ItemId,
    pub count: u32,
    pub tags: Vec<String>,
}

impl ItemStack {
    pub fn new(item: &ItemId, count: u32) -> Self {
        Self {
            item: item.clone(),
            count,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Remove up to `amount` items
    pub fn shrink(&mut self, amount: u32) {
        self.count = self.count.saturating_sub(amount);
    }
}

/// Which items satisfy a requirement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemMatcher {
    Item(ItemId),
    Tag(String),
}

impl ItemMatcher {
    /// Whether an item of this type, carrying these tags, satisfies the matcher
    pub fn matches(&self, item: &ItemId, tags: &[String]) -> bool {
        match self {
            ItemMatcher::Item(id) => id == item,
            ItemMatcher::Tag(tag) => tags.iter().any(|t| t == tag),
        }
    }

    pub fn matches_stack(&self, stack: &ItemStack) -> bool {
        self.matches(&stack.item, &stack.tags)
    }
}

impl fmt::Display for ItemMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemMatcher::Item(id) => write!(f, "{id}"),
            ItemMatcher::Tag(tag) => write!(f, "#{tag}"),
        }
    }
}

/// A discrete item a reaction needs present (catalyst) or consumes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemRequirement {
    pub matcher: ItemMatcher,
    pub consumed: bool,
}

impl ItemRequirement {
    pub fn consumed(matcher: ItemMatcher) -> Self {
        Self {
            matcher,
            consumed: true,
        }
    }

    pub fn catalyst(matcher: ItemMatcher) -> Self {
        Self {
            matcher,
            consumed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matchers() {
        let zinc = ItemId::new("lab:zinc_ingot");
        let stack = ItemStack::new(&zinc, 3).with_tag("ingots/zinc");
        assert!(ItemMatcher::Item(zinc.clone()).matches_stack(&stack));
        assert!(ItemMatcher::Tag("ingots/zinc".into()).matches_stack(&stack));
        assert!(!ItemMatcher::Tag("ingots/iron".into()).matches_stack(&stack));
    }

    #[test]
    fn test_shrink_saturates() {
        let mut stack = ItemStack::new(&ItemId::new("lab:glass_rod"), 2);
        stack.shrink(5);
        assert!(stack.is_empty());
    }
}
