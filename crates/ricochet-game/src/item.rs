//! Loot table and player inventories.
//!
//! Items are data; what they *do* lives in the game state. This module
//! only knows how items are drawn and where they sit.

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use ricochet_protocol::Item;

/// Maximum items a player can hold. Drawing into a full bag evicts the
/// oldest item.
pub const BAG_CAPACITY: usize = 8;

/// Draw weights for the loot table.
///
/// The last three variants are present in shipments but currently have no
/// effect handler (their behavior is unspecified upstream), so they are
/// drawn rarely.
const LOOT_TABLE: [(Item, u32); 8] = [
    (Item::Beer, 20),
    (Item::Cigarettes, 20),
    (Item::MagnifyingGlass, 16),
    (Item::Handsaw, 14),
    (Item::Handcuffs, 14),
    (Item::BurnerPhone, 2),
    (Item::Inverter, 2),
    (Item::Adrenaline, 2),
];

/// Draws `count` items from the weighted loot table.
pub fn draw_loot(rng: &mut impl Rng, count: usize) -> Vec<Item> {
    let dist = WeightedIndex::new(LOOT_TABLE.iter().map(|(_, w)| *w))
        .expect("loot table weights are non-zero constants");
    (0..count).map(|_| LOOT_TABLE[dist.sample(rng)].0).collect()
}

/// An ordered, bounded item bag.
///
/// Order is insertion order; removal preserves the order of the remaining
/// items. Overflow drops the oldest item first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bag {
    items: Vec<Item>,
}

impl Bag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item, evicting the oldest if the bag is full.
    pub fn push(&mut self, item: Item) {
        if self.items.len() >= BAG_CAPACITY {
            self.items.remove(0);
        }
        self.items.push(item);
    }

    /// Looks at the item in `slot` without removing it.
    pub fn get(&self, slot: usize) -> Option<Item> {
        self.items.get(slot).copied()
    }

    /// Removes and returns the item in `slot`, shifting later items down.
    pub fn take(&mut self, slot: usize) -> Option<Item> {
        if slot < self.items.len() {
            Some(self.items.remove(slot))
        } else {
            None
        }
    }

    /// All held items in order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops everything (restart).
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_draw_loot_count_and_membership() {
        let mut rng = StdRng::seed_from_u64(1);
        let loot = draw_loot(&mut rng, 5);
        assert_eq!(loot.len(), 5);
        for item in loot {
            assert!(LOOT_TABLE.iter().any(|(i, _)| *i == item));
        }
    }

    #[test]
    fn test_draw_loot_is_reproducible() {
        let a = draw_loot(&mut StdRng::seed_from_u64(9), 8);
        let b = draw_loot(&mut StdRng::seed_from_u64(9), 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_bag_overflow_evicts_oldest() {
        let mut bag = Bag::new();
        for _ in 0..BAG_CAPACITY {
            bag.push(Item::Beer);
        }
        bag.push(Item::Handsaw);
        assert_eq!(bag.len(), BAG_CAPACITY);
        // Oldest beer gone, handsaw is the newest slot.
        assert_eq!(bag.get(BAG_CAPACITY - 1), Some(Item::Handsaw));
    }

    #[test]
    fn test_bag_take_preserves_order() {
        let mut bag = Bag::new();
        bag.push(Item::Beer);
        bag.push(Item::Cigarettes);
        bag.push(Item::Handcuffs);
        assert_eq!(bag.take(1), Some(Item::Cigarettes));
        assert_eq!(bag.items(), &[Item::Beer, Item::Handcuffs]);
        assert_eq!(bag.take(5), None);
    }
}
