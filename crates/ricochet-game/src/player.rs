//! Per-combatant state for an active game.

use serde::{Deserialize, Serialize};

use ricochet_protocol::{Item, PlayerId, PlayerPublic, Seat};

use crate::item::Bag;

/// One seated player's combat state.
///
/// `alive` is monotonic within a game: once false it never flips back
/// except through a full restart (which rebuilds the game from scratch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: PlayerId,
    pub name: String,
    pub seat: Seat,
    pub hp: u32,
    pub max_hp: u32,
    pub alive: bool,
    pub handcuffed: bool,
    /// Armed saw: consumed by this player's next shot, doubling damage
    /// when that shell is live.
    pub sawed: bool,
    pub bag: Bag,
}

impl Combatant {
    pub fn new(id: PlayerId, name: String, seat: Seat, hp: u32) -> Self {
        Self {
            id,
            name,
            seat,
            hp,
            max_hp: hp,
            alive: true,
            handcuffed: false,
            sawed: false,
            bag: Bag::new(),
        }
    }

    /// Applies damage, flooring hp at 0. Returns `true` if this killed the
    /// player (exactly one transition to not-alive).
    pub fn apply_damage(&mut self, damage: u32) -> bool {
        self.hp = self.hp.saturating_sub(damage);
        if self.hp == 0 && self.alive {
            self.alive = false;
            return true;
        }
        false
    }

    /// Heals one hp, capped at max.
    pub fn heal(&mut self) {
        self.hp = (self.hp + 1).min(self.max_hp);
    }

    /// Adds an item to the tray (oldest evicted on overflow).
    pub fn give(&mut self, item: Item) {
        self.bag.push(item);
    }

    /// Public, table-visible view of this combatant.
    pub fn public(&self) -> PlayerPublic {
        PlayerPublic {
            id: self.id,
            name: self.name.clone(),
            seat: self.seat,
            hp: self.hp,
            max_hp: self.max_hp,
            alive: self.alive,
            handcuffed: self.handcuffed,
            sawed: self.sawed,
            items: self.bag.items().to_vec(),
        }
    }
}
