//! Authoritative game core for Ricochet.
//!
//! Pure, synchronous, deterministic-under-seed game rules: chamber
//! generation, turn scheduling, item effects, elimination, and win
//! detection. No I/O and no clocks — the room layer owns timers and
//! message delivery, this crate owns what the game *means*.
//!
//! # Key types
//!
//! - [`GameState`] — one running game's full server-side state
//! - [`Phase`] — the round lifecycle state machine
//! - [`Chamber`] — the hidden live/blank shell sequence
//! - [`Combatant`] — per-player combat state
//! - [`ActionError`] — why an action was refused

mod chamber;
mod error;
mod item;
mod player;
mod state;
mod turn;

pub use chamber::{Chamber, MAX_SHELLS, MIN_SHELLS};
pub use error::ActionError;
pub use item::{Bag, BAG_CAPACITY, draw_loot};
pub use player::Combatant;
pub use state::{ActionOutcome, Events, GameState, Phase};
pub use turn::{TurnOutcome, next_turn, ring_successor};
