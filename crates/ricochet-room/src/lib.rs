//! Room layer for Ricochet.
//!
//! Each room is an actor: a Tokio task owning the lobby roster, chat,
//! host role, the game state, and the phase timers for one room. The
//! [`RoomRegistry`] creates rooms on demand, routes intents by player id,
//! and reaps rooms when the last player leaves.

mod config;
mod error;
mod registry;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{PlayerSender, RoomHandle, RoomInfo};
