//! # Ricochet
//!
//! Authoritative server for a round-based shell-roulette elimination
//! game. Clients connect over WebSocket, join a room, and play; every
//! rule runs server-side and clients only ever see the events they are
//! entitled to.
//!
//! The workspace is layered:
//!
//! - `ricochet-protocol` — wire types and the JSON codec
//! - `ricochet-game` — pure game rules, no I/O
//! - `ricochet-room` — room actors, lobby, phase timers
//! - `ricochet-transport` — WebSocket listener and connections
//! - `ricochet` (this crate) — server loop and connection handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ricochet::RicochetServer;
//!
//! # async fn run() -> Result<(), ricochet::RicochetError> {
//! let server = RicochetServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::RicochetError;
pub use server::{RicochetServer, RicochetServerBuilder};

/// Commonly used types, re-exported for server binaries and tests.
pub mod prelude {
    pub use ricochet_protocol::{
        ClientIntent, Item, MatchSettings, PlayerId, RejectReason, ServerEvent,
        Shell,
    };
    pub use ricochet_room::RoomConfig;

    pub use crate::{RicochetError, RicochetServer, RicochetServerBuilder};
}
