//! Wire protocol for Ricochet.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientIntent`], [`ServerEvent`], [`GameSnapshot`], etc.)
//!   — the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing so.
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! layer (game semantics). It doesn't know about connections or rooms —
//! it only knows shapes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientIntent, GameSnapshot, Item, MatchSettings, MemberPublic, PlayerId,
    PlayerPublic, Recipient, RejectReason, Seat, ServerEvent, Shell,
};
