//! Error types for the room layer.

use ricochet_protocol::{PlayerId, RejectReason};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room is full — all seats taken.
    #[error("room {0} is full")]
    RoomFull(String),

    /// The display name is already taken in this room
    /// (case-insensitive).
    #[error("name {0:?} already taken")]
    NameTaken(String),

    /// The room's game has already started.
    #[error("room {0} has a game in progress")]
    GameInProgress(String),

    /// The player is not in any room.
    #[error("player {0} not in a room")]
    NotInRoom(PlayerId),

    /// The player is already seated in a room (one room per connection).
    #[error("already in room {0}")]
    AlreadyInRoom(String),

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(String),
}

impl RoomError {
    /// The rejection to surface to the client, when one applies.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::RoomFull(_) => Some(RejectReason::RoomFull),
            Self::NameTaken(_) => Some(RejectReason::NameTaken),
            Self::GameInProgress(_) => Some(RejectReason::GameInProgress),
            Self::NotInRoom(_) => Some(RejectReason::NotInRoom),
            Self::AlreadyInRoom(_) => Some(RejectReason::AlreadyInRoom),
            Self::Unavailable(_) => None,
        }
    }
}
