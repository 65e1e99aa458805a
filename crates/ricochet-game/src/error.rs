//! Error types for the game core.

use ricochet_protocol::RejectReason;

/// Why a player action was refused. None of these are fatal to the room.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// Wrong player, or the game is not accepting actions right now.
    #[error("not your turn")]
    NotYourTurn,

    /// The referenced inventory slot is empty.
    #[error("no item in that slot")]
    NoSuchItem,

    /// The item exists but has no effect handler; nothing was consumed.
    #[error("item cannot be used")]
    UnusableItem,

    /// The shot target doesn't exist or is already dead. Treated as a
    /// silent no-op: no rejection event is sent.
    #[error("unknown or dead target")]
    UnknownTarget,
}

impl ActionError {
    /// The rejection to surface to the offending client, or `None` when
    /// the error is deliberately silent.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::NotYourTurn => Some(RejectReason::NotYourTurn),
            Self::NoSuchItem => Some(RejectReason::NoSuchItem),
            Self::UnusableItem => Some(RejectReason::UnusableItem),
            Self::UnknownTarget => None,
        }
    }
}
