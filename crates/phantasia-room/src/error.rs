//! Error types for the room layer.
//!
//! Note what is *not* here: a combat action whose preconditions fail
//! (dead player, no mana, no encounter) is not an error. The resolver
//! reports it as [`Outcome::Ignored`](crate::Outcome) and the room still
//! broadcasts.

use phantasia_protocol::PlayerId;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room is registered under this name.
    #[error("room {0} not found")]
    NotFound(String),

    /// A player with this id is already in the room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, String),

    /// The room's actor has stopped or its command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(String),

    /// The game configuration cannot be used to run rooms.
    #[error("invalid game config: {0}")]
    InvalidConfig(String),
}
