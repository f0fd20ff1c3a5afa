//! Unified error type for the Phantasia server.

use phantasia_protocol::ProtocolError;
use phantasia_room::RoomError;
use phantasia_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PhantasiaError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, oversized frame).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, unavailable, bad config).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Reading a game config file failed.
    #[error("cannot load game config from {path}: {reason}")]
    Config { path: String, reason: String },
}
