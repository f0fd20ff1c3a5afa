//! Wire protocol for Phantasia.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`RoomSnapshot`]):
//!   the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures
//!   become text frames and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong on the way.
//!
//! The protocol layer knows nothing about rooms or combat rules; the room
//! crate fills in snapshots, the server crate moves frames.
//!
//! ```text
//! Transport (frames) → Protocol (messages) → Room (state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, MAX_FRAME_BYTES};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Ack, Action, ClientMessage, EnemyView, Failure, Hello, PlayerId, PlayerView, RoomSnapshot,
    ServerMessage,
};
