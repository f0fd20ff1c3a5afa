//! Codec trait and implementations for turning messages into frames.
//!
//! The server only needs "parsed command in, text out", so the trait is
//! deliberately small. [`JsonCodec`] is the only implementation; the trait
//! exists so the connection handler is not welded to `serde_json`.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Largest inbound frame the server will attempt to parse, in bytes.
pub const MAX_FRAME_BYTES: usize = 1_000_000;

/// Encodes values to text frames and decodes raw frames back.
///
/// - `Send + Sync` → shared by every connection task.
/// - `'static` → lives as long as the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a raw frame.
    ///
    /// # Errors
    /// - `ProtocolError::FrameTooLarge` if `data` exceeds [`MAX_FRAME_BYTES`]
    /// - `ProtocolError::Decode` if the bytes don't describe a `T`
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// ## Example
///
/// ```rust
/// use phantasia_protocol::{Action, ClientMessage, Codec, JsonCodec, PlayerId};
///
/// let codec = JsonCodec;
/// let msg: ClientMessage = codec
///     .decode(br#"{"type":"action","room":"dragons","playerId":"p1","action":"attack"}"#)
///     .unwrap();
///
/// assert_eq!(
///     msg,
///     ClientMessage::Action {
///         room: "dragons".into(),
///         player_id: PlayerId::from("p1"),
///         action: Action::Attack,
///     }
/// );
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        if data.len() > MAX_FRAME_BYTES {
            return Err(ProtocolError::FrameTooLarge {
                size: data.len(),
                limit: MAX_FRAME_BYTES,
            });
        }
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
