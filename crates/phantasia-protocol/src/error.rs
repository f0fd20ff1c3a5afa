//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding frames.
///
/// Every variant is a "malformed input" failure from the client's point of
/// view: nothing has touched room state by the time one of these is raised.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into text).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing field, a
    /// wrong field type, and so on.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame exceeded the size limit and was not parsed at all.
    #[error("frame of {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { size: usize, limit: usize },
}
