//! Error types for the protocol layer.

/// Errors raised while encoding, decoding or validating wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes were malformed or did not match the expected message.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// Well-formed, but breaks a protocol rule (wrong first message,
    /// version mismatch, bad room code).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
