//! Unified error type for the routewire crate.

use routewire_protocol::ProtocolError;

/// Top-level error for [`ClientCodec`](crate::ClientCodec) users.
///
/// `#[from]` lets `?` lift a [`ProtocolError`] into this type, so callers
/// only match on one enum.
#[derive(Debug, thiserror::Error)]
pub enum RoutewireError {
    /// Encoding or decoding failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A configuration document could not be parsed.
    #[error("config parse failed: {0}")]
    Config(#[source] serde_json::Error),
}
