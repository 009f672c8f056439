//! Error types for the protocol layer.
//!
//! Every codec operation either succeeds with an owned value or fails with
//! a [`ProtocolError`]. Nothing is half-built on failure: a `Result` that
//! comes back as `Err` has already dropped whatever it allocated on the way.
//!
//! The variants are fine-grained so tests and logs can say exactly which
//! byte was wrong. Most callers only need the coarse answer, which
//! [`ProtocolError::category`] gives them.

use std::io;

use crate::types::MessageKind;

/// Coarse classification of a [`ProtocolError`].
///
/// Callers rarely care about the exact variant. They care whether the peer
/// sent garbage, whether their dictionary is stale, or whether compression
/// broke. `category()` answers that question without a giant `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The received bytes are not a valid message: a truncated header, an
    /// unknown kind, a reserved id, or a body that isn't the JSON it
    /// claims to be.
    ///
    /// The peer sent something broken. Retrying the same bytes won't help.
    Malformed,
    /// The buffer is well-formed but names a route code we can't resolve.
    DictionaryMiss,
    /// Gzip inflate failed on a body the sender flagged as compressed.
    Compression,
    /// The caller asked for something the wire format can't express, or
    /// its body couldn't be serialized. Only the encode side produces these.
    Encoding,
    /// Configuration or dictionary input is unusable.
    Config,
}

/// Errors that can occur in the protocol layer.
///
/// `#[derive(thiserror::Error)]` generates the `std::error::Error` impl.
/// Each `#[error("...")]` is the text you see when the error is printed or
/// lands in a log line. Variants that wrap another error mark it with
/// `#[source]`, so `Error::source()` walks down to the `io::Error` or
/// `serde_json::Error` that started it.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The buffer ended before `field` was complete.
    #[error("truncated buffer: missing {field}")]
    Truncated {
        /// Which header field was being read.
        field: &'static str,
    },

    /// The kind field of the flag byte holds a reserved value.
    #[error("unknown message type: {0}")]
    UnknownMessageKind(u8),

    /// The variable-length id does not fit in 32 bits.
    #[error("message id overflows 32 bits")]
    IdOverflow,

    /// The id equals [`INVALID_ID`](crate::INVALID_ID).
    ///
    /// That value marks a failed decode in the legacy API, so a request or
    /// response may not carry it. The encoder refuses to write it and the
    /// decoder refuses to read it.
    #[error("message id {0} is reserved")]
    ReservedId(u32),

    /// A route name longer than a one-byte length prefix can describe.
    #[error("route name is {0} bytes, limit is 255")]
    RouteTooLong(usize),

    /// The inline route bytes are not UTF-8.
    #[error("route name is not valid utf-8")]
    InvalidRouteName(#[source] std::string::FromUtf8Error),

    /// A request/notify/push without a route.
    #[error("{0} message requires a route")]
    MissingRoute(MessageKind),

    /// A response that was given a route.
    #[error("{0} message cannot carry a route")]
    UnexpectedRoute(MessageKind),

    /// A coded route with no entry in the code → route dictionary.
    #[error("route dictionary miss for code {0}")]
    DictionaryMiss(u16),

    /// Gzip inflate failed.
    ///
    /// The sender set the compressed bit, so there is no plain fallback.
    /// Common causes: a corrupt or truncated stream, or bytes after its end.
    #[error("inflate error: {0}")]
    Inflate(#[source] io::Error),

    /// Serializing a body to JSON failed.
    ///
    /// For example a map whose keys aren't strings. The inner
    /// `serde_json::Error` says which value was at fault.
    #[cfg(feature = "json")]
    #[error("json encode failed: {0}")]
    JsonEncode(#[source] serde_json::Error),

    /// The body is not a JSON value, or not the shape the caller asked for.
    #[cfg(feature = "json")]
    #[error("json decode failed: {0}")]
    JsonDecode(#[source] serde_json::Error),

    /// The body holds a JSON value followed by extra bytes.
    ///
    /// A body is exactly one value. Even whitespace after it counts.
    #[error("json body has trailing bytes: value ends at {offset}, body is {len} bytes")]
    TrailingBytes {
        /// Where the JSON value ended.
        offset: usize,
        /// Total body length.
        len: usize,
    },

    /// A route dictionary could not be built from its source.
    #[error("invalid route dictionary: {0}")]
    InvalidDictionary(String),

    /// A [`CodecConfig`](crate::CodecConfig) failed validation.
    #[error("invalid codec config: {0}")]
    InvalidConfig(String),
}

impl ProtocolError {
    /// Returns the failure class this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Truncated { .. }
            | Self::UnknownMessageKind(_)
            | Self::IdOverflow
            | Self::ReservedId(_)
            | Self::InvalidRouteName(_)
            | Self::TrailingBytes { .. } => ErrorCategory::Malformed,
            #[cfg(feature = "json")]
            Self::JsonDecode(_) => ErrorCategory::Malformed,
            Self::DictionaryMiss(_) => ErrorCategory::DictionaryMiss,
            Self::Inflate(_) => ErrorCategory::Compression,
            Self::RouteTooLong(_) | Self::MissingRoute(_) | Self::UnexpectedRoute(_) => {
                ErrorCategory::Encoding
            }
            #[cfg(feature = "json")]
            Self::JsonEncode(_) => ErrorCategory::Encoding,
            Self::InvalidDictionary(_) | Self::InvalidConfig(_) => ErrorCategory::Config,
        }
    }
}
