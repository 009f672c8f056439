//! Message codec: whole messages to and from wire bytes.
//!
//! ## Wire layout
//!
//! ```text
//! ┌──────┬────────────┬──────────────────────────────┬───────────┐
//! │ flag │ id         │ route                        │ body      │
//! │ 1 B  │ varint     │ [len][name] or [code hi][lo] │ remaining │
//! └──────┴────────────┴──────────────────────────────┴───────────┘
//!          request,     request/notify/push only
//!          response
//!          only
//! ```
//!
//! Decoding happens in two stages. `decode_raw` walks the header and
//! returns a `RawMessage` whose body is still a slice of the input.
//! [`MessageCodec::decode`] then resolves the route, inflates or copies the
//! body, and hands back an owned [`Message`] that no longer borrows the
//! input.
//!
//! Every check that decoding makes is mirrored on the encode side, so
//! anything [`MessageCodec::encode`] accepts, [`MessageCodec::decode`] reads
//! back unchanged.

#[cfg(feature = "json")]
use serde::Serialize;
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;
#[cfg(feature = "json")]
use serde_json::Value;

use crate::body::{self, EncodedBody};
use crate::flag::Flag;
use crate::header::{self, ROUTE_CODE_BYTES, ROUTE_LEN_BYTES};
use crate::{
    CodecConfig, Compression, Gzip, INVALID_ID, Message, MessageKind, NOTIFY_PUSH_ID,
    ProtocolError, RouteDictionary, RouteRef,
};

const FLAG_BYTES: usize = 1;

// ---------------------------------------------------------------------------
// Frame — encode input
// ---------------------------------------------------------------------------

/// Everything needed to lay out one message on the wire.
///
/// The body is already prepared (see [`MessageCodec::encode_body`]); the
/// frame only records whether it was compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Message kind.
    pub kind: MessageKind,
    /// Correlation id. Ignored for notify and push.
    pub id: u32,
    /// Route. Required for request/notify/push, forbidden for response.
    pub route: Option<RouteRef<'a>>,
    /// Set the error indicator.
    pub error: bool,
    /// Body bytes as they go on the wire.
    pub body: &'a [u8],
    /// `body` is gzip output.
    pub body_compressed: bool,
}

impl<'a> Frame<'a> {
    /// A frame with no error bit carrying `body`.
    pub fn new(
        kind: MessageKind,
        id: u32,
        route: Option<RouteRef<'a>>,
        body: &'a EncodedBody,
    ) -> Self {
        Self {
            kind,
            id,
            route,
            error: false,
            body: &body.bytes,
            body_compressed: body.compressed,
        }
    }

    /// Sets the error indicator.
    pub fn with_error(mut self, error: bool) -> Self {
        self.error = error;
        self
    }
}

// ---------------------------------------------------------------------------
// RawMessage — first decode stage
// ---------------------------------------------------------------------------

/// Route as it appeared on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawRoute {
    Coded(u16),
    Named(String),
}

/// Header fields parsed, body still borrowed from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawMessage<'a> {
    pub id: u32,
    pub kind: MessageKind,
    pub error: bool,
    pub body_compressed: bool,
    pub route: Option<RawRoute>,
    pub body: &'a [u8],
}

/// Parses the header of `buf`. Nothing is allocated except an inline route
/// name.
pub(crate) fn decode_raw(buf: &[u8], error_mask: u8) -> Result<RawMessage<'_>, ProtocolError> {
    let &flag_byte = buf
        .first()
        .ok_or(ProtocolError::Truncated { field: "flag" })?;
    let flag = Flag::from_byte(flag_byte, error_mask)?;
    let mut offset = FLAG_BYTES;

    let id = if flag.kind.has_id() {
        let (id, next) = header::decode_id(buf, offset)?;
        if id == INVALID_ID {
            return Err(ProtocolError::ReservedId(id));
        }
        offset = next;
        id
    } else {
        NOTIFY_PUSH_ID
    };

    let route = if !flag.kind.has_route() {
        None
    } else if flag.route_coded {
        let (code, next) = header::decode_route_code(buf, offset)?;
        offset = next;
        Some(RawRoute::Coded(code))
    } else {
        let (name, next) = header::decode_route(buf, offset)?;
        offset = next;
        Some(RawRoute::Named(name))
    };

    Ok(RawMessage {
        id,
        kind: flag.kind,
        error: flag.error,
        body_compressed: flag.body_compressed,
        route,
        body: &buf[offset..],
    })
}

// ---------------------------------------------------------------------------
// MessageCodec
// ---------------------------------------------------------------------------

/// Encodes and decodes complete messages.
///
/// Stateless apart from its configuration and compressor, so one instance
/// can be shared across threads and used concurrently.
///
/// The type parameter `C` is the body compressor. It defaults to [`Gzip`];
/// tests swap in a compressor that fails on purpose to exercise the
/// fallback paths. Because the parameter is generic rather than a
/// `Box<dyn Compression>`, the compiler generates a specialized codec for
/// each compressor and there is no dynamic dispatch per body.
///
/// The route dictionary is *not* stored here. It changes with every
/// handshake, so [`decode`](Self::decode) borrows it per call instead.
#[derive(Debug, Clone)]
pub struct MessageCodec<C = Gzip> {
    config: CodecConfig,
    compressor: C,
}

impl MessageCodec<Gzip> {
    /// A codec using gzip for bodies.
    ///
    /// # Errors
    /// `InvalidConfig` if `config` fails [`CodecConfig::validate`].
    pub fn new(config: CodecConfig) -> Result<Self, ProtocolError> {
        Self::with_compressor(config, Gzip::default())
    }
}

impl<C: Compression> MessageCodec<C> {
    /// A codec using a custom compressor.
    pub fn with_compressor(config: CodecConfig, compressor: C) -> Result<Self, ProtocolError> {
        config.validate()?;
        Ok(Self { config, compressor })
    }

    /// The active configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// The body compressor.
    pub fn compressor(&self) -> &C {
        &self.compressor
    }

    /// Prepares a raw body, compressing it unless compression is disabled
    /// in the config or doesn't pay off.
    pub fn encode_body(&self, raw: &[u8]) -> EncodedBody {
        body::encode_body(&self.compressor, raw, !self.config.disable_compression)
    }

    /// Serializes `value` as a JSON body, then as [`encode_body`](Self::encode_body).
    #[cfg(feature = "json")]
    pub fn encode_json_body<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<EncodedBody, ProtocolError> {
        body::encode_json_body(&self.compressor, value, !self.config.disable_compression)
    }

    /// Lays out `frame` on the wire.
    ///
    /// The output is allocated once at its exact final size: the length of
    /// every header field is known before the first byte is written, so
    /// the `Vec` never reallocates.
    ///
    /// # Errors
    /// - `MissingRoute` / `UnexpectedRoute` if the route doesn't match the
    ///   kind.
    /// - `ReservedId` if a request or response carries [`INVALID_ID`].
    /// - `RouteTooLong` for an inline route over 255 bytes.
    pub fn encode(&self, frame: &Frame<'_>) -> Result<Vec<u8>, ProtocolError> {
        let kind = frame.kind;
        let route = match (kind.has_route(), frame.route) {
            (true, None) => return Err(ProtocolError::MissingRoute(kind)),
            (false, Some(_)) => return Err(ProtocolError::UnexpectedRoute(kind)),
            (_, route) => route,
        };
        if kind.has_id() && frame.id == INVALID_ID {
            return Err(ProtocolError::ReservedId(frame.id));
        }

        let id_len = if kind.has_id() { header::id_len(frame.id) } else { 0 };
        let route_len = match route {
            Some(RouteRef::Name(name)) => ROUTE_LEN_BYTES + name.len(),
            Some(RouteRef::Code(_)) => ROUTE_CODE_BYTES,
            None => 0,
        };
        let total = FLAG_BYTES + id_len + route_len + frame.body.len();

        let flag = Flag {
            kind,
            route_coded: route.is_some_and(|r| r.is_coded()),
            body_compressed: frame.body_compressed,
            error: frame.error,
        };

        let mut out = Vec::with_capacity(total);
        out.push(flag.to_byte(self.config.error_mask()));
        if kind.has_id() {
            header::encode_id(frame.id, &mut out);
        }
        match route {
            Some(RouteRef::Name(name)) => header::encode_route(name, &mut out)?,
            Some(RouteRef::Code(code)) => header::encode_route_code(code, &mut out),
            None => {}
        }
        out.extend_from_slice(frame.body);
        debug_assert_eq!(out.len(), total);

        tracing::trace!(%kind, id = frame.id, len = total, "message encoded");
        Ok(out)
    }

    /// Decodes one complete message.
    ///
    /// `dictionary` resolves coded routes; without one, any coded route is a
    /// dictionary miss. The returned message owns all its data.
    ///
    /// This is the one place a failed decode is logged. The helpers it
    /// calls return their errors without logging them.
    ///
    /// # Errors
    /// - Malformed input: `Truncated`, `UnknownMessageKind`, `IdOverflow`,
    ///   `ReservedId`, `InvalidRouteName`.
    /// - `DictionaryMiss` for an unresolvable route code.
    /// - `Inflate` if a body flagged as gzipped won't decompress.
    pub fn decode(
        &self,
        dictionary: Option<&RouteDictionary>,
        buf: &[u8],
    ) -> Result<Message, ProtocolError> {
        self.decode_inner(dictionary, buf).inspect_err(|e| {
            tracing::error!(error = %e, len = buf.len(), "message decode failed");
        })
    }

    fn decode_inner(
        &self,
        dictionary: Option<&RouteDictionary>,
        buf: &[u8],
    ) -> Result<Message, ProtocolError> {
        let raw = decode_raw(buf, self.config.error_mask())?;

        let route = match raw.route {
            None => None,
            Some(RawRoute::Named(name)) => Some(name),
            Some(RawRoute::Coded(code)) => {
                let name = dictionary
                    .and_then(|d| d.route_for(code))
                    .ok_or(ProtocolError::DictionaryMiss(code))?;
                Some(name.to_owned())
            }
        };

        let body = body::decode_body(&self.compressor, raw.body, raw.body_compressed)?;

        Ok(Message {
            id: raw.id,
            kind: raw.kind,
            error: i32::from(raw.error),
            route,
            body,
        })
    }

    /// Parses a decoded message's body as a single JSON value.
    #[cfg(feature = "json")]
    pub fn decode_json_body(&self, message: &Message) -> Result<Value, ProtocolError> {
        // `Message::body` is already inflated.
        body::decode_body_as_json(&self.compressor, &message.body, false)
    }

    /// Parses a decoded message's body into `T`.
    ///
    /// `T` is anything serde can build, e.g. a `#[derive(Deserialize)]`
    /// struct. `DeserializeOwned` means the result doesn't borrow from the
    /// message, so the message can be dropped afterwards.
    #[cfg(feature = "json")]
    pub fn decode_body_as<T: DeserializeOwned>(&self, message: &Message) -> Result<T, ProtocolError> {
        body::decode_body_as(&self.compressor, &message.body, false)
    }
}
