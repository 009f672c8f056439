//! `ClientCodec`: the codec a transport plugs in.
//!
//! The transport deals in byte buffers. The client API deals in
//! [`Message`]s. `ClientCodec` sits between them, holding the two pieces of
//! state the protocol codec itself refuses to own: the route dictionary
//! the server handed out and the client's codec settings.

use routewire_protocol::{
    CodecConfig, Compression, Frame, Gzip, Message, MessageCodec, MessageKind, NOTIFY_PUSH_ID,
    ProtocolError, RouteDictionary, RouteRef,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::RoutewireError;

/// Builder for a [`ClientCodec`].
///
/// # Example
///
/// ```rust
/// use routewire::prelude::*;
///
/// let codec = ClientCodec::builder()
///     .config(CodecConfig { disable_compression: true, ..CodecConfig::default() })
///     .build()
///     .unwrap();
/// assert!(codec.config().disable_compression);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientCodecBuilder {
    config: CodecConfig,
    dictionary: RouteDictionary,
}

impl ClientCodecBuilder {
    /// A builder with the default config and an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the codec configuration.
    pub fn config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// Reads the codec configuration from a JSON document. Missing fields
    /// keep their defaults.
    pub fn config_json(mut self, json: &str) -> Result<Self, RoutewireError> {
        self.config = serde_json::from_str(json).map_err(RoutewireError::Config)?;
        Ok(self)
    }

    /// Sets the route dictionary.
    pub fn dictionary(mut self, dictionary: RouteDictionary) -> Self {
        self.dictionary = dictionary;
        self
    }

    /// Builds a codec that gzips bodies.
    pub fn build(self) -> Result<ClientCodec, RoutewireError> {
        self.build_with(Gzip::default())
    }

    /// Builds a codec with a custom compressor.
    pub fn build_with<C: Compression>(self, compressor: C) -> Result<ClientCodec<C>, RoutewireError> {
        let codec = MessageCodec::with_compressor(self.config, compressor)?;
        tracing::debug!(
            routes = self.dictionary.len(),
            compression = !self.config.disable_compression,
            "client codec ready"
        );
        Ok(ClientCodec {
            codec,
            dictionary: self.dictionary,
        })
    }
}

/// Encodes outgoing client messages and decodes incoming server messages.
///
/// Encoding picks the message kind from the id: [`NOTIFY_PUSH_ID`] means a
/// notify, anything else a request. The route travels as a code whenever
/// the dictionary has one for it.
#[derive(Debug, Clone)]
pub struct ClientCodec<C = Gzip> {
    codec: MessageCodec<C>,
    dictionary: RouteDictionary,
}

impl ClientCodec<Gzip> {
    /// Creates a new builder.
    pub fn builder() -> ClientCodecBuilder {
        ClientCodecBuilder::new()
    }
}

impl<C: Compression> ClientCodec<C> {
    /// The active configuration.
    pub fn config(&self) -> &CodecConfig {
        self.codec.config()
    }

    /// The current route dictionary.
    pub fn dictionary(&self) -> &RouteDictionary {
        &self.dictionary
    }

    /// Replaces the route dictionary, e.g. after a fresh handshake.
    pub fn set_dictionary(&mut self, dictionary: RouteDictionary) {
        tracing::debug!(routes = dictionary.len(), "route dictionary replaced");
        self.dictionary = dictionary;
    }

    /// The underlying message codec.
    pub fn message_codec(&self) -> &MessageCodec<C> {
        &self.codec
    }

    /// Encodes a client message.
    ///
    /// # Errors
    /// `MissingRoute` if the message has no route, `RouteTooLong` if an
    /// inline route doesn't fit its length byte, `ReservedId` if the id is
    /// [`INVALID_ID`](routewire_protocol::INVALID_ID).
    pub fn encode(&self, message: &Message) -> Result<Vec<u8>, RoutewireError> {
        let kind = Self::kind_for(message.id);
        let route = message
            .route
            .as_deref()
            .ok_or(ProtocolError::MissingRoute(kind))?;
        let body = self.codec.encode_body(&message.body);
        self.encode_frame(kind, message.id, route, &body.bytes, body.compressed)
    }

    /// Encodes a request (`id != 0`) or notify (`id == 0`) from raw parts.
    pub fn encode_raw(&self, id: u32, route: &str, body: &[u8]) -> Result<Vec<u8>, RoutewireError> {
        let body = self.codec.encode_body(body);
        self.encode_frame(Self::kind_for(id), id, route, &body.bytes, body.compressed)
    }

    /// Encodes a request or notify whose body is `value` as JSON.
    ///
    /// # Errors
    /// `JsonEncode` if `value` can't be serialized.
    pub fn encode_json<T: Serialize + ?Sized>(
        &self,
        id: u32,
        route: &str,
        value: &T,
    ) -> Result<Vec<u8>, RoutewireError> {
        let body = self.codec.encode_json_body(value).inspect_err(|e| {
            tracing::error!(%route, error = %e, "failed to encode body as json");
        })?;
        self.encode_frame(Self::kind_for(id), id, route, &body.bytes, body.compressed)
    }

    /// Decodes a server message, resolving coded routes through the
    /// dictionary.
    pub fn decode(&self, buf: &[u8]) -> Result<Message, RoutewireError> {
        Ok(self.codec.decode(Some(&self.dictionary), buf)?)
    }

    /// Like [`decode`](Self::decode), but reports failure as
    /// [`Message::invalid`] for callers that only check the id.
    pub fn decode_or_invalid(&self, buf: &[u8]) -> Message {
        self.decode(buf).unwrap_or_else(|_| Message::invalid())
    }

    /// Parses a decoded message's body as one JSON value.
    pub fn decode_json_body(&self, message: &Message) -> Result<Value, RoutewireError> {
        Ok(self.codec.decode_json_body(message)?)
    }

    /// Parses a decoded message's body into `T`.
    pub fn decode_body_as<T: DeserializeOwned>(&self, message: &Message) -> Result<T, RoutewireError> {
        Ok(self.codec.decode_body_as(message)?)
    }

    fn kind_for(id: u32) -> MessageKind {
        if id == NOTIFY_PUSH_ID {
            MessageKind::Notify
        } else {
            MessageKind::Request
        }
    }

    fn encode_frame(
        &self,
        kind: MessageKind,
        id: u32,
        route: &str,
        body: &[u8],
        body_compressed: bool,
    ) -> Result<Vec<u8>, RoutewireError> {
        let route_ref = match self.dictionary.code_for(route) {
            Some(code) => RouteRef::Code(code),
            None => RouteRef::Name(route),
        };
        let frame = Frame {
            kind,
            id,
            route: Some(route_ref),
            error: false,
            body,
            body_compressed,
        };
        let bytes = self.codec.encode(&frame).inspect_err(|e| {
            tracing::error!(%route, error = %e, "failed to encode message");
        })?;
        tracing::debug!(%kind, %route, len = bytes.len(), "message encoded");
        Ok(bytes)
    }
}
