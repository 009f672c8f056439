//! Wire codec for route-based client/server messages.
//!
//! Every message on the wire is a flag byte, an optional id, an optional
//! route and a body. Three independent layers shrink it:
//!
//! - **Route dictionary**: a route name can travel as a two-byte code
//!   ([`RouteDictionary`]).
//! - **Body compression**: a body can be gzipped, kept only when that makes
//!   it smaller ([`encode_body`], [`Compression`]).
//! - **JSON transcoding**: bodies can be produced from and parsed into JSON
//!   (`encode_json_body`, `decode_body_as_json`). Needs the `json` feature,
//!   which is on by default.
//!
//! # Architecture
//!
//! ```text
//! encode: route + body → body (gzip?) → MessageCodec::encode → Vec<u8>
//! decode: &[u8] → header (borrowing) → dictionary → inflate/copy → Message
//! ```
//!
//! The codec is synchronous and holds no mutable state. Connections,
//! framing onto a byte stream, request bookkeeping and handshakes are the
//! caller's business.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "json")] {
//! use routewire_protocol::{CodecConfig, Frame, MessageCodec, MessageKind, RouteRef};
//!
//! let codec = MessageCodec::new(CodecConfig::default()).unwrap();
//! let body = codec.encode_json_body(&serde_json::json!({ "name": "a" })).unwrap();
//! let frame = Frame::new(MessageKind::Notify, 0, Some(RouteRef::Name("user.login")), &body);
//! let bytes = codec.encode(&frame).unwrap();
//!
//! let msg = codec.decode(None, &bytes).unwrap();
//! assert_eq!(msg.route.as_deref(), Some("user.login"));
//! # }
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

// The private modules are reached through the re-exports below. `flag` and
// `header` stay public because their field-level codecs are useful on their
// own, e.g. for peeking at a message's id without decoding the body.

mod body;
mod codec;
mod compress;
mod config;
mod dictionary;
mod error;
mod types;

pub mod flag;
pub mod header;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

// Callers write `use routewire_protocol::MessageCodec` instead of reaching
// into the module tree. The JSON helpers only exist with the `json` feature.

pub use body::{EncodedBody, decode_body, encode_body};
#[cfg(feature = "json")]
pub use body::{decode_body_as, decode_body_as_json, encode_json_body};
pub use codec::{Frame, MessageCodec};
pub use compress::{Compression, Gzip};
pub use config::CodecConfig;
pub use dictionary::RouteDictionary;
pub use error::{ErrorCategory, ProtocolError};
pub use flag::{Flag, encode_flag};
pub use types::{INVALID_ID, Message, MessageKind, NOTIFY_PUSH_ID, RouteRef};
