//! # Routewire
//!
//! Client-side message codec for route-based game protocols.
//!
//! A game client exchanges four kinds of messages with its backend:
//! requests, notifies, responses and pushes. Each one names a route (the
//! server-side handler, e.g. `"room.join"`) and carries a body, usually
//! JSON. Routewire turns those into compact wire bytes and back:
//!
//! - routes the server registered in its dictionary go out as 2-byte codes,
//! - bodies are gzipped when that actually saves bytes,
//! - everything decoded is owned, never borrowed from the receive buffer.
//!
//! The heavy lifting lives in [`routewire_protocol`]; this crate bundles it
//! with a dictionary and a config into [`ClientCodec`], the object a
//! transport plugs in.
//!
//! ## Quick Start
//!
//! ```rust
//! use routewire::prelude::*;
//!
//! let dict: RouteDictionary = [("room.join", 1)].into_iter().collect();
//! let codec = ClientCodec::builder().dictionary(dict).build().unwrap();
//!
//! let bytes = codec.encode_json(7, "room.join", &serde_json::json!({ "room": 3 })).unwrap();
//! assert_eq!(bytes[0] & 0x01, 0x01); // route went out as a code
//! ```

mod client;
mod error;

pub use client::{ClientCodec, ClientCodecBuilder};
pub use error::RoutewireError;
pub use routewire_protocol as protocol;

/// Everything a transport integration usually needs.
pub mod prelude {
    pub use crate::{ClientCodec, ClientCodecBuilder, RoutewireError};
    pub use routewire_protocol::{
        CodecConfig, Compression, ErrorCategory, Gzip, INVALID_ID, Message, MessageKind,
        NOTIFY_PUSH_ID, ProtocolError, RouteDictionary,
    };
}
