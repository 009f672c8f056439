//! Core protocol types: message kinds, the public [`Message`], and the
//! route reference used when encoding.
//!
//! These are the values that cross the codec boundary. Everything here owns
//! its data: a decoded `Message` never points back into the wire buffer it
//! came from.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sentinel ids
// ---------------------------------------------------------------------------

/// Id written for (and restored on) notify and push messages, which have no
/// correlation id on the wire.
pub const NOTIFY_PUSH_ID: u32 = 0;

/// Id of the legacy "invalid message" returned at the boundary when a decode
/// fails. A successful decode never yields it.
pub const INVALID_ID: u32 = u32::MAX;

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// The four message kinds the flag byte can carry.
///
/// The discriminants are the on-wire values. Which header fields are present
/// depends entirely on the kind:
///
/// ```text
///            id    route
/// Request    yes   yes
/// Notify     no    yes
/// Response   yes   no
/// Push       no    yes
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum MessageKind {
    /// Client → server, expects a response with the same id.
    Request = 0,
    /// Client → server, fire-and-forget.
    Notify = 1,
    /// Server → client, answers a request.
    Response = 2,
    /// Server → client, unsolicited.
    Push = 3,
}

impl MessageKind {
    /// Parses a kind from its wire value. Returns `None` for reserved values.
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Request),
            1 => Some(Self::Notify),
            2 => Some(Self::Response),
            3 => Some(Self::Push),
            _ => None,
        }
    }

    /// The on-wire value.
    pub fn to_wire(self) -> u8 {
        self as u8
    }

    /// Requests and responses carry an id; notify and push don't.
    pub fn has_id(self) -> bool {
        matches!(self, Self::Request | Self::Response)
    }

    /// Everything except a response carries a route.
    pub fn has_route(self) -> bool {
        !matches!(self, Self::Response)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Notify => write!(f, "notify"),
            Self::Response => write!(f, "response"),
            Self::Push => write!(f, "push"),
        }
    }
}

// ---------------------------------------------------------------------------
// RouteRef — how the route goes onto the wire
// ---------------------------------------------------------------------------

/// The route field of an outgoing message.
///
/// Either the route name inline, or the dictionary code that stands in for
/// it. Which one is used decides bit 0 of the flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRef<'a> {
    /// `[1-byte length][name bytes]`
    Name(&'a str),
    /// `[2-byte big-endian code]`
    Code(u16),
}

impl RouteRef<'_> {
    /// Whether this route sets the route-is-coded flag bit.
    pub fn is_coded(&self) -> bool {
        matches!(self, Self::Code(_))
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A fully decoded message.
///
/// `route` is `Some` for request/notify/push and `None` for responses.
/// `error` is nonzero when the server flagged a response as an error; how
/// the body describes that error is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Correlation id, or [`NOTIFY_PUSH_ID`] for notify/push.
    pub id: u32,
    /// Which of the four kinds this message is.
    pub kind: MessageKind,
    /// Nonzero for a server-reported error response.
    pub error: i32,
    /// Route name, resolved through the dictionary when it was coded.
    pub route: Option<String>,
    /// Body bytes, already decompressed.
    pub body: Vec<u8>,
}

impl Message {
    /// A request with the given id, route and body.
    pub fn request(id: u32, route: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            kind: MessageKind::Request,
            error: 0,
            route: Some(route.into()),
            body: body.into(),
        }
    }

    /// A notify with the given route and body.
    pub fn notify(route: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            id: NOTIFY_PUSH_ID,
            kind: MessageKind::Notify,
            error: 0,
            route: Some(route.into()),
            body: body.into(),
        }
    }

    /// The legacy failure value: invalid id, no route, empty body.
    ///
    /// Only produced by boundary helpers that must hand back a `Message`
    /// no matter what. Inside the codec, failures are `Err`.
    pub fn invalid() -> Self {
        Self {
            id: INVALID_ID,
            kind: MessageKind::Response,
            error: 0,
            route: None,
            body: Vec::new(),
        }
    }

    /// `false` for [`Message::invalid`].
    pub fn is_valid(&self) -> bool {
        self.id != INVALID_ID
    }

    /// `true` when the server flagged this message as an error.
    pub fn is_error(&self) -> bool {
        self.error != 0
    }
}
