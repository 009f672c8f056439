//! The flag byte: the first byte of every message.
//!
//! ```text
//!   bit  7 6 5 4 3 2 1 0
//!        . e . z k k k r
//!
//!   r   route is a dictionary code
//!   k   message kind (values 4–7 are reserved)
//!   z   body is gzip-compressed
//!   e   error indicator (position configurable, 5 by default)
//! ```

use crate::{MessageKind, ProtocolError};

const ROUTE_CODED: u8 = 0x01;
const KIND_SHIFT: u8 = 1;
const KIND_MASK: u8 = 0x07;
const BODY_COMPRESSED: u8 = 0x10;

/// Unpacked contents of a flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag {
    /// Message kind.
    pub kind: MessageKind,
    /// The route field is a 2-byte dictionary code.
    pub route_coded: bool,
    /// The body is gzip-compressed.
    pub body_compressed: bool,
    /// The error indicator is set.
    pub error: bool,
}

impl Flag {
    /// Packs the flag. `error_mask` comes from
    /// [`CodecConfig::error_mask`](crate::CodecConfig::error_mask).
    pub fn to_byte(self, error_mask: u8) -> u8 {
        let mut byte = encode_flag(self.kind, self.route_coded, self.body_compressed);
        if self.error {
            byte |= error_mask;
        }
        byte
    }

    /// Unpacks a flag byte, rejecting reserved kinds.
    pub fn from_byte(byte: u8, error_mask: u8) -> Result<Self, ProtocolError> {
        let raw_kind = (byte >> KIND_SHIFT) & KIND_MASK;
        let kind =
            MessageKind::from_wire(raw_kind).ok_or(ProtocolError::UnknownMessageKind(raw_kind))?;
        Ok(Self {
            kind,
            route_coded: byte & ROUTE_CODED != 0,
            body_compressed: byte & BODY_COMPRESSED != 0,
            error: byte & error_mask != 0,
        })
    }
}

/// Packs kind, route-coded and body-compressed bits into a flag byte.
pub fn encode_flag(kind: MessageKind, route_coded: bool, body_compressed: bool) -> u8 {
    let mut byte = kind.to_wire() << KIND_SHIFT;
    if route_coded {
        byte |= ROUTE_CODED;
    }
    if body_compressed {
        byte |= BODY_COMPRESSED;
    }
    byte
}
