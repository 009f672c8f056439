//! Header field codecs: the message id and the route.
//!
//! Encoders append to a `Vec<u8>`. Decoders take the whole buffer plus an
//! offset and return the value together with the offset just past it, so
//! the message decoder can walk the header field by field without copying.
//!
//! ## Message id
//!
//! Little-endian base-128: each byte carries 7 bits of the id, low bits
//! first, and the high bit says "another byte follows".
//!
//! ```text
//!   0        → 00
//!   127      → 7F
//!   128      → 80 01
//!   16384    → 80 80 01
//!   u32::MAX → FF FF FF FF 0F
//! ```

use crate::ProtocolError;

/// Bytes in the length prefix of an inline route.
pub const ROUTE_LEN_BYTES: usize = 1;

/// Bytes in a dictionary-coded route.
pub const ROUTE_CODE_BYTES: usize = 2;

/// Longest varint a `u32` can need.
pub const MAX_ID_BYTES: usize = 5;

const CONTINUATION: u8 = 0x80;
const PAYLOAD: u8 = 0x7F;

// ---------------------------------------------------------------------------
// Message id
// ---------------------------------------------------------------------------

/// Number of bytes [`encode_id`] writes for `id`.
pub fn id_len(id: u32) -> usize {
    let mut len = 1;
    let mut rest = id >> 7;
    while rest != 0 {
        len += 1;
        rest >>= 7;
    }
    len
}

/// Appends `id` as a base-128 varint. Always writes at least one byte.
pub fn encode_id(id: u32, out: &mut Vec<u8>) {
    let mut rest = id;
    loop {
        let low = (rest & u32::from(PAYLOAD)) as u8;
        rest >>= 7;
        if rest == 0 {
            out.push(low);
            break;
        }
        out.push(low | CONTINUATION);
    }
}

/// Reads a base-128 varint id starting at `offset`.
///
/// # Errors
/// - `Truncated` if the buffer ends before a byte without the continuation
///   bit.
/// - `IdOverflow` if the value needs more than 32 bits.
pub fn decode_id(buf: &[u8], offset: usize) -> Result<(u32, usize), ProtocolError> {
    let mut value: u64 = 0;
    for i in 0..MAX_ID_BYTES {
        let byte = *buf
            .get(offset + i)
            .ok_or(ProtocolError::Truncated { field: "message id" })?;
        value |= u64::from(byte & PAYLOAD) << (7 * i);
        if byte & CONTINUATION == 0 {
            let id = u32::try_from(value).map_err(|_| ProtocolError::IdOverflow)?;
            return Ok((id, offset + i + 1));
        }
    }
    Err(ProtocolError::IdOverflow)
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// Appends `[len][name bytes]`. No terminator.
///
/// # Errors
/// `RouteTooLong` if the name is longer than 255 bytes.
pub fn encode_route(route: &str, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
    let len = u8::try_from(route.len()).map_err(|_| ProtocolError::RouteTooLong(route.len()))?;
    out.push(len);
    out.extend_from_slice(route.as_bytes());
    Ok(())
}

/// Appends a dictionary code, big-endian.
pub fn encode_route_code(code: u16, out: &mut Vec<u8>) {
    out.extend_from_slice(&code.to_be_bytes());
}

/// Reads a length-prefixed route name into an owned `String`.
///
/// # Errors
/// - `Truncated` if the length byte is missing or the declared length runs
///   past the end of the buffer.
/// - `InvalidRouteName` if the bytes aren't UTF-8.
pub fn decode_route(buf: &[u8], offset: usize) -> Result<(String, usize), ProtocolError> {
    let len = *buf
        .get(offset)
        .ok_or(ProtocolError::Truncated { field: "route length" })? as usize;
    let start = offset + ROUTE_LEN_BYTES;
    let bytes = buf
        .get(start..start + len)
        .ok_or(ProtocolError::Truncated { field: "route name" })?;
    let route = String::from_utf8(bytes.to_vec()).map_err(ProtocolError::InvalidRouteName)?;
    Ok((route, start + len))
}

/// Reads a 2-byte big-endian route code.
pub fn decode_route_code(buf: &[u8], offset: usize) -> Result<(u16, usize), ProtocolError> {
    let bytes = buf
        .get(offset..offset + ROUTE_CODE_BYTES)
        .ok_or(ProtocolError::Truncated { field: "route code" })?;
    let code = u16::from_be_bytes([bytes[0], bytes[1]]);
    Ok((code, offset + ROUTE_CODE_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_bytes(id: u32) -> Vec<u8> {
        let mut out = Vec::new();
        encode_id(id, &mut out);
        out
    }

    #[test]
    fn test_id_boundaries_use_minimal_bytes() {
        let cases = [
            (0, 1),
            (127, 1),
            (128, 2),
            (16_383, 2),
            (16_384, 3),
            (2_097_151, 3),
            (2_097_152, 4),
            (u32::MAX, 5),
        ];
        for (id, expected_len) in cases {
            let bytes = id_bytes(id);
            assert_eq!(bytes.len(), expected_len, "id {id}");
            assert_eq!(id_len(id), expected_len, "id {id}");
            assert_eq!(decode_id(&bytes, 0).unwrap(), (id, expected_len), "id {id}");
        }
    }

    #[test]
    fn test_id_known_encodings() {
        assert_eq!(id_bytes(0), [0x00]);
        assert_eq!(id_bytes(128), [0x80, 0x01]);
        assert_eq!(id_bytes(300), [0xAC, 0x02]);
        assert_eq!(id_bytes(u32::MAX), [0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_decode_id_respects_offset() {
        let buf = [0xAA, 0xAC, 0x02, 0xBB];
        assert_eq!(decode_id(&buf, 1).unwrap(), (300, 3));
    }

    #[test]
    fn test_decode_id_truncated() {
        assert!(matches!(
            decode_id(&[0x80, 0x80], 0),
            Err(ProtocolError::Truncated { .. })
        ));
        assert!(matches!(
            decode_id(&[], 0),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_id_overflow() {
        // Fifth byte carries more than the 4 bits left in a u32.
        assert!(matches!(
            decode_id(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F], 0),
            Err(ProtocolError::IdOverflow)
        ));
        // Six bytes never fit.
        assert!(matches!(
            decode_id(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00], 0),
            Err(ProtocolError::IdOverflow)
        ));
    }

    #[test]
    fn test_route_round_trip() {
        let mut out = Vec::new();
        encode_route("room.join", &mut out).unwrap();
        assert_eq!(out[0], 9);
        assert_eq!(&out[1..], b"room.join");
        assert_eq!(decode_route(&out, 0).unwrap(), ("room.join".to_string(), 10));
    }

    #[test]
    fn test_empty_route() {
        let mut out = Vec::new();
        encode_route("", &mut out).unwrap();
        assert_eq!(out, [0]);
        assert_eq!(decode_route(&out, 0).unwrap(), (String::new(), 1));
    }

    #[test]
    fn test_route_too_long() {
        let long = "r".repeat(256);
        let mut out = Vec::new();
        assert!(matches!(
            encode_route(&long, &mut out),
            Err(ProtocolError::RouteTooLong(256))
        ));
        assert!(encode_route(&long[..255], &mut out).is_ok());
    }

    #[test]
    fn test_decode_route_length_past_end() {
        let buf = [5, b'a', b'b'];
        assert!(matches!(
            decode_route(&buf, 0),
            Err(ProtocolError::Truncated { field: "route name" })
        ));
        assert!(matches!(
            decode_route(&buf, 3),
            Err(ProtocolError::Truncated { field: "route length" })
        ));
    }

    #[test]
    fn test_decode_route_rejects_non_utf8() {
        let buf = [2, 0xC3, 0x28];
        assert!(matches!(
            decode_route(&buf, 0),
            Err(ProtocolError::InvalidRouteName(_))
        ));
    }

    #[test]
    fn test_route_code_is_big_endian() {
        let mut out = Vec::new();
        encode_route_code(0x1234, &mut out);
        assert_eq!(out, [0x12, 0x34]);
        assert_eq!(decode_route_code(&out, 0).unwrap(), (0x1234, 2));
        assert!(matches!(
            decode_route_code(&out[..1], 0),
            Err(ProtocolError::Truncated { field: "route code" })
        ));
    }
}
