//! Body transcoding: optional gzip on the way out, inflate and JSON parsing
//! on the way in.
//!
//! Encoding can always decide not to compress, so every compression problem
//! on the encode side degrades to "send it uncompressed". Decoding has to
//! trust the sender's flag, so an inflate failure there is a hard error.
//!
//! The JSON half of this module needs the `json` feature.

#[cfg(feature = "json")]
use serde::Serialize;
#[cfg(feature = "json")]
use serde::de::{DeserializeOwned, Error as _};
#[cfg(feature = "json")]
use serde_json::Value;

use crate::{Compression, ProtocolError};

/// A body ready to be written after the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    /// Bytes to put on the wire.
    pub bytes: Vec<u8>,
    /// Whether `bytes` is gzip output (sets the flag bit).
    pub compressed: bool,
}

impl EncodedBody {
    /// A body sent as-is.
    pub fn plain(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            compressed: false,
        }
    }
}

/// Prepares `raw` for the wire, compressing it if that was requested and
/// actually makes it smaller.
///
/// The compressed form is kept only when it is strictly shorter than the
/// original. A compressor error is logged and the body goes out
/// uncompressed.
pub fn encode_body<C>(compressor: &C, raw: &[u8], compress: bool) -> EncodedBody
where
    C: Compression + ?Sized,
{
    if !compress || raw.is_empty() {
        return EncodedBody::plain(raw);
    }

    match compressor.compress(raw) {
        Ok(packed) if packed.len() < raw.len() => {
            tracing::trace!(from = raw.len(), to = packed.len(), "body compressed");
            EncodedBody {
                bytes: packed,
                compressed: true,
            }
        }
        Ok(packed) => {
            tracing::debug!(
                compressed = packed.len(),
                original = raw.len(),
                "compressed body is not smaller, sending uncompressed"
            );
            EncodedBody::plain(raw)
        }
        Err(e) => {
            tracing::error!(error = %e, "error compressing body, sending uncompressed");
            EncodedBody::plain(raw)
        }
    }
}

/// Serializes `value` to JSON, then runs it through [`encode_body`].
///
/// # Errors
/// `JsonEncode` if `value` can't be represented as JSON. There is no
/// fallback here: the caller asked for JSON.
#[cfg(feature = "json")]
pub fn encode_json_body<T, C>(
    compressor: &C,
    value: &T,
    compress: bool,
) -> Result<EncodedBody, ProtocolError>
where
    T: Serialize + ?Sized,
    C: Compression + ?Sized,
{
    let json = serde_json::to_vec(value).map_err(ProtocolError::JsonEncode)?;
    Ok(encode_body(compressor, &json, compress))
}

/// Turns a borrowed wire body into an owned one, inflating it when the
/// sender flagged it as gzipped.
///
/// An empty body is copied as-is even when flagged. Failures are returned
/// unlogged; the caller decides where the log line goes.
pub fn decode_body<C>(compressor: &C, raw: &[u8], gzipped: bool) -> Result<Vec<u8>, ProtocolError>
where
    C: Compression + ?Sized,
{
    if !gzipped || raw.is_empty() {
        return Ok(raw.to_vec());
    }
    let inflated = compressor.decompress(raw).map_err(ProtocolError::Inflate)?;
    tracing::debug!(from = raw.len(), to = inflated.len(), "body decompressed");
    Ok(inflated)
}

/// Parses a body as exactly one JSON value, inflating it first if
/// `gzipped`.
///
/// The value must span the whole body: parsing has to stop exactly at its
/// last byte. Anything after the value, whitespace included, is rejected.
///
/// # Errors
/// - `Inflate` if decompression fails.
/// - `JsonDecode` if the body doesn't start with a JSON value.
/// - `TrailingBytes` if bytes remain after the value.
#[cfg(feature = "json")]
pub fn decode_body_as_json<C>(
    compressor: &C,
    body: &[u8],
    gzipped: bool,
) -> Result<Value, ProtocolError>
where
    C: Compression + ?Sized,
{
    let inflated;
    let data = if gzipped {
        inflated = decode_body(compressor, body, true).inspect_err(|e| {
            tracing::error!(error = %e, "gzip inflate error");
        })?;
        inflated.as_slice()
    } else {
        body
    };

    let (value, end) = parse_json_prefix(data)?;
    if end != data.len() {
        tracing::error!(offset = end, len = data.len(), "json body has trailing bytes");
        return Err(ProtocolError::TrailingBytes {
            offset: end,
            len: data.len(),
        });
    }
    Ok(value)
}

/// Like [`decode_body_as_json`], deserializing into `T`.
#[cfg(feature = "json")]
pub fn decode_body_as<T, C>(compressor: &C, body: &[u8], gzipped: bool) -> Result<T, ProtocolError>
where
    T: DeserializeOwned,
    C: Compression + ?Sized,
{
    let value = decode_body_as_json(compressor, body, gzipped)?;
    serde_json::from_value(value).map_err(ProtocolError::JsonDecode)
}

/// Parses the first JSON value in `data`, returning it with the offset
/// where parsing stopped.
#[cfg(feature = "json")]
fn parse_json_prefix(data: &[u8]) -> Result<(Value, usize), ProtocolError> {
    let mut stream = serde_json::Deserializer::from_slice(data).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Ok((value, stream.byte_offset())),
        Some(Err(e)) => {
            tracing::error!(error = %e, "json decode error");
            Err(ProtocolError::JsonDecode(e))
        }
        None => Err(ProtocolError::JsonDecode(serde_json::Error::custom(
            "body holds no json value",
        ))),
    }
}
