//! Compression capability.
//!
//! The codec never calls gzip directly. It goes through [`Compression`], so
//! tests can hand it a compressor that always fails or always inflates the
//! data, and see the fallback paths run.

use std::io::{self, Read, Write};

use flate2::Compression as Level;
use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;

/// Compress/decompress primitive used for message bodies.
pub trait Compression: Send + Sync {
    /// Compresses `data`.
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Decompresses `data`, which must hold exactly one compressed stream.
    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>>;
}

/// Gzip via `flate2`.
#[derive(Debug, Clone, Copy)]
pub struct Gzip {
    level: Level,
}

impl Gzip {
    /// Gzip with an explicit level (0–9).
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Level::new(level),
        }
    }
}

impl Default for Gzip {
    fn default() -> Self {
        Self {
            level: Level::default(),
        }
    }
}

impl Compression for Gzip {
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        // A `&[u8]` reader only advances past what the decoder consumed, so
        // whatever is left after the gzip trailer is still in it.
        let mut decoder = GzDecoder::new(data);
        let mut out = Vec::with_capacity(data.len() * 2);
        decoder.read_to_end(&mut out)?;
        let rest = decoder.into_inner();
        if !rest.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} trailing bytes after gzip stream", rest.len()),
            ));
        }
        Ok(out)
    }
}
