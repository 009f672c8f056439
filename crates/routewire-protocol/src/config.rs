//! Codec configuration.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Bits of the flag byte that are already spoken for: route-coded (0),
/// kind (1–3) and body-compressed (4).
const RESERVED_FLAG_BITS: u8 = 0b0001_1111;

/// Settings supplied by the surrounding client.
///
/// `#[serde(default)]` lets a config file name only the fields it changes;
/// anything missing falls back to [`CodecConfig::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Never gzip outgoing bodies, even when it would save bytes.
    pub disable_compression: bool,

    /// Bit position of the error indicator in the flag byte.
    ///
    /// Default: 5 (`0x20`). Must be 5, 6 or 7; the lower bits belong to
    /// the route, kind and compression fields.
    pub error_flag_bit: u8,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            disable_compression: false,
            error_flag_bit: 5,
        }
    }
}

impl CodecConfig {
    /// Checks that the error bit doesn't overlap another flag field.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.error_flag_bit > 7 {
            return Err(ProtocolError::InvalidConfig(format!(
                "error_flag_bit {} is outside the flag byte",
                self.error_flag_bit
            )));
        }
        if RESERVED_FLAG_BITS & (1 << self.error_flag_bit) != 0 {
            return Err(ProtocolError::InvalidConfig(format!(
                "error_flag_bit {} overlaps the route/kind/compression bits",
                self.error_flag_bit
            )));
        }
        Ok(())
    }

    /// The error indicator as a mask over the flag byte.
    pub fn error_mask(&self) -> u8 {
        1u8.checked_shl(u32::from(self.error_flag_bit)).unwrap_or(0)
    }
}
