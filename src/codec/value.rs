//! Fixed-width configuration parameter values.
//!
//! Configuration parameters travel as big-endian integers of 1, 2 or 4 bytes,
//! optionally signed. [`ConfigurationValue`] keeps the raw bytes together with
//! the signedness used to interpret them.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Width of a configuration parameter on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueSize {
    One,
    Two,
    Four,
}

impl ValueSize {
    /// Number of bytes this width occupies.
    pub fn bytes(self) -> usize {
        match self {
            ValueSize::One => 1,
            ValueSize::Two => 2,
            ValueSize::Four => 4,
        }
    }

    /// Parse a width from a byte count.
    pub fn from_bytes(len: usize) -> Option<Self> {
        match len {
            1 => Some(ValueSize::One),
            2 => Some(ValueSize::Two),
            4 => Some(ValueSize::Four),
            _ => None,
        }
    }

    /// Inclusive range of integers representable at this width.
    pub fn range(self, signed: bool) -> (i64, i64) {
        let bits = (self.bytes() * 8) as u32;
        if signed {
            (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
        } else {
            (0, (1i64 << bits) - 1)
        }
    }
}

/// A configuration parameter value as exchanged with the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationValue {
    bytes: Vec<u8>,
    size: ValueSize,
    signed: bool,
}

impl ConfigurationValue {
    /// Wrap bytes received from the node.
    ///
    /// A length other than 1, 2 or 4 is a malformed response.
    pub fn from_bytes(bytes: &[u8], signed: bool) -> Result<Self> {
        let size = ValueSize::from_bytes(bytes.len()).ok_or_else(|| {
            EngineError::MalformedResponse(format!(
                "configuration value of {} bytes",
                bytes.len()
            ))
        })?;
        Ok(Self {
            bytes: bytes.to_vec(),
            size,
            signed,
        })
    }

    /// Encode an integer at the given width.
    ///
    /// Values that do not fit the width/signedness are rejected rather than
    /// truncated.
    pub fn encode(value: i64, size: ValueSize, signed: bool) -> Result<Self> {
        let (min, max) = size.range(signed);
        if value < min || value > max {
            return Err(EngineError::out_of_range(
                value as f64,
                format!(
                    "{}-byte {} parameter",
                    size.bytes(),
                    if signed { "signed" } else { "unsigned" }
                ),
            ));
        }
        let be = value.to_be_bytes();
        Ok(Self {
            bytes: be[8 - size.bytes()..].to_vec(),
            size,
            signed,
        })
    }

    /// Width of this value.
    pub fn size(&self) -> ValueSize {
        self.size
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Raw big-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Interpret the value according to its signedness.
    pub fn value(&self) -> i64 {
        let unsigned = self
            .bytes
            .iter()
            .fold(0i64, |acc, byte| (acc << 8) | i64::from(*byte));
        if self.signed {
            let bits = (self.bytes.len() * 8) as u32;
            let sign_bit = 1i64 << (bits - 1);
            if unsigned & sign_bit != 0 {
                return unsigned - (1i64 << bits);
            }
        }
        unsigned
    }

    /// Interpret the value as unsigned regardless of how it was declared.
    pub fn unsigned_value(&self) -> u32 {
        self.bytes
            .iter()
            .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_two_byte_unsigned() {
        let value = ConfigurationValue::encode(32536, ValueSize::Two, false).unwrap();
        assert_eq!(value.as_bytes(), &[0x7F, 0x18]);
        assert_eq!(value.value(), 32536);
        assert_eq!(value.size(), ValueSize::Two);
    }

    #[test]
    fn test_signed_negative_roundtrip() {
        let value = ConfigurationValue::encode(-2, ValueSize::Two, true).unwrap();
        assert_eq!(value.as_bytes(), &[0xFF, 0xFE]);
        assert_eq!(value.value(), -2);
        assert_eq!(value.unsigned_value(), 0xFFFE);
    }

    #[test]
    fn test_encode_rejects_values_outside_width() {
        assert!(ConfigurationValue::encode(256, ValueSize::One, false).is_err());
        assert!(ConfigurationValue::encode(128, ValueSize::One, true).is_err());
        assert!(ConfigurationValue::encode(-1, ValueSize::Four, false).is_err());
        assert!(ConfigurationValue::encode(255, ValueSize::One, false).is_ok());
    }

    #[test]
    fn test_from_bytes_rejects_odd_lengths() {
        let err = ConfigurationValue::from_bytes(&[1, 2, 3], false).unwrap_err();
        assert!(err.is_transient());
        assert!(ConfigurationValue::from_bytes(&[], false).is_err());
        assert_eq!(
            ConfigurationValue::from_bytes(&[0, 0, 1, 0], false)
                .unwrap()
                .value(),
            256
        );
    }
}
