//! Multilevel switch scale.
//!
//! Multilevel switches report 0..=99 for off..full and 255 for "on at the last
//! level". Capabilities use a 0.0..=1.0 fraction.

use crate::error::{EngineError, Result};

/// Highest addressable level on the wire.
pub const LEVEL_MAX: u8 = 99;

/// "Restore last level" marker sent by some firmware in reports.
pub const LEVEL_RESTORE: u8 = 255;

/// Fraction in `0.0..=1.0` to a multilevel switch level.
pub fn encode_level(fraction: f64) -> Result<u8> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(EngineError::out_of_range(fraction, "dim level"));
    }
    Ok((fraction * f64::from(LEVEL_MAX)).round() as u8)
}

/// Multilevel switch level to a fraction.
pub fn decode_level(level: u8) -> Result<f64> {
    match level {
        LEVEL_RESTORE => Ok(1.0),
        0..=LEVEL_MAX => Ok(f64::from(level) / f64::from(LEVEL_MAX)),
        other => Err(EngineError::out_of_range(
            f64::from(other),
            "multilevel switch report",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bounds() {
        assert_eq!(encode_level(0.0).unwrap(), 0);
        assert_eq!(encode_level(1.0).unwrap(), 99);
        assert_eq!(encode_level(0.5).unwrap(), 50);
        assert!(encode_level(1.2).is_err());
        assert!(encode_level(-0.1).is_err());
    }

    #[test]
    fn test_restore_marker_decodes_to_full() {
        assert_eq!(decode_level(255).unwrap(), 1.0);
        assert_eq!(decode_level(99).unwrap(), 1.0);
        assert_eq!(decode_level(0).unwrap(), 0.0);
        assert!(decode_level(100).is_err());
    }

    #[test]
    fn test_every_level_survives_roundtrip() {
        for level in 0..=LEVEL_MAX {
            let fraction = decode_level(level).unwrap();
            assert_eq!(encode_level(fraction).unwrap(), level);
        }
    }
}
