//! Domain specs shared by several device models.

use crate::codec::{DomainSpec, LinearRange, NegativeBand};

/// Wire value meaning "no temperature offset".
pub const TEMPERATURE_OFFSET_DISABLED: i64 = 32536;

/// Offset band used for negative temperatures.
pub const NEGATIVE_OFFSET: i64 = 1000;

/// Longest auto-off time, in seconds, that fits the ×100 wire encoding.
pub const AUTO_OFF_MAX_SECONDS: f64 = 655.0;

/// Wire value that switches the antifreeze function off.
pub const ANTIFREEZE_DISABLED: i64 = 255;

/// Temperature sensor offset: 0 is disabled, ±0.1..10 °C in tenths.
pub fn temperature_sensor_offset() -> DomainSpec {
    DomainSpec::split(
        LinearRange::new(0.1, 10.0, 10.0),
        NegativeBand::new(-10.0, -0.1, 10.0, NEGATIVE_OFFSET),
    )
    .with_sentinel(TEMPERATURE_OFFSET_DISABLED, 0.0)
}

/// Temperature reporting threshold in tenths of a degree.
pub fn temperature_reporting_threshold() -> DomainSpec {
    DomainSpec::linear(0.0, 12.7, 10.0)
}

/// Signed temperature in tenths, negatives offset from 1000.
pub fn offset_temperature(min: f64, max: f64) -> DomainSpec {
    DomainSpec::split(
        LinearRange::new(0.0, max, 10.0),
        NegativeBand::new(min, -0.1, 10.0, NEGATIVE_OFFSET),
    )
}

/// Dim duration in seconds, sent in hundredths.
pub fn dim_duration() -> DomainSpec {
    hundredths(0.0, 2.55)
}

/// Values sent in tenths of the canonical unit.
pub fn tenths(min: f64, max: f64) -> DomainSpec {
    DomainSpec::linear(min, max, 10.0)
}

/// Values sent in hundredths of the canonical unit.
pub fn hundredths(min: f64, max: f64) -> DomainSpec {
    DomainSpec::linear(min, max, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_antifreeze_style_negative_band() {
        let spec = offset_temperature(-12.7, 12.7);
        assert_eq!(spec.encode(-12.7).unwrap(), 1127);
        assert_eq!(spec.encode(5.0).unwrap(), 50);
        assert_eq!(spec.decode(1001).unwrap(), -0.1);
        assert!(spec.encode(-12.8).is_err());
    }

    #[test]
    fn test_shutter_timings() {
        assert_eq!(tenths(0.0, 6553.5).encode(12.3).unwrap(), 123);
        assert_eq!(hundredths(0.0, 655.35).encode(1.5).unwrap(), 150);
        assert_eq!(dim_duration().encode(2.55).unwrap(), 255);
    }
}
