//! Mappings between canonical user units and wire integers.
//!
//! Every settings key that holds a physical quantity (temperature, time,
//! percentage) declares a [`DomainSpec`]. The spec is a pure description:
//! `encode` turns a canonical value into the integer written to the node,
//! `decode` does the reverse, and both reject anything outside the declared
//! domain instead of clamping it.

use crate::error::{EngineError, Result};

/// A canonical interval scaled linearly onto the wire: `wire = value * factor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRange {
    /// Smallest canonical value.
    pub min: f64,
    /// Largest canonical value.
    pub max: f64,
    /// Wire units per canonical unit (10 for tenths, 100 for hundredths).
    pub factor: f64,
}

impl LinearRange {
    pub const fn new(min: f64, max: f64, factor: f64) -> Self {
        Self { min, max, factor }
    }

    fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn wire_bounds(&self) -> (i64, i64) {
        (
            (self.min * self.factor).round() as i64,
            (self.max * self.factor).round() as i64,
        )
    }

    fn encode(&self, value: f64) -> i64 {
        (value * self.factor).round() as i64
    }

    fn decode(&self, wire: i64) -> f64 {
        wire as f64 / self.factor
    }
}

/// Negative canonical values stored as a positive offset band.
///
/// A value `v < 0` is written as `offset + |v| * factor`. With `offset = 1000`
/// and `factor = 10`, `-0.1` becomes `1001` and `-12.7` becomes `1127`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NegativeBand {
    /// Most negative canonical value (e.g. `-12.7`).
    pub min: f64,
    /// Negative value closest to zero (e.g. `-0.1`).
    pub max: f64,
    pub factor: f64,
    pub offset: i64,
}

impl NegativeBand {
    pub const fn new(min: f64, max: f64, factor: f64, offset: i64) -> Self {
        Self {
            min,
            max,
            factor,
            offset,
        }
    }

    fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn wire_bounds(&self) -> (i64, i64) {
        (self.encode(self.max), self.encode(self.min))
    }

    fn encode(&self, value: f64) -> i64 {
        self.offset + (-value * self.factor).round() as i64
    }

    fn decode(&self, wire: i64) -> f64 {
        -((wire - self.offset) as f64) / self.factor
    }
}

/// How a canonical value maps onto a configuration parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainSpec {
    /// Plain scaling over one interval.
    Linear(LinearRange),
    /// Non-negative values scale directly, negatives use an offset band.
    SplitRange {
        positive: LinearRange,
        negative: NegativeBand,
    },
    /// A reserved wire value means "feature disabled".
    ///
    /// `disabled` is the canonical value the sentinel decodes to, and the
    /// value that encodes to the sentinel. Any other value goes through
    /// `inner`.
    Sentinel {
        sentinel: i64,
        disabled: f64,
        inner: Box<DomainSpec>,
    },
}

impl DomainSpec {
    /// `wire = value * factor` for `value` in `[min, max]`.
    pub fn linear(min: f64, max: f64, factor: f64) -> Self {
        DomainSpec::Linear(LinearRange::new(min, max, factor))
    }

    /// Positive range scaled by `factor`, negatives offset from `offset`.
    pub fn split(positive: LinearRange, negative: NegativeBand) -> Self {
        DomainSpec::SplitRange { positive, negative }
    }

    /// Wrap `self` so that `sentinel` on the wire means `disabled`.
    pub fn with_sentinel(self, sentinel: i64, disabled: f64) -> Self {
        DomainSpec::Sentinel {
            sentinel,
            disabled,
            inner: Box::new(self),
        }
    }

    /// Canonical value to wire integer.
    pub fn encode(&self, value: f64) -> Result<i64> {
        if !value.is_finite() {
            return Err(EngineError::out_of_range(value, "configuration domain"));
        }
        match self {
            DomainSpec::Linear(range) => {
                if range.contains(value) {
                    Ok(range.encode(value))
                } else {
                    Err(EngineError::out_of_range(
                        value,
                        format!("linear range {}..={}", range.min, range.max),
                    ))
                }
            }
            DomainSpec::SplitRange { positive, negative } => {
                if value >= 0.0 && positive.contains(value) {
                    Ok(positive.encode(value))
                } else if value < 0.0 && negative.contains(value) {
                    Ok(negative.encode(value))
                } else {
                    Err(EngineError::out_of_range(
                        value,
                        format!(
                            "split range {}..={} / {}..={}",
                            negative.min, negative.max, positive.min, positive.max
                        ),
                    ))
                }
            }
            DomainSpec::Sentinel {
                sentinel,
                disabled,
                inner,
            } => {
                if value == *disabled {
                    Ok(*sentinel)
                } else {
                    inner.encode(value)
                }
            }
        }
    }

    /// Wire integer to canonical value.
    pub fn decode(&self, wire: i64) -> Result<f64> {
        match self {
            DomainSpec::Linear(range) => {
                let (low, high) = range.wire_bounds();
                if (low..=high).contains(&wire) {
                    Ok(range.decode(wire))
                } else {
                    Err(EngineError::out_of_range(wire as f64, "linear wire range"))
                }
            }
            DomainSpec::SplitRange { positive, negative } => {
                let (pos_low, pos_high) = positive.wire_bounds();
                let (neg_low, neg_high) = negative.wire_bounds();
                if (pos_low..=pos_high).contains(&wire) {
                    Ok(positive.decode(wire))
                } else if (neg_low..=neg_high).contains(&wire) {
                    Ok(negative.decode(wire))
                } else {
                    Err(EngineError::out_of_range(wire as f64, "split wire range"))
                }
            }
            DomainSpec::Sentinel {
                sentinel,
                disabled,
                inner,
            } => {
                if wire == *sentinel {
                    Ok(*disabled)
                } else {
                    inner.decode(wire)
                }
            }
        }
    }
}

/// Clamp a canonical value into explicit bounds.
///
/// Only used where a device explicitly calls for clamping; everywhere else
/// out-of-domain input is an error.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temperature_offset() -> DomainSpec {
        DomainSpec::split(
            LinearRange::new(0.1, 10.0, 10.0),
            NegativeBand::new(-10.0, -0.1, 10.0, 1000),
        )
        .with_sentinel(32536, 0.0)
    }

    fn hysteresis() -> DomainSpec {
        DomainSpec::split(
            LinearRange::new(0.0, 12.7, 10.0),
            NegativeBand::new(-12.7, -0.1, 10.0, 1000),
        )
    }

    #[test]
    fn test_temperature_offset_encoding() {
        let spec = temperature_offset();
        assert_eq!(spec.encode(0.0).unwrap(), 32536);
        assert_eq!(spec.encode(0.1).unwrap(), 1);
        assert_eq!(spec.encode(10.0).unwrap(), 100);
        assert_eq!(spec.encode(-0.1).unwrap(), 1001);
        assert_eq!(spec.encode(-10.0).unwrap(), 1100);
        assert_eq!(spec.encode(-2.5).unwrap(), 1025);
    }

    #[test]
    fn test_temperature_offset_rejects_out_of_domain() {
        let spec = temperature_offset();
        assert!(spec.encode(10.1).is_err());
        assert!(spec.encode(-10.5).is_err());
        assert!(spec.decode(500).is_err());
        assert!(spec.decode(0).is_err());
        assert!(spec.encode(f64::NAN).is_err());
    }

    #[test]
    fn test_wire_roundtrip_split_range() {
        let spec = hysteresis();
        for wire in (0..=127).chain(1001..=1127) {
            let value = spec.decode(wire).unwrap();
            assert_eq!(spec.encode(value).unwrap(), wire, "wire {wire}");
        }
    }

    #[test]
    fn test_canonical_roundtrip_split_range() {
        let spec = hysteresis();
        for value in [-12.7, -5.5, -0.1, 0.0, 0.1, 1.5, 12.7] {
            let wire = spec.encode(value).unwrap();
            assert_eq!(spec.decode(wire).unwrap(), value);
        }
    }

    #[test]
    fn test_wire_roundtrip_with_sentinel() {
        let spec = temperature_offset();
        for wire in (1..=100).chain(1001..=1100).chain([32536]) {
            let value = spec.decode(wire).unwrap();
            assert_eq!(spec.encode(value).unwrap(), wire, "wire {wire}");
        }
    }

    #[test]
    fn test_sentinel_collapse_is_lossy() {
        // 0 is both the disabled default and a valid inner value
        let spec = DomainSpec::linear(0.0, 80.0, 10.0).with_sentinel(65535, 0.0);
        assert_eq!(spec.decode(65535).unwrap(), 0.0);
        assert_eq!(spec.decode(0).unwrap(), 0.0);
        assert_eq!(spec.encode(0.0).unwrap(), 65535);
    }

    #[test]
    fn test_linear_scaling() {
        let spec = DomainSpec::linear(0.0, 12.7, 10.0);
        assert_eq!(spec.encode(0.5).unwrap(), 5);
        assert_eq!(spec.decode(127).unwrap(), 12.7);
        assert!(spec.decode(128).is_err());
    }

    #[test]
    fn test_clamp_uses_explicit_bounds() {
        assert_eq!(clamp(900.0, 0.0, 655.0), 655.0);
        assert_eq!(clamp(12.0, 0.0, 655.0), 12.0);
    }
}
