//! Device settings schema and the user-initiated settings pipeline.
//!
//! A device model describes its settings as a [`SettingsSchema`]: which keys
//! exist, their defaults, and how each one reaches the node (parameter index,
//! width, signedness and [`SettingCodec`]). Combined and linked settings are
//! described alongside so [`apply::plan_writes`] can turn a settings change
//! into the exact configuration writes the firmware expects.

pub mod apply;
pub mod combined;
pub mod keys;
pub mod messages;
pub mod parsers;

pub use apply::{ParameterWrite, SettingsChange, plan_writes};
pub use combined::{combine_all_on_all_off, split_all_on_all_off};
pub use messages::{LocalizedMessage, custom_save_message};

use crate::capabilities::CapabilityId;
use crate::codec::{ConfigurationValue, DomainSpec, ValueSize};
use crate::error::{EngineError, Result};
use crate::store::Settings;
use serde_json::Value;

/// Where a setting lives on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    pub index: u8,
    pub size: ValueSize,
    pub signed: bool,
}

impl ParameterSpec {
    pub const fn new(index: u8, size: ValueSize) -> Self {
        Self {
            index,
            size,
            signed: false,
        }
    }

    pub const fn signed(mut self) -> Self {
        self.signed = true;
        self
    }
}

/// How a settings value becomes a parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingCodec {
    /// Integer written unchanged.
    Raw,
    /// Dropdown id: a string holding an integer.
    Dropdown,
    /// Checkbox written as 1/0.
    Bool,
    /// Checkbox written as 0/1.
    InvertedBool,
    /// Physical quantity in user units.
    Domain(DomainSpec),
}

/// One settings key of a device model.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingDefinition {
    pub key: &'static str,
    pub default: Value,
    /// `None` for settings that never reach the node directly.
    pub parameter: Option<ParameterSpec>,
    pub codec: SettingCodec,
}

impl SettingDefinition {
    /// A setting stored locally only.
    pub fn local(key: &'static str, default: Value) -> Self {
        Self {
            key,
            default,
            parameter: None,
            codec: SettingCodec::Raw,
        }
    }

    /// A setting written to `parameter` through `codec`.
    pub fn parameter(
        key: &'static str,
        default: Value,
        parameter: ParameterSpec,
        codec: SettingCodec,
    ) -> Self {
        Self {
            key,
            default,
            parameter: Some(parameter),
            codec,
        }
    }

    /// Encode a settings value for this definition's parameter.
    pub fn encode(&self, value: &Value) -> Result<Option<ConfigurationValue>> {
        let Some(parameter) = self.parameter else {
            return Ok(None);
        };
        let wire = match &self.codec {
            SettingCodec::Raw | SettingCodec::Dropdown => value_as_f64(value)
                .map(|v| v.round() as i64)
                .ok_or_else(|| EngineError::invalid_setting(self.key, "expected a number"))?,
            SettingCodec::Bool => i64::from(
                value_as_bool(value)
                    .ok_or_else(|| EngineError::invalid_setting(self.key, "expected a boolean"))?,
            ),
            SettingCodec::InvertedBool => i64::from(
                !value_as_bool(value)
                    .ok_or_else(|| EngineError::invalid_setting(self.key, "expected a boolean"))?,
            ),
            SettingCodec::Domain(spec) => {
                let canonical = value_as_f64(value)
                    .ok_or_else(|| EngineError::invalid_setting(self.key, "expected a number"))?;
                spec.encode(canonical)?
            }
        };
        ConfigurationValue::encode(wire, parameter.size, parameter.signed).map(Some)
    }
}

/// A boolean toggle that enables a feature whose value parameter uses a
/// sentinel for "disabled".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedToggle {
    pub toggle_key: &'static str,
    pub value_key: &'static str,
    /// Wire value written when the toggle is off.
    pub sentinel: i64,
}

/// Keys whose invert setting mirrors a capability's cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionInversion {
    pub setting_key: &'static str,
    pub capability: CapabilityId,
}

/// Minimum/maximum dim value pair validated on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimLimits {
    pub minimum_key: &'static str,
    pub maximum_key: &'static str,
}

/// Combined all-on/all-off parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllOnAllOff {
    pub parameter: ParameterSpec,
}

impl AllOnAllOff {
    pub const PARAMETER_INDEX: u8 = 10;

    /// Parameter 10 at the given width; signed unless it is a single byte.
    pub const fn with_size(size: ValueSize) -> Self {
        Self {
            parameter: ParameterSpec {
                index: Self::PARAMETER_INDEX,
                size,
                signed: !matches!(size, ValueSize::One),
            },
        }
    }
}

impl Default for AllOnAllOff {
    fn default() -> Self {
        Self::with_size(ValueSize::Two)
    }
}

/// Complete settings description of a device model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsSchema {
    pub definitions: Vec<SettingDefinition>,
    pub all_on_all_off: Option<AllOnAllOff>,
    pub linked_toggles: Vec<LinkedToggle>,
    pub dim_limits: Option<DimLimits>,
    pub inversions: Vec<DirectionInversion>,
    /// Keys that change the endpoint structure and need a re-pair.
    pub structural_keys: Vec<&'static str>,
}

impl SettingsSchema {
    pub fn definition(&self, key: &str) -> Option<&SettingDefinition> {
        self.definitions.iter().find(|definition| definition.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.definition(key).is_some()
    }

    /// Keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.definitions.iter().map(|definition| definition.key)
    }

    /// Settings map holding every default.
    pub fn defaults(&self) -> Settings {
        self.definitions
            .iter()
            .map(|definition| (definition.key.to_string(), definition.default.clone()))
            .collect()
    }
}

/// Read a settings value as a number. Accepts numeric strings and booleans.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Read a settings value as a boolean. Accepts 0/1 and "true"/"false".
pub fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Build a JSON number, keeping integers integral.
pub fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inverted_bool_codec() {
        let definition = SettingDefinition::parameter(
            keys::RESTORE_STATUS,
            json!(true),
            ParameterSpec::new(30, ValueSize::One),
            SettingCodec::InvertedBool,
        );
        assert_eq!(definition.encode(&json!(true)).unwrap().unwrap().value(), 0);
        assert_eq!(definition.encode(&json!(false)).unwrap().unwrap().value(), 1);
    }

    #[test]
    fn test_dropdown_accepts_string_ids() {
        let definition = SettingDefinition::parameter(
            keys::ENABLE_INPUT_2,
            json!("0"),
            ParameterSpec::new(100, ValueSize::One),
            SettingCodec::Dropdown,
        );
        assert_eq!(definition.encode(&json!("9")).unwrap().unwrap().value(), 9);
        assert!(definition.encode(&json!("nine")).is_err());
    }

    #[test]
    fn test_domain_codec_surfaces_out_of_range() {
        let definition = SettingDefinition::parameter(
            keys::TEMPERATURE_SENSOR_OFFSET,
            json!(0),
            ParameterSpec::new(110, ValueSize::Two),
            SettingCodec::Domain(parsers::temperature_sensor_offset()),
        );
        assert_eq!(
            definition.encode(&json!(0)).unwrap().unwrap().value(),
            32536
        );
        assert_eq!(
            definition.encode(&json!(-0.5)).unwrap().unwrap().value(),
            1005
        );
        assert!(matches!(
            definition.encode(&json!(11)),
            Err(EngineError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_local_setting_has_no_write() {
        let definition = SettingDefinition::local(keys::ALL_ON, json!(true));
        assert_eq!(definition.encode(&json!(false)).unwrap(), None);
    }

    #[test]
    fn test_all_on_all_off_signedness_follows_width() {
        assert!(AllOnAllOff::default().parameter.signed);
        assert!(!AllOnAllOff::with_size(ValueSize::One).parameter.signed);
    }

    #[test]
    fn test_number_keeps_integers_integral() {
        assert_eq!(number(655.0), json!(655));
        assert_eq!(number(1.5), json!(1.5));
    }
}
