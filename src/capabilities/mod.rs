//! Abstract capabilities and their wire transforms.
//!
//! A capability is what the automation layer sees ("onoff", "dim",
//! "measure_temperature"). Each bound capability is tied to one endpoint and
//! command class and carries a [`ValueTransform`] that turns reports into
//! capability values and capability values into commands.

pub mod binder;
pub mod state;

pub use binder::{
    CapabilityBinder, CapabilityBinding, CapabilityDeclaration, EndpointSelector, bind_capabilities,
};
pub use state::CapabilityHandle;

use crate::codec::{decode_level, encode_level};
use crate::error::{EngineError, Result};
use crate::transport::{Command, MeterScale, Report, ThermostatMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{AsRefStr, Display, EnumString};

/// Capability identifiers understood by the automation layer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Ord,
    PartialOrd,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CapabilityId {
    Onoff,
    Dim,
    MeterPower,
    MeasurePower,
    MeasureTemperature,
    WindowcoveringsTiltSet,
    TargetTemperature,
    ThermostatModeOffAuto,
}

/// Capabilities a device model exposes. Checked once at bind time.
pub type DeclaredCapabilities = BTreeSet<CapabilityId>;

/// Value of a capability as seen by the automation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityValue {
    Bool(bool),
    Number(f64),
    Mode(ThermostatMode),
}

impl CapabilityValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CapabilityValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CapabilityValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// How a capability value maps onto reports and commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueTransform {
    /// Binary switch on/off.
    OnOff,
    /// 0.0..=1.0 on the multilevel 0..99 scale.
    Level,
    /// Meter reading of the given quantity, read-only.
    Meter(MeterScale),
    /// Multilevel sensor reading, read-only.
    Sensor,
    /// Thermostat setpoint in degrees.
    Setpoint,
    /// Thermostat mode restricted to off/auto on set.
    OffAutoMode,
}

impl ValueTransform {
    /// Natural transform for a capability.
    pub fn for_capability(capability: CapabilityId) -> Self {
        match capability {
            CapabilityId::Onoff => ValueTransform::OnOff,
            CapabilityId::Dim | CapabilityId::WindowcoveringsTiltSet => ValueTransform::Level,
            CapabilityId::MeterPower => ValueTransform::Meter(MeterScale::Energy),
            CapabilityId::MeasurePower => ValueTransform::Meter(MeterScale::Power),
            CapabilityId::MeasureTemperature => ValueTransform::Sensor,
            CapabilityId::TargetTemperature => ValueTransform::Setpoint,
            CapabilityId::ThermostatModeOffAuto => ValueTransform::OffAutoMode,
        }
    }

    /// Decode a report, `None` when the report does not carry this value.
    pub fn decode(&self, report: &Report) -> Option<CapabilityValue> {
        match (self, report) {
            (ValueTransform::OnOff, Report::SwitchBinary { value }) => {
                Some(CapabilityValue::Bool(*value))
            }
            (ValueTransform::OnOff, Report::SwitchMultilevel { level }) => {
                Some(CapabilityValue::Bool(*level > 0))
            }
            (ValueTransform::Level, Report::SwitchMultilevel { level }) => {
                decode_level(*level).ok().map(CapabilityValue::Number)
            }
            (ValueTransform::Meter(wanted), Report::Meter { scale, value }) if wanted == scale => {
                Some(CapabilityValue::Number(*value))
            }
            (ValueTransform::Sensor, Report::SensorMultilevel { value }) => {
                Some(CapabilityValue::Number(*value))
            }
            (ValueTransform::Setpoint, Report::ThermostatSetpoint { value }) => {
                Some(CapabilityValue::Number(*value))
            }
            (ValueTransform::OffAutoMode, Report::ThermostatMode { mode }) => {
                Some(CapabilityValue::Mode(*mode))
            }
            _ => None,
        }
    }

    /// Encode a set request into a command.
    pub fn encode(&self, value: &CapabilityValue) -> Result<Command> {
        match (self, value) {
            (ValueTransform::OnOff, CapabilityValue::Bool(on)) => Ok(Command::SwitchBinarySet(*on)),
            (ValueTransform::Level, CapabilityValue::Number(fraction)) => {
                Ok(Command::SwitchMultilevelSet(encode_level(*fraction)?))
            }
            (ValueTransform::Setpoint, CapabilityValue::Number(degrees)) => {
                Ok(Command::ThermostatSetpointSet(*degrees))
            }
            (ValueTransform::OffAutoMode, CapabilityValue::Mode(mode)) => {
                let mode = if *mode == ThermostatMode::Off {
                    ThermostatMode::Off
                } else {
                    ThermostatMode::Auto
                };
                Ok(Command::ThermostatModeSet(mode))
            }
            (ValueTransform::Meter(_) | ValueTransform::Sensor, _) => Err(
                EngineError::UnsupportedCapability("read-only capability".to_string()),
            ),
            (transform, value) => Err(EngineError::UnsupportedCapability(format!(
                "{:?} cannot carry {:?}",
                transform, value
            ))),
        }
    }
}
