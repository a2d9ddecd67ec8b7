//! Boundary to the command/response bus.
//!
//! The engine never talks to a radio. It consumes a [`NodeTransport`] that
//! can describe the node's endpoint graph, read and write configuration
//! parameters, and send command-class commands. Inbound frames arrive as
//! [`Report`]s and are dispatched through a [`ReportRouter`].

pub mod reader;
pub mod reports;
pub mod sim;

pub use reader::{ParameterRead, SafeParameterReader};
pub use reports::{ReportHandler, ReportRouter};
pub use sim::SimulatedNode;

use crate::codec::ConfigurationValue;
use crate::error::Result;
use crate::topology::{CommandClass, EndpointGraph};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Node id the controller uses for itself in association commands.
pub const CONTROLLER_NODE_ID: u8 = 1;

/// Thermostat operating modes seen in mode reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ThermostatMode {
    Off,
    Heat,
    Cool,
    Auto,
}

/// Quantity carried by a meter report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeterScale {
    /// Accumulated energy in kWh.
    Energy,
    /// Instantaneous power in W.
    Power,
}

/// Outbound command-class commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    SwitchBinarySet(bool),
    SwitchMultilevelSet(u8),
    /// Request a fresh report for a command class.
    Get(CommandClass),
    MeterReset,
    ThermostatModeSet(ThermostatMode),
    ThermostatSetpointSet(f64),
    AssociationRemove {
        group: u8,
        node_id: u8,
    },
    MultiChannelAssociationSet {
        group: u8,
        node_id: u8,
        endpoint: u8,
    },
}

impl Command {
    /// Command class the command belongs to.
    pub fn command_class(&self) -> CommandClass {
        match self {
            Command::SwitchBinarySet(_) => CommandClass::SwitchBinary,
            Command::SwitchMultilevelSet(_) => CommandClass::SwitchMultilevel,
            Command::Get(cc) => *cc,
            Command::MeterReset => CommandClass::Meter,
            Command::ThermostatModeSet(_) => CommandClass::ThermostatMode,
            Command::ThermostatSetpointSet(_) => CommandClass::ThermostatSetpoint,
            Command::AssociationRemove { .. } => CommandClass::Association,
            Command::MultiChannelAssociationSet { .. } => CommandClass::MultiChannelAssociation,
        }
    }
}

/// Decoded inbound reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Report {
    SwitchBinary { value: bool },
    SwitchMultilevel { level: u8 },
    /// Binary sensor report; `detected` is "detected an event".
    SensorBinary { detected: bool },
    /// Notification report; `event_active` is false for "event inactive".
    Notification { event_active: bool },
    SensorMultilevel { value: f64 },
    Meter { scale: MeterScale, value: f64 },
    ThermostatMode { mode: ThermostatMode },
    ThermostatSetpoint { value: f64 },
}

impl Report {
    /// Command class the report belongs to.
    pub fn command_class(&self) -> CommandClass {
        match self {
            Report::SwitchBinary { .. } => CommandClass::SwitchBinary,
            Report::SwitchMultilevel { .. } => CommandClass::SwitchMultilevel,
            Report::SensorBinary { .. } => CommandClass::SensorBinary,
            Report::Notification { .. } => CommandClass::Notification,
            Report::SensorMultilevel { .. } => CommandClass::SensorMultilevel,
            Report::Meter { .. } => CommandClass::Meter,
            Report::ThermostatMode { .. } => CommandClass::ThermostatMode,
            Report::ThermostatSetpoint { .. } => CommandClass::ThermostatSetpoint,
        }
    }
}

/// A multi-channel node reachable over the bus.
///
/// Requests against one node are issued strictly one after another by the
/// engine; timing and timeouts belong to the implementation.
#[async_trait]
pub trait NodeTransport: Send + Sync {
    /// Endpoint graph discovered during the node interview.
    fn endpoint_graph(&self) -> EndpointGraph;

    /// Read a configuration parameter.
    async fn configuration_get(&self, parameter: u8) -> Result<ConfigurationValue>;

    /// Write a configuration parameter.
    async fn configuration_set(&self, parameter: u8, value: ConfigurationValue) -> Result<()>;

    /// Send a command to the root node (`None`) or a multi-channel endpoint.
    async fn send_command(&self, endpoint: Option<u8>, command: Command) -> Result<()>;
}
