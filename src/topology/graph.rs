//! Endpoint graph as reported by the transport.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::{AsRefStr, Display, EnumString, FromRepr};

/// Generic device class of an endpoint.
///
/// Discriminants are the generic class codes from the node information frame.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Ord,
    PartialOrd,
    FromRepr,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum GenericDeviceClass {
    #[strum(serialize = "GENERIC_TYPE_SENSOR_NOTIFICATION")]
    SensorNotification = 0x07,
    #[strum(serialize = "GENERIC_TYPE_THERMOSTAT")]
    Thermostat = 0x08,
    #[strum(serialize = "GENERIC_TYPE_SWITCH_BINARY")]
    SwitchBinary = 0x10,
    #[strum(serialize = "GENERIC_TYPE_SWITCH_MULTILEVEL")]
    SwitchMultilevel = 0x11,
    #[strum(serialize = "GENERIC_TYPE_SENSOR_BINARY")]
    SensorBinary = 0x20,
    #[strum(serialize = "GENERIC_TYPE_SENSOR_MULTILEVEL")]
    SensorMultilevel = 0x21,
    #[strum(serialize = "GENERIC_TYPE_UNKNOWN")]
    Unknown = 0xFF,
}

impl GenericDeviceClass {
    /// Map a raw generic class code, falling back to [`GenericDeviceClass::Unknown`].
    pub fn from_code(code: u8) -> Self {
        Self::from_repr(code).unwrap_or(GenericDeviceClass::Unknown)
    }

    /// Parse a generic class name, falling back to [`GenericDeviceClass::Unknown`].
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or(GenericDeviceClass::Unknown)
    }

    pub fn is_switch(self) -> bool {
        matches!(
            self,
            GenericDeviceClass::SwitchBinary | GenericDeviceClass::SwitchMultilevel
        )
    }

    pub fn is_input_sensor(self) -> bool {
        matches!(
            self,
            GenericDeviceClass::SensorBinary | GenericDeviceClass::SensorNotification
        )
    }
}

/// Command classes this engine talks to.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Ord,
    PartialOrd,
    FromRepr,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum CommandClass {
    #[strum(serialize = "SWITCH_BINARY")]
    SwitchBinary = 0x25,
    #[strum(serialize = "SWITCH_MULTILEVEL")]
    SwitchMultilevel = 0x26,
    #[strum(serialize = "SENSOR_BINARY")]
    SensorBinary = 0x30,
    #[strum(serialize = "SENSOR_MULTILEVEL")]
    SensorMultilevel = 0x31,
    #[strum(serialize = "METER")]
    Meter = 0x32,
    #[strum(serialize = "THERMOSTAT_MODE")]
    ThermostatMode = 0x40,
    #[strum(serialize = "THERMOSTAT_SETPOINT")]
    ThermostatSetpoint = 0x43,
    #[strum(serialize = "MULTI_CHANNEL")]
    MultiChannel = 0x60,
    #[strum(serialize = "CONFIGURATION")]
    Configuration = 0x70,
    #[strum(serialize = "NOTIFICATION")]
    Notification = 0x71,
    #[strum(serialize = "ASSOCIATION")]
    Association = 0x85,
    #[strum(serialize = "MULTI_CHANNEL_ASSOCIATION")]
    MultiChannelAssociation = 0x8E,
}

/// One addressable sub-unit of a multi-channel node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: u8,
    pub generic_class: GenericDeviceClass,
    pub command_classes: BTreeSet<CommandClass>,
}

impl Endpoint {
    pub fn new(
        id: u8,
        generic_class: GenericDeviceClass,
        command_classes: impl IntoIterator<Item = CommandClass>,
    ) -> Self {
        Self {
            id,
            generic_class,
            command_classes: command_classes.into_iter().collect(),
        }
    }

    pub fn supports(&self, command_class: CommandClass) -> bool {
        self.command_classes.contains(&command_class)
    }
}

/// Root node plus its multi-channel endpoints, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointGraph {
    /// Command classes supported by the root node itself.
    pub root_command_classes: BTreeSet<CommandClass>,
    pub endpoints: BTreeMap<u8, Endpoint>,
}

impl EndpointGraph {
    /// A node without multi-channel endpoints.
    pub fn flat(root_command_classes: impl IntoIterator<Item = CommandClass>) -> Self {
        Self {
            root_command_classes: root_command_classes.into_iter().collect(),
            endpoints: BTreeMap::new(),
        }
    }

    /// Add an endpoint, replacing one with the same id.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.insert(endpoint.id, endpoint);
        self
    }

    pub fn endpoint(&self, id: u8) -> Option<&Endpoint> {
        self.endpoints.get(&id)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Whether the root node supports a command class.
    pub fn root_supports(&self, command_class: CommandClass) -> bool {
        self.root_command_classes.contains(&command_class)
    }
}
