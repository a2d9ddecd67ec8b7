//! Events published to the automation layer.

use crate::capabilities::{CapabilityId, CapabilityValue};
use crate::inputs::InputEvent;
use crate::transport::ThermostatMode;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// What happened on a device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEventKind {
    /// A bound capability took a new value.
    CapabilityChanged {
        capability: CapabilityId,
        value: CapabilityValue,
    },
    /// An input changed state; `trigger` is the automation trigger id.
    InputTriggered {
        input: u8,
        event: InputEvent,
        trigger: &'static str,
    },
    /// The thermostat switched from one known mode to another.
    ThermostatModeChanged { mode: ThermostatMode },
    /// The device could not be configured and should be shown as unavailable.
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceEvent {
    pub device_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: DeviceEventKind,
}

/// Cloneable sender stamping events with the device id and time.
#[derive(Debug, Clone)]
pub struct EventSink {
    device_id: Uuid,
    tx: mpsc::UnboundedSender<DeviceEvent>,
}

impl EventSink {
    pub fn new(device_id: Uuid) -> (Self, mpsc::UnboundedReceiver<DeviceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { device_id, tx }, rx)
    }

    pub fn emit(&self, kind: DeviceEventKind) {
        let event = DeviceEvent {
            device_id: self.device_id,
            timestamp: Utc::now(),
            kind,
        };
        if self.tx.send(event).is_err() {
            debug!("[Device] Event receiver dropped for {}", self.device_id);
        }
    }
}
