//! One field device: initialization pipeline and device-level actions.
//!
//! Initialization runs strictly in sequence against the node:
//! topology resolution, settings migration, multi-channel reporting setup,
//! capability binding, input resolution, mode discovery. Nothing in this
//! pipeline aborts bring-up; missing roles and unreadable parameters only
//! reduce what the device exposes. User-initiated writes (capability sets,
//! settings changes, actions) surface every transport error to the caller.

pub mod events;

pub use events::{DeviceEvent, DeviceEventKind, EventSink};

use crate::capabilities::{
    CapabilityBinder, CapabilityBinding, CapabilityHandle, CapabilityId, CapabilityValue,
};
use crate::codec::ConfigurationValue;
use crate::error::{EngineError, Result};
use crate::inputs::{InputBinding, InputChannel};
use crate::migration::MigrationOutcome;
use crate::models::DeviceModel;
use crate::settings::{
    LocalizedMessage, SettingsChange, custom_save_message, keys, plan_writes, value_as_bool,
};
use crate::store::{Settings, SettingsStore};
use crate::topology::{CommandClass, Topology, TopologyResolver};
use crate::transport::{
    CONTROLLER_NODE_ID, Command, NodeTransport, Report, ReportHandler, ReportRouter,
    SafeParameterReader, ThermostatMode, reader::DEFAULT_READ_ATTEMPTS,
};
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Association group the controller listens on.
const LIFELINE_GROUP: u8 = 1;

/// Controller endpoint multi-channel reports are sent to.
const CONTROLLER_ENDPOINT: u8 = 1;

/// Per-device engine options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceOptions {
    /// Total requests per configuration read.
    pub read_attempts: u32,
    /// Point association group 1 at the controller's endpoint 1 once.
    pub configure_multi_channel_reporting: bool,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            read_attempts: DEFAULT_READ_ATTEMPTS,
            configure_multi_channel_reporting: true,
        }
    }
}

pub struct Device {
    id: Uuid,
    model: DeviceModel,
    transport: Arc<dyn NodeTransport>,
    store: Arc<dyn SettingsStore>,
    options: DeviceOptions,
    reader: SafeParameterReader,
    router: ReportRouter,
    events: EventSink,
    topology: RwLock<Option<Topology>>,
    capabilities: RwLock<BTreeMap<CapabilityId, Arc<CapabilityHandle>>>,
    /// Values of declared capabilities the current wiring cannot serve.
    placeholders: RwLock<BTreeMap<CapabilityId, CapabilityValue>>,
    inputs: RwLock<Vec<Arc<InputChannel>>>,
    mode: RwLock<Option<String>>,
    ready: AtomicBool,
    available: AtomicBool,
}

impl Device {
    pub fn new(
        model: DeviceModel,
        transport: Arc<dyn NodeTransport>,
        store: Arc<dyn SettingsStore>,
        options: DeviceOptions,
    ) -> (Self, mpsc::UnboundedReceiver<DeviceEvent>) {
        let id = Uuid::new_v4();
        let (events, rx) = EventSink::new(id);
        let reader = SafeParameterReader::new(transport.clone(), options.read_attempts);
        let device = Self {
            id,
            model,
            transport,
            store,
            options,
            reader,
            router: ReportRouter::new(),
            events,
            topology: RwLock::new(None),
            capabilities: RwLock::new(BTreeMap::new()),
            placeholders: RwLock::new(BTreeMap::new()),
            inputs: RwLock::new(Vec::new()),
            mode: RwLock::new(None),
            ready: AtomicBool::new(false),
            available: AtomicBool::new(true),
        };
        (device, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn model(&self) -> &DeviceModel {
        &self.model
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Topology resolved by the last initialization.
    pub fn topology(&self) -> Option<Topology> {
        self.topology.read().clone()
    }

    pub fn bindings(&self) -> Vec<CapabilityBinding> {
        self.capabilities
            .read()
            .values()
            .map(|handle| *handle.binding())
            .collect()
    }

    pub fn input_bindings(&self) -> Vec<InputBinding> {
        self.inputs
            .read()
            .iter()
            .map(|channel| channel.binding().clone())
            .collect()
    }

    /// Last known value of a capability, bound or placeholder.
    pub fn capability_value(&self, capability: CapabilityId) -> Option<CapabilityValue> {
        if let Some(handle) = self.capabilities.read().get(&capability) {
            return handle.get();
        }
        self.placeholders.read().get(&capability).cloned()
    }

    /// Mode discovered from the model's mode parameter.
    pub fn mode(&self) -> Option<String> {
        self.mode.read().clone()
    }

    /// Run the initialization pipeline.
    pub async fn initialize(&self) {
        info!(
            "[Device] Initializing {} ({}) as {}",
            self.model.name, self.model.id, self.id
        );

        let resolver = match self.model.root_class_override {
            Some(class) => TopologyResolver::with_root_class(class),
            None => TopologyResolver::new(),
        };
        let topology = resolver.resolve(&self.transport.endpoint_graph());

        self.migrate_settings().await;

        if self.options.configure_multi_channel_reporting {
            self.configure_multi_channel_reporting(&topology).await;
        }

        let binder = CapabilityBinder::new(
            self.reader.clone(),
            self.store.clone(),
            self.model.multi_channel_disabled,
        );
        let bindings = binder.bind(&self.model.declarations, &self.model.declared, &topology);
        self.router.clear();
        self.register_capabilities(&bindings);

        let input_bindings = binder.bind_inputs(&self.model.inputs, &topology).await;
        self.register_inputs(input_bindings);

        let mode = self.discover_mode().await;
        *self.mode.write() = mode;

        *self.topology.write() = Some(topology);
        self.ready.store(true, Ordering::SeqCst);
        info!(
            "[Device] {} ready: {} capabilit(ies), {} input(s)",
            self.model.id,
            bindings.len(),
            self.inputs.read().len()
        );

        self.request_initial_values(&bindings).await;
    }

    async fn migrate_settings(&self) {
        let engine = self.model.migration_engine();
        match engine.run_once(self.store.as_ref(), &self.model.schema).await {
            Ok(MigrationOutcome::Migrated { migrated }) if !migrated.is_empty() => {
                info!("[Settings] Migrated {}", migrated.join(", "));
            }
            Ok(_) => {}
            Err(e) => warn!("[Settings] Migration failed, will retry next start: {}", e),
        }
    }

    async fn configure_multi_channel_reporting(&self, topology: &Topology) {
        if topology.is_flat() || self.model.multi_channel_disabled {
            return;
        }
        let configured = self
            .store
            .get_setting(keys::MULTI_CHANNEL_REPORTING_CONFIGURED)
            .and_then(|value| value_as_bool(&value))
            .unwrap_or(false);
        if configured {
            debug!("[Device] Multi-channel reporting already configured");
            return;
        }
        let result: Result<()> = async {
            if !topology
                .root_command_classes
                .contains(&CommandClass::MultiChannelAssociation)
            {
                return Err(EngineError::UnsupportedCapability(
                    "root node has no multi-channel association support".to_string(),
                ));
            }
            self.transport
                .send_command(
                    None,
                    Command::AssociationRemove {
                        group: LIFELINE_GROUP,
                        node_id: CONTROLLER_NODE_ID,
                    },
                )
                .await?;
            self.transport
                .send_command(
                    None,
                    Command::MultiChannelAssociationSet {
                        group: LIFELINE_GROUP,
                        node_id: CONTROLLER_NODE_ID,
                        endpoint: CONTROLLER_ENDPOINT,
                    },
                )
                .await?;
            let group = format!("{}.{}", CONTROLLER_NODE_ID, CONTROLLER_ENDPOINT);
            self.store
                .set_settings(Settings::from([(
                    keys::ZW_GROUP_1.to_string(),
                    Value::String(group),
                )]))
                .await
        }
        .await;

        match result {
            Ok(()) => info!("[Device] Configured multi-channel reporting"),
            Err(e) => {
                error!("[Device] Failed to configure multi-channel reporting: {}", e);
                self.mark_unavailable(format!("multi-channel reporting: {}", e));
            }
        }

        // Attempted once per device either way
        let flag = Settings::from([(
            keys::MULTI_CHANNEL_REPORTING_CONFIGURED.to_string(),
            Value::Bool(true),
        )]);
        if let Err(e) = self.store.set_settings(flag).await {
            warn!("[Device] Failed to persist reporting flag: {}", e);
        }
    }

    fn register_capabilities(&self, bindings: &[CapabilityBinding]) {
        let mut capabilities = self.capabilities.write();
        capabilities.clear();
        for binding in bindings {
            let handle = Arc::new(CapabilityHandle::new(*binding));
            let listener = handle.clone();
            let events = self.events.clone();
            let handler: ReportHandler = Arc::new(move |report: &Report| {
                let binding = listener.binding();
                let Some(value) = binding.transform.decode(report) else {
                    return;
                };
                let Some(previous) = listener.set(value.clone()) else {
                    return;
                };
                if binding.capability == CapabilityId::ThermostatModeOffAuto
                    && let (Some(_), CapabilityValue::Mode(mode)) = (&previous, &value)
                {
                    events.emit(DeviceEventKind::ThermostatModeChanged { mode: *mode });
                }
                events.emit(DeviceEventKind::CapabilityChanged {
                    capability: binding.capability,
                    value,
                });
            });
            self.router
                .on_report(binding.endpoint, binding.command_class, handler);
            capabilities.insert(binding.capability, handle);
        }

        let mut placeholders = self.placeholders.write();
        placeholders.clear();
        for capability in &self.model.placeholders {
            if capabilities.contains_key(capability) {
                continue;
            }
            info!(
                "[Binder] {} unavailable in the current configuration",
                capability
            );
            placeholders.insert(*capability, CapabilityValue::Number(0.0));
            self.events.emit(DeviceEventKind::CapabilityChanged {
                capability: *capability,
                value: CapabilityValue::Number(0.0),
            });
        }
    }

    fn register_inputs(&self, bindings: Vec<InputBinding>) {
        let mut inputs = self.inputs.write();
        inputs.clear();
        for binding in bindings {
            let channel = Arc::new(InputChannel::new(binding));
            let listener = channel.clone();
            let events = self.events.clone();
            let handler: ReportHandler = Arc::new(move |report: &Report| {
                let config = &listener.binding().config;
                for event in listener.process(report) {
                    events.emit(DeviceEventKind::InputTriggered {
                        input: config.index,
                        event,
                        trigger: config.triggers.id(event),
                    });
                }
            });
            // Firmware revisions use either report shape
            let endpoint = Some(channel.binding().endpoint);
            self.router
                .on_report(endpoint, CommandClass::SensorBinary, handler.clone());
            self.router
                .on_report(endpoint, CommandClass::Notification, handler);
            inputs.push(channel);
        }
    }

    async fn discover_mode(&self) -> Option<String> {
        let discovery = self.model.mode_discovery?;
        if let Some(Value::String(mode)) = self.store.get_store_value(discovery.store_key) {
            debug!("[Device] Mode (cached): {}", mode);
            return Some(mode);
        }
        let read = self.reader.read(discovery.parameter).await;
        let mode = read.value()?.value().to_string();
        info!(
            "[Device] Mode from parameter {}: {}",
            discovery.parameter, mode
        );
        let update = Settings::from([(
            discovery.setting_key.to_string(),
            Value::String(mode.clone()),
        )]);
        if let Err(e) = self.store.set_settings(update).await {
            warn!("[Device] Failed to reflect {}: {}", discovery.setting_key, e);
        }
        if let Err(e) = self
            .store
            .set_store_value(discovery.store_key, Value::String(mode.clone()))
            .await
        {
            warn!("[Device] Failed to cache {}: {}", discovery.store_key, e);
        }
        Some(mode)
    }

    async fn request_initial_values(&self, bindings: &[CapabilityBinding]) {
        for binding in bindings.iter().filter(|binding| binding.get_on_start) {
            let command = Command::Get(binding.command_class);
            if let Err(e) = self.transport.send_command(binding.endpoint, command).await {
                warn!(
                    "[Device] Initial get of {} failed: {}",
                    binding.capability, e
                );
            }
        }
    }

    fn mark_unavailable(&self, reason: String) {
        self.available.store(false, Ordering::SeqCst);
        self.events.emit(DeviceEventKind::Unavailable { reason });
    }

    /// Feed an inbound report. Returns how many listeners saw it.
    pub fn handle_report(&self, endpoint: Option<u8>, report: &Report) -> usize {
        self.router.dispatch(endpoint, report)
    }

    /// Set a capability on the node.
    ///
    /// The cached value follows the node's report, not the request.
    pub async fn set_capability(
        &self,
        capability: CapabilityId,
        value: CapabilityValue,
    ) -> Result<()> {
        if !self.model.declared.contains(&capability) {
            return Err(EngineError::UnsupportedCapability(format!(
                "{} is not a capability of {}",
                capability, self.model.id
            )));
        }
        let handle = self.capabilities.read().get(&capability).cloned();
        let Some(handle) = handle else {
            if self.model.placeholders.contains(&capability) {
                self.placeholders
                    .write()
                    .insert(capability, CapabilityValue::Number(0.0));
                self.events.emit(DeviceEventKind::CapabilityChanged {
                    capability,
                    value: CapabilityValue::Number(0.0),
                });
            }
            return Err(EngineError::UnsupportedCapability(format!(
                "{} is not available in the current device configuration",
                capability
            )));
        };
        let binding = handle.binding();
        let command = binding.command(&value)?;
        debug!(
            "[Device] {} <- {:?} via {:?}",
            capability, value, binding.endpoint
        );
        self.transport.send_command(binding.endpoint, command).await
    }

    /// Reset the accumulated energy meter.
    pub async fn reset_meter(&self) -> Result<()> {
        let endpoint = self
            .capabilities
            .read()
            .get(&CapabilityId::MeterPower)
            .map(|handle| handle.binding().endpoint)
            .ok_or_else(|| {
                EngineError::UnsupportedCapability(format!("{} has no meter", self.model.id))
            })?;
        info!("[Device] Resetting meter");
        self.transport
            .send_command(endpoint, Command::MeterReset)
            .await
    }

    /// Start a motor calibration run.
    pub async fn start_calibration(&self) -> Result<()> {
        let calibration = self.model.calibration.ok_or_else(|| {
            EngineError::UnsupportedCapability(format!("{} has no calibration", self.model.id))
        })?;
        let value = ConfigurationValue::encode(
            calibration.value,
            calibration.parameter.size,
            calibration.parameter.signed,
        )?;
        info!("[Device] Starting calibration");
        self.transport
            .configuration_set(calibration.parameter.index, value)
            .await
    }

    /// Switch the thermostat off or to auto.
    pub async fn set_thermostat_mode(&self, mode: ThermostatMode) -> Result<()> {
        self.set_capability(
            CapabilityId::ThermostatModeOffAuto,
            CapabilityValue::Mode(mode),
        )
        .await
    }

    /// Apply a user settings change.
    ///
    /// Every derived configuration write is sent in order and the first
    /// failure is returned; nothing is retried. The changed keys are stored
    /// once all writes succeeded.
    pub async fn on_settings(
        &self,
        old: &Settings,
        new: &Settings,
        changed_keys: &[String],
    ) -> Result<()> {
        let change = SettingsChange::new(old, new, changed_keys);
        let writes = plan_writes(&self.model.schema, &change)?;
        for write in writes {
            debug!(
                "[Settings] {} -> parameter {} = {}",
                write.key,
                write.parameter,
                write.value.value()
            );
            self.transport
                .configuration_set(write.parameter, write.value)
                .await?;
        }

        let applied: Settings = changed_keys
            .iter()
            .filter_map(|key| new.get(key).map(|value| (key.clone(), value.clone())))
            .collect();
        if !applied.is_empty() {
            self.store.set_settings(applied).await?;
        }

        self.mirror_inversions(&change);
        Ok(())
    }

    fn mirror_inversions(&self, change: &SettingsChange<'_>) {
        for inversion in &self.model.schema.inversions {
            if !change.is_changed(inversion.setting_key) {
                continue;
            }
            let handle = self.capabilities.read().get(&inversion.capability).cloned();
            let Some(handle) = handle else {
                continue;
            };
            let Some(current) = handle.get().and_then(|value| value.as_f64()) else {
                continue;
            };
            let mirrored = CapabilityValue::Number(1.0 - current);
            if handle.set(mirrored.clone()).is_some() {
                self.events.emit(DeviceEventKind::CapabilityChanged {
                    capability: inversion.capability,
                    value: mirrored,
                });
            }
        }
    }

    /// Message to show after saving `changed_keys`, if any.
    pub fn custom_save_message(&self, changed_keys: &[String]) -> Option<LocalizedMessage> {
        custom_save_message(&self.model.schema, changed_keys)
    }
}
