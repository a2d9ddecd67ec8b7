//! Capability binding.
//!
//! Turns a device model's capability declarations plus the resolved topology
//! into concrete (endpoint, command class, transform) bindings, and resolves
//! which input endpoints carry which logical inputs.

use super::{CapabilityId, CapabilityValue, DeclaredCapabilities, ValueTransform};
use crate::codec::LEVEL_RESTORE;
use crate::error::{EngineError, Result};
use crate::inputs::{self, InputBinding, InputConfig};
use crate::store::SettingsStore;
use crate::topology::{CommandClass, Topology};
use crate::transport::{Command, SafeParameterReader};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Which endpoint a capability lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointSelector {
    /// Always the root node, even on multi-channel devices.
    RootNode,
    /// The resolved root (control) endpoint; the root node on flat devices.
    Root,
    /// The resolved temperature sensor endpoint. Not available on flat devices.
    Temperature,
    /// A fixed endpoint id. Not available on flat devices.
    Endpoint(u8),
}

/// One entry of a device model's capability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDeclaration {
    pub capability: CapabilityId,
    pub command_class: CommandClass,
    pub endpoint: EndpointSelector,
    pub transform: ValueTransform,
    /// Request a fresh report right after initialization.
    pub get_on_start: bool,
}

impl CapabilityDeclaration {
    pub fn new(
        capability: CapabilityId,
        command_class: CommandClass,
        endpoint: EndpointSelector,
    ) -> Self {
        Self {
            capability,
            command_class,
            endpoint,
            transform: ValueTransform::for_capability(capability),
            get_on_start: false,
        }
    }

    pub fn with_get_on_start(mut self) -> Self {
        self.get_on_start = true;
        self
    }
}

/// A capability resolved to a concrete address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityBinding {
    pub capability: CapabilityId,
    /// `None` addresses the root node.
    pub endpoint: Option<u8>,
    pub command_class: CommandClass,
    pub transform: ValueTransform,
    pub get_on_start: bool,
}

impl CapabilityBinding {
    /// Command that sets this capability to `value`.
    ///
    /// On/off bound to a multilevel switch is sent as a level: off, or back
    /// to the last level.
    pub fn command(&self, value: &CapabilityValue) -> Result<Command> {
        let command = self.transform.encode(value)?;
        Ok(match command {
            Command::SwitchBinarySet(on) if self.command_class == CommandClass::SwitchMultilevel => {
                Command::SwitchMultilevelSet(if on { LEVEL_RESTORE } else { 0 })
            }
            other => other,
        })
    }
}

fn resolve_endpoint(
    selector: EndpointSelector,
    topology: &Topology,
    multi_channel_disabled: bool,
) -> Result<Option<u8>> {
    if multi_channel_disabled || selector == EndpointSelector::RootNode {
        return Ok(None);
    }
    match selector {
        EndpointSelector::RootNode => Ok(None),
        EndpointSelector::Root if topology.is_flat() => Ok(None),
        EndpointSelector::Root => topology
            .root_endpoint
            .map(Some)
            .ok_or(EngineError::MissingTopologyRole("root")),
        EndpointSelector::Temperature => topology
            .temperature_endpoint
            .map(Some)
            .ok_or(EngineError::MissingTopologyRole("temperature")),
        EndpointSelector::Endpoint(id) => topology
            .endpoint(id)
            .map(|endpoint| Some(endpoint.id))
            .ok_or(EngineError::MissingTopologyRole("endpoint")),
    }
}

/// Bind declared capabilities to endpoints.
///
/// Capabilities outside `declared` are never bound, the first declaration of
/// a capability wins, and declarations whose endpoint or command class cannot
/// be resolved are skipped with a warning.
pub fn bind_capabilities(
    declarations: &[CapabilityDeclaration],
    declared: &DeclaredCapabilities,
    topology: &Topology,
    multi_channel_disabled: bool,
) -> Vec<CapabilityBinding> {
    let mut bound: BTreeSet<CapabilityId> = BTreeSet::new();
    let mut bindings = Vec::new();

    for declaration in declarations {
        if !declared.contains(&declaration.capability) || bound.contains(&declaration.capability)
        {
            continue;
        }

        let endpoint =
            match resolve_endpoint(declaration.endpoint, topology, multi_channel_disabled) {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    warn!("[Binder] Not binding {}: {}", declaration.capability, e);
                    continue;
                }
            };

        if !topology.supports(endpoint, declaration.command_class) {
            warn!(
                "[Binder] Not binding {}: {}",
                declaration.capability,
                EngineError::UnsupportedCapability(format!(
                    "{} absent on {}",
                    declaration.command_class,
                    describe_endpoint(endpoint)
                ))
            );
            continue;
        }

        info!(
            "[Binder] {} -> {} via {}",
            declaration.capability,
            describe_endpoint(endpoint),
            declaration.command_class
        );
        bound.insert(declaration.capability);
        bindings.push(CapabilityBinding {
            capability: declaration.capability,
            endpoint,
            command_class: declaration.command_class,
            transform: declaration.transform,
            get_on_start: declaration.get_on_start,
        });
    }

    bindings
}

pub(crate) fn describe_endpoint(endpoint: Option<u8>) -> String {
    match endpoint {
        Some(id) => format!("endpoint {}", id),
        None => "root node".to_string(),
    }
}

/// Binds capabilities and inputs for one device.
pub struct CapabilityBinder {
    reader: SafeParameterReader,
    store: Arc<dyn SettingsStore>,
    multi_channel_disabled: bool,
}

impl CapabilityBinder {
    pub fn new(
        reader: SafeParameterReader,
        store: Arc<dyn SettingsStore>,
        multi_channel_disabled: bool,
    ) -> Self {
        Self {
            reader,
            store,
            multi_channel_disabled,
        }
    }

    /// Bind the declared capabilities. Never fails.
    pub fn bind(
        &self,
        declarations: &[CapabilityDeclaration],
        declared: &DeclaredCapabilities,
        topology: &Topology,
    ) -> Vec<CapabilityBinding> {
        bind_capabilities(declarations, declared, topology, self.multi_channel_disabled)
    }

    /// Resolve input enablement and assign enabled inputs to input endpoints.
    ///
    /// Enablement reads go through the [`SafeParameterReader`]; an input
    /// whose state cannot be determined stays unbound for this session.
    pub async fn bind_inputs(
        &self,
        configs: &[InputConfig],
        topology: &Topology,
    ) -> Vec<InputBinding> {
        if configs.is_empty() {
            return Vec::new();
        }
        let mut enabled = Vec::with_capacity(configs.len());
        // Strictly sequential: one outstanding request per node
        for config in configs {
            let state =
                inputs::resolve_enablement(config, &self.reader, self.store.as_ref()).await;
            enabled.push((config.clone(), state.unwrap_or(false)));
        }
        inputs::assign_inputs(&enabled, &topology.input_endpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{Endpoint, EndpointGraph, GenericDeviceClass, TopologyResolver};

    fn dimmer_graph() -> EndpointGraph {
        EndpointGraph::flat([CommandClass::MultiChannel, CommandClass::Meter])
            .with_endpoint(Endpoint::new(
                1,
                GenericDeviceClass::SwitchMultilevel,
                [
                    CommandClass::SwitchMultilevel,
                    CommandClass::SwitchBinary,
                    CommandClass::Meter,
                ],
            ))
            .with_endpoint(Endpoint::new(
                2,
                GenericDeviceClass::SensorBinary,
                [CommandClass::SensorBinary],
            ))
            .with_endpoint(Endpoint::new(
                3,
                GenericDeviceClass::SensorMultilevel,
                [CommandClass::SensorMultilevel],
            ))
    }

    fn declarations() -> Vec<CapabilityDeclaration> {
        vec![
            CapabilityDeclaration::new(
                CapabilityId::Dim,
                CommandClass::SwitchMultilevel,
                EndpointSelector::Root,
            ),
            CapabilityDeclaration::new(
                CapabilityId::Onoff,
                CommandClass::SwitchBinary,
                EndpointSelector::Root,
            ),
            CapabilityDeclaration::new(
                CapabilityId::Onoff,
                CommandClass::SwitchMultilevel,
                EndpointSelector::Root,
            ),
            CapabilityDeclaration::new(
                CapabilityId::MeasureTemperature,
                CommandClass::SensorMultilevel,
                EndpointSelector::Temperature,
            ),
        ]
    }

    fn all_declared() -> DeclaredCapabilities {
        [
            CapabilityId::Dim,
            CapabilityId::Onoff,
            CapabilityId::MeasureTemperature,
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_binds_to_resolved_endpoints() {
        let topology = TopologyResolver::new().resolve(&dimmer_graph());
        let bindings = bind_capabilities(&declarations(), &all_declared(), &topology, false);

        assert_eq!(bindings.len(), 3);
        let onoff = bindings
            .iter()
            .find(|b| b.capability == CapabilityId::Onoff)
            .unwrap();
        assert_eq!(onoff.endpoint, Some(1));
        assert_eq!(onoff.command_class, CommandClass::SwitchBinary);
        let temperature = bindings
            .iter()
            .find(|b| b.capability == CapabilityId::MeasureTemperature)
            .unwrap();
        assert_eq!(temperature.endpoint, Some(3));
    }

    #[test]
    fn test_undeclared_capabilities_are_never_bound() {
        let topology = TopologyResolver::new().resolve(&dimmer_graph());
        let declared: DeclaredCapabilities = [CapabilityId::Dim].into_iter().collect();
        let bindings = bind_capabilities(&declarations(), &declared, &topology, false);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].capability, CapabilityId::Dim);
    }

    #[test]
    fn test_flat_device_binds_root_node_only() {
        let graph = EndpointGraph::flat([
            CommandClass::SwitchMultilevel,
            CommandClass::SwitchBinary,
            CommandClass::SensorMultilevel,
        ]);
        let topology = TopologyResolver::new().resolve(&graph);
        let bindings = bind_capabilities(&declarations(), &all_declared(), &topology, false);

        assert!(bindings.iter().all(|b| b.endpoint.is_none()));
        // No temperature endpoint role on a flat device
        assert!(
            !bindings
                .iter()
                .any(|b| b.capability == CapabilityId::MeasureTemperature)
        );
    }

    #[test]
    fn test_multi_channel_disabled_uses_root_node() {
        let graph = dimmer_graph();
        let mut topology = TopologyResolver::new().resolve(&graph);
        topology.root_command_classes = [
            CommandClass::SwitchMultilevel,
            CommandClass::SwitchBinary,
            CommandClass::SensorMultilevel,
        ]
        .into_iter()
        .collect();
        let bindings = bind_capabilities(&declarations(), &all_declared(), &topology, true);
        assert_eq!(bindings.len(), 3);
        assert!(bindings.iter().all(|b| b.endpoint.is_none()));
    }

    #[test]
    fn test_onoff_on_multilevel_switch_sends_levels() {
        let binding = CapabilityBinding {
            capability: CapabilityId::Onoff,
            endpoint: Some(1),
            command_class: CommandClass::SwitchMultilevel,
            transform: ValueTransform::OnOff,
            get_on_start: false,
        };
        assert_eq!(
            binding.command(&CapabilityValue::Bool(true)).unwrap(),
            Command::SwitchMultilevelSet(LEVEL_RESTORE)
        );
        assert_eq!(
            binding.command(&CapabilityValue::Bool(false)).unwrap(),
            Command::SwitchMultilevelSet(0)
        );
    }

    #[test]
    fn test_missing_command_class_is_skipped() {
        let topology = TopologyResolver::new().resolve(&dimmer_graph());
        let declared: DeclaredCapabilities =
            [CapabilityId::TargetTemperature].into_iter().collect();
        let declarations = [CapabilityDeclaration::new(
            CapabilityId::TargetTemperature,
            CommandClass::ThermostatSetpoint,
            EndpointSelector::Root,
        )];
        assert!(bind_capabilities(&declarations, &declared, &topology, false).is_empty());
    }
}
