//! Device model tables.
//!
//! A model is data only: which capabilities it declares and where they live,
//! which inputs it has, its settings schema and migration overrides. The
//! engine in [`crate::device`] interprets these tables; no model carries
//! behaviour of its own.

pub mod dimmer;
pub mod relay;
pub mod shutter;
pub mod thermostat;

use crate::capabilities::{CapabilityDeclaration, CapabilityId, DeclaredCapabilities};
use crate::codec::ValueSize;
use crate::error::{EngineError, Result};
use crate::inputs::{ActiveRange, InputConfig, InputEnablement, InputTriggers};
use crate::migration::{self, CombinedMigration, MigrationMap, SettingsMigrationEngine};
use crate::settings::{
    AllOnAllOff, ParameterSpec, SettingCodec, SettingDefinition, SettingsSchema, keys, parsers,
};
use crate::topology::{EndpointGraph, GenericDeviceClass};
use serde_json::json;

/// Parameter read once to learn how the device is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDiscovery {
    pub parameter: u8,
    /// Private store key caching the discovered mode.
    pub store_key: &'static str,
    /// Visible setting the mode is reflected into.
    pub setting_key: &'static str,
}

/// Parameter write that starts a motor calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub parameter: ParameterSpec,
    pub value: i64,
}

/// Static description of one device model.
#[derive(Debug, Clone)]
pub struct DeviceModel {
    pub id: &'static str,
    pub name: &'static str,
    /// Capability table in priority order; the first usable entry of a
    /// capability wins.
    pub declarations: Vec<CapabilityDeclaration>,
    pub declared: DeclaredCapabilities,
    pub inputs: Vec<InputConfig>,
    /// Generic class of the root endpoint when it is not a switch.
    pub root_class_override: Option<GenericDeviceClass>,
    /// Address everything through the root node even if endpoints exist.
    pub multi_channel_disabled: bool,
    pub schema: SettingsSchema,
    /// Migration rules overriding the generic ones.
    pub migration: MigrationMap,
    pub mode_discovery: Option<ModeDiscovery>,
    pub calibration: Option<Calibration>,
    /// Capabilities reset to zero and refused while unbound.
    pub placeholders: Vec<CapabilityId>,
    /// Endpoint graph of a typical installation, used by the simulator.
    pub sample_graph: EndpointGraph,
}

impl DeviceModel {
    /// Migration engine with the generic rules overridden by this model's.
    pub fn migration_engine(&self) -> SettingsMigrationEngine {
        SettingsMigrationEngine::new(&migration::generic::migration_map(), &self.migration)
            .with_combined(self.combined_migrations())
    }

    fn combined_migrations(&self) -> Vec<CombinedMigration> {
        if self.schema.all_on_all_off.is_some() {
            migration::generic::combined_migrations()
        } else {
            Vec::new()
        }
    }
}

/// Every known model.
pub fn all() -> Vec<DeviceModel> {
    vec![
        relay::zmnhad(),
        relay::zmnhaa(),
        dimmer::zmnhdd(),
        shutter::zmnhcd(),
        thermostat::zmnhkd(),
    ]
}

/// Look up a model by id (case-insensitive).
pub fn by_id(id: &str) -> Result<DeviceModel> {
    all()
        .into_iter()
        .find(|model| model.id.eq_ignore_ascii_case(id.trim()))
        .ok_or_else(|| EngineError::UnknownModel(id.to_string()))
}

pub(crate) const INPUT_ONE: InputTriggers = InputTriggers {
    toggle: "inputOneToggled",
    on: "inputOneTurnedOn",
    off: "inputOneTurnedOff",
};

pub(crate) const INPUT_TWO: InputTriggers = InputTriggers {
    toggle: "inputTwoToggled",
    on: "inputTwoTurnedOn",
    off: "inputTwoTurnedOff",
};

pub(crate) const INPUT_THREE: InputTriggers = InputTriggers {
    toggle: "inputThreeToggled",
    on: "inputThreeTurnedOn",
    off: "inputThreeTurnedOff",
};

/// Input whose enablement is read from `parameter`.
pub(crate) fn parameter_input(index: u8, parameter: u8, triggers: InputTriggers) -> InputConfig {
    InputConfig {
        index,
        enablement: InputEnablement::Parameter {
            index: parameter,
            active: ActiveRange::default(),
        },
        triggers,
    }
}

/// Inputs 2 and 3 on parameters 100 and 101, shared by most flush modules.
pub(crate) fn flush_inputs() -> Vec<InputConfig> {
    vec![
        parameter_input(2, 100, INPUT_TWO),
        parameter_input(3, 101, INPUT_THREE),
    ]
}

pub(crate) fn declared(capabilities: &[CapabilityId]) -> DeclaredCapabilities {
    capabilities.iter().copied().collect()
}

/// All-on/all-off toggles stored locally and combined into parameter 10.
pub(crate) fn all_on_all_off_definitions() -> Vec<SettingDefinition> {
    vec![
        SettingDefinition::local(keys::ALL_ON, json!(true)),
        SettingDefinition::local(keys::ALL_OFF, json!(true)),
    ]
}

pub(crate) fn restore_status() -> SettingDefinition {
    SettingDefinition::parameter(
        keys::RESTORE_STATUS,
        json!(true),
        ParameterSpec::new(30, ValueSize::One),
        SettingCodec::InvertedBool,
    )
}

pub(crate) fn power_reporting() -> Vec<SettingDefinition> {
    vec![
        SettingDefinition::parameter(
            keys::POWER_REPORTING_THRESHOLD,
            json!(10),
            ParameterSpec::new(40, ValueSize::One),
            SettingCodec::Raw,
        ),
        SettingDefinition::parameter(
            keys::POWER_REPORTING_INTERVAL,
            json!(300),
            ParameterSpec::new(42, ValueSize::Two),
            SettingCodec::Raw,
        ),
    ]
}

pub(crate) fn temperature_sensor() -> Vec<SettingDefinition> {
    vec![
        SettingDefinition::parameter(
            keys::TEMPERATURE_SENSOR_OFFSET,
            json!(0),
            ParameterSpec::new(110, ValueSize::Two),
            SettingCodec::Domain(parsers::temperature_sensor_offset()),
        ),
        SettingDefinition::parameter(
            keys::TEMPERATURE_SENSOR_REPORTING_THRESHOLD,
            json!(0.5),
            ParameterSpec::new(120, ValueSize::One),
            SettingCodec::Domain(parsers::temperature_reporting_threshold()),
        ),
    ]
}

/// Input type dropdowns for inputs 2 and 3.
pub(crate) fn input_type_definitions() -> Vec<SettingDefinition> {
    vec![
        SettingDefinition::parameter(
            keys::ENABLE_INPUT_2,
            json!("0"),
            ParameterSpec::new(100, ValueSize::One),
            SettingCodec::Dropdown,
        ),
        SettingDefinition::parameter(
            keys::ENABLE_INPUT_3,
            json!("0"),
            ParameterSpec::new(101, ValueSize::One),
            SettingCodec::Dropdown,
        ),
    ]
}

/// Input wiring changes the endpoint structure.
pub(crate) const INPUT_STRUCTURAL_KEYS: [&str; 3] =
    [keys::ENABLE_INPUT_1, keys::ENABLE_INPUT_2, keys::ENABLE_INPUT_3];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(by_id("zmnhdd").unwrap().id, "ZMNHDD");
        assert!(matches!(by_id("ZMNHXX"), Err(EngineError::UnknownModel(_))));
    }

    #[test]
    fn test_model_ids_are_unique() {
        let ids: BTreeSet<&str> = all().iter().map(|model| model.id).collect();
        assert_eq!(ids.len(), all().len());
    }

    #[test]
    fn test_declarations_only_reference_declared_capabilities() {
        for model in all() {
            for declaration in &model.declarations {
                assert!(
                    model.declared.contains(&declaration.capability),
                    "{} declares {} outside its capability set",
                    model.id,
                    declaration.capability
                );
            }
        }
    }

    #[test]
    fn test_migration_targets_exist_in_schema() {
        for model in all() {
            for key in model.migration.keys() {
                assert!(
                    model.schema.contains(key.as_str()),
                    "{} migrates unknown key {}",
                    model.id,
                    key
                );
            }
        }
    }

    #[test]
    fn test_schema_parameters_are_unique() {
        for model in all() {
            let mut seen = BTreeSet::new();
            for definition in &model.schema.definitions {
                if let Some(parameter) = definition.parameter {
                    assert!(
                        seen.insert(parameter.index),
                        "{} maps parameter {} twice",
                        model.id,
                        parameter.index
                    );
                }
            }
            if let Some(all_on_all_off) = model.schema.all_on_all_off {
                assert!(seen.insert(all_on_all_off.parameter.index));
            }
        }
    }

    #[test]
    fn test_defaults_encode_cleanly() {
        for model in all() {
            for definition in &model.schema.definitions {
                assert!(
                    definition.encode(&definition.default).is_ok(),
                    "{} default of {} does not encode",
                    model.id,
                    definition.key
                );
            }
        }
    }

    #[test]
    fn test_all_on_all_off_default_width() {
        assert_eq!(
            by_id("ZMNHAD").unwrap().schema.all_on_all_off,
            Some(AllOnAllOff::default())
        );
    }
}
