//! Flush 1 relay modules.

use super::{
    DeviceModel, INPUT_STRUCTURAL_KEYS, all_on_all_off_definitions, declared, flush_inputs,
    input_type_definitions, power_reporting, restore_status, temperature_sensor,
};
use crate::capabilities::{CapabilityDeclaration, CapabilityId, EndpointSelector};
use crate::codec::ValueSize;
use crate::inputs::{InputConfig, InputEnablement, InputTriggers};
use crate::migration::generic::copy;
use crate::migration::{MigrationFn, MigrationMap, SettingKey, legacy};
use crate::settings::{
    AllOnAllOff, ParameterSpec, SettingCodec, SettingDefinition, SettingsSchema, keys, number,
    parsers, value_as_f64,
};
use crate::store::Settings;
use crate::topology::{CommandClass, Endpoint, EndpointGraph, GenericDeviceClass};
use serde_json::{Value, json};

fn relay_declarations() -> Vec<CapabilityDeclaration> {
    vec![
        CapabilityDeclaration::new(
            CapabilityId::MeterPower,
            CommandClass::Meter,
            EndpointSelector::Root,
        ),
        CapabilityDeclaration::new(
            CapabilityId::MeasurePower,
            CommandClass::Meter,
            EndpointSelector::Root,
        ),
        CapabilityDeclaration::new(
            CapabilityId::Onoff,
            CommandClass::SwitchBinary,
            EndpointSelector::Root,
        ),
        CapabilityDeclaration::new(
            CapabilityId::MeasureTemperature,
            CommandClass::SensorMultilevel,
            EndpointSelector::Temperature,
        ),
    ]
}

fn relay_graph(input_class: GenericDeviceClass, input_cc: CommandClass) -> EndpointGraph {
    EndpointGraph::flat([
        CommandClass::SwitchBinary,
        CommandClass::Meter,
        CommandClass::SensorMultilevel,
        CommandClass::MultiChannel,
        CommandClass::Association,
        CommandClass::MultiChannelAssociation,
        CommandClass::Configuration,
    ])
    .with_endpoint(Endpoint::new(
        1,
        GenericDeviceClass::SwitchBinary,
        [CommandClass::SwitchBinary, CommandClass::Meter],
    ))
    .with_endpoint(Endpoint::new(2, input_class, [input_cc]))
    .with_endpoint(Endpoint::new(3, input_class, [input_cc]))
    .with_endpoint(Endpoint::new(
        4,
        GenericDeviceClass::SensorMultilevel,
        [CommandClass::SensorMultilevel],
    ))
}

/// Flush 1 relay (ZMNHAD).
pub fn zmnhad() -> DeviceModel {
    let mut definitions = all_on_all_off_definitions();
    definitions.push(restore_status());
    definitions.push(SettingDefinition::parameter(
        keys::AUTO_OFF,
        json!(0),
        ParameterSpec::new(11, ValueSize::Two),
        SettingCodec::Raw,
    ));
    definitions.push(SettingDefinition::parameter(
        keys::AUTO_ON,
        json!(0),
        ParameterSpec::new(12, ValueSize::Two),
        SettingCodec::Raw,
    ));
    definitions.extend(power_reporting());
    definitions.extend(temperature_sensor());
    definitions.extend(input_type_definitions());

    DeviceModel {
        id: "ZMNHAD",
        name: "Flush 1 Relay",
        declarations: relay_declarations(),
        declared: declared(&[
            CapabilityId::Onoff,
            CapabilityId::MeterPower,
            CapabilityId::MeasurePower,
            CapabilityId::MeasureTemperature,
        ]),
        inputs: flush_inputs(),
        root_class_override: None,
        multi_channel_disabled: false,
        schema: SettingsSchema {
            definitions,
            all_on_all_off: Some(AllOnAllOff::default()),
            structural_keys: INPUT_STRUCTURAL_KEYS.to_vec(),
            ..Default::default()
        },
        migration: MigrationMap::new(),
        mode_discovery: None,
        calibration: None,
        placeholders: Vec::new(),
        sample_graph: relay_graph(
            GenericDeviceClass::SensorNotification,
            CommandClass::Notification,
        ),
    }
}

const LEGACY_AUTO_OFF_Q1: &str = "automatic_turning_off_output_q1_after_set_time";
const LEGACY_POWER_REPORT_ON_CHANGE_Q1: &str = "power_report_on_power_change_q1";
const LEGACY_POWER_REPORT_INTERVAL_Q1: &str = "power_report_by_time_interval_q1";

fn legacy_auto_off(settings: &Settings) -> Option<Value> {
    let seconds = legacy(settings, LEGACY_AUTO_OFF_Q1).and_then(value_as_f64)?;
    Some(number(seconds.min(parsers::AUTO_OFF_MAX_SECONDS)))
}

fn legacy_power_reporting_threshold(settings: &Settings) -> Option<Value> {
    copy(settings, LEGACY_POWER_REPORT_ON_CHANGE_Q1)
}

fn legacy_power_reporting_interval(settings: &Settings) -> Option<Value> {
    copy(settings, LEGACY_POWER_REPORT_INTERVAL_Q1)
}

/// Flush 1 relay, first generation (ZMNHAA).
///
/// Its multi-channel firmware is unreliable, so everything is addressed
/// through the root node. Inputs 2 and 3 are always wired and the all-on/
/// all-off parameter is a single byte.
pub fn zmnhaa() -> DeviceModel {
    let mut definitions = all_on_all_off_definitions();
    definitions.push(restore_status());
    definitions.push(SettingDefinition::parameter(
        keys::AUTO_OFF,
        json!(0),
        ParameterSpec::new(11, ValueSize::Two),
        SettingCodec::Domain(parsers::hundredths(0.0, parsers::AUTO_OFF_MAX_SECONDS)),
    ));
    definitions.extend(power_reporting());
    definitions.extend(temperature_sensor());

    let inputs = vec![
        InputConfig {
            index: 2,
            enablement: InputEnablement::Static(true),
            triggers: InputTriggers {
                toggle: "inputTwoToggled",
                on: "I2_on",
                off: "I2_off",
            },
        },
        InputConfig {
            index: 3,
            enablement: InputEnablement::Static(true),
            triggers: InputTriggers {
                toggle: "inputThreeToggled",
                on: "I3_on",
                off: "I3_off",
            },
        },
    ];

    DeviceModel {
        id: "ZMNHAA",
        name: "Flush 1 Relay (first generation)",
        declarations: relay_declarations(),
        declared: declared(&[
            CapabilityId::Onoff,
            CapabilityId::MeterPower,
            CapabilityId::MeasurePower,
            CapabilityId::MeasureTemperature,
        ]),
        inputs,
        root_class_override: None,
        multi_channel_disabled: true,
        schema: SettingsSchema {
            definitions,
            all_on_all_off: Some(AllOnAllOff::with_size(ValueSize::One)),
            structural_keys: INPUT_STRUCTURAL_KEYS.to_vec(),
            ..Default::default()
        },
        migration: MigrationMap::from([
            (SettingKey(keys::AUTO_OFF), legacy_auto_off as MigrationFn),
            (
                SettingKey(keys::POWER_REPORTING_THRESHOLD),
                legacy_power_reporting_threshold,
            ),
            (
                SettingKey(keys::POWER_REPORTING_INTERVAL),
                legacy_power_reporting_interval,
            ),
        ]),
        mode_discovery: None,
        calibration: None,
        placeholders: Vec::new(),
        sample_graph: relay_graph(GenericDeviceClass::SensorBinary, CommandClass::SensorBinary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::bind_capabilities;
    use crate::topology::TopologyResolver;

    #[test]
    fn test_legacy_auto_off_is_capped() {
        let settings = Settings::from([(LEGACY_AUTO_OFF_Q1.to_string(), json!(900))]);
        assert_eq!(legacy_auto_off(&settings), Some(json!(655)));
        let settings = Settings::from([(LEGACY_AUTO_OFF_Q1.to_string(), json!(30))]);
        assert_eq!(legacy_auto_off(&settings), Some(json!(30)));
        assert_eq!(legacy_auto_off(&Settings::new()), None);
    }

    #[test]
    fn test_zmnhaa_binds_everything_to_root_node() {
        let model = zmnhaa();
        let topology = TopologyResolver::new().resolve(&model.sample_graph);
        let bindings = bind_capabilities(
            &model.declarations,
            &model.declared,
            &topology,
            model.multi_channel_disabled,
        );
        assert_eq!(bindings.len(), 4);
        assert!(bindings.iter().all(|binding| binding.endpoint.is_none()));
        assert!(
            bindings
                .iter()
                .any(|binding| binding.capability == CapabilityId::MeasureTemperature)
        );
    }

    #[test]
    fn test_zmnhad_sample_graph_roles() {
        let model = zmnhad();
        let topology = TopologyResolver::new().resolve(&model.sample_graph);
        assert_eq!(topology.root_endpoint, Some(1));
        assert_eq!(topology.temperature_endpoint, Some(4));
        assert_eq!(topology.input_endpoints, vec![2, 3]);
    }
}
