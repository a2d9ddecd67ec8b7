//! Flush dimmer.

use super::{
    DeviceModel, INPUT_STRUCTURAL_KEYS, ModeDiscovery, all_on_all_off_definitions, declared,
    flush_inputs, input_type_definitions, power_reporting, restore_status, temperature_sensor,
};
use crate::capabilities::{CapabilityDeclaration, CapabilityId, EndpointSelector};
use crate::codec::ValueSize;
use crate::migration::MigrationMap;
use crate::settings::{
    AllOnAllOff, DimLimits, ParameterSpec, SettingCodec, SettingDefinition, SettingsSchema, keys,
    parsers,
};
use crate::topology::{CommandClass, Endpoint, EndpointGraph, GenericDeviceClass};
use serde_json::json;

/// Flush dimmer (ZMNHDD).
pub fn zmnhdd() -> DeviceModel {
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
    definitions.push(SettingDefinition::parameter(
        keys::MINIMUM_DIM_VALUE,
        json!(1),
        ParameterSpec::new(60, ValueSize::One),
        SettingCodec::Raw,
    ));
    definitions.push(SettingDefinition::parameter(
        keys::MAXIMUM_DIM_VALUE,
        json!(99),
        ParameterSpec::new(61, ValueSize::One),
        SettingCodec::Raw,
    ));
    definitions.push(SettingDefinition::parameter(
        keys::DIM_DURATION,
        json!(1),
        ParameterSpec::new(65, ValueSize::Two),
        SettingCodec::Domain(parsers::dim_duration()),
    ));
    definitions.push(SettingDefinition::local(keys::WORKING_MODE, json!("0")));
    definitions.extend(power_reporting());
    definitions.extend(temperature_sensor());
    definitions.extend(input_type_definitions());

    DeviceModel {
        id: "ZMNHDD",
        name: "Flush Dimmer",
        declarations: vec![
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
                CapabilityId::Dim,
                CommandClass::SwitchMultilevel,
                EndpointSelector::Root,
            ),
            CapabilityDeclaration::new(
                CapabilityId::Onoff,
                CommandClass::SwitchBinary,
                EndpointSelector::Root,
            ),
            // Older firmware only answers multilevel on the dimmer endpoint
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
        ],
        declared: declared(&[
            CapabilityId::Onoff,
            CapabilityId::Dim,
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
            dim_limits: Some(DimLimits {
                minimum_key: keys::MINIMUM_DIM_VALUE,
                maximum_key: keys::MAXIMUM_DIM_VALUE,
            }),
            structural_keys: INPUT_STRUCTURAL_KEYS.to_vec(),
            ..Default::default()
        },
        migration: MigrationMap::new(),
        mode_discovery: Some(ModeDiscovery {
            parameter: 5,
            store_key: keys::WORKING_MODE,
            setting_key: keys::WORKING_MODE,
        }),
        calibration: None,
        placeholders: Vec::new(),
        sample_graph: EndpointGraph::flat([
            CommandClass::SwitchMultilevel,
            CommandClass::SwitchBinary,
            CommandClass::Meter,
            CommandClass::MultiChannel,
            CommandClass::Association,
            CommandClass::MultiChannelAssociation,
            CommandClass::Configuration,
        ])
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
            [CommandClass::SensorBinary, CommandClass::Notification],
        ))
        .with_endpoint(Endpoint::new(
            3,
            GenericDeviceClass::SensorBinary,
            [CommandClass::SensorBinary, CommandClass::Notification],
        ))
        .with_endpoint(Endpoint::new(
            4,
            GenericDeviceClass::SensorMultilevel,
            [CommandClass::SensorMultilevel],
        )),
    }
}
