//! Flush shutter.
//!
//! Venetian blind mode adds a second motor endpoint for the slats; the
//! temperature sensor, when connected, takes the next endpoint. Switching
//! blind mode changes the endpoint structure and needs a re-pair.

use super::{
    Calibration, DeviceModel, all_on_all_off_definitions, declared, restore_status,
    temperature_sensor,
};
use crate::capabilities::{CapabilityDeclaration, CapabilityId, EndpointSelector};
use crate::codec::ValueSize;
use crate::migration::MigrationMap;
use crate::settings::{
    AllOnAllOff, DirectionInversion, ParameterSpec, SettingCodec, SettingDefinition,
    SettingsSchema, keys, parsers,
};
use crate::topology::{CommandClass, Endpoint, EndpointGraph, GenericDeviceClass};
use serde_json::json;

/// Forced calibration parameter.
pub const CALIBRATION_PARAMETER: u8 = 78;

/// Endpoint of the slats motor in venetian blind mode.
pub const TILT_ENDPOINT: u8 = 2;

/// Flush shutter (ZMNHCD).
pub fn zmnhcd() -> DeviceModel {
    let mut definitions = all_on_all_off_definitions();
    definitions.push(restore_status());
    definitions.extend([
        SettingDefinition::parameter(
            keys::OPERATING_MODE,
            json!("0"),
            ParameterSpec::new(71, ValueSize::One),
            SettingCodec::Dropdown,
        ),
        SettingDefinition::parameter(
            keys::SLATS_TILTING_TIME,
            json!(1.5),
            ParameterSpec::new(72, ValueSize::Two),
            SettingCodec::Domain(parsers::hundredths(0.0, 655.35)),
        ),
        SettingDefinition::parameter(
            keys::MOTOR_MOVING_TIME,
            json!(0),
            ParameterSpec::new(74, ValueSize::Two),
            SettingCodec::Domain(parsers::tenths(0.0, 6553.5)),
        ),
        SettingDefinition::parameter(
            keys::MOTOR_OPERATION_DETECTION,
            json!(1),
            ParameterSpec::new(76, ValueSize::One),
            SettingCodec::Domain(parsers::tenths(0.0, 25.5)),
        ),
        SettingDefinition::parameter(
            keys::DELAY_BETWEEN_MOTOR_MOVEMENT,
            json!(0.5),
            ParameterSpec::new(80, ValueSize::One),
            SettingCodec::Domain(parsers::tenths(0.0, 25.5)),
        ),
        SettingDefinition::parameter(
            keys::POWER_REPORT_DELAY_TIME,
            json!(3),
            ParameterSpec::new(85, ValueSize::One),
            SettingCodec::Domain(parsers::tenths(0.0, 25.5)),
        ),
        SettingDefinition::local(keys::INVERT_WINDOW_COVERINGS_DIRECTION, json!(false)),
        SettingDefinition::local(keys::INVERT_WINDOW_COVERINGS_TILT_DIRECTION, json!(false)),
    ]);
    definitions.extend(temperature_sensor());

    DeviceModel {
        id: "ZMNHCD",
        name: "Flush Shutter",
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
                CapabilityId::WindowcoveringsTiltSet,
                CommandClass::SwitchMultilevel,
                EndpointSelector::Endpoint(TILT_ENDPOINT),
            ),
            CapabilityDeclaration::new(
                CapabilityId::MeasureTemperature,
                CommandClass::SensorMultilevel,
                EndpointSelector::Temperature,
            ),
        ],
        declared: declared(&[
            CapabilityId::Dim,
            CapabilityId::WindowcoveringsTiltSet,
            CapabilityId::MeterPower,
            CapabilityId::MeasurePower,
            CapabilityId::MeasureTemperature,
        ]),
        inputs: Vec::new(),
        root_class_override: None,
        multi_channel_disabled: false,
        schema: SettingsSchema {
            definitions,
            all_on_all_off: Some(AllOnAllOff::default()),
            inversions: vec![
                DirectionInversion {
                    setting_key: keys::INVERT_WINDOW_COVERINGS_DIRECTION,
                    capability: CapabilityId::Dim,
                },
                DirectionInversion {
                    setting_key: keys::INVERT_WINDOW_COVERINGS_TILT_DIRECTION,
                    capability: CapabilityId::WindowcoveringsTiltSet,
                },
            ],
            structural_keys: vec![keys::OPERATING_MODE],
            ..Default::default()
        },
        migration: MigrationMap::new(),
        mode_discovery: None,
        calibration: Some(Calibration {
            parameter: ParameterSpec::new(CALIBRATION_PARAMETER, ValueSize::One),
            value: 1,
        }),
        placeholders: vec![CapabilityId::WindowcoveringsTiltSet],
        sample_graph: EndpointGraph::flat([
            CommandClass::SwitchMultilevel,
            CommandClass::Meter,
            CommandClass::MultiChannel,
            CommandClass::Association,
            CommandClass::MultiChannelAssociation,
            CommandClass::Configuration,
        ])
        .with_endpoint(Endpoint::new(
            1,
            GenericDeviceClass::SwitchMultilevel,
            [CommandClass::SwitchMultilevel, CommandClass::Meter],
        ))
        .with_endpoint(Endpoint::new(
            TILT_ENDPOINT,
            GenericDeviceClass::SwitchMultilevel,
            [CommandClass::SwitchMultilevel],
        ))
        .with_endpoint(Endpoint::new(
            3,
            GenericDeviceClass::SensorMultilevel,
            [CommandClass::SensorMultilevel],
        )),
    }
}
