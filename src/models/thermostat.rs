//! Flush heat & cool thermostat.
//!
//! The controlling endpoint reports a thermostat generic class, and every
//! capability is served by the root node.

use super::{
    DeviceModel, INPUT_ONE, INPUT_STRUCTURAL_KEYS, INPUT_TWO, all_on_all_off_definitions,
    declared, parameter_input, power_reporting, temperature_sensor,
};
use crate::capabilities::{CapabilityDeclaration, CapabilityId, EndpointSelector};
use crate::codec::{DomainSpec, ValueSize};
use crate::migration::generic::copy;
use crate::migration::{MigrationFn, MigrationMap, SettingKey, legacy};
use crate::settings::{
    AllOnAllOff, LinkedToggle, ParameterSpec, SettingCodec, SettingDefinition, SettingsSchema,
    keys, number, parsers, value_as_f64,
};
use crate::store::Settings;
use crate::topology::{CommandClass, Endpoint, EndpointGraph, GenericDeviceClass};
use serde_json::{Value, json};

pub const STATUS_ON_DELAY_INPUT_1: &str = "statusOnDelayInput1";
pub const STATUS_ON_DELAY_INPUT_2: &str = "statusOnDelayInput2";
pub const STATUS_OFF_DELAY_INPUT_1: &str = "statusOffDelayInput1";
pub const STATUS_OFF_DELAY_INPUT_2: &str = "statusOffDelayInput2";
pub const FUNCTIONALITY_INPUT_1: &str = "functionalityInput1";
pub const FUNCTIONALITY_INPUT_2: &str = "functionalityInput2";

fn hysteresis_domain() -> DomainSpec {
    parsers::offset_temperature(-12.7, 12.7)
}

fn too_low_domain() -> DomainSpec {
    parsers::offset_temperature(-15.0, 40.0)
}

fn too_high_domain() -> DomainSpec {
    parsers::tenths(1.0, 100.0)
}

/// Legacy wire value decoded through the key's own domain.
///
/// Values outside the domain keep the current setting.
fn decoded(settings: &Settings, key: &str, domain: DomainSpec) -> Option<Value> {
    let wire = legacy(settings, key).and_then(value_as_f64)?;
    domain.decode(wire.round() as i64).ok().map(number)
}

fn hysteresis(key: &'static str, index: u8) -> SettingDefinition {
    SettingDefinition::parameter(
        key,
        json!(0.5),
        ParameterSpec::new(index, ValueSize::Two),
        SettingCodec::Domain(hysteresis_domain()),
    )
}

fn dropdown(key: &'static str, index: u8) -> SettingDefinition {
    SettingDefinition::parameter(
        key,
        json!("0"),
        ParameterSpec::new(index, ValueSize::One),
        SettingCodec::Dropdown,
    )
}

fn raw(key: &'static str, index: u8, default: Value) -> SettingDefinition {
    SettingDefinition::parameter(
        key,
        default,
        ParameterSpec::new(index, ValueSize::Two),
        SettingCodec::Raw,
    )
}

fn schema() -> SettingsSchema {
    let mut definitions = all_on_all_off_definitions();
    definitions.extend([
        dropdown(keys::ENABLE_INPUT_1, 100),
        dropdown(keys::ENABLE_INPUT_2, 101),
        raw(STATUS_ON_DELAY_INPUT_1, 102, json!(0)),
        raw(STATUS_ON_DELAY_INPUT_2, 103, json!(0)),
        raw(STATUS_OFF_DELAY_INPUT_1, 104, json!(0)),
        raw(STATUS_OFF_DELAY_INPUT_2, 105, json!(0)),
        dropdown(FUNCTIONALITY_INPUT_1, 106),
        dropdown(FUNCTIONALITY_INPUT_2, 107),
        SettingDefinition::local(keys::ANTIFREEZE_ENABLED, json!(true)),
        SettingDefinition::parameter(
            keys::ANTIFREEZE,
            json!(5),
            ParameterSpec::new(11, ValueSize::Two),
            SettingCodec::Domain(parsers::offset_temperature(-12.7, 12.7)),
        ),
        hysteresis(keys::TEMPERATURE_HEATING_HYSTERESIS_ON, 43),
        hysteresis(keys::TEMPERATURE_HEATING_HYSTERESIS_OFF, 44),
        hysteresis(keys::TEMPERATURE_COOLING_HYSTERESIS_ON, 45),
        hysteresis(keys::TEMPERATURE_COOLING_HYSTERESIS_OFF, 46),
        SettingDefinition::parameter(
            keys::TOO_LOW_TEMPERATURE_LIMIT,
            json!(5),
            ParameterSpec::new(60, ValueSize::Two),
            SettingCodec::Domain(too_low_domain()),
        ),
        SettingDefinition::parameter(
            keys::TOO_HIGH_TEMPERATURE_LIMIT,
            json!(50),
            ParameterSpec::new(61, ValueSize::Two),
            SettingCodec::Domain(too_high_domain()),
        ),
        dropdown(keys::RELAY_TYPE_Q1, 63),
        dropdown(keys::RELAY_TYPE_Q2, 64),
    ]);
    definitions.extend(power_reporting());
    definitions.extend(temperature_sensor());

    SettingsSchema {
        definitions,
        all_on_all_off: Some(AllOnAllOff::default()),
        linked_toggles: vec![LinkedToggle {
            toggle_key: keys::ANTIFREEZE_ENABLED,
            value_key: keys::ANTIFREEZE,
            sentinel: parsers::ANTIFREEZE_DISABLED,
        }],
        structural_keys: INPUT_STRUCTURAL_KEYS.to_vec(),
        ..Default::default()
    }
}

// Older releases stored these two keys with a trailing space
const LEGACY_RELAY_TYPE_Q1: &str = "output_switch_selection_q1 ";
const LEGACY_RELAY_TYPE_Q2: &str = "output_switch_selection_q2 ";
const LEGACY_ANTIFREEZE: &str = "antifreeze";

fn status_on_delay_input_1(settings: &Settings) -> Option<Value> {
    copy(settings, "input_1_status_on_delay")
}

fn status_on_delay_input_2(settings: &Settings) -> Option<Value> {
    copy(settings, "input_2_status_on_delay")
}

fn status_off_delay_input_1(settings: &Settings) -> Option<Value> {
    copy(settings, "input_1_status_off_delay")
}

fn status_off_delay_input_2(settings: &Settings) -> Option<Value> {
    copy(settings, "input_2_status_off_delay")
}

fn functionality_input_1(settings: &Settings) -> Option<Value> {
    copy(settings, "input_1_functionality_selection")
}

fn functionality_input_2(settings: &Settings) -> Option<Value> {
    copy(settings, "input_2_functionality_selection")
}

fn power_reporting_threshold(settings: &Settings) -> Option<Value> {
    copy(settings, "power_report_on_power_change_q1")
}

fn power_reporting_interval(settings: &Settings) -> Option<Value> {
    copy(settings, "power_report_by_time_interval_q1")
}

fn heating_hysteresis_on(settings: &Settings) -> Option<Value> {
    decoded(settings, "temperature_hysteresis_heating_on", hysteresis_domain())
}

fn heating_hysteresis_off(settings: &Settings) -> Option<Value> {
    decoded(settings, "temperature_hysteresis_heating_off", hysteresis_domain())
}

fn cooling_hysteresis_on(settings: &Settings) -> Option<Value> {
    decoded(settings, "temperature_hysteresis_cooling_on", hysteresis_domain())
}

fn cooling_hysteresis_off(settings: &Settings) -> Option<Value> {
    decoded(settings, "temperature_hysteresis_cooling_off", hysteresis_domain())
}

fn legacy_antifreeze(settings: &Settings) -> Option<i64> {
    legacy(settings, LEGACY_ANTIFREEZE)
        .and_then(value_as_f64)
        .map(|value| value.round() as i64)
}

fn antifreeze_enabled(settings: &Settings) -> Option<Value> {
    legacy_antifreeze(settings).map(|wire| Value::Bool(wire != parsers::ANTIFREEZE_DISABLED))
}

fn antifreeze(settings: &Settings) -> Option<Value> {
    let wire = legacy_antifreeze(settings)?;
    // Tenths, the exact inverse of what a save writes
    let degrees = match wire {
        0..=127 => wire as f64 / 10.0,
        _ => 0.0,
    };
    Some(number(degrees))
}

fn too_low_temperature_limit(settings: &Settings) -> Option<Value> {
    decoded(settings, "too_low_temperature_limit", too_low_domain())
}

fn too_high_temperature_limit(settings: &Settings) -> Option<Value> {
    decoded(settings, "too_high_temperature_limit", too_high_domain())
}

fn relay_type_q1(settings: &Settings) -> Option<Value> {
    copy(settings, LEGACY_RELAY_TYPE_Q1)
}

fn relay_type_q2(settings: &Settings) -> Option<Value> {
    copy(settings, LEGACY_RELAY_TYPE_Q2)
}

fn migration_map() -> MigrationMap {
    MigrationMap::from([
        (
            SettingKey(STATUS_ON_DELAY_INPUT_1),
            status_on_delay_input_1 as MigrationFn,
        ),
        (SettingKey(STATUS_ON_DELAY_INPUT_2), status_on_delay_input_2),
        (SettingKey(STATUS_OFF_DELAY_INPUT_1), status_off_delay_input_1),
        (SettingKey(STATUS_OFF_DELAY_INPUT_2), status_off_delay_input_2),
        (SettingKey(FUNCTIONALITY_INPUT_1), functionality_input_1),
        (SettingKey(FUNCTIONALITY_INPUT_2), functionality_input_2),
        (
            SettingKey(keys::POWER_REPORTING_THRESHOLD),
            power_reporting_threshold,
        ),
        (
            SettingKey(keys::POWER_REPORTING_INTERVAL),
            power_reporting_interval,
        ),
        (
            SettingKey(keys::TEMPERATURE_HEATING_HYSTERESIS_ON),
            heating_hysteresis_on,
        ),
        (
            SettingKey(keys::TEMPERATURE_HEATING_HYSTERESIS_OFF),
            heating_hysteresis_off,
        ),
        (
            SettingKey(keys::TEMPERATURE_COOLING_HYSTERESIS_ON),
            cooling_hysteresis_on,
        ),
        (
            SettingKey(keys::TEMPERATURE_COOLING_HYSTERESIS_OFF),
            cooling_hysteresis_off,
        ),
        (SettingKey(keys::ANTIFREEZE_ENABLED), antifreeze_enabled),
        (SettingKey(keys::ANTIFREEZE), antifreeze),
        (
            SettingKey(keys::TOO_LOW_TEMPERATURE_LIMIT),
            too_low_temperature_limit,
        ),
        (
            SettingKey(keys::TOO_HIGH_TEMPERATURE_LIMIT),
            too_high_temperature_limit,
        ),
        (SettingKey(keys::RELAY_TYPE_Q1), relay_type_q1),
        (SettingKey(keys::RELAY_TYPE_Q2), relay_type_q2),
    ])
}

/// Flush heat & cool thermostat (ZMNHKD).
pub fn zmnhkd() -> DeviceModel {
    DeviceModel {
        id: "ZMNHKD",
        name: "Flush Heat & Cool Thermostat",
        declarations: vec![
            CapabilityDeclaration::new(
                CapabilityId::MeterPower,
                CommandClass::Meter,
                EndpointSelector::RootNode,
            ),
            CapabilityDeclaration::new(
                CapabilityId::MeasurePower,
                CommandClass::Meter,
                EndpointSelector::RootNode,
            ),
            CapabilityDeclaration::new(
                CapabilityId::TargetTemperature,
                CommandClass::ThermostatSetpoint,
                EndpointSelector::RootNode,
            ),
            CapabilityDeclaration::new(
                CapabilityId::ThermostatModeOffAuto,
                CommandClass::ThermostatMode,
                EndpointSelector::RootNode,
            )
            .with_get_on_start(),
            CapabilityDeclaration::new(
                CapabilityId::MeasureTemperature,
                CommandClass::SensorMultilevel,
                EndpointSelector::Temperature,
            ),
        ],
        declared: declared(&[
            CapabilityId::MeterPower,
            CapabilityId::MeasurePower,
            CapabilityId::TargetTemperature,
            CapabilityId::ThermostatModeOffAuto,
            CapabilityId::MeasureTemperature,
        ]),
        inputs: vec![
            parameter_input(1, 100, INPUT_ONE),
            parameter_input(2, 101, INPUT_TWO),
        ],
        root_class_override: Some(GenericDeviceClass::Thermostat),
        multi_channel_disabled: false,
        schema: schema(),
        migration: migration_map(),
        mode_discovery: None,
        calibration: None,
        placeholders: Vec::new(),
        sample_graph: EndpointGraph::flat([
            CommandClass::Meter,
            CommandClass::ThermostatMode,
            CommandClass::ThermostatSetpoint,
            CommandClass::MultiChannel,
            CommandClass::Association,
            CommandClass::MultiChannelAssociation,
            CommandClass::Configuration,
        ])
        .with_endpoint(Endpoint::new(
            1,
            GenericDeviceClass::Thermostat,
            [CommandClass::ThermostatMode, CommandClass::ThermostatSetpoint],
        ))
        .with_endpoint(Endpoint::new(
            2,
            GenericDeviceClass::SensorBinary,
            [CommandClass::SensorBinary],
        ))
        .with_endpoint(Endpoint::new(
            3,
            GenericDeviceClass::SensorBinary,
            [CommandClass::SensorBinary],
        ))
        .with_endpoint(Endpoint::new(
            4,
            GenericDeviceClass::SensorMultilevel,
            [CommandClass::SensorMultilevel],
        )),
    }
}
