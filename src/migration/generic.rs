//! Migration rules shared by every model.
//!
//! Legacy settings used snake_case keys and, for temperatures, the raw wire
//! value. Current keys are camelCase and hold user units.

use super::{CombinedMigration, MigrationFn, MigrationMap, SettingKey, legacy};
use crate::settings::{keys, number, parsers, split_all_on_all_off, value_as_bool, value_as_f64};
use crate::store::Settings;
use serde_json::Value;

pub const LEGACY_ALL_ON_ALL_OFF: &str = "deactivate_ALL_ON_ALL_OFF";
pub const LEGACY_RESTORE_STATUS: &str = "state_of_device_after_power_failure";
pub const LEGACY_POWER_REPORT_ON_CHANGE: &str = "power_report_on_power_change";
pub const LEGACY_POWER_REPORT_INTERVAL: &str = "power_report_by_time_interval";
pub const LEGACY_TEMPERATURE_OFFSET: &str = "temperature_sensor_offset";
pub const LEGACY_TEMPERATURE_REPORTING: &str = "digital_temperature_sensor_reporting";
pub const LEGACY_AUTO_OFF: &str = "automatic_turning_off_output_after_set_time";
pub const LEGACY_AUTO_ON: &str = "automatic_turning_on_output_after_set_time";

/// Copy a legacy value unchanged.
pub fn copy(settings: &Settings, legacy_key: &str) -> Option<Value> {
    legacy(settings, legacy_key).cloned()
}

/// Legacy value divided by `divisor`.
pub fn scaled(settings: &Settings, legacy_key: &str, divisor: f64) -> Option<Value> {
    legacy(settings, legacy_key)
        .and_then(value_as_f64)
        .map(|value| number(value / divisor))
}

fn restore_status(settings: &Settings) -> Option<Value> {
    legacy(settings, LEGACY_RESTORE_STATUS)
        .and_then(value_as_bool)
        .map(Value::Bool)
}

fn power_reporting_threshold(settings: &Settings) -> Option<Value> {
    copy(settings, LEGACY_POWER_REPORT_ON_CHANGE)
}

fn power_reporting_interval(settings: &Settings) -> Option<Value> {
    copy(settings, LEGACY_POWER_REPORT_INTERVAL)
}

fn temperature_sensor_offset(settings: &Settings) -> Option<Value> {
    let wire = legacy(settings, LEGACY_TEMPERATURE_OFFSET).and_then(value_as_f64)?;
    // Wire values the firmware never produced keep the current setting
    parsers::temperature_sensor_offset()
        .decode(wire.round() as i64)
        .ok()
        .map(number)
}

fn temperature_sensor_reporting_threshold(settings: &Settings) -> Option<Value> {
    scaled(settings, LEGACY_TEMPERATURE_REPORTING, 10.0)
}

fn auto_off(settings: &Settings) -> Option<Value> {
    copy(settings, LEGACY_AUTO_OFF)
}

fn auto_on(settings: &Settings) -> Option<Value> {
    copy(settings, LEGACY_AUTO_ON)
}

fn split_all_on_all_off_value(value: &Value) -> Option<Vec<Value>> {
    let combined = value_as_f64(value)?.round() as i64;
    let (all_on, all_off) = split_all_on_all_off(combined);
    Some(vec![Value::Bool(all_on), Value::Bool(all_off)])
}

/// The legacy combined all-on/all-off dropdown.
pub const ALL_ON_ALL_OFF: CombinedMigration = CombinedMigration {
    legacy_key: LEGACY_ALL_ON_ALL_OFF,
    outputs: &[SettingKey(keys::ALL_ON), SettingKey(keys::ALL_OFF)],
    split: split_all_on_all_off_value,
};

/// Per-key rules every device starts from.
pub fn migration_map() -> MigrationMap {
    MigrationMap::from([
        (SettingKey(keys::RESTORE_STATUS), restore_status as MigrationFn),
        (
            SettingKey(keys::POWER_REPORTING_THRESHOLD),
            power_reporting_threshold,
        ),
        (
            SettingKey(keys::POWER_REPORTING_INTERVAL),
            power_reporting_interval,
        ),
        (
            SettingKey(keys::TEMPERATURE_SENSOR_OFFSET),
            temperature_sensor_offset,
        ),
        (
            SettingKey(keys::TEMPERATURE_SENSOR_REPORTING_THRESHOLD),
            temperature_sensor_reporting_threshold,
        ),
        (SettingKey(keys::AUTO_OFF), auto_off),
        (SettingKey(keys::AUTO_ON), auto_on),
    ])
}

/// Combined-field steps every device starts from.
pub fn combined_migrations() -> Vec<CombinedMigration> {
    vec![ALL_ON_ALL_OFF]
}
