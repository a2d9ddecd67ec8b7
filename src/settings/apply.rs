//! Turning a settings change into configuration writes.

use super::keys::{ALL_OFF, ALL_ON};
use super::{SettingsSchema, combine_all_on_all_off, value_as_bool, value_as_f64};
use crate::codec::ConfigurationValue;
use crate::error::{EngineError, Result};
use crate::store::Settings;
use log::debug;
use serde_json::Value;
use std::collections::BTreeSet;

/// A user-initiated settings change.
///
/// `new` may hold only the changed keys; anything missing from it is taken
/// from `old`, the settings as they were before this change.
#[derive(Debug, Clone, Copy)]
pub struct SettingsChange<'a> {
    pub old: &'a Settings,
    pub new: &'a Settings,
    pub changed: &'a [String],
}

impl<'a> SettingsChange<'a> {
    pub fn new(old: &'a Settings, new: &'a Settings, changed: &'a [String]) -> Self {
        Self { old, new, changed }
    }

    pub fn is_changed(&self, key: &str) -> bool {
        self.changed.iter().any(|changed| changed == key)
    }

    /// Value after the change: the new value if given, else the old one.
    pub fn effective(&self, key: &str) -> Option<&'a Value> {
        self.new
            .get(key)
            .filter(|value| !value.is_null())
            .or_else(|| self.old.get(key).filter(|value| !value.is_null()))
    }
}

/// One configuration write derived from a settings change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterWrite {
    /// Setting that caused the write.
    pub key: String,
    pub parameter: u8,
    pub value: ConfigurationValue,
}

fn effective_bool(schema: &SettingsSchema, change: &SettingsChange<'_>, key: &str) -> bool {
    change
        .effective(key)
        .or_else(|| schema.definition(key).map(|definition| &definition.default))
        .and_then(value_as_bool)
        .unwrap_or(false)
}

fn effective_number(
    schema: &SettingsSchema,
    change: &SettingsChange<'_>,
    key: &str,
) -> Option<f64> {
    change
        .effective(key)
        .or_else(|| schema.definition(key).map(|definition| &definition.default))
        .and_then(value_as_f64)
}

/// Reject a maximum dim value below the minimum.
fn validate_dim_limits(schema: &SettingsSchema, change: &SettingsChange<'_>) -> Result<()> {
    let Some(limits) = schema.dim_limits else {
        return Ok(());
    };
    if !change.is_changed(limits.minimum_key) && !change.is_changed(limits.maximum_key) {
        return Ok(());
    }
    if let (Some(minimum), Some(maximum)) = (
        effective_number(schema, change, limits.minimum_key),
        effective_number(schema, change, limits.maximum_key),
    ) && maximum < minimum
    {
        return Err(EngineError::invalid_setting(
            limits.maximum_key,
            format!(
                "maximum dim value {} cannot be lower than minimum {}",
                maximum, minimum
            ),
        ));
    }
    Ok(())
}

/// Compute every configuration write a settings change requires.
///
/// Nothing is written when any part of the change is invalid; the caller
/// sends the returned writes in order and surfaces the first failure.
pub fn plan_writes(
    schema: &SettingsSchema,
    change: &SettingsChange<'_>,
) -> Result<Vec<ParameterWrite>> {
    validate_dim_limits(schema, change)?;

    let mut handled: BTreeSet<&str> = BTreeSet::new();
    let mut writes = Vec::new();

    if let Some(combined) = schema.all_on_all_off
        && (change.is_changed(ALL_ON) || change.is_changed(ALL_OFF))
    {
        let all_on = effective_bool(schema, change, ALL_ON);
        let all_off = effective_bool(schema, change, ALL_OFF);
        let parameter = combined.parameter;
        let key = if change.is_changed(ALL_ON) { ALL_ON } else { ALL_OFF };
        writes.push(ParameterWrite {
            key: key.to_string(),
            parameter: parameter.index,
            value: ConfigurationValue::encode(
                combine_all_on_all_off(all_on, all_off),
                parameter.size,
                parameter.signed,
            )?,
        });
        handled.insert(ALL_ON);
        handled.insert(ALL_OFF);
    }

    for toggle in &schema.linked_toggles {
        let toggle_changed = change.is_changed(toggle.toggle_key);
        if !toggle_changed && !change.is_changed(toggle.value_key) {
            continue;
        }
        handled.insert(toggle.toggle_key);
        handled.insert(toggle.value_key);

        let definition = schema
            .definition(toggle.value_key)
            .ok_or_else(|| EngineError::invalid_setting(toggle.value_key, "not in schema"))?;
        let parameter = definition.parameter.ok_or_else(|| {
            EngineError::invalid_setting(toggle.value_key, "no configuration parameter")
        })?;

        if !effective_bool(schema, change, toggle.toggle_key) {
            // Value edits while disabled stay local until re-enabled
            if toggle_changed {
                writes.push(ParameterWrite {
                    key: toggle.toggle_key.to_string(),
                    parameter: parameter.index,
                    value: ConfigurationValue::encode(
                        toggle.sentinel,
                        parameter.size,
                        parameter.signed,
                    )?,
                });
            }
            continue;
        }

        let value = change
            .effective(toggle.value_key)
            .unwrap_or(&definition.default);
        if let Some(encoded) = definition.encode(value)? {
            writes.push(ParameterWrite {
                key: toggle.value_key.to_string(),
                parameter: parameter.index,
                value: encoded,
            });
        }
    }

    for key in change.changed {
        if handled.contains(key.as_str()) {
            continue;
        }
        let Some(definition) = schema.definition(key) else {
            debug!("[Settings] Ignoring unknown key {}", key);
            continue;
        };
        let Some(value) = change.effective(key) else {
            continue;
        };
        if let Some(encoded) = definition.encode(value)?
            && let Some(parameter) = definition.parameter
        {
            writes.push(ParameterWrite {
                key: key.clone(),
                parameter: parameter.index,
                value: encoded,
            });
        }
    }

    Ok(writes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ValueSize;
    use crate::settings::{
        AllOnAllOff, DimLimits, LinkedToggle, ParameterSpec, SettingCodec, SettingDefinition,
        keys, parsers,
    };
    use serde_json::json;

    fn schema() -> SettingsSchema {
        SettingsSchema {
            definitions: vec![
                SettingDefinition::local(keys::ALL_ON, json!(true)),
                SettingDefinition::local(keys::ALL_OFF, json!(true)),
                SettingDefinition::parameter(
                    keys::RESTORE_STATUS,
                    json!(true),
                    ParameterSpec::new(30, ValueSize::One),
                    SettingCodec::InvertedBool,
                ),
                SettingDefinition::parameter(
                    keys::MINIMUM_DIM_VALUE,
                    json!(1),
                    ParameterSpec::new(60, ValueSize::One),
                    SettingCodec::Raw,
                ),
                SettingDefinition::parameter(
                    keys::MAXIMUM_DIM_VALUE,
                    json!(99),
                    ParameterSpec::new(61, ValueSize::One),
                    SettingCodec::Raw,
                ),
                SettingDefinition::local(keys::ANTIFREEZE_ENABLED, json!(false)),
                SettingDefinition::parameter(
                    keys::ANTIFREEZE,
                    json!(0),
                    ParameterSpec::new(10, ValueSize::Two),
                    SettingCodec::Domain(parsers::offset_temperature(-12.7, 12.7)),
                ),
            ],
            all_on_all_off: Some(AllOnAllOff::default()),
            linked_toggles: vec![LinkedToggle {
                toggle_key: keys::ANTIFREEZE_ENABLED,
                value_key: keys::ANTIFREEZE,
                sentinel: parsers::ANTIFREEZE_DISABLED,
            }],
            dim_limits: Some(DimLimits {
                minimum_key: keys::MINIMUM_DIM_VALUE,
                maximum_key: keys::MAXIMUM_DIM_VALUE,
            }),
            ..Default::default()
        }
    }

    fn settings(entries: &[(&str, Value)]) -> Settings {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    fn changed(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|key| key.to_string()).collect()
    }

    #[test]
    fn test_all_on_change_reads_all_off_from_old_settings() {
        let old = settings(&[(keys::ALL_ON, json!(false)), (keys::ALL_OFF, json!(false))]);
        let new = settings(&[(keys::ALL_ON, json!(true))]);
        let changed = changed(&[keys::ALL_ON]);

        let writes = plan_writes(&schema(), &SettingsChange::new(&old, &new, &changed)).unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].parameter, 10);
        assert_eq!(writes[0].value.value(), 2);
        assert_eq!(writes[0].value.size(), ValueSize::Two);
        assert!(writes[0].value.is_signed());
    }

    #[test]
    fn test_both_broadcast_toggles_in_one_change() {
        let old = settings(&[]);
        let new = settings(&[(keys::ALL_ON, json!(false)), (keys::ALL_OFF, json!(true))]);
        let changed = changed(&[keys::ALL_ON, keys::ALL_OFF]);

        let writes = plan_writes(&schema(), &SettingsChange::new(&old, &new, &changed)).unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].value.value(), 1);
    }

    #[test]
    fn test_max_dim_below_min_is_rejected() {
        let old = settings(&[
            (keys::MINIMUM_DIM_VALUE, json!(30)),
            (keys::MAXIMUM_DIM_VALUE, json!(90)),
        ]);
        let new = settings(&[(keys::MAXIMUM_DIM_VALUE, json!(20))]);
        let changed = changed(&[keys::MAXIMUM_DIM_VALUE]);

        let err = plan_writes(&schema(), &SettingsChange::new(&old, &new, &changed)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSetting { .. }));
    }

    #[test]
    fn test_disabling_toggle_writes_sentinel() {
        let old = settings(&[
            (keys::ANTIFREEZE_ENABLED, json!(true)),
            (keys::ANTIFREEZE, json!(5.0)),
        ]);
        let new = settings(&[(keys::ANTIFREEZE_ENABLED, json!(false))]);
        let changed = changed(&[keys::ANTIFREEZE_ENABLED]);

        let writes = plan_writes(&schema(), &SettingsChange::new(&old, &new, &changed)).unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].value.value(), 255);
    }

    #[test]
    fn test_enabling_toggle_writes_stored_value() {
        let old = settings(&[
            (keys::ANTIFREEZE_ENABLED, json!(false)),
            (keys::ANTIFREEZE, json!(-2.5)),
        ]);
        let new = settings(&[(keys::ANTIFREEZE_ENABLED, json!(true))]);
        let changed = changed(&[keys::ANTIFREEZE_ENABLED]);

        let writes = plan_writes(&schema(), &SettingsChange::new(&old, &new, &changed)).unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].key, keys::ANTIFREEZE);
        assert_eq!(writes[0].value.value(), 1025);
    }

    #[test]
    fn test_value_edit_while_disabled_is_not_written() {
        let old = settings(&[(keys::ANTIFREEZE_ENABLED, json!(false))]);
        let new = settings(&[(keys::ANTIFREEZE, json!(3))]);
        let changed = changed(&[keys::ANTIFREEZE]);

        let writes = plan_writes(&schema(), &SettingsChange::new(&old, &new, &changed)).unwrap();
        assert!(writes.is_empty());
    }

    #[test]
    fn test_regular_keys_use_their_codec() {
        let old = settings(&[]);
        let new = settings(&[(keys::RESTORE_STATUS, json!(true)), ("unknownKey", json!(1))]);
        let changed = changed(&[keys::RESTORE_STATUS, "unknownKey"]);

        let writes = plan_writes(&schema(), &SettingsChange::new(&old, &new, &changed)).unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].parameter, 30);
        assert_eq!(writes[0].value.value(), 0);
    }
}
