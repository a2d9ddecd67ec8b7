//! One-time settings migration.
//!
//! Older releases stored settings under different keys and often in wire
//! units. A migration map assigns each current settings key a pure function
//! of the *old* settings snapshot. A device's map is the generic map
//! overridden key by key by the model's own map.
//!
//! Scale conversions are not idempotent, so a migration runs at most once
//! per device. A flag in the private store records the run and is set even
//! when no function changed anything.

pub mod generic;

use crate::error::{EngineError, Result};
use crate::settings::SettingsSchema;
use crate::store::{Settings, SettingsStore};
use log::{debug, info};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;

/// Private store key of the migration guard.
pub const MIGRATED_FLAG: &str = "settingsMigrated";

/// A current settings key targeted by a migration function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SettingKey(pub &'static str);

impl SettingKey {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Computes a new value from the old settings, `None` to keep the current one.
pub type MigrationFn = fn(&Settings) -> Option<Value>;

/// Migration functions by target key.
pub type MigrationMap = BTreeMap<SettingKey, MigrationFn>;

/// A legacy field that fans out into several current keys.
#[derive(Clone, Copy)]
pub struct CombinedMigration {
    pub legacy_key: &'static str,
    pub outputs: &'static [SettingKey],
    /// Values for `outputs`, in order.
    pub split: fn(&Value) -> Option<Vec<Value>>,
}

impl fmt::Debug for CombinedMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedMigration")
            .field("legacy_key", &self.legacy_key)
            .field("outputs", &self.outputs)
            .finish()
    }
}

/// Result of [`SettingsMigrationEngine::run_once`].
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationOutcome {
    /// Settings were rewritten; `migrated` lists keys whose value changed.
    Migrated { migrated: Vec<String> },
    /// The guard flag was already set; nothing was touched.
    AlreadyMigrated,
}

/// Look up a legacy value. Keys stored with a trailing space by older
/// releases are also found under their trimmed spelling and vice versa.
pub fn legacy<'a>(settings: &'a Settings, key: &str) -> Option<&'a Value> {
    let found = settings.get(key).or_else(|| {
        let trimmed = key.trim_end();
        if trimmed.len() != key.len() {
            settings.get(trimmed)
        } else {
            settings.get(&format!("{} ", key))
        }
    });
    found.filter(|value| !value.is_null())
}

/// `generic` overridden key by key by `device`.
pub fn merge(generic: &MigrationMap, device: &MigrationMap) -> MigrationMap {
    let mut merged = generic.clone();
    merged.extend(device.iter().map(|(key, function)| (*key, *function)));
    merged
}

/// Pure migration pass.
///
/// Every key of `schema` with a migration function gets the function's
/// result (evaluated against `current`), every other key keeps its value.
/// Combined migrations run afterwards, keyed on the legacy field being
/// present.
pub fn migrate(
    current: &Settings,
    schema: &SettingsSchema,
    merged: &MigrationMap,
    combined: &[CombinedMigration],
) -> Settings {
    let mut next = Settings::new();
    for key in schema.keys() {
        let migrated = merged
            .get(&SettingKey(key))
            .and_then(|function| function(current));
        match migrated {
            Some(value) => {
                debug!("[Migration] {} <- {}", key, value);
                next.insert(key.to_string(), value);
            }
            None => {
                if let Some(value) = current.get(key) {
                    next.insert(key.to_string(), value.clone());
                }
            }
        }
    }

    for step in combined {
        let Some(values) = legacy(current, step.legacy_key).and_then(step.split) else {
            continue;
        };
        for (output, value) in step.outputs.iter().zip(values) {
            if schema.contains(output.as_str()) {
                debug!("[Migration] {} <- {} (from {})", output, value, step.legacy_key);
                next.insert(output.as_str().to_string(), value);
            }
        }
    }
    next
}

/// Runs the merged migration against a device's settings store, once.
pub struct SettingsMigrationEngine {
    merged: MigrationMap,
    combined: Vec<CombinedMigration>,
}

impl SettingsMigrationEngine {
    pub fn new(generic: &MigrationMap, device: &MigrationMap) -> Self {
        Self {
            merged: merge(generic, device),
            combined: Vec::new(),
        }
    }

    pub fn with_combined(mut self, combined: impl IntoIterator<Item = CombinedMigration>) -> Self {
        self.combined.extend(combined);
        self
    }

    pub fn merged(&self) -> &MigrationMap {
        &self.merged
    }

    /// Compute migrated settings without touching any store.
    pub fn migrate(&self, current: &Settings, schema: &SettingsSchema) -> Settings {
        migrate(current, schema, &self.merged, &self.combined)
    }

    /// Fails with [`EngineError::MigrationGuardViolation`] once migrated.
    pub fn check_guard(store: &dyn SettingsStore) -> Result<()> {
        match store.get_store_value(MIGRATED_FLAG) {
            Some(Value::Bool(true)) => Err(EngineError::MigrationGuardViolation),
            _ => Ok(()),
        }
    }

    /// Migrate the store's settings unless that already happened.
    ///
    /// All settings are written in one update, then the guard flag is set.
    /// A failed write leaves the flag unset so the next start tries again.
    pub async fn run_once(
        &self,
        store: &dyn SettingsStore,
        schema: &SettingsSchema,
    ) -> Result<MigrationOutcome> {
        if let Err(EngineError::MigrationGuardViolation) = Self::check_guard(store) {
            debug!("[Migration] Already migrated, skipping");
            return Ok(MigrationOutcome::AlreadyMigrated);
        }

        let current = store.get_settings();
        let next = self.migrate(&current, schema);
        let migrated: Vec<String> = next
            .iter()
            .filter(|(key, value)| current.get(key.as_str()) != Some(*value))
            .map(|(key, _)| key.clone())
            .collect();

        store.set_settings(next).await?;
        store.set_store_value(MIGRATED_FLAG, json!(true)).await?;
        info!(
            "[Migration] Migrated settings ({} value(s) changed)",
            migrated.len()
        );
        Ok(MigrationOutcome::Migrated { migrated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingDefinition;
    use crate::store::MemoryStore;

    const TEMPERATURE: SettingKey = SettingKey("temperature");
    const RELAY: SettingKey = SettingKey("relayType");

    fn schema() -> SettingsSchema {
        SettingsSchema {
            definitions: vec![
                SettingDefinition::local("temperature", json!(0)),
                SettingDefinition::local("relayType", json!("0")),
                SettingDefinition::local("untouched", json!(1)),
                SettingDefinition::local("on", json!(true)),
                SettingDefinition::local("off", json!(true)),
            ],
            ..Default::default()
        }
    }

    fn tenth(settings: &Settings) -> Option<Value> {
        let raw = legacy(settings, "temperature_raw")?.as_f64()?;
        Some(json!(raw / 10.0))
    }

    fn constant_one(_: &Settings) -> Option<Value> {
        Some(json!(1))
    }

    fn constant_two(_: &Settings) -> Option<Value> {
        Some(json!(2))
    }

    fn relay(settings: &Settings) -> Option<Value> {
        legacy(settings, "output_switch_selection ").cloned()
    }

    fn split_pair(value: &Value) -> Option<Vec<Value>> {
        let raw = value.as_str()?;
        Some(vec![json!(raw == "3" || raw == "2"), json!(raw == "3" || raw == "1")])
    }

    const PAIR: CombinedMigration = CombinedMigration {
        legacy_key: "legacy_pair",
        outputs: &[SettingKey("on"), SettingKey("off")],
        split: split_pair,
    };

    fn old_settings() -> Settings {
        Settings::from([
            ("temperature_raw".to_string(), json!(55)),
            ("untouched".to_string(), json!(7)),
            ("output_switch_selection ".to_string(), json!("1")),
            ("legacy_pair".to_string(), json!("2")),
        ])
    }

    #[test]
    fn test_device_map_overrides_generic() {
        let generic = MigrationMap::from([(TEMPERATURE, constant_one as MigrationFn)]);
        let device = MigrationMap::from([(TEMPERATURE, constant_two as MigrationFn)]);
        let merged = merge(&generic, &device);
        let function = merged.get(&TEMPERATURE).unwrap();
        assert_eq!(function(&Settings::new()), Some(json!(2)));
    }

    #[test]
    fn test_migrate_converts_and_keeps() {
        let map = MigrationMap::from([
            (TEMPERATURE, tenth as MigrationFn),
            (RELAY, relay as MigrationFn),
        ]);
        let next = migrate(&old_settings(), &schema(), &map, &[PAIR]);

        assert_eq!(next.get("temperature"), Some(&json!(5.5)));
        assert_eq!(next.get("relayType"), Some(&json!("1")));
        assert_eq!(next.get("untouched"), Some(&json!(7)));
        assert_eq!(next.get("on"), Some(&json!(true)));
        assert_eq!(next.get("off"), Some(&json!(false)));
        // Keys outside the schema are not carried over
        assert!(!next.contains_key("temperature_raw"));
    }

    #[test]
    fn test_legacy_lookup_tolerates_trailing_space() {
        let settings = Settings::from([("relay_q1 ".to_string(), json!("1"))]);
        assert_eq!(legacy(&settings, "relay_q1"), Some(&json!("1")));
        let settings = Settings::from([("relay_q1".to_string(), json!("0"))]);
        assert_eq!(legacy(&settings, "relay_q1 "), Some(&json!("0")));
    }

    #[tokio::test]
    async fn test_runs_exactly_once() {
        let store = MemoryStore::with_settings(old_settings());
        let engine = SettingsMigrationEngine::new(
            &MigrationMap::from([(TEMPERATURE, tenth as MigrationFn)]),
            &MigrationMap::new(),
        );

        let outcome = engine.run_once(&store, &schema()).await.unwrap();
        assert!(matches!(outcome, MigrationOutcome::Migrated { .. }));
        assert_eq!(store.get_setting("temperature"), Some(json!(5.5)));
        assert_eq!(store.get_store_value(MIGRATED_FLAG), Some(json!(true)));

        // A second run must not divide again
        store
            .set_settings(Settings::from([("temperature_raw".to_string(), json!(80))]))
            .await
            .unwrap();
        let outcome = engine.run_once(&store, &schema()).await.unwrap();
        assert_eq!(outcome, MigrationOutcome::AlreadyMigrated);
        assert_eq!(store.get_setting("temperature"), Some(json!(5.5)));
    }

    #[tokio::test]
    async fn test_guard_is_set_for_empty_maps() {
        let store = MemoryStore::new();
        let engine = SettingsMigrationEngine::new(&MigrationMap::new(), &MigrationMap::new());
        engine.run_once(&store, &schema()).await.unwrap();
        assert!(matches!(
            SettingsMigrationEngine::check_guard(&store),
            Err(EngineError::MigrationGuardViolation)
        ));
    }
}
