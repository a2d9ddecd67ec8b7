//! Per-device settings and private store.
//!
//! Two flat key-value maps live side by side for every device:
//! - **settings**: user-visible configuration, written through the settings UI
//!   and by the migration engine
//! - **store**: private values the engine caches across restarts, such as
//!   resolved input enablement and the migration guard flag

pub mod file;

pub use file::JsonFileStore;

use crate::error::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Flat settings map keyed by setting id.
pub type Settings = BTreeMap<String, Value>;

/// Persisted state of one device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub store: BTreeMap<String, Value>,
}

/// Settings and private store for one device.
///
/// `set_settings` overwrites the given keys in one update; other keys are
/// left untouched. Readers never observe a partially applied update.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// A single setting; `None` when absent or null.
    fn get_setting(&self, key: &str) -> Option<Value>;

    /// Snapshot of all settings.
    fn get_settings(&self) -> Settings;

    /// Overwrite `settings` keys in one update.
    async fn set_settings(&self, settings: Settings) -> Result<()>;

    /// A private store value; `None` when absent or null.
    fn get_store_value(&self, key: &str) -> Option<Value>;

    async fn set_store_value(&self, key: &str, value: Value) -> Result<()>;
}

/// Settings store kept in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: RwLock<DeviceRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing settings, e.g. those saved by an older release.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            record: RwLock::new(DeviceRecord {
                settings,
                store: BTreeMap::new(),
            }),
        }
    }

    pub fn snapshot(&self) -> DeviceRecord {
        self.record.read().clone()
    }
}

pub(crate) fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

#[async_trait]
impl SettingsStore for MemoryStore {
    fn get_setting(&self, key: &str) -> Option<Value> {
        non_null(self.record.read().settings.get(key))
    }

    fn get_settings(&self) -> Settings {
        self.record.read().settings.clone()
    }

    async fn set_settings(&self, settings: Settings) -> Result<()> {
        self.record.write().settings.extend(settings);
        Ok(())
    }

    fn get_store_value(&self, key: &str) -> Option<Value> {
        non_null(self.record.read().store.get(key))
    }

    async fn set_store_value(&self, key: &str, value: Value) -> Result<()> {
        self.record.write().store.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_settings_overwrites_only_given_keys() {
        let store = MemoryStore::with_settings(Settings::from([
            ("allOn".to_string(), json!(true)),
            ("autoOff".to_string(), json!(10)),
        ]));
        store
            .set_settings(Settings::from([("autoOff".to_string(), json!(20))]))
            .await
            .unwrap();

        assert_eq!(store.get_setting("allOn"), Some(json!(true)));
        assert_eq!(store.get_setting("autoOff"), Some(json!(20)));
    }

    #[tokio::test]
    async fn test_null_reads_as_absent() {
        let store = MemoryStore::new();
        store.set_store_value("inputTwoEnabled", Value::Null).await.unwrap();
        assert_eq!(store.get_store_value("inputTwoEnabled"), None);
        assert_eq!(store.get_setting("missing"), None);
    }
}
