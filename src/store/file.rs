//! JSON file backed settings store.

use super::{DeviceRecord, Settings, SettingsStore, non_null};
use crate::error::Result;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

impl DeviceRecord {
    /// Load from file. Missing or unreadable files start empty.
    pub fn load(path: &Path) -> Self {
        match fs::read(path) {
            Ok(bytes) => match serde_json::from_slice::<DeviceRecord>(&bytes) {
                Ok(record) => {
                    info!(
                        "[Store] Loaded {} setting(s) from {:?}",
                        record.settings.len(),
                        path
                    );
                    record
                }
                Err(e) => {
                    warn!("[Store] Failed to parse {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[Store] No stored settings at {:?} (first run)", path);
                Self::default()
            }
            Err(e) => {
                error!("[Store] Failed to read {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save to file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        debug!("[Store] Saved {:?}", path);
        Ok(())
    }
}

/// Settings store persisted as one JSON document per device.
///
/// Updates are serialized by `write_gate`. The in-memory record only changes
/// after the file was written, so readers never see a value the file lacks.
pub struct JsonFileStore {
    path: PathBuf,
    record: RwLock<DeviceRecord>,
    write_gate: Mutex<()>,
}

impl JsonFileStore {
    /// Open (or create on first write) the document at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let record = DeviceRecord::load(&path);
        Self {
            path,
            record: RwLock::new(record),
            write_gate: Mutex::new(()),
        }
    }

    /// Apply `update` to a copy of the record, write it out, then publish it.
    async fn update(&self, update: impl FnOnce(&mut DeviceRecord)) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let mut updated = self.record.read().clone();
        update(&mut updated);
        let data = serde_json::to_vec_pretty(&updated)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, data).await?;
        debug!("[Store] Saved {:?}", self.path);

        *self.record.write() = updated;
        Ok(())
    }

    /// Store for `device_id` under `data_dir`.
    pub fn for_device(data_dir: &Path, device_id: &str) -> Self {
        Self::open(data_dir.join(format!("{}.json", device_id)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    fn get_setting(&self, key: &str) -> Option<Value> {
        non_null(self.record.read().settings.get(key))
    }

    fn get_settings(&self) -> Settings {
        self.record.read().settings.clone()
    }

    async fn set_settings(&self, settings: Settings) -> Result<()> {
        self.update(|record| record.settings.extend(settings)).await
    }

    fn get_store_value(&self, key: &str) -> Option<Value> {
        non_null(self.record.read().store.get(key))
    }

    async fn set_store_value(&self, key: &str, value: Value) -> Result<()> {
        self.update(|record| {
            record.store.insert(key.to_string(), value);
        })
        .await
    }
}
