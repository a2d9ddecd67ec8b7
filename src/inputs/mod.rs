//! Digital inputs exposed as multi-channel sensor endpoints.
//!
//! Whether an input is wired up is either fixed per model or read once from
//! a configuration parameter and cached in the device's private store for
//! the rest of its life. Changing input wiring requires re-adding the device.

pub mod channel;

pub use channel::{InputChannel, InputEvent};

use crate::store::{Settings, SettingsStore};
use crate::transport::{ParameterRead, SafeParameterReader};
use log::{info, warn};
use serde_json::Value;

/// Automation trigger ids fired by one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputTriggers {
    pub toggle: &'static str,
    pub on: &'static str,
    pub off: &'static str,
}

impl InputTriggers {
    pub fn id(&self, event: InputEvent) -> &'static str {
        match event {
            InputEvent::Toggled => self.toggle,
            InputEvent::TurnedOn => self.on,
            InputEvent::TurnedOff => self.off,
        }
    }
}

/// Parameter values that mean "input enabled".
///
/// Most models use an input type of 1..=6 or 9 for an enabled input and 0
/// for disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRange {
    pub low: i64,
    pub high: i64,
    pub extra: Option<i64>,
}

impl ActiveRange {
    pub fn contains(&self, value: i64) -> bool {
        (self.low..=self.high).contains(&value) || self.extra == Some(value)
    }
}

impl Default for ActiveRange {
    fn default() -> Self {
        Self {
            low: 1,
            high: 6,
            extra: Some(9),
        }
    }
}

/// How to decide whether an input is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEnablement {
    Static(bool),
    Parameter { index: u8, active: ActiveRange },
}

/// A logical input of a device model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputConfig {
    /// Input number printed on the device (1..=3).
    pub index: u8,
    pub enablement: InputEnablement,
    pub triggers: InputTriggers,
}

impl InputConfig {
    /// Private store key caching the resolved enablement.
    pub fn store_key(&self) -> String {
        let word = match self.index {
            1 => "One",
            2 => "Two",
            3 => "Three",
            _ => "",
        };
        if word.is_empty() {
            format!("input{}Enabled", self.index)
        } else {
            format!("input{}Enabled", word)
        }
    }

    /// Visible settings key reflecting the input type.
    pub fn setting_key(&self) -> String {
        format!("enableInput{}", self.index)
    }
}

/// An enabled input assigned to a sensor endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBinding {
    pub endpoint: u8,
    pub config: InputConfig,
}

/// Determine whether `config` is enabled.
///
/// A cached answer wins. Otherwise the parameter is read once; the answer is
/// cached and the input type is reflected into the visible settings. `None`
/// means the node did not answer, and nothing is cached so the next
/// initialization asks again.
pub async fn resolve_enablement(
    config: &InputConfig,
    reader: &SafeParameterReader,
    store: &dyn SettingsStore,
) -> Option<bool> {
    let (index, active) = match config.enablement {
        InputEnablement::Static(enabled) => return Some(enabled),
        InputEnablement::Parameter { index, active } => (index, active),
    };

    let store_key = config.store_key();
    if let Some(Value::Bool(cached)) = store.get_store_value(&store_key) {
        info!("[Inputs] Input {} enabled (cached): {}", config.index, cached);
        return Some(cached);
    }

    let value = match reader.read(index).await {
        ParameterRead::Value(value) => value.value(),
        ParameterRead::NotAvailable => {
            warn!(
                "[Inputs] Could not determine input {} from parameter {}",
                config.index, index
            );
            return None;
        }
    };

    let enabled = active.contains(value);
    info!(
        "[Inputs] Input {} enabled: {} (parameter {} = {})",
        config.index, enabled, index, value
    );
    if let Err(e) = store.set_store_value(&store_key, Value::Bool(enabled)).await {
        warn!("[Inputs] Failed to cache {}: {}", store_key, e);
    }
    let shown = if enabled { value.to_string() } else { "0".to_string() };
    let update = Settings::from([(config.setting_key(), Value::String(shown))]);
    if let Err(e) = store.set_settings(update).await {
        warn!("[Inputs] Failed to reflect {}: {}", config.setting_key(), e);
    }
    Some(enabled)
}

/// Assign enabled inputs, in declaration order, to input endpoints in
/// ascending id order. Surplus inputs or endpoints stay unassigned.
pub fn assign_inputs(inputs: &[(InputConfig, bool)], input_endpoints: &[u8]) -> Vec<InputBinding> {
    let mut endpoints = input_endpoints.to_vec();
    endpoints.sort_unstable();

    let bindings: Vec<InputBinding> = inputs
        .iter()
        .filter(|(_, enabled)| *enabled)
        .zip(endpoints)
        .map(|((config, _), endpoint)| InputBinding {
            endpoint,
            config: config.clone(),
        })
        .collect();

    for binding in &bindings {
        info!(
            "[Inputs] Input {} on endpoint {}",
            binding.config.index, binding.endpoint
        );
    }
    bindings
}
