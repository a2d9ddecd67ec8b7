use crate::models;
use crate::transport::reader::DEFAULT_READ_ATTEMPTS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Load `KEY=value` lines from `.env` in the working directory.
///
/// Variables already present in the environment are left alone. Values may
/// contain spaces and may be wrapped in single or double quotes.
pub fn load_dotenv() {
    let path = Path::new(".env");
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };

    for (key, value) in content.lines().filter_map(parse_env_line) {
        if std::env::var(key).is_err() {
            // SAFETY: called from main before the runtime starts any threads
            unsafe { std::env::set_var(key, value) };
        }
    }
}

fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let mut value = value.trim();
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = &value[1..value.len() - 1];
    }
    (!key.is_empty()).then_some((key, value))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub store: StoreConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Total requests per configuration read before giving up.
    pub config_read_attempts: u32,
    pub configure_multi_channel_reporting: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON document per device.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Model ids to simulate.
    pub models: Vec<String>,
    /// Probability that a simulated configuration read times out.
    pub failure_rate: f64,
    /// Seconds between simulated input flips; 0 disables them.
    pub input_period_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                config_read_attempts: DEFAULT_READ_ATTEMPTS,
                configure_multi_channel_reporting: true,
            },
            store: StoreConfig {
                data_dir: default_data_dir(),
            },
            simulation: SimulationConfig {
                models: models::all()
                    .iter()
                    .map(|model| model.id.to_string())
                    .collect(),
                failure_rate: 0.0,
                input_period_secs: 10,
            },
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("zwave-multichannel")
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(attempts) = std::env::var("CONFIG_READ_ATTEMPTS")
            && let Ok(a) = attempts.parse::<u32>()
        {
            config.engine.config_read_attempts = a.max(1);
        }
        if let Ok(configure) = std::env::var("CONFIGURE_MULTI_CHANNEL_REPORTING")
            && let Ok(c) = configure.parse()
        {
            config.engine.configure_multi_channel_reporting = c;
        }

        if let Ok(dir) = std::env::var("STORE_DIR") {
            config.store.data_dir = PathBuf::from(dir);
        }

        // Simulation
        if let Ok(models) = std::env::var("SIM_MODELS") {
            config.simulation.models = models
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(rate) = std::env::var("SIM_FAILURE_RATE")
            && let Ok(r) = rate.parse::<f64>()
        {
            config.simulation.failure_rate = r.clamp(0.0, 1.0);
        }
        if let Ok(period) = std::env::var("SIM_INPUT_PERIOD_SECS")
            && let Ok(p) = period.parse()
        {
            config.simulation.input_period_secs = p;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_line_parsing() {
        assert_eq!(parse_env_line("STORE_DIR=/var/lib/zw"), Some(("STORE_DIR", "/var/lib/zw")));
        assert_eq!(
            parse_env_line("  SIM_MODELS = \"ZMNHAD, ZMNHKD\" "),
            Some(("SIM_MODELS", "ZMNHAD, ZMNHKD"))
        );
        assert_eq!(parse_env_line("# comment"), None);
        assert_eq!(parse_env_line("no separator"), None);
        assert_eq!(parse_env_line("=value"), None);
        assert_eq!(parse_env_line("QUOTE=\""), Some(("QUOTE", "\"")));
    }

    #[test]
    fn test_defaults_simulate_every_model() {
        let config = Config::default();
        assert_eq!(config.engine.config_read_attempts, 3);
        assert!(config.engine.configure_multi_channel_reporting);
        assert_eq!(config.simulation.models.len(), models::all().len());
        assert!(config.store.data_dir.ends_with("zwave-multichannel"));
    }
}
