//! Runs every configured device model against a simulated node.
//!
//! Each device gets its own JSON store under the data directory, so
//! restarting shows the cached input enablement and the one-time migration
//! and reporting setup being skipped.

use clap::Parser;
use futures_util::future::join_all;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use zwave_multichannel::config::{Config, load_dotenv};
use zwave_multichannel::device::{Device, DeviceOptions};
use zwave_multichannel::models::{self, DeviceModel};
use zwave_multichannel::store::JsonFileStore;
use zwave_multichannel::transport::SimulatedNode;
use zwave_multichannel::transport::sim::run_input_simulation;

#[derive(Parser)]
#[command(name = "zwave-multichannel")]
#[command(about = "Simulate multi-channel Z-Wave devices through the initialization pipeline")]
struct Args {
    /// Comma separated model ids (default: all models)
    #[arg(long, value_delimiter = ',')]
    models: Option<Vec<String>>,

    /// Directory for per-device settings documents
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Probability that a simulated configuration read times out
    #[arg(long)]
    failure_rate: Option<f64>,

    /// Skip the one-time multi-channel reporting setup
    #[arg(long)]
    no_reporting_setup: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

struct RunningDevice {
    device: Arc<Device>,
    tasks: Vec<JoinHandle<()>>,
}

async fn start_device(model: DeviceModel, config: &Config) -> RunningDevice {
    let node = Arc::new(
        SimulatedNode::new(model.sample_graph.clone())
            .with_failure_rate(config.simulation.failure_rate),
    );
    seed_parameters(&node, &model);
    let mut reports = node.report_channel();

    let store = Arc::new(JsonFileStore::for_device(
        &config.store.data_dir,
        &model.id.to_lowercase(),
    ));
    let options = DeviceOptions {
        read_attempts: config.engine.config_read_attempts,
        configure_multi_channel_reporting: config.engine.configure_multi_channel_reporting,
    };
    let (device, mut events) = Device::new(model, node.clone(), store, options);
    let device = Arc::new(device);
    let mut tasks = Vec::new();

    let listener = device.clone();
    tasks.push(tokio::spawn(async move {
        while let Some((endpoint, report)) = reports.recv().await {
            listener.handle_report(endpoint, &report);
        }
    }));

    tasks.push(tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => info!("[Device] Event {}", json),
                Err(e) => warn!("[Device] Failed to serialize event: {}", e),
            }
        }
    }));

    device.initialize().await;

    let inputs: Vec<u8> = device
        .input_bindings()
        .iter()
        .map(|binding| binding.endpoint)
        .collect();
    if !inputs.is_empty() && config.simulation.input_period_secs > 0 {
        let period = Duration::from_secs(config.simulation.input_period_secs);
        tasks.push(run_input_simulation(node, inputs, period));
    }

    RunningDevice { device, tasks }
}

/// Give the simulated node plausible parameter values for its model.
fn seed_parameters(node: &SimulatedNode, model: &DeviceModel) {
    use zwave_multichannel::codec::{ConfigurationValue, ValueSize};
    use zwave_multichannel::inputs::InputEnablement;

    let mut seeds: Vec<(u8, i64)> = model
        .inputs
        .iter()
        .filter_map(|input| match input.enablement {
            InputEnablement::Parameter { index, .. } => Some((index, 1)),
            InputEnablement::Static(_) => None,
        })
        .collect();
    if let Some(discovery) = model.mode_discovery {
        seeds.push((discovery.parameter, 0));
    }
    for (parameter, value) in seeds {
        match ConfigurationValue::encode(value, ValueSize::One, false) {
            Ok(encoded) => node.set_parameter(parameter, encoded),
            Err(e) => warn!("[Sim] Cannot seed parameter {}: {}", parameter, e),
        }
    }
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_logger();
    info!("Starting zwave-multichannel simulator");

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(models) = args.models {
        config.simulation.models = models;
    }
    if let Some(dir) = args.data_dir {
        config.store.data_dir = dir;
    }
    if let Some(rate) = args.failure_rate {
        config.simulation.failure_rate = rate.clamp(0.0, 1.0);
    }
    if args.no_reporting_setup {
        config.engine.configure_multi_channel_reporting = false;
    }

    info!("Configuration loaded:");
    info!("  Models: {}", config.simulation.models.join(", "));
    info!("  Data dir: {:?}", config.store.data_dir);
    info!("  Read attempts: {}", config.engine.config_read_attempts);
    info!("  Read failure rate: {}", config.simulation.failure_rate);

    let mut selected = Vec::new();
    for id in &config.simulation.models {
        match models::by_id(id) {
            Ok(model) => selected.push(model),
            Err(e) => error!("{}", e),
        }
    }
    if selected.is_empty() {
        error!("No known models to simulate");
        std::process::exit(1);
    }

    let running = join_all(
        selected
            .into_iter()
            .map(|model| start_device(model, &config)),
    )
    .await;

    for entry in &running {
        let device = &entry.device;
        info!(
            "  - {} ({}): {} capabilit(ies), {} input(s), available={}",
            device.model().name,
            device.id(),
            device.bindings().len(),
            device.input_bindings().len(),
            device.is_available()
        );
    }
    info!("Press Ctrl+C to exit");

    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    for entry in running {
        for task in entry.tasks {
            task.abort();
        }
    }
    info!("zwave-multichannel stopped");
}
