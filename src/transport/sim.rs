//! Simulated multi-channel node for development and testing.
//!
//! Holds a parameter table, answers configuration reads and writes, records
//! every outbound command and echoes the reports a real node would send
//! back. Reads can be made to time out, either a scripted number of times or
//! randomly at a configured rate.

use super::{Command, MeterScale, NodeTransport, Report, ThermostatMode};
use crate::codec::ConfigurationValue;
use crate::error::{EngineError, Result};
use crate::topology::{CommandClass, EndpointGraph};
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

/// Report emitted by the node: source endpoint (`None` = root) and payload.
pub type InboundReport = (Option<u8>, Report);

pub struct SimulatedNode {
    graph: EndpointGraph,
    parameters: Mutex<HashMap<u8, ConfigurationValue>>,
    /// Remaining scripted timeouts per parameter.
    scripted_failures: Mutex<HashMap<u8, u32>>,
    failure_rate: f64,
    read_attempts: Mutex<HashMap<u8, u32>>,
    writes: Mutex<Vec<(u8, ConfigurationValue)>>,
    commands: Mutex<Vec<(Option<u8>, Command)>>,
    reject_writes: AtomicBool,
    reject_commands: AtomicBool,
    thermostat_mode: Mutex<ThermostatMode>,
    report_tx: Mutex<Option<mpsc::UnboundedSender<InboundReport>>>,
}

impl SimulatedNode {
    pub fn new(graph: EndpointGraph) -> Self {
        Self {
            graph,
            parameters: Mutex::new(HashMap::new()),
            scripted_failures: Mutex::new(HashMap::new()),
            failure_rate: 0.0,
            read_attempts: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            commands: Mutex::new(Vec::new()),
            reject_writes: AtomicBool::new(false),
            reject_commands: AtomicBool::new(false),
            thermostat_mode: Mutex::new(ThermostatMode::Auto),
            report_tx: Mutex::new(None),
        }
    }

    /// Probability in `0.0..=1.0` that any configuration read times out.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn set_parameter(&self, parameter: u8, value: ConfigurationValue) {
        self.parameters.lock().insert(parameter, value);
    }

    pub fn parameter(&self, parameter: u8) -> Option<ConfigurationValue> {
        self.parameters.lock().get(&parameter).cloned()
    }

    /// Make the next `count` reads of `parameter` time out.
    pub fn fail_next_reads(&self, parameter: u8, count: u32) {
        self.scripted_failures.lock().insert(parameter, count);
    }

    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn reject_commands(&self, reject: bool) {
        self.reject_commands.store(reject, Ordering::SeqCst);
    }

    /// Number of read requests seen for `parameter`.
    pub fn read_attempts(&self, parameter: u8) -> u32 {
        self.read_attempts
            .lock()
            .get(&parameter)
            .copied()
            .unwrap_or(0)
    }

    /// Every accepted configuration write, oldest first.
    pub fn writes(&self) -> Vec<(u8, ConfigurationValue)> {
        self.writes.lock().clone()
    }

    /// Every accepted command, oldest first.
    pub fn commands(&self) -> Vec<(Option<u8>, Command)> {
        self.commands.lock().clone()
    }

    /// Receive reports emitted by this node. Replaces any earlier receiver.
    pub fn report_channel(&self) -> mpsc::UnboundedReceiver<InboundReport> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.report_tx.lock() = Some(tx);
        rx
    }

    /// Emit a report as if it arrived from the bus.
    pub fn emit(&self, endpoint: Option<u8>, report: Report) {
        if let Some(tx) = self.report_tx.lock().as_ref() {
            // Receiver gone means nobody is listening anymore
            let _ = tx.send((endpoint, report));
        }
    }

    fn should_time_out(&self, parameter: u8) -> bool {
        let mut scripted = self.scripted_failures.lock();
        if let Some(remaining) = scripted.get_mut(&parameter)
            && *remaining > 0
        {
            *remaining -= 1;
            return true;
        }
        drop(scripted);
        self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate)
    }

    fn respond(&self, endpoint: Option<u8>, command: &Command) {
        match command {
            Command::SwitchBinarySet(value) => {
                self.emit(endpoint, Report::SwitchBinary { value: *value });
            }
            Command::SwitchMultilevelSet(level) => {
                self.emit(endpoint, Report::SwitchMultilevel { level: *level });
            }
            Command::ThermostatModeSet(mode) => {
                *self.thermostat_mode.lock() = *mode;
                self.emit(endpoint, Report::ThermostatMode { mode: *mode });
            }
            Command::Get(CommandClass::ThermostatMode) => {
                let mode = *self.thermostat_mode.lock();
                self.emit(endpoint, Report::ThermostatMode { mode });
            }
            Command::MeterReset => {
                self.emit(
                    endpoint,
                    Report::Meter {
                        scale: MeterScale::Energy,
                        value: 0.0,
                    },
                );
            }
            _ => {}
        }
    }
}

#[async_trait]
impl NodeTransport for SimulatedNode {
    fn endpoint_graph(&self) -> EndpointGraph {
        self.graph.clone()
    }

    async fn configuration_get(&self, parameter: u8) -> Result<ConfigurationValue> {
        *self.read_attempts.lock().entry(parameter).or_insert(0) += 1;
        if self.should_time_out(parameter) {
            debug!("[Sim] Read of parameter {} timed out", parameter);
            return Err(EngineError::TransportTimeout(format!(
                "configuration get {}",
                parameter
            )));
        }
        self.parameters.lock().get(&parameter).cloned().ok_or_else(|| {
            EngineError::TransportFailure(format!("parameter {} not supported", parameter))
        })
    }

    async fn configuration_set(&self, parameter: u8, value: ConfigurationValue) -> Result<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(EngineError::TransportFailure(format!(
                "configuration set {}",
                parameter
            )));
        }
        debug!("[Sim] Parameter {} <- {}", parameter, value.value());
        self.parameters.lock().insert(parameter, value.clone());
        self.writes.lock().push((parameter, value));
        Ok(())
    }

    async fn send_command(&self, endpoint: Option<u8>, command: Command) -> Result<()> {
        if self.reject_commands.load(Ordering::SeqCst) {
            return Err(EngineError::TransportFailure(format!(
                "{} command to {:?}",
                command.command_class(),
                endpoint
            )));
        }
        debug!("[Sim] Command {:?} -> {:?}", command, endpoint);
        self.respond(endpoint, &command);
        self.commands.lock().push((endpoint, command));
        Ok(())
    }
}

/// Spawn a task that periodically flips the given input endpoints.
///
/// Alternates between binary sensor and notification reports so both
/// firmware variants get exercised.
pub fn run_input_simulation(
    node: Arc<SimulatedNode>,
    input_endpoints: Vec<u8>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval(period);
        let mut state = false;
        let mut use_notification = false;
        loop {
            interval.tick().await;
            state = !state;
            for endpoint in &input_endpoints {
                let report = if use_notification {
                    Report::Notification {
                        event_active: state,
                    }
                } else {
                    Report::SensorBinary { detected: state }
                };
                info!("[Sim] Input endpoint {} -> {}", endpoint, state);
                node.emit(Some(*endpoint), report);
            }
            use_notification = !use_notification;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ValueSize;

    #[tokio::test]
    async fn test_scripted_failures_then_value() {
        let node = SimulatedNode::new(EndpointGraph::default());
        node.set_parameter(101, ConfigurationValue::encode(9, ValueSize::One, false).unwrap());
        node.fail_next_reads(101, 1);

        let err = node.configuration_get(101).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(node.configuration_get(101).await.unwrap().value(), 9);
        assert_eq!(node.read_attempts(101), 2);
    }

    #[tokio::test]
    async fn test_commands_echo_reports() {
        let node = SimulatedNode::new(EndpointGraph::default());
        let mut rx = node.report_channel();

        node.send_command(Some(1), Command::SwitchBinarySet(true))
            .await
            .unwrap();
        assert_eq!(
            rx.recv().await,
            Some((Some(1), Report::SwitchBinary { value: true }))
        );
        assert_eq!(node.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_writes_are_not_recorded() {
        let node = SimulatedNode::new(EndpointGraph::default());
        node.reject_writes(true);
        let value = ConfigurationValue::encode(1, ValueSize::One, false).unwrap();
        assert!(node.configuration_set(78, value).await.is_err());
        assert!(node.writes().is_empty());
    }

    #[tokio::test]
    async fn test_full_failure_rate_always_times_out() {
        let node = SimulatedNode::new(EndpointGraph::default()).with_failure_rate(1.0);
        node.set_parameter(100, ConfigurationValue::encode(1, ValueSize::One, false).unwrap());
        for _ in 0..3 {
            assert!(node.configuration_get(100).await.is_err());
        }
    }
}
