//! Bounded-retry configuration reads.
//!
//! Field devices intermittently leave configuration queries unanswered
//! without being faulty. [`SafeParameterReader`] retries every failed read
//! a fixed number of times and then reports
//! [`ParameterRead::NotAvailable`] instead of an error, so a silent node can
//! never abort device initialization.

use super::NodeTransport;
use crate::codec::ConfigurationValue;
use log::{debug, warn};
use std::sync::Arc;

/// Total attempts per read when nothing else is configured.
pub const DEFAULT_READ_ATTEMPTS: u32 = 3;

/// Outcome of a configuration read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterRead {
    Value(ConfigurationValue),
    /// The node did not produce a usable answer; keep existing configuration.
    NotAvailable,
}

impl ParameterRead {
    pub fn value(&self) -> Option<&ConfigurationValue> {
        match self {
            ParameterRead::Value(value) => Some(value),
            ParameterRead::NotAvailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ParameterRead::Value(_))
    }
}

/// Retrying wrapper around [`NodeTransport::configuration_get`].
///
/// No backoff is applied between attempts; timing is the transport's job.
#[derive(Clone)]
pub struct SafeParameterReader {
    transport: Arc<dyn NodeTransport>,
    max_attempts: u32,
}

impl SafeParameterReader {
    /// `max_attempts` is the total number of requests per read, at least 1.
    pub fn new(transport: Arc<dyn NodeTransport>, max_attempts: u32) -> Self {
        Self {
            transport,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Read `parameter` with the configured attempt bound.
    pub async fn read(&self, parameter: u8) -> ParameterRead {
        self.read_with_attempts(parameter, self.max_attempts).await
    }

    /// Read `parameter`, issuing at most `max_attempts` requests.
    pub async fn read_with_attempts(&self, parameter: u8, max_attempts: u32) -> ParameterRead {
        let max_attempts = max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.transport.configuration_get(parameter).await {
                Ok(value) => {
                    debug!(
                        "[Reader] Parameter {} = {} (attempt {}/{})",
                        parameter,
                        value.value(),
                        attempt,
                        max_attempts
                    );
                    return ParameterRead::Value(value);
                }
                Err(e) if e.is_transient() => {
                    debug!(
                        "[Reader] Parameter {} attempt {}/{} failed: {}",
                        parameter, attempt, max_attempts, e
                    );
                }
                Err(e) => {
                    warn!(
                        "[Reader] Parameter {} attempt {}/{} rejected: {}",
                        parameter, attempt, max_attempts, e
                    );
                }
            }
        }
        warn!(
            "[Reader] Parameter {} not available after {} attempt(s)",
            parameter, max_attempts
        );
        ParameterRead::NotAvailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ValueSize;
    use crate::transport::SimulatedNode;
    use crate::topology::EndpointGraph;

    fn node_with_parameter() -> Arc<SimulatedNode> {
        let node = SimulatedNode::new(EndpointGraph::default());
        node.set_parameter(100, ConfigurationValue::encode(3, ValueSize::One, false).unwrap());
        Arc::new(node)
    }

    #[tokio::test]
    async fn test_succeeds_on_last_attempt() {
        let node = node_with_parameter();
        node.fail_next_reads(100, 2);
        let reader = SafeParameterReader::new(node.clone(), 3);

        let read = reader.read(100).await;
        assert_eq!(read.value().map(|v| v.value()), Some(3));
        assert_eq!(node.read_attempts(100), 3);
    }

    #[tokio::test]
    async fn test_always_failing_gives_not_available_after_bound() {
        let node = node_with_parameter();
        node.fail_next_reads(100, u32::MAX);
        let reader = SafeParameterReader::new(node.clone(), 3);

        assert_eq!(reader.read(100).await, ParameterRead::NotAvailable);
        assert_eq!(node.read_attempts(100), 3);
    }

    #[tokio::test]
    async fn test_explicit_attempt_bound() {
        let node = node_with_parameter();
        node.fail_next_reads(100, 4);
        let reader = SafeParameterReader::new(node.clone(), 3);

        assert!(reader.read_with_attempts(100, 5).await.is_available());
        assert_eq!(node.read_attempts(100), 5);
    }

    #[tokio::test]
    async fn test_rejected_reads_use_every_attempt() {
        // Unknown parameters are rejected by the node outright
        let node = Arc::new(SimulatedNode::new(EndpointGraph::default()));
        let reader = SafeParameterReader::new(node.clone(), 3);

        assert_eq!(reader.read(42).await, ParameterRead::NotAvailable);
        assert_eq!(node.read_attempts(42), 3);
    }

    #[test]
    fn test_zero_attempts_is_raised_to_one() {
        let node = node_with_parameter();
        let reader = SafeParameterReader::new(node, 0);
        assert_eq!(reader.max_attempts(), 1);
    }
}
