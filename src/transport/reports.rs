//! Inbound report dispatch.

use super::Report;
use crate::topology::CommandClass;
use log::trace;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Callback invoked for a matching report.
pub type ReportHandler = Arc<dyn Fn(&Report) + Send + Sync>;

/// Routes reports to handlers keyed by endpoint and command class.
///
/// `None` as endpoint addresses the root node. Several handlers may listen on
/// the same key; they run in registration order.
#[derive(Default)]
pub struct ReportRouter {
    handlers: RwLock<HashMap<(Option<u8>, CommandClass), Vec<ReportHandler>>>,
}

impl ReportRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for reports of `command_class` from `endpoint`.
    pub fn on_report(
        &self,
        endpoint: Option<u8>,
        command_class: CommandClass,
        handler: ReportHandler,
    ) {
        self.handlers
            .write()
            .entry((endpoint, command_class))
            .or_default()
            .push(handler);
    }

    /// Dispatch a report. Returns how many handlers saw it.
    pub fn dispatch(&self, endpoint: Option<u8>, report: &Report) -> usize {
        // Clone out so handlers can register further listeners
        let handlers: Vec<ReportHandler> = self
            .handlers
            .read()
            .get(&(endpoint, report.command_class()))
            .cloned()
            .unwrap_or_default();
        if handlers.is_empty() {
            trace!(
                "[Reports] No listener for {} on {:?}",
                report.command_class(),
                endpoint
            );
        }
        for handler in &handlers {
            handler(report);
        }
        handlers.len()
    }

    /// Number of registered (endpoint, command class) keys.
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    pub fn clear(&self) {
        self.handlers.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dispatch_matches_endpoint_and_class() {
        let router = ReportRouter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        router.on_report(
            Some(2),
            CommandClass::SwitchBinary,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let report = Report::SwitchBinary { value: true };
        assert_eq!(router.dispatch(Some(2), &report), 1);
        assert_eq!(router.dispatch(None, &report), 0);
        assert_eq!(
            router.dispatch(Some(2), &Report::SensorBinary { detected: true }),
            0
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
