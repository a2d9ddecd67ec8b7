//! Edge-triggered input state.

use super::InputBinding;
use crate::transport::Report;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

const STATE_UNKNOWN: u8 = 0;
const STATE_OFF: u8 = 1;
const STATE_ON: u8 = 2;

/// Events fired by an input transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    Toggled,
    TurnedOn,
    TurnedOff,
}

/// State of one input endpoint.
///
/// Firmware revisions report inputs either as binary sensor reports or as
/// notification reports; both decode to the same boolean. Only a change of
/// that boolean produces events. The state starts unknown, so the first
/// report after initialization always fires.
pub struct InputChannel {
    binding: InputBinding,
    state: AtomicU8,
    version: AtomicU32,
}

impl InputChannel {
    pub fn new(binding: InputBinding) -> Self {
        Self {
            binding,
            state: AtomicU8::new(STATE_UNKNOWN),
            version: AtomicU32::new(0),
        }
    }

    pub fn binding(&self) -> &InputBinding {
        &self.binding
    }

    /// Decoded boolean of an input report, `None` for other report kinds.
    pub fn decode(report: &Report) -> Option<bool> {
        match report {
            Report::SensorBinary { detected } => Some(*detected),
            Report::Notification { event_active } => Some(*event_active),
            _ => None,
        }
    }

    /// Last known state, `None` before the first report.
    pub fn get(&self) -> Option<bool> {
        match self.state.load(Ordering::SeqCst) {
            STATE_ON => Some(true),
            STATE_OFF => Some(false),
            _ => None,
        }
    }

    /// Feed a report. Returns the events to fire, empty when nothing changed.
    pub fn process(&self, report: &Report) -> Vec<InputEvent> {
        let Some(new_state) = Self::decode(report) else {
            return Vec::new();
        };
        let encoded = if new_state { STATE_ON } else { STATE_OFF };
        // swap keeps concurrent duplicate reports from firing twice
        let old = self.state.swap(encoded, Ordering::SeqCst);
        if old == encoded {
            return Vec::new();
        }
        self.version.fetch_add(1, Ordering::SeqCst);
        info!(
            "[Inputs] Input {} on endpoint {}: {}",
            self.binding.config.index, self.binding.endpoint, new_state
        );
        let edge = if new_state {
            InputEvent::TurnedOn
        } else {
            InputEvent::TurnedOff
        };
        vec![InputEvent::Toggled, edge]
    }

    pub fn version(&self) -> u32 {
        self.version.load(Ordering::SeqCst)
    }
}
