//! Last known value of a bound capability.

use super::{CapabilityBinding, CapabilityValue};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe state of one bound capability.
///
/// Reports update the value from the transport side while user commands and
/// settings changes read or mirror it; the version is bumped on every change
/// so observers can detect updates cheaply.
pub struct CapabilityHandle {
    binding: CapabilityBinding,
    value: RwLock<Option<CapabilityValue>>,
    version: AtomicU32,
}

impl CapabilityHandle {
    pub fn new(binding: CapabilityBinding) -> Self {
        Self {
            binding,
            value: RwLock::new(None),
            version: AtomicU32::new(0),
        }
    }

    pub fn binding(&self) -> &CapabilityBinding {
        &self.binding
    }

    /// Current value, `None` until the first report.
    pub fn get(&self) -> Option<CapabilityValue> {
        self.value.read().clone()
    }

    /// Store a value. Returns the previous one if the value changed.
    pub fn set(&self, value: CapabilityValue) -> Option<Option<CapabilityValue>> {
        let mut current = self.value.write();
        if current.as_ref() == Some(&value) {
            return None;
        }
        let previous = current.replace(value);
        self.version.fetch_add(1, Ordering::SeqCst);
        Some(previous)
    }

    pub fn version(&self) -> u32 {
        self.version.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{CapabilityId, ValueTransform};
    use crate::topology::CommandClass;

    fn handle() -> CapabilityHandle {
        CapabilityHandle::new(CapabilityBinding {
            capability: CapabilityId::Onoff,
            endpoint: Some(1),
            command_class: CommandClass::SwitchBinary,
            transform: ValueTransform::OnOff,
            get_on_start: false,
        })
    }

    #[test]
    fn test_initial_state_is_unknown() {
        let handle = handle();
        assert_eq!(handle.get(), None);
        assert_eq!(handle.version(), 0);
    }

    #[test]
    fn test_set_increments_version_on_change_only() {
        let handle = handle();
        assert_eq!(handle.set(CapabilityValue::Bool(true)), Some(None));
        assert_eq!(handle.version(), 1);

        // Same value doesn't increment
        assert_eq!(handle.set(CapabilityValue::Bool(true)), None);
        assert_eq!(handle.version(), 1);

        assert_eq!(
            handle.set(CapabilityValue::Bool(false)),
            Some(Some(CapabilityValue::Bool(true)))
        );
        assert_eq!(handle.version(), 2);
    }
}
