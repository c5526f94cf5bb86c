use crate::{device::Device, error::DeviceLost, role::QueueRole, set::QueueSet};

/// Point on a queue timeline.
///
/// Timeline values are never reused, so checking a fence is a comparison
/// with the value the queue is known to have completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FenceRef {
    role: QueueRole,
    value: u64,
}

impl FenceRef {
    /// Create fence for the timeline value of the queue.
    pub fn new(role: QueueRole, value: u64) -> Self {
        FenceRef { role, value }
    }

    /// Queue that signals the fence.
    pub fn role(&self) -> QueueRole {
        self.role
    }

    /// Timeline value.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Check if fence is signaled without blocking.
    pub fn is_signaled<D: Device>(&self, queues: &QueueSet<D>, device: &D) -> Result<bool, DeviceLost> {
        queues.queue(self.role).is_complete(device, self.value)
    }

    /// Block until fence is signaled or `timeout_ns` passes.
    /// Returns `false` on timeout.
    pub fn wait<D: Device>(
        &self,
        queues: &QueueSet<D>,
        device: &D,
        timeout_ns: u64,
    ) -> Result<bool, DeviceLost> {
        queues.queue(self.role).wait_value(device, self.value, timeout_ns)
    }
}
