//! Family module docs.

use syncline_core::hal::queue::{QueueFamilyId, QueueType};

/// Queue id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueId(pub QueueFamilyId, pub usize);

impl QueueId {
    /// Get family of the queue.
    pub fn family(&self) -> QueueFamilyId {
        self.0
    }

    /// Get index of the queue.
    pub fn index(&self) -> usize {
        self.1
    }
}

/// Properties of the hardware queue family reported by the physical device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FamilyProperties {
    /// Family id.
    pub id: QueueFamilyId,

    /// Capabilities of queues of the family.
    pub queue_type: QueueType,

    /// Number of queues in the family.
    pub queue_count: usize,

    /// Whether queues of the family can present to the target surface.
    pub present: bool,
}

impl FamilyProperties {
    /// Check if family has at least one queue.
    pub fn is_usable(&self) -> bool {
        self.queue_count > 0
    }

    /// Check if family supports graphics.
    pub fn supports_graphics(&self) -> bool {
        self.is_usable() && self.queue_type.supports_graphics()
    }

    /// Check if family supports compute but not graphics.
    pub fn is_compute_only(&self) -> bool {
        self.is_usable() && self.queue_type == QueueType::Compute
    }

    /// Check if family supports transfer only.
    pub fn is_transfer_only(&self) -> bool {
        self.is_usable() && self.queue_type == QueueType::Transfer
    }
}
