//! Queue selection and queue set configuration.

use {
    crate::{
        error::InitError,
        family::{FamilyProperties, QueueId},
        role::{QueueRole, QUEUE_ROLE_COUNT},
    },
    syncline_chain::HandlerConfig,
};

/// Config for `QueueSet`.
#[derive(Clone, derivative::Derivative)]
#[derivative(Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config<Q = DedicatedQueues> {
    /// Queue selection method.
    pub queues: Q,

    /// Config for barrier handlers of all queues.
    pub tracking: HandlerConfig,
}

/// Hardware queue picked for every role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueSelection([QueueId; QUEUE_ROLE_COUNT]);

impl QueueSelection {
    /// Create selection from queue ids in `QueueRole::ALL` order.
    pub fn new(queues: [QueueId; QUEUE_ROLE_COUNT]) -> Self {
        QueueSelection(queues)
    }

    /// Queue picked for the role.
    pub fn queue(&self, role: QueueRole) -> QueueId {
        self.0[role.index()]
    }
}

/// Trait that represents some method to select hardware queues for logical roles.
pub trait QueuesConfigure {
    /// Pick queues among `families`.
    fn configure(self, families: &[FamilyProperties]) -> Result<QueueSelection, InitError>;
}

/// Picks dedicated families for compute and transfer when device has them.
///
/// Graphics uses first graphics capable family.
/// Present uses graphics family if it can present, first presenting family otherwise.
/// Compute and transfer fall back to more capable families.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DedicatedQueues;

struct QueueAllocator<'a> {
    families: &'a [FamilyProperties],
    used: Vec<usize>,
}

impl<'a> QueueAllocator<'a> {
    fn new(families: &'a [FamilyProperties]) -> Self {
        QueueAllocator {
            families,
            used: vec![0; families.len()],
        }
    }

    /// Next unused queue of the family at `position`. Shares the first queue once all are taken.
    fn allocate(&mut self, position: usize) -> QueueId {
        let family = &self.families[position];
        let used = &mut self.used[position];
        let index = if *used < family.queue_count {
            *used += 1;
            *used - 1
        } else {
            log::debug!("Family {:?} is out of queues, sharing queue 0", family.id);
            0
        };
        QueueId(family.id, index)
    }
}

impl QueuesConfigure for DedicatedQueues {
    fn configure(self, families: &[FamilyProperties]) -> Result<QueueSelection, InitError> {
        let graphics = families
            .iter()
            .position(FamilyProperties::supports_graphics)
            .ok_or(InitError::NoGraphicsFamily)?;
        let compute = families.iter().position(FamilyProperties::is_compute_only);
        let transfer = families.iter().position(FamilyProperties::is_transfer_only);

        let mut allocator = QueueAllocator::new(families);
        let graphics_queue = allocator.allocate(graphics);

        let present_queue = if families[graphics].present {
            graphics_queue
        } else if let Some(present) = families.iter().position(|f| f.is_usable() && f.present) {
            allocator.allocate(present)
        } else {
            log::warn!("No queue family can present, presenting from graphics queue");
            graphics_queue
        };

        let compute_queue = allocator.allocate(compute.unwrap_or(graphics));
        let transfer_queue = allocator.allocate(transfer.or(compute).unwrap_or(graphics));

        let selection = QueueSelection([
            graphics_queue,
            present_queue,
            compute_queue,
            transfer_queue,
        ]);
        log::debug!("Selected queues {:?}", selection);
        Ok(selection)
    }
}

/// Saved queue selection.
/// Validated against device families before use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SavedQueueConfig(pub QueueSelection);

impl QueuesConfigure for SavedQueueConfig {
    fn configure(self, families: &[FamilyProperties]) -> Result<QueueSelection, InitError> {
        for &role in &QueueRole::ALL {
            let id = self.0.queue(role);
            let invalid = InitError::InvalidFamily {
                family: id.family(),
                role: role.name(),
            };
            let family = families
                .iter()
                .find(|f| f.id == id.family())
                .ok_or(invalid)?;

            let capable = match role {
                QueueRole::Graphics => family.supports_graphics(),
                QueueRole::Present => family.present,
                QueueRole::Compute => family.queue_type.supports_compute(),
                QueueRole::Transfer => family.queue_type.supports_transfer(),
            };
            if !capable {
                return Err(invalid);
            }

            if id.index() >= family.queue_count {
                return Err(InitError::InvalidQueueIndex {
                    family: id.family(),
                    index: id.index(),
                });
            }
        }
        Ok(self.0)
    }
}
