use {
    crate::{device::Device, error::OutOfMemory},
    std::collections::VecDeque,
};

/// Maximum number of binary semaphores owned by one queue.
pub const SEMAPHORE_RING_SIZE: usize = 8;

#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
struct Slot<D: Device> {
    semaphore: D::Semaphore,
    retire: u64,
    used: bool,
}

/// Disposable binary semaphores of one queue.
/// Semaphore is reused once the timeline value of the submission that signaled it is reached.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct SemaphoreRing<D: Device> {
    // Oldest first.
    slots: VecDeque<Slot<D>>,
}

impl<D> SemaphoreRing<D>
where
    D: Device,
{
    /// Create empty ring.
    pub fn new() -> Self {
        SemaphoreRing {
            slots: VecDeque::with_capacity(SEMAPHORE_RING_SIZE),
        }
    }

    /// Number of created semaphores.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Timeline value to wait before `acquire` can succeed.
    /// `None` if a semaphore is available now.
    pub fn blocking_value(&self, completed: u64) -> Option<u64> {
        match self.slots.front() {
            Some(slot) if self.slots.len() == SEMAPHORE_RING_SIZE && slot.retire > completed => {
                Some(slot.retire)
            }
            _ => None,
        }
    }

    /// Get semaphore that will be signaled by submission with timeline value `retire`.
    ///
    /// # Panics
    ///
    /// Panics if ring is full and oldest semaphore is not retired yet.
    /// Check `blocking_value` and wait first.
    pub fn acquire(
        &mut self,
        device: &D,
        completed: u64,
        retire: u64,
    ) -> Result<D::Semaphore, OutOfMemory> {
        let reuse = match self.slots.front() {
            Some(slot) => slot.retire <= completed,
            None => false,
        };

        let mut slot = if reuse {
            match self.slots.pop_front() {
                Some(slot) => slot,
                None => unreachable!(),
            }
        } else {
            assert!(
                self.slots.len() < SEMAPHORE_RING_SIZE,
                "Semaphore ring exhausted (SEMAPHORE_RING_SIZE = {})",
                SEMAPHORE_RING_SIZE
            );
            Slot {
                semaphore: device.create_semaphore()?,
                retire: 0,
                used: false,
            }
        };

        slot.retire = retire;
        slot.used = true;
        let semaphore = slot.semaphore.clone();
        self.slots.push_back(slot);
        Ok(semaphore)
    }

    /// Destroy retired semaphores not acquired since previous prune.
    /// Returns number of destroyed semaphores.
    pub fn prune(&mut self, device: &D, completed: u64) -> usize {
        let before = self.slots.len();
        let mut kept = VecDeque::with_capacity(SEMAPHORE_RING_SIZE);
        for mut slot in self.slots.drain(..) {
            if !slot.used && slot.retire <= completed {
                unsafe { device.destroy_semaphore(slot.semaphore) };
            } else {
                slot.used = false;
                kept.push_back(slot);
            }
        }
        self.slots = kept;
        before - self.slots.len()
    }

    /// Destroy all semaphores.
    ///
    /// # Safety
    ///
    /// No pending submission may reference them.
    pub unsafe fn dispose(self, device: &D) {
        for slot in self.slots {
            device.destroy_semaphore(slot.semaphore);
        }
    }
}
