use {
    crate::{
        config::{Config, QueuesConfigure},
        device::Device,
        error::{DeviceLost, InitError, OutOfMemory},
        family::FamilyProperties,
        fence::FenceRef,
        queue::Queue,
        role::{QueueRole, QUEUE_ROLE_COUNT},
    },
    std::convert::TryInto,
    syncline_chain::BarrierHandler,
    thread_profiler::profile_scope,
};

/// Logical queues of the device.
///
/// All cross-queue ordering and hazard tracking migration goes through this type.
/// Must be disposed with `QueueSet::dispose`.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct QueueSet<D: Device> {
    queues: [Queue<D>; QUEUE_ROLE_COUNT],
    relevant: relevant::Relevant,
}

impl<D> QueueSet<D>
where
    D: Device,
{
    /// Select hardware queues among `families` and create logical queue for every role.
    pub fn new<Q>(device: &D, families: &[FamilyProperties], config: Config<Q>) -> Result<Self, InitError>
    where
        Q: QueuesConfigure,
    {
        let selection = config.queues.configure(families)?;

        let mut queues = Vec::with_capacity(QUEUE_ROLE_COUNT);
        for &role in &QueueRole::ALL {
            match Queue::new(device, selection.queue(role), role, config.tracking) {
                Ok(queue) => queues.push(queue),
                Err(error) => {
                    for queue in queues {
                        unsafe { queue.dispose(device) };
                    }
                    return Err(error.into());
                }
            }
        }

        let queues: [Queue<D>; QUEUE_ROLE_COUNT] = match queues.try_into() {
            Ok(queues) => queues,
            Err(_) => unreachable!("One queue per role"),
        };

        Ok(QueueSet {
            queues,
            relevant: relevant::Relevant,
        })
    }

    /// Get queue of the role.
    pub fn queue(&self, role: QueueRole) -> &Queue<D> {
        &self.queues[role.index()]
    }

    /// Get queue of the role.
    pub fn queue_mut(&mut self, role: QueueRole) -> &mut Queue<D> {
        &mut self.queues[role.index()]
    }

    /// Barrier handler of the queue of the role.
    pub fn barriers_mut(&mut self, role: QueueRole) -> &mut BarrierHandler {
        self.queue_mut(role).barriers_mut()
    }

    /// Command buffer currently recording for the role.
    pub fn command_buffer(&mut self, role: QueueRole, device: &D) -> Result<&mut D::CommandBuffer, OutOfMemory> {
        self.queue_mut(role).command_buffer(device)
    }

    /// Record pending barriers of the role into its command buffer.
    pub fn flush_barriers(&mut self, role: QueueRole, device: &D) -> Result<bool, OutOfMemory> {
        self.queue_mut(role).flush_barriers(device)
    }

    /// Submit command buffer of the role and begin a fresh one.
    pub fn submit(&mut self, role: QueueRole, device: &D) -> Result<&mut D::CommandBuffer, OutOfMemory> {
        let queue = self.queue_mut(role);
        queue.submit(device);
        queue.command_buffer(device)
    }

    fn pair_mut(&mut self, from: QueueRole, to: QueueRole) -> (&mut Queue<D>, &mut Queue<D>) {
        let (from, to) = (from.index(), to.index());
        assert_ne!(from, to);
        if from < to {
            let (left, right) = self.queues.split_at_mut(to);
            (&mut left[from], &mut right[0])
        } else {
            let (left, right) = self.queues.split_at_mut(from);
            (&mut right[0], &mut left[to])
        }
    }

    /// Order next submission of `to` after work of `from` submitted so far plus `offset`
    /// and move hazard tracking of `from` into `to`.
    ///
    /// Use this when `to` accesses resources `from` used.
    pub fn sync(&mut self, from: QueueRole, to: QueueRole, offset: u64) {
        if from == to {
            log::warn!("Sync of {} queue with itself ignored", from.name());
            return;
        }
        let (from, to) = self.pair_mut(from, to);
        to.wait_for(from, offset, None);
        from.barriers().transfer_records(to.barriers_mut());
    }

    /// Order next submission of `to` after work of `from` submitted so far plus `offset`.
    /// Hazard tracking is not moved.
    pub fn wait(&mut self, from: QueueRole, to: QueueRole, offset: u64) {
        if from == to {
            log::warn!("Wait of {} queue on itself ignored", from.name());
            return;
        }
        let (from, to) = self.pair_mut(from, to);
        to.wait_for(from, offset, None);
    }

    /// Move hazard tracking of `from` into `to` without ordering.
    /// Ordering must be guaranteed by other means.
    pub fn transfer(&mut self, from: QueueRole, to: QueueRole) {
        if from == to {
            log::warn!("Transfer of {} queue records to itself ignored", from.name());
            return;
        }
        let (from, to) = self.pair_mut(from, to);
        from.barriers().transfer_records(to.barriers_mut());
    }

    /// Fence for the last submission of the role plus `offset`.
    pub fn fence(&self, role: QueueRole, offset: u64) -> FenceRef {
        self.queue(role).fence(offset)
    }

    /// Prune every queue.
    /// Call once per retired frame.
    /// Returns total number of resources evicted from tracking.
    pub fn prune(&mut self, device: &D) -> Result<usize, DeviceLost> {
        profile_scope!("prune");
        let mut evicted = 0;
        for queue in self.queues.iter_mut() {
            evicted += queue.prune(device)?;
        }
        Ok(evicted)
    }

    /// Block until all queues are idle.
    pub fn wait_idle(&self, device: &D) -> Result<(), DeviceLost> {
        device.wait_idle()?;
        for queue in &self.queues {
            queue.completed(device)?;
        }
        Ok(())
    }

    /// Wait for the device to become idle and release all queue resources.
    pub fn dispose(self, device: &D) {
        if let Err(error) = device.wait_idle() {
            log::error!("Dispose queues: {}", error);
        }
        for queue in IntoIterator::into_iter(self.queues) {
            unsafe { queue.dispose(device) };
        }
        self.relevant.dispose();
    }
}
