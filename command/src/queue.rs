use {
    crate::{
        device::{Device, Submission, Wait},
        error::{DeviceLost, OutOfMemory},
        family::QueueId,
        fence::FenceRef,
        role::{QueueRole, QUEUE_ROLE_COUNT},
        semaphore::SemaphoreRing,
    },
    std::{cell::Cell, cmp::max, collections::VecDeque},
    syncline_chain::{BarrierHandler, HandlerConfig},
    syncline_core::hal::{pso::PipelineStage, queue::QueueFamilyId},
    thread_profiler::profile_scope,
};

/// Idle command buffers a queue keeps after prune.
pub const MAX_IDLE_COMMAND_BUFFERS: usize = 2;

#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
struct PendingWait<D: Device> {
    timeline: D::Timeline,
    value: u64,
    stages: PipelineStage,
}

/// Logical queue.
///
/// Owns barrier handler tracking resources used by the queue,
/// counting semaphore advanced by each submission
/// and waits to attach to the next submission.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Queue<D: Device> {
    id: QueueId,
    role: QueueRole,
    handler: BarrierHandler,
    timeline: D::Timeline,

    /// Value signaled by the last submission.
    value: u64,

    /// Last value the device reported as reached.
    completed: Cell<u64>,

    /// Coalesced waits by source role.
    waits: [Option<PendingWait<D>>; QUEUE_ROLE_COUNT],
    semaphore_wait: Option<(D::Semaphore, PipelineStage)>,

    recording: Option<D::CommandBuffer>,
    in_flight: VecDeque<(u64, D::CommandBuffer)>,
    idle: Vec<D::CommandBuffer>,
    semaphores: SemaphoreRing<D>,
}

impl<D> Queue<D>
where
    D: Device,
{
    pub(crate) fn new(
        device: &D,
        id: QueueId,
        role: QueueRole,
        config: HandlerConfig,
    ) -> Result<Self, OutOfMemory> {
        let timeline = device.create_timeline(0)?;
        log::debug!("Create {} queue {:?}", role.name(), id);
        Ok(Queue {
            id,
            role,
            handler: BarrierHandler::new(id.family(), config),
            timeline,
            value: 0,
            completed: Cell::new(0),
            waits: Default::default(),
            semaphore_wait: None,
            recording: None,
            in_flight: VecDeque::new(),
            idle: Vec::new(),
            semaphores: SemaphoreRing::new(),
        })
    }

    /// Id of the hardware queue.
    pub fn id(&self) -> QueueId {
        self.id
    }

    /// Role of the queue.
    pub fn role(&self) -> QueueRole {
        self.role
    }

    /// Family of the hardware queue.
    pub fn family(&self) -> QueueFamilyId {
        self.id.family()
    }

    /// Timeline value signaled by the last submission.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Counting semaphore of the queue.
    pub fn timeline(&self) -> &D::Timeline {
        &self.timeline
    }

    /// Barrier handler of the queue.
    pub fn barriers(&self) -> &BarrierHandler {
        &self.handler
    }

    /// Barrier handler of the queue.
    pub fn barriers_mut(&mut self) -> &mut BarrierHandler {
        &mut self.handler
    }

    /// Number of waits that will be attached to the next submission.
    pub fn pending_waits(&self) -> usize {
        self.waits.iter().flatten().count() + self.semaphore_wait.iter().count()
    }

    /// Number of command buffers submitted and not known to be retired.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of binary semaphores owned by the queue.
    pub fn semaphores(&self) -> usize {
        self.semaphores.len()
    }

    /// Command buffer currently recording.
    /// Begins new one if nothing is recording.
    pub fn command_buffer(&mut self, device: &D) -> Result<&mut D::CommandBuffer, OutOfMemory> {
        if self.recording.is_none() {
            self.recycle();
            let mut buffer = match self.idle.pop() {
                Some(buffer) => buffer,
                None => device.allocate_command_buffer(self.id.family())?,
            };
            unsafe { device.begin(&mut buffer) };
            self.recording = Some(buffer);
        }

        match &mut self.recording {
            Some(buffer) => Ok(buffer),
            None => unreachable!(),
        }
    }

    /// Resolve pending barriers and record them into current command buffer.
    /// Returns `false` if there was nothing to record.
    pub fn flush_barriers(&mut self, device: &D) -> Result<bool, OutOfMemory> {
        match self.handler.resolve() {
            Some(batch) => {
                let buffer = self.command_buffer(device)?;
                unsafe { device.pipeline_barrier(buffer, &batch) };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Make next submission wait until `other` reaches the value it has now plus `offset`.
    /// The value is captured by this call.
    pub fn wait_for(&mut self, other: &Queue<D>, offset: u64, stages: Option<PipelineStage>) {
        let value = other.value + offset;
        if value == 0 {
            log::trace!("{} queue has nothing to wait on {} queue", self.role.name(), other.role.name());
            return;
        }

        let stages = stages.unwrap_or_else(|| self.role.wait_stages());
        log::debug!(
            "{} queue waits {} queue value {} at {:?}",
            self.role.name(),
            other.role.name(),
            value,
            stages
        );

        let slot = &mut self.waits[other.role.index()];
        match slot.as_mut() {
            Some(wait) => {
                wait.value = max(wait.value, value);
                wait.stages |= stages;
            }
            None => {
                *slot = Some(PendingWait {
                    timeline: other.timeline.clone(),
                    value,
                    stages,
                });
            }
        }
    }

    /// Make next submission wait for external binary semaphore.
    ///
    /// # Panics
    ///
    /// Panics if another semaphore wait is pending.
    pub fn wait_semaphore(&mut self, semaphore: D::Semaphore, stages: PipelineStage) {
        assert!(
            self.semaphore_wait.is_none(),
            "{} queue already waits for a binary semaphore",
            self.role.name()
        );
        self.semaphore_wait = Some((semaphore, stages));
    }

    /// Submit current command buffer.
    /// Attaches and clears pending waits.
    /// Returns timeline value the submission signals.
    ///
    /// Barriers still pending in the handler stay there for the next command buffer.
    pub fn submit(&mut self, device: &D) -> u64 {
        self.submit_inner(device, None)
    }

    /// Submit current command buffer signaling binary semaphore as well.
    /// The semaphore must be waited before the ring cycles back to it.
    pub fn submit_signal(&mut self, device: &D) -> Result<(u64, D::Semaphore), OutOfMemory> {
        let semaphore = self.acquire_semaphore(device)?;
        let value = self.submit_inner(device, Some(&semaphore));
        Ok((value, semaphore))
    }

    /// Submit nothing but a signal of binary semaphore.
    /// The semaphore is signaled after all work submitted to this queue so far.
    /// Advances the timeline so the semaphore can be recycled.
    pub fn signal(&mut self, device: &D, stages: PipelineStage) -> Result<D::Semaphore, OutOfMemory> {
        let semaphore = self.acquire_semaphore(device)?;
        let value = self.value + 1;
        let submission = Submission {
            command_buffer: None,
            waits: Default::default(),
            timeline_signal: Some((&self.timeline, value)),
            semaphore_signal: Some(&semaphore),
            signal_stages: stages,
        };
        log::debug!("{} queue signals semaphore at value {}", self.role.name(), value);
        self.dispatch(device, submission);
        self.value = value;
        Ok(semaphore)
    }

    fn submit_inner(&mut self, device: &D, signal: Option<&D::Semaphore>) -> u64 {
        profile_scope!("submit");

        let mut buffer = self.recording.take();
        if let Some(buffer) = &mut buffer {
            unsafe { device.finish(buffer) };
        }

        let waits = std::mem::replace(&mut self.waits, Default::default());
        let semaphore_wait = self.semaphore_wait.take();
        let value = self.value + 1;

        let submission = Submission {
            command_buffer: buffer.as_ref(),
            waits: waits
                .iter()
                .flatten()
                .map(|wait| Wait::Timeline(&wait.timeline, wait.value, wait.stages))
                .chain(
                    semaphore_wait
                        .iter()
                        .map(|(semaphore, stages)| Wait::Semaphore(semaphore, *stages)),
                )
                .collect(),
            timeline_signal: Some((&self.timeline, value)),
            semaphore_signal: signal,
            signal_stages: PipelineStage::BOTTOM_OF_PIPE,
        };
        log::debug!(
            "Submit to {} queue {:?}: value {}, {} waits",
            self.role.name(),
            self.id,
            value,
            submission.waits.len()
        );
        self.dispatch(device, submission);

        self.value = value;
        if let Some(buffer) = buffer {
            self.in_flight.push_back((value, buffer));
        }
        value
    }

    fn dispatch(&self, device: &D, submission: Submission<'_, D>) {
        if let Err(error) = unsafe { device.submit(self.id, submission) } {
            self.device_lost(error);
        }
    }

    fn device_lost(&self, error: DeviceLost) -> ! {
        log::error!("{} queue {:?}: {}", self.role.name(), self.id, error);
        panic!("{}", error)
    }

    fn acquire_semaphore(&mut self, device: &D) -> Result<D::Semaphore, OutOfMemory> {
        if let Some(value) = self.semaphores.blocking_value(self.completed.get()) {
            log::debug!("{} queue waits value {} to reuse semaphore", self.role.name(), value);
            match self.wait_value(device, value, !0) {
                Ok(true) => {}
                Ok(false) => panic!("Infinite wait for value {} timed out", value),
                Err(error) => self.device_lost(error),
            }
        }
        self.semaphores.acquire(device, self.completed.get(), self.value + 1)
    }

    /// Fence for the value of the last submission plus `offset`.
    pub fn fence(&self, offset: u64) -> FenceRef {
        FenceRef::new(self.role, self.value + offset)
    }

    /// Query value reached by the queue.
    pub fn completed(&self, device: &D) -> Result<u64, DeviceLost> {
        let value = max(device.timeline_value(&self.timeline)?, self.completed.get());
        self.completed.set(value);
        Ok(value)
    }

    /// Check if queue reached the value without blocking.
    pub fn is_complete(&self, device: &D, value: u64) -> Result<bool, DeviceLost> {
        if self.completed.get() >= value {
            return Ok(true);
        }
        Ok(self.completed(device)? >= value)
    }

    /// Block until queue reaches the value or `timeout_ns` passes.
    /// Returns `false` on timeout.
    pub fn wait_value(&self, device: &D, value: u64, timeout_ns: u64) -> Result<bool, DeviceLost> {
        if self.completed.get() >= value {
            return Ok(true);
        }
        if device.wait_timeline(&self.timeline, value, timeout_ns)? {
            self.completed.set(max(self.completed.get(), value));
            Ok(true)
        } else {
            log::trace!("{} queue wait for value {} timed out", self.role.name(), value);
            Ok(false)
        }
    }

    /// Move command buffers of retired submissions to idle list.
    fn recycle(&mut self) {
        let completed = self.completed.get();
        while let Some(&(value, _)) = self.in_flight.front() {
            if value > completed {
                break;
            }
            if let Some((_, buffer)) = self.in_flight.pop_front() {
                self.idle.push(buffer);
            }
        }
    }

    /// Prune barrier handler and release retired slack.
    /// Returns number of resources evicted from tracking.
    pub fn prune(&mut self, device: &D) -> Result<usize, DeviceLost> {
        profile_scope!("queue_prune");

        let completed = self.completed(device)?;
        self.recycle();
        while self.idle.len() > MAX_IDLE_COMMAND_BUFFERS {
            if let Some(buffer) = self.idle.pop() {
                unsafe { device.free_command_buffer(self.id.family(), buffer) };
            }
        }
        let semaphores = self.semaphores.prune(device, completed);
        let evicted = self.handler.prune();

        log::debug!(
            "Prune {} queue at value {}: {} resources, {} semaphores",
            self.role.name(),
            completed,
            evicted,
            semaphores
        );
        Ok(evicted)
    }

    /// Release every object owned by the queue.
    ///
    /// # Safety
    ///
    /// Queue must be idle.
    pub(crate) unsafe fn dispose(self, device: &D) {
        let family = self.id.family();
        let buffers = self
            .recording
            .into_iter()
            .chain(self.in_flight.into_iter().map(|(_, buffer)| buffer))
            .chain(self.idle);
        for buffer in buffers {
            device.free_command_buffer(family, buffer);
        }
        self.semaphores.dispose(device);
        device.destroy_timeline(self.timeline);
        log::debug!("Disposed {} queue {:?}", self.role.name(), self.id);
    }
}
