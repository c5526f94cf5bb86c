use {
    crate::{
        error::{DeviceLost, OutOfMemory},
        family::QueueId,
    },
    smallvec::SmallVec,
    std::fmt::Debug,
    syncline_chain::BarrierBatch,
    syncline_core::hal::{pso::PipelineStage, queue::QueueFamilyId},
};

/// Maximum number of wait operations of one submission.
/// One timeline wait per queue role plus one binary semaphore.
pub const MAX_SUBMISSION_WAITS: usize = crate::role::QUEUE_ROLE_COUNT + 1;

/// Trait for command submission and synchronization primitives of the logical device.
///
/// Every method takes `&self` as hardware queues and semaphores are
/// externally synchronized by `Queue` and `QueueSet`.
pub trait Device: Sized {
    /// Command buffer recorded on the host and submitted to a queue.
    type CommandBuffer: Debug;

    /// Binary semaphore. Handle is cheap to clone.
    type Semaphore: Clone + Debug;

    /// Counting semaphore. Handle is cheap to clone.
    type Timeline: Clone + Debug;

    /// Create counting semaphore with initial value.
    fn create_timeline(&self, initial: u64) -> Result<Self::Timeline, OutOfMemory>;

    /// Destroy counting semaphore.
    ///
    /// # Safety
    ///
    /// No pending submission may reference the semaphore.
    unsafe fn destroy_timeline(&self, timeline: Self::Timeline);

    /// Create binary semaphore.
    fn create_semaphore(&self) -> Result<Self::Semaphore, OutOfMemory>;

    /// Destroy binary semaphore.
    ///
    /// # Safety
    ///
    /// No pending submission may reference the semaphore.
    unsafe fn destroy_semaphore(&self, semaphore: Self::Semaphore);

    /// Allocate command buffer for queues of the family.
    fn allocate_command_buffer(
        &self,
        family: QueueFamilyId,
    ) -> Result<Self::CommandBuffer, OutOfMemory>;

    /// Free command buffer.
    ///
    /// # Safety
    ///
    /// Command buffer must not be pending execution.
    unsafe fn free_command_buffer(&self, family: QueueFamilyId, buffer: Self::CommandBuffer);

    /// Reset command buffer and begin recording.
    ///
    /// # Safety
    ///
    /// Command buffer must not be pending execution.
    unsafe fn begin(&self, buffer: &mut Self::CommandBuffer);

    /// Finish recording.
    ///
    /// # Safety
    ///
    /// Command buffer must be in recording state.
    unsafe fn finish(&self, buffer: &mut Self::CommandBuffer);

    /// Record pipeline barrier command.
    ///
    /// # Safety
    ///
    /// Command buffer must be in recording state.
    unsafe fn pipeline_barrier(&self, buffer: &mut Self::CommandBuffer, batch: &BarrierBatch);

    /// Submit work to the hardware queue.
    ///
    /// # Safety
    ///
    /// Command buffer must be finished.
    /// Semaphores must not be destroyed until submission retires.
    unsafe fn submit(&self, queue: QueueId, submission: Submission<'_, Self>)
        -> Result<(), DeviceLost>;

    /// Get completed value of the counting semaphore.
    fn timeline_value(&self, timeline: &Self::Timeline) -> Result<u64, DeviceLost>;

    /// Block until counting semaphore reaches `value` or `timeout_ns` passes.
    /// Returns `false` on timeout.
    fn wait_timeline(
        &self,
        timeline: &Self::Timeline,
        value: u64,
        timeout_ns: u64,
    ) -> Result<bool, DeviceLost>;

    /// Block until every queue is idle.
    fn wait_idle(&self) -> Result<(), DeviceLost>;
}

/// Single wait operation of a submission.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub enum Wait<'a, D: Device> {
    /// Wait until counting semaphore reaches the value.
    Timeline(&'a D::Timeline, u64, PipelineStage),

    /// Wait for binary semaphore to be signaled.
    Semaphore(&'a D::Semaphore, PipelineStage),
}

/// Submission description passed to the device.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Submission<'a, D: Device> {
    /// Command buffer to execute. Or nothing for signal-only submission.
    pub command_buffer: Option<&'a D::CommandBuffer>,

    /// Operations to wait before execution starts.
    pub waits: SmallVec<[Wait<'a, D>; MAX_SUBMISSION_WAITS]>,

    /// Counting semaphore to advance to the value when submission retires.
    pub timeline_signal: Option<(&'a D::Timeline, u64)>,

    /// Binary semaphore to signal when submission retires.
    pub semaphore_signal: Option<&'a D::Semaphore>,

    /// Stages that must complete before signal operations.
    pub signal_stages: PipelineStage,
}
