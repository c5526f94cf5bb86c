use crate::{
    resource::{Buffer, Image, Resource},
    Id, MAX_BARRIERS,
};
use std::ops::Range;
use syncline_core::hal::{pso::PipelineStage, queue::QueueFamilyId};

/// Pipeline barrier info.
#[derive(Clone, Debug)]
pub struct Barrier<R: Resource> {
    /// Resource the barrier applies to.
    pub id: Id,

    /// Part of the resource.
    pub region: R::Region,

    /// `Some` families for ownership transfer. Or `None`.
    pub families: Option<Range<QueueFamilyId>>,

    /// State transition.
    pub states: Range<(R::Access, R::Layout)>,
}

/// Barrier for a buffer range.
pub type BufferBarrier = Barrier<Buffer>;

/// Barrier for an image region.
pub type ImageBarrier = Barrier<Image>;

/// Barriers accumulated between two resolves.
/// Recorded as a single pipeline barrier command.
#[derive(Clone, Debug)]
pub struct BarrierBatch {
    /// Union of source stages .. union of destination stages.
    pub stages: Range<PipelineStage>,

    /// Buffer barriers.
    pub buffers: Vec<BufferBarrier>,

    /// Image barriers.
    pub images: Vec<ImageBarrier>,
}

impl Default for BarrierBatch {
    fn default() -> Self {
        BarrierBatch::new()
    }
}

impl BarrierBatch {
    /// Create empty batch.
    pub fn new() -> Self {
        BarrierBatch {
            stages: PipelineStage::empty()..PipelineStage::empty(),
            buffers: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Check if batch has no barriers.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty() && self.images.is_empty()
    }

    fn add_stages(&mut self, stages: Range<PipelineStage>) {
        self.stages.start |= stages.start;
        self.stages.end |= stages.end;
    }

    pub(crate) fn push_buffer(&mut self, barrier: BufferBarrier, stages: Range<PipelineStage>) {
        assert!(
            self.buffers.len() < MAX_BARRIERS,
            "Too many buffer barriers in one resolve window (MAX_BARRIERS = {})",
            MAX_BARRIERS
        );
        self.add_stages(stages);
        self.buffers.push(barrier);
    }

    pub(crate) fn push_image(&mut self, barrier: ImageBarrier, stages: Range<PipelineStage>) {
        assert!(
            self.images.len() < MAX_BARRIERS,
            "Too many image barriers in one resolve window (MAX_BARRIERS = {})",
            MAX_BARRIERS
        );
        self.add_stages(stages);
        self.images.push(barrier);
    }
}
