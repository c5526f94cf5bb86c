use crate::{
    barrier::BarrierBatch,
    record::{AccessRecord, Owner, State},
    region::{ImageRegion, Region},
    resource::{Buffer, Image, Resource},
    table::HazardTable,
    Id,
};
use std::ops::Range;
use syncline_core::hal::{self, pso::PipelineStage, queue::QueueFamilyId};
use thread_profiler::profile_scope;

bitflags::bitflags! {
    /// Options for a single `record_*` call.
    pub struct RecordFlags: u32 {
        /// Update bookkeeping without emitting barriers.
        /// E.g. first use of a freshly created resource.
        const NO_BARRIER = 0x1;

        /// Resource is shared by all families and needs no ownership transfer.
        const CONCURRENT = 0x2;
    }
}

/// Config for `BarrierHandler`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandlerConfig {
    /// Number of `prune` calls without access after which resource state is forgotten.
    pub prune_delay: u64,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        HandlerConfig { prune_delay: 2 }
    }
}

/// Tracks accesses to resources performed by one queue
/// and accumulates barriers required to keep them ordered.
#[derive(Debug)]
pub struct BarrierHandler {
    family: QueueFamilyId,
    buffers: HazardTable<Buffer>,
    images: HazardTable<Image>,
    pending: BarrierBatch,
    generation: u64,
    prune_delay: u64,
}

impl BarrierHandler {
    /// Create handler for queue of the family.
    pub fn new(family: QueueFamilyId, config: HandlerConfig) -> Self {
        assert!(config.prune_delay > 0, "Prune delay must be non-zero");
        BarrierHandler {
            family,
            buffers: HazardTable::new(),
            images: HazardTable::new(),
            pending: BarrierBatch::new(),
            generation: 0,
            prune_delay: config.prune_delay,
        }
    }

    /// Family of the queue this handler tracks.
    pub fn family(&self) -> QueueFamilyId {
        self.family
    }

    /// Current generation. Advanced by `prune`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check if there are barriers waiting for `resolve`.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn owner(&self, flags: RecordFlags) -> Owner {
        if flags.contains(RecordFlags::CONCURRENT) {
            Owner::Concurrent
        } else {
            Owner::Exclusive(self.family)
        }
    }

    /// Register access to the buffer range.
    pub fn record_buffer(
        &mut self,
        id: Id,
        range: Range<u64>,
        stages: PipelineStage,
        access: hal::buffer::Access,
        flags: RecordFlags,
    ) {
        if range.start >= range.end {
            log::trace!("Ignore empty range {:?} of buffer {:?}", range, id);
            return;
        }

        let claim = AccessRecord::new(range, State::new(stages, access, ()), self.owner(flags));
        let pending = &mut self.pending;
        if flags.contains(RecordFlags::NO_BARRIER) {
            self.buffers.record(id, claim, self.generation, |_, _| ());
        } else {
            self.buffers.record(id, claim, self.generation, |barrier, stages| {
                pending.push_buffer(barrier, stages)
            });
        }
    }

    /// Register access to the image region.
    pub fn record_image(
        &mut self,
        id: Id,
        region: ImageRegion,
        stages: PipelineStage,
        access: hal::image::Access,
        layout: hal::image::Layout,
        flags: RecordFlags,
    ) {
        if region.is_empty() {
            log::trace!("Ignore empty region {:?} of image {:?}", region, id);
            return;
        }

        let claim = AccessRecord::new(region, State::new(stages, access, layout), self.owner(flags));
        let pending = &mut self.pending;
        if flags.contains(RecordFlags::NO_BARRIER) {
            self.images.record(id, claim, self.generation, |_, _| ());
        } else {
            self.images.record(id, claim, self.generation, |barrier, stages| {
                pending.push_image(barrier, stages)
            });
        }
    }

    /// Take accumulated barriers.
    /// Returns `None` if there is nothing to synchronize.
    pub fn resolve(&mut self) -> Option<BarrierBatch> {
        if self.pending.is_empty() {
            return None;
        }

        profile_scope!("resolve");
        let batch = std::mem::replace(&mut self.pending, BarrierBatch::new());
        log::trace!(
            "Resolved {} buffer and {} image barriers, stages {:?}",
            batch.buffers.len(),
            batch.images.len(),
            batch.stages
        );
        Some(batch)
    }

    /// Advance generation and forget resources not touched for configured number of generations.
    /// Returns number of evicted resources.
    pub fn prune(&mut self) -> usize {
        profile_scope!("prune");
        self.generation += 1;
        let evicted = self.buffers.prune(self.generation, self.prune_delay)
            + self.images.prune(self.generation, self.prune_delay);
        if evicted > 0 {
            log::debug!(
                "Family {:?} generation {}: evicted {} resources",
                self.family,
                self.generation,
                evicted
            );
        }
        evicted
    }

    /// Leave placeholders for every tracked resource in `target`.
    /// The next access `target` records to any of them is guaranteed to produce a barrier.
    ///
    /// Resources keep their age. A transfer never makes a resource look recently used.
    pub fn transfer_records(&self, target: &mut BarrierHandler) {
        profile_scope!("transfer_records");
        transfer(
            &self.buffers,
            self.generation,
            self.family,
            &mut target.buffers,
            target.generation,
        );
        transfer(
            &self.images,
            self.generation,
            self.family,
            &mut target.images,
            target.generation,
        );
        log::debug!(
            "Transferred {} buffers and {} images from family {:?} to {:?}",
            self.buffers.len(),
            self.images.len(),
            self.family,
            target.family
        );
    }

    /// Check if buffer is tracked.
    pub fn is_buffer_tracked(&self, id: Id) -> bool {
        self.buffers.contains(id)
    }

    /// Check if image is tracked.
    pub fn is_image_tracked(&self, id: Id) -> bool {
        self.images.contains(id)
    }

    /// Records of the buffer. In no particular order.
    pub fn buffer_records(&self, id: Id) -> impl Iterator<Item = &AccessRecord<Buffer>> + '_ {
        self.buffers.chain(id)
    }

    /// Records of the image. In no particular order.
    pub fn image_records(&self, id: Id) -> impl Iterator<Item = &AccessRecord<Image>> + '_ {
        self.images.chain(id)
    }

    /// Number of tracked buffers.
    pub fn tracked_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Number of tracked images.
    pub fn tracked_images(&self) -> usize {
        self.images.len()
    }
}

fn transfer<R: Resource>(
    source: &HazardTable<R>,
    source_generation: u64,
    family: QueueFamilyId,
    target: &mut HazardTable<R>,
    target_generation: u64,
) {
    for (id, record) in source.iter() {
        let age = source
            .stamp(id)
            .map_or(0, |stamp| source_generation.saturating_sub(stamp));
        let stamp = target_generation.saturating_sub(age);

        // Layout of whichever queue touched the resource last wins. Ties go to the source.
        let keep_layout = target.stamp(id).map_or(false, |own| own > stamp);

        // Hardware ownership stays with the last real owner until it is acquired.
        let owner = match record.owner {
            Owner::Exclusive(owner) | Owner::Foreign(owner) => owner,
            Owner::Concurrent => family,
        };
        let placeholder = AccessRecord::placeholder(record.region.clone(), record.state.layout, owner);
        target.place(id, placeholder, stamp, keep_layout);
    }
}
