use crate::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::ops::Range;
use syncline_core::hal::{
    buffer,
    image::{self, Layout},
    pso::PipelineStage,
    queue::QueueFamilyId,
};

const GRAPHICS: QueueFamilyId = QueueFamilyId(0);
const TRANSFER: QueueFamilyId = QueueFamilyId(2);

fn handler(family: QueueFamilyId) -> BarrierHandler {
    BarrierHandler::new(family, HandlerConfig::default())
}

fn read(handler: &mut BarrierHandler, id: Id, range: Range<u64>) {
    handler.record_buffer(
        id,
        range,
        PipelineStage::VERTEX_INPUT,
        buffer::Access::VERTEX_BUFFER_READ,
        RecordFlags::empty(),
    );
}

fn write(handler: &mut BarrierHandler, id: Id, range: Range<u64>) {
    handler.record_buffer(
        id,
        range,
        PipelineStage::TRANSFER,
        buffer::Access::TRANSFER_WRITE,
        RecordFlags::empty(),
    );
}

fn buffer_ranges(handler: &BarrierHandler, id: Id) -> Vec<Range<u64>> {
    let mut ranges: Vec<_> = handler.buffer_records(id).map(|r| r.region.clone()).collect();
    ranges.sort_by_key(|r| r.start);
    ranges
}

#[test]
fn overlapping_reads_merge_without_barriers() {
    let mut h = handler(GRAPHICS);
    let buf = Id(0);
    read(&mut h, buf, 0..64);
    read(&mut h, buf, 32..96);

    assert_eq!(buffer_ranges(&h, buf), vec![0..96]);
    assert!(h.resolve().is_none());
}

#[test]
fn read_after_write_emits_barrier() {
    let mut h = handler(GRAPHICS);
    let buf = Id(0);
    write(&mut h, buf, 0..64);
    assert!(h.resolve().is_none(), "First touch needs no barrier");

    h.record_buffer(
        buf,
        0..64,
        PipelineStage::COMPUTE_SHADER,
        buffer::Access::SHADER_READ,
        RecordFlags::empty(),
    );

    let batch = h.resolve().expect("Barrier expected");
    assert_eq!(batch.buffers.len(), 1);
    assert!(batch.images.is_empty());
    let barrier = &batch.buffers[0];
    assert_eq!(barrier.id, buf);
    assert_eq!(barrier.region, 0..64);
    assert_eq!(barrier.families, None);
    assert_eq!(
        barrier.states,
        (buffer::Access::TRANSFER_WRITE, ())..(buffer::Access::SHADER_READ, ())
    );
    assert_eq!(
        batch.stages,
        PipelineStage::TRANSFER..PipelineStage::COMPUTE_SHADER
    );

    // Batch is cleared by resolve.
    assert!(!h.has_pending());
    assert!(h.resolve().is_none());
}

#[test]
fn transferred_records_force_barrier() {
    let mut source = handler(TRANSFER);
    let mut target = handler(GRAPHICS);
    let buf = Id(3);
    let img = Id(3);

    write(&mut source, buf, 0..256);
    source.record_image(
        img,
        ImageRegion::whole(1, 4),
        PipelineStage::TRANSFER,
        image::Access::TRANSFER_WRITE,
        Layout::TransferDstOptimal,
        RecordFlags::empty(),
    );
    source.transfer_records(&mut target);
    assert!(!target.has_pending(), "Transfer itself emits nothing");
    assert!(target.buffer_records(buf).all(AccessRecord::is_placeholder));

    // Read-only access that would not conflict with anything still gets a barrier.
    read(&mut target, buf, 0..16);
    target.record_image(
        img,
        ImageRegion::whole(1, 4),
        PipelineStage::FRAGMENT_SHADER,
        image::Access::SHADER_READ,
        Layout::ShaderReadOnlyOptimal,
        RecordFlags::empty(),
    );

    let batch = target.resolve().expect("Ownership transfer expected");
    assert_eq!(batch.buffers.len(), 1);
    assert_eq!(batch.buffers[0].families, Some(TRANSFER..GRAPHICS));
    assert_eq!(batch.buffers[0].region, 0..256);
    assert_eq!(batch.images.len(), 1);
    assert_eq!(batch.images[0].families, Some(TRANSFER..GRAPHICS));
    assert_eq!(
        batch.images[0].states,
        (image::Access::empty(), Layout::TransferDstOptimal)
            ..(image::Access::SHADER_READ, Layout::ShaderReadOnlyOptimal)
    );
    assert_eq!(batch.stages.start, PipelineStage::TOP_OF_PIPE);

    // Source keeps its own view.
    assert!(source.buffer_records(buf).all(|r| !r.is_placeholder()));

    // Second access is ordinary.
    read(&mut target, buf, 0..16);
    assert!(target.resolve().is_none());
}

#[test]
fn transfer_of_untouched_placeholder_keeps_original_owner() {
    let mut a = handler(TRANSFER);
    let mut b = handler(QueueFamilyId(1));
    let mut c = handler(GRAPHICS);
    let buf = Id(9);

    write(&mut a, buf, 0..32);
    a.transfer_records(&mut b);
    b.transfer_records(&mut c);

    read(&mut c, buf, 0..32);
    let batch = c.resolve().expect("Ownership transfer expected");
    assert_eq!(batch.buffers[0].families, Some(TRANSFER..GRAPHICS));
}

#[test]
fn transfer_keeps_target_accesses_outside_source_range() {
    let mut source = handler(TRANSFER);
    let mut target = handler(GRAPHICS);
    let buf = Id(6);

    target.record_buffer(
        buf,
        0..128,
        PipelineStage::COMPUTE_SHADER,
        buffer::Access::SHADER_WRITE,
        RecordFlags::empty(),
    );
    write(&mut source, buf, 0..64);
    source.transfer_records(&mut target);
    assert_eq!(buffer_ranges(&target, buf), vec![0..64, 64..128]);

    // Part the source never touched is still target's own write.
    target.record_buffer(
        buf,
        96..128,
        PipelineStage::FRAGMENT_SHADER,
        buffer::Access::SHADER_READ,
        RecordFlags::empty(),
    );
    let batch = target.resolve().expect("Read after write must be ordered");
    assert_eq!(batch.buffers.len(), 1);
    let barrier = &batch.buffers[0];
    assert_eq!(barrier.region, 64..128);
    assert_eq!(barrier.families, None);
    assert_eq!(
        barrier.states,
        (buffer::Access::SHADER_WRITE, ())..(buffer::Access::SHADER_READ, ())
    );
    assert_eq!(batch.stages.start, PipelineStage::COMPUTE_SHADER);

    // Shared part is acquired and still waits for target's own write.
    target.record_buffer(
        buf,
        0..32,
        PipelineStage::FRAGMENT_SHADER,
        buffer::Access::SHADER_READ,
        RecordFlags::empty(),
    );
    let batch = target.resolve().expect("Ownership transfer expected");
    assert_eq!(batch.buffers.len(), 1);
    let barrier = &batch.buffers[0];
    assert_eq!(barrier.region, 0..64);
    assert_eq!(barrier.families, Some(TRANSFER..GRAPHICS));
    assert!(barrier.states.start.0.contains(buffer::Access::SHADER_WRITE));
    assert!(batch.stages.start.contains(PipelineStage::COMPUTE_SHADER));
}

#[test]
fn transfer_keeps_target_image_layouts_outside_source_region() {
    let mut source = handler(TRANSFER);
    let mut target = handler(GRAPHICS);
    let img = Id(7);

    target.record_image(
        img,
        ImageRegion::whole(1, 4),
        PipelineStage::COMPUTE_SHADER,
        image::Access::SHADER_WRITE,
        Layout::General,
        RecordFlags::empty(),
    );
    source.record_image(
        img,
        ImageRegion::single(0, 0),
        PipelineStage::TRANSFER,
        image::Access::TRANSFER_WRITE,
        Layout::TransferDstOptimal,
        RecordFlags::empty(),
    );
    source.transfer_records(&mut target);

    let mut records: Vec<_> = target.image_records(img).cloned().collect();
    records.sort_by_key(|r| r.region.levels.start);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].region, ImageRegion::single(0, 0));
    assert!(records[0].is_placeholder());
    assert_eq!(records[0].state.layout, Layout::TransferDstOptimal);
    assert_eq!(records[1].region, ImageRegion::new(0..1, 1..4));
    assert_eq!(records[1].owner, Owner::Exclusive(GRAPHICS));
    assert_eq!(records[1].state.layout, Layout::General);

    target.record_image(
        img,
        ImageRegion::single(0, 2),
        PipelineStage::FRAGMENT_SHADER,
        image::Access::SHADER_READ,
        Layout::ShaderReadOnlyOptimal,
        RecordFlags::empty(),
    );
    let batch = target.resolve().expect("Layout transition expected");
    assert_eq!(batch.images.len(), 1);
    assert_eq!(batch.images[0].region, ImageRegion::new(0..1, 1..4));
    assert_eq!(batch.images[0].families, None);
    assert_eq!(
        batch.images[0].states,
        (image::Access::SHADER_WRITE, Layout::General)
            ..(image::Access::SHADER_READ, Layout::ShaderReadOnlyOptimal)
    );
    assert_eq!(batch.stages.start, PipelineStage::COMPUTE_SHADER);
}

#[test]
fn stale_transfer_keeps_fresher_target_layout() {
    let mut source = handler(TRANSFER);
    let mut target = handler(GRAPHICS);
    let img = Id(8);

    source.record_image(
        img,
        ImageRegion::whole(1, 1),
        PipelineStage::TRANSFER,
        image::Access::TRANSFER_WRITE,
        Layout::TransferDstOptimal,
        RecordFlags::empty(),
    );
    source.prune();
    target.prune();

    target.record_image(
        img,
        ImageRegion::whole(1, 1),
        PipelineStage::FRAGMENT_SHADER,
        image::Access::SHADER_READ,
        Layout::ShaderReadOnlyOptimal,
        RecordFlags::empty(),
    );
    source.transfer_records(&mut target);

    let records: Vec<_> = target.image_records(img).collect();
    assert_eq!(records.len(), 1);
    assert!(records[0].is_placeholder());
    assert_eq!(records[0].state.layout, Layout::ShaderReadOnlyOptimal);
}

#[test]
fn transfers_in_both_directions_do_not_keep_resources_alive() {
    let mut graphics = handler(GRAPHICS);
    let mut compute = handler(QueueFamilyId(1));
    let stale = Id(10);
    let live = Id(11);
    write(&mut graphics, stale, 0..64);

    for frame in 1..=10 {
        write(&mut graphics, live, 0..64);
        graphics.resolve();

        graphics.transfer_records(&mut compute);
        compute.transfer_records(&mut graphics);
        graphics.prune();
        compute.prune();

        let tracked = graphics.is_buffer_tracked(stale) || compute.is_buffer_tracked(stale);
        assert_eq!(tracked, frame < 2, "frame {}", frame);
        assert!(graphics.is_buffer_tracked(live) && compute.is_buffer_tracked(live));
    }
}

#[test]
fn disjoint_records_do_not_merge_across_gaps() {
    let mut h = handler(GRAPHICS);
    let buf = Id(1);
    for i in 0..16u64 {
        read(&mut h, buf, i * 32..i * 32 + 16);
    }
    assert_eq!(h.buffer_records(buf).count(), 16);
    assert!(h.resolve().is_none());
}

#[test]
fn included_read_is_noop() {
    let mut h = handler(GRAPHICS);
    let buf = Id(1);
    read(&mut h, buf, 0..128);
    read(&mut h, buf, 16..48);
    assert_eq!(buffer_ranges(&h, buf), vec![0..128]);
    assert!(h.resolve().is_none());
}

#[test]
fn write_after_write_emits_barrier() {
    let mut h = handler(GRAPHICS);
    let buf = Id(1);
    write(&mut h, buf, 0..128);
    write(&mut h, buf, 16..48);
    let batch = h.resolve().expect("Write after write must be ordered");
    assert_eq!(batch.buffers[0].region, 0..128);
    assert_eq!(buffer_ranges(&h, buf), vec![0..128]);
}

#[test]
fn no_barrier_flag_only_updates_bookkeeping() {
    let mut h = handler(GRAPHICS);
    let buf = Id(1);
    write(&mut h, buf, 0..64);
    h.record_buffer(
        buf,
        0..64,
        PipelineStage::TRANSFER,
        buffer::Access::TRANSFER_READ,
        RecordFlags::NO_BARRIER,
    );
    assert!(h.resolve().is_none());

    let records: Vec<_> = h.buffer_records(buf).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].state.access, buffer::Access::TRANSFER_READ);
}

#[test]
fn concurrent_records_need_no_ownership_transfer() {
    let mut source = handler(TRANSFER);
    let mut target = handler(GRAPHICS);
    let buf = Id(5);
    write(&mut source, buf, 0..64);
    source.transfer_records(&mut target);
    target.record_buffer(
        buf,
        0..64,
        PipelineStage::VERTEX_INPUT,
        buffer::Access::VERTEX_BUFFER_READ,
        RecordFlags::CONCURRENT,
    );
    let batch = target.resolve().expect("Barrier expected");
    assert_eq!(batch.buffers[0].families, None);
    assert_eq!(target.buffer_records(buf).next().map(|r| r.owner), Some(Owner::Concurrent));
}

#[test]
fn empty_ranges_are_ignored() {
    let mut h = handler(GRAPHICS);
    write(&mut h, Id(1), 8..8);
    h.record_image(
        Id(1),
        ImageRegion::new(0..0, 0..1),
        PipelineStage::TRANSFER,
        image::Access::TRANSFER_WRITE,
        Layout::TransferDstOptimal,
        RecordFlags::empty(),
    );
    assert!(!h.is_buffer_tracked(Id(1)));
    assert!(!h.is_image_tracked(Id(1)));
}

#[test]
fn image_layout_change_splits_reads() {
    let mut h = handler(GRAPHICS);
    let img = Id(2);
    let sampled = State::for_image_access(PipelineStage::FRAGMENT_SHADER, image::Access::SHADER_READ);
    assert_eq!(sampled.layout, Layout::ShaderReadOnlyOptimal);

    h.record_image(
        img,
        ImageRegion::whole(1, 4),
        sampled.stages,
        sampled.access,
        sampled.layout,
        RecordFlags::empty(),
    );
    // Read in another layout still requires a transition.
    h.record_image(
        img,
        ImageRegion::single(0, 0),
        PipelineStage::COMPUTE_SHADER,
        image::Access::SHADER_READ,
        Layout::General,
        RecordFlags::empty(),
    );

    let batch = h.resolve().expect("Layout transition expected");
    assert_eq!(batch.images.len(), 1);
    assert_eq!(batch.images[0].region, ImageRegion::whole(1, 4));
    assert_eq!(
        batch.images[0].states,
        (image::Access::SHADER_READ, Layout::ShaderReadOnlyOptimal)
            ..(image::Access::SHADER_READ, Layout::General)
    );
}

#[test]
fn mip_chain_generation_merges_levels() {
    let mut h = handler(GRAPHICS);
    let img = Id(4);
    for level in 0..6 {
        h.record_image(
            img,
            ImageRegion::single(0, level),
            PipelineStage::TRANSFER,
            image::Access::TRANSFER_WRITE,
            Layout::TransferDstOptimal,
            RecordFlags::empty(),
        );
    }
    assert!(h.resolve().is_none());
    let records: Vec<_> = h.image_records(img).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].region, ImageRegion::new(0..1, 0..6));
}

#[test]
fn prune_evicts_after_delay() {
    let mut h = BarrierHandler::new(GRAPHICS, HandlerConfig { prune_delay: 3 });
    let stale = Id(1);
    let live = Id(2);
    write(&mut h, stale, 0..64);
    write(&mut h, live, 0..64);

    for _ in 0..2 {
        assert_eq!(h.prune(), 0);
        read(&mut h, live, 0..64);
        h.resolve();
    }
    assert!(h.is_buffer_tracked(stale));
    assert_eq!(h.prune(), 1);
    assert!(!h.is_buffer_tracked(stale));
    assert!(h.is_buffer_tracked(live));
    assert_eq!(h.generation(), 3);

    // Evicted resource is first touch again.
    read(&mut h, stale, 0..64);
    assert!(h.resolve().is_none());
}

#[test]
fn prune_with_default_delay() {
    let mut h = handler(GRAPHICS);
    write(&mut h, Id(1), 0..64);
    h.prune();
    assert_eq!(h.tracked_buffers(), 1);
    h.prune();
    assert_eq!(h.tracked_buffers(), 0);
}

#[test]
#[should_panic]
fn barrier_window_overflow_is_fatal() {
    let mut h = handler(GRAPHICS);
    for i in 0..=MAX_BARRIERS {
        write(&mut h, Id(i), 0..4);
        write(&mut h, Id(i), 0..4);
    }
}

#[test]
#[should_panic]
fn record_exhaustion_is_fatal() {
    let mut h = handler(GRAPHICS);
    for i in 0..=MAX_RECORDS as u64 {
        read(&mut h, Id(0), i * 2..i * 2 + 1);
    }
}

/// Random accesses to one buffer.
/// Checks that chain stays a partition and every write hazard is reported.
#[test]
fn random_accesses_keep_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut h = handler(GRAPHICS);
    let buf = Id(11);

    for _ in 0..2000 {
        let start = rng.gen_range(0, 240u64);
        let end = rng.gen_range(start + 1, 256u64);
        let is_write = rng.gen_range(0, 4) == 0;
        let (stages, access) = if is_write {
            (PipelineStage::COMPUTE_SHADER, buffer::Access::SHADER_WRITE)
        } else if rng.gen() {
            (PipelineStage::VERTEX_INPUT, buffer::Access::VERTEX_BUFFER_READ)
        } else {
            (PipelineStage::FRAGMENT_SHADER, buffer::Access::SHADER_READ)
        };

        let hazards: Vec<AccessRecord<Buffer>> = h
            .buffer_records(buf)
            .filter(|r| r.region.overlaps(&(start..end)))
            .filter(|r| is_write || r.state.exclusive())
            .cloned()
            .collect();

        h.record_buffer(buf, start..end, stages, access, RecordFlags::empty());
        let batch = h.resolve();

        if hazards.is_empty() {
            assert!(batch.is_none());
        } else {
            let batch = batch.expect("Hazard must produce barrier");
            assert!(batch.stages.end.contains(stages));
            for hazard in &hazards {
                assert!(batch.stages.start.contains(hazard.state.stages));
                assert!(batch.buffers.iter().any(|b| {
                    Region::contains(&b.region, &hazard.region)
                        && b.states.start.0 == hazard.state.access
                        && b.states.end.0.contains(access)
                }));
            }
        }

        let records: Vec<_> = h.buffer_records(buf).cloned().collect();
        for (i, a) in records.iter().enumerate() {
            for b in &records[i + 1..] {
                assert!(!a.region.overlaps(&b.region), "{:?} overlaps {:?}", a, b);
            }
        }
        let covering: Vec<_> = records
            .iter()
            .filter(|r| Region::contains(&r.region, &(start..end)))
            .collect();
        assert_eq!(covering.len(), 1);
        assert!(covering[0].state.access.contains(access));
    }
}
