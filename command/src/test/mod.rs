#![allow(dead_code)]


use {
    crate::{
        device::{Device, Submission, Wait},
        error::{DeviceLost, OutOfMemory},
        family::QueueId,
    },
    std::{
        cell::RefCell,
        collections::{HashMap, HashSet},
    },
    syncline_chain::BarrierBatch,
    syncline_core::hal::queue::QueueFamilyId,
};

#[derive(Debug)]
struct MockCommandBuffer {
    id: u64,
    family: QueueFamilyId,
    recording: bool,
}

/// Submission as seen by the device.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Submitted {
    queue: QueueId,
    command_buffer: Option<u64>,
    timeline_waits: Vec<(u64, u64)>,
    semaphore_waits: Vec<u64>,
    timeline_signal: Option<(u64, u64)>,
    semaphore_signal: Option<u64>,
}

#[derive(Debug, Default)]
struct Inner {
    next: u64,
    /// Timeline -> (signaled, completed).
    timelines: HashMap<u64, (u64, u64)>,
    semaphores: HashSet<u64>,
    buffers: HashSet<u64>,
    created_semaphores: usize,
    allocated_buffers: usize,
    submitted: Vec<Submitted>,
    barriers: Vec<(u64, BarrierBatch)>,
    manual: bool,
    lost: bool,
}

impl Inner {
    fn next(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

struct MockDevice(RefCell<Inner>);

impl std::fmt::Debug for MockDevice {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "MockDevice")
    }
}

impl MockDevice {
    /// Device that retires every submission immediately.
    fn new() -> Self {
        let _ = simple_logger::init();
        MockDevice(RefCell::new(Inner::default()))
    }

    /// Device that retires submissions only on `complete`.
    fn manual() -> Self {
        let device = MockDevice::new();
        device.0.borrow_mut().manual = true;
        device
    }

    /// Retire everything submitted so far.
    fn complete(&self) {
        for (signaled, completed) in self.0.borrow_mut().timelines.values_mut() {
            *completed = *signaled;
        }
    }

    fn lose(&self) {
        self.0.borrow_mut().lost = true;
    }

    fn submitted(&self) -> Vec<Submitted> {
        self.0.borrow().submitted.clone()
    }

    fn last_submitted(&self) -> Submitted {
        self.0.borrow().submitted.last().cloned().unwrap()
    }

    fn barriers(&self) -> Vec<(u64, BarrierBatch)> {
        self.0.borrow().barriers.clone()
    }

    fn created_semaphores(&self) -> usize {
        self.0.borrow().created_semaphores
    }

    fn allocated_buffers(&self) -> usize {
        self.0.borrow().allocated_buffers
    }

    fn live_objects(&self) -> usize {
        let inner = self.0.borrow();
        inner.timelines.len() + inner.semaphores.len() + inner.buffers.len()
    }
}

impl Device for MockDevice {
    type CommandBuffer = MockCommandBuffer;
    type Semaphore = u64;
    type Timeline = u64;

    fn create_timeline(&self, initial: u64) -> Result<u64, OutOfMemory> {
        let mut inner = self.0.borrow_mut();
        let id = inner.next();
        inner.timelines.insert(id, (initial, initial));
        Ok(id)
    }

    unsafe fn destroy_timeline(&self, timeline: u64) {
        assert!(self.0.borrow_mut().timelines.remove(&timeline).is_some(), "Double-free");
    }

    fn create_semaphore(&self) -> Result<u64, OutOfMemory> {
        let mut inner = self.0.borrow_mut();
        let id = inner.next();
        inner.semaphores.insert(id);
        inner.created_semaphores += 1;
        Ok(id)
    }

    unsafe fn destroy_semaphore(&self, semaphore: u64) {
        assert!(self.0.borrow_mut().semaphores.remove(&semaphore), "Double-free");
    }

    fn allocate_command_buffer(&self, family: QueueFamilyId) -> Result<MockCommandBuffer, OutOfMemory> {
        let mut inner = self.0.borrow_mut();
        let id = inner.next();
        inner.buffers.insert(id);
        inner.allocated_buffers += 1;
        Ok(MockCommandBuffer {
            id,
            family,
            recording: false,
        })
    }

    unsafe fn free_command_buffer(&self, family: QueueFamilyId, buffer: MockCommandBuffer) {
        assert_eq!(buffer.family, family);
        assert!(self.0.borrow_mut().buffers.remove(&buffer.id), "Double-free");
    }

    unsafe fn begin(&self, buffer: &mut MockCommandBuffer) {
        assert!(!buffer.recording);
        buffer.recording = true;
    }

    unsafe fn finish(&self, buffer: &mut MockCommandBuffer) {
        assert!(buffer.recording);
        buffer.recording = false;
    }

    unsafe fn pipeline_barrier(&self, buffer: &mut MockCommandBuffer, batch: &BarrierBatch) {
        assert!(buffer.recording);
        assert!(!batch.is_empty());
        self.0.borrow_mut().barriers.push((buffer.id, batch.clone()));
    }

    unsafe fn submit(&self, queue: QueueId, submission: Submission<'_, Self>) -> Result<(), DeviceLost> {
        let mut inner = self.0.borrow_mut();
        if inner.lost {
            return Err(DeviceLost);
        }

        let mut submitted = Submitted {
            queue,
            command_buffer: submission.command_buffer.map(|buffer| {
                assert!(!buffer.recording);
                buffer.id
            }),
            timeline_waits: Vec::new(),
            semaphore_waits: Vec::new(),
            timeline_signal: submission.timeline_signal.map(|(&t, v)| (t, v)),
            semaphore_signal: submission.semaphore_signal.cloned(),
        };
        for wait in &submission.waits {
            match *wait {
                Wait::Timeline(&timeline, value, _) => submitted.timeline_waits.push((timeline, value)),
                Wait::Semaphore(&semaphore, _) => submitted.semaphore_waits.push(semaphore),
            }
        }

        if let Some((timeline, value)) = submitted.timeline_signal {
            let manual = inner.manual;
            let state = inner.timelines.get_mut(&timeline).unwrap();
            assert!(value > state.0, "Timeline must increase");
            state.0 = value;
            if !manual {
                state.1 = value;
            }
        }
        inner.submitted.push(submitted);
        Ok(())
    }

    fn timeline_value(&self, timeline: &u64) -> Result<u64, DeviceLost> {
        Ok(self.0.borrow().timelines[timeline].1)
    }

    fn wait_timeline(&self, timeline: &u64, value: u64, _timeout_ns: u64) -> Result<bool, DeviceLost> {
        Ok(self.0.borrow().timelines[timeline].1 >= value)
    }

    fn wait_idle(&self) -> Result<(), DeviceLost> {
        self.complete();
        Ok(())
    }
}
