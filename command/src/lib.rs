//! Logical queues on top of hardware queues.
//!
//! Every queue advances its own counting semaphore by one per submission.
//! Cross-queue ordering is declared with `QueueSet::sync`, `QueueSet::wait` and
//! `QueueSet::transfer` which also decide whether hazard tracking follows the work.

#![forbid(overflowing_literals)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(path_statements)]
#![deny(trivial_bounds)]
#![deny(type_alias_bounds)]
#![deny(unconditional_recursion)]
#![deny(while_true)]
#![deny(bad_style)]
#![deny(future_incompatible)]
#![warn(rust_2018_compatibility)]
#![warn(rust_2018_idioms)]
#![allow(unused_unsafe)]

#[macro_use]
extern crate failure;

mod config;
mod device;
mod error;
mod family;
mod fence;
mod queue;
mod role;
mod semaphore;
mod set;

pub use crate::{
    config::{Config, DedicatedQueues, QueueSelection, QueuesConfigure, SavedQueueConfig},
    device::{Device, Submission, Wait, MAX_SUBMISSION_WAITS},
    error::{DeviceLost, InitError, OutOfMemory},
    family::{FamilyProperties, QueueId},
    fence::FenceRef,
    queue::{Queue, MAX_IDLE_COMMAND_BUFFERS},
    role::{QueueRole, QUEUE_ROLE_COUNT},
    semaphore::{SemaphoreRing, SEMAPHORE_RING_SIZE},
    set::QueueSet,
};

#[cfg(test)]
mod test;
