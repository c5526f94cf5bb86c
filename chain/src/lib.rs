//! This crate tracks accesses to GPU resources performed by a queue
//! and derives the barriers required to keep them ordered.
//!
//! Each queue owns a `BarrierHandler`. Render passes `record_*` every access
//! they are about to perform, `resolve` pending barriers at command buffer
//! boundaries and `prune` once per retired frame.

#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

/// Unique resource id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(pub usize);

/// Maximum number of live access records per resource kind in one handler.
pub const MAX_RECORDS: usize = 4096;

/// Maximum number of tracked resources per resource kind in one handler.
pub const MAX_RESOURCES: usize = 2048;

/// Maximum number of barriers per resource kind between two resolves.
pub const MAX_BARRIERS: usize = 512;

mod access;
mod barrier;
mod handler;
mod pool;
mod record;
mod region;
mod resource;
mod table;

pub use crate::{
    access::AccessFlags,
    barrier::{Barrier, BarrierBatch, BufferBarrier, ImageBarrier},
    handler::{BarrierHandler, HandlerConfig, RecordFlags},
    record::{AccessRecord, Overlap, Owner, State},
    region::{ImageRegion, Region},
    resource::{Buffer, Image, Resource},
};

#[cfg(test)]
mod tests;
