//! Syncline's top level crate.
//! Reexports all others.
//!
//! Render passes record every access they are about to perform into the
//! `BarrierHandler` of the queue they record for, flush resolved barriers at
//! command buffer boundaries and declare cross-queue dependencies through
//! `QueueSet`. `QueueSet::prune` runs once per retired frame.

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

#[cfg(feature = "chain")]
#[doc(inline)]
pub use syncline_chain as chain;

#[cfg(feature = "command")]
#[doc(inline)]
pub use syncline_command as command;

#[doc(inline)]
pub use syncline_core::hal;
