//! Error module docs.

use syncline_core::hal::queue::QueueFamilyId;

/// Typical memory error - out of available memory.
#[derive(Clone, Copy, Debug, Fail, PartialEq, Eq)]
pub enum OutOfMemory {
    /// Host memory exhausted.
    #[fail(display = "Out of host memory")]
    Host,

    /// Device memory exhausted.
    #[fail(display = "Out of device memory")]
    Device,
}

/// Error that can be returned by some functions
/// indicating that logical device is lost.
/// Those methods on objects created from the device will likely result in this error again.
/// When device is lost user should free all objects created from it and destroy the device.
/// Every timeline value still in flight is invalidated.
#[derive(Clone, Copy, Debug, Fail, PartialEq, Eq)]
#[fail(display = "Device lost. Re-initialization required")]
pub struct DeviceLost;

/// Possible cause of queue set initialization failure.
#[derive(Clone, Copy, Debug, Fail, PartialEq, Eq)]
pub enum InitError {
    /// Device exposes no family capable of graphics.
    #[fail(display = "No queue family supports graphics")]
    NoGraphicsFamily,

    /// Saved selection references family that doesn't exist or lacks capabilities.
    #[fail(display = "Queue family {:?} can't serve as {}", family, role)]
    InvalidFamily {
        /// Family from the selection.
        family: QueueFamilyId,

        /// Role the family was selected for.
        role: &'static str,
    },

    /// Saved selection references queue index the family doesn't have.
    #[fail(display = "Queue family {:?} has no queue with index {}", family, index)]
    InvalidQueueIndex {
        /// Family from the selection.
        family: QueueFamilyId,

        /// Index of the queue.
        index: usize,
    },

    /// Out of either host or device memory.
    #[fail(display = "{}", _0)]
    OutOfMemory(OutOfMemory),
}

impl From<OutOfMemory> for InitError {
    fn from(error: OutOfMemory) -> Self {
        InitError::OutOfMemory(error)
    }
}
