use syncline_core::hal::pso::PipelineStage;

/// Number of logical queues.
pub const QUEUE_ROLE_COUNT: usize = 4;

/// Logical queue used by render passes.
/// Several roles may be served by one hardware queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueueRole {
    /// Draws.
    Graphics,

    /// Presents swapchain images.
    Present,

    /// Async compute.
    Compute,

    /// Uploads and copies.
    Transfer,
}

impl QueueRole {
    /// All roles in index order.
    pub const ALL: [QueueRole; QUEUE_ROLE_COUNT] = [
        QueueRole::Graphics,
        QueueRole::Present,
        QueueRole::Compute,
        QueueRole::Transfer,
    ];

    /// Index of the role in per-role arrays.
    pub fn index(self) -> usize {
        match self {
            QueueRole::Graphics => 0,
            QueueRole::Present => 1,
            QueueRole::Compute => 2,
            QueueRole::Transfer => 3,
        }
    }

    /// Human readable name.
    pub fn name(self) -> &'static str {
        match self {
            QueueRole::Graphics => "graphics",
            QueueRole::Present => "present",
            QueueRole::Compute => "compute",
            QueueRole::Transfer => "transfer",
        }
    }

    /// Stages of work submitted to this role that wait for other queues
    /// unless the caller asks for something narrower.
    pub fn wait_stages(self) -> PipelineStage {
        match self {
            QueueRole::Graphics | QueueRole::Compute => PipelineStage::all(),
            QueueRole::Present => PipelineStage::COLOR_ATTACHMENT_OUTPUT,
            QueueRole::Transfer => PipelineStage::TRANSFER,
        }
    }
}
