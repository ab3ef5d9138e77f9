use thiserror::Error;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// Failures reported by a [`GpuDevice`](super::GpuDevice).
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to create shader module `{label}`: {reason}")]
    ShaderModule { label: String, reason: String },

    #[error("failed to create pipeline `{label}`: {reason}")]
    Pipeline { label: String, reason: String },

    #[error("failed to create descriptor set layout: {0}")]
    DescriptorSetLayout(String),

    #[error("failed to create pipeline layout: {0}")]
    PipelineLayout(String),

    #[error("failed to allocate descriptor set: {0}")]
    DescriptorSetAllocation(String),

    #[error("failed to allocate a {size}-byte buffer")]
    BufferAllocation { size: u64 },

    #[error("failed to create texture `{label}`: {reason}")]
    Texture { label: String, reason: String },

    /// The surface could not provide an image this frame.
    #[error("frame skipped ({0:?})")]
    FrameSkipped(SurfaceErrorAction),

    #[error("surface out of memory")]
    OutOfMemory,

    #[error("no frame is being recorded")]
    NoFrame,
}

impl DeviceError {
    /// Returns `true` when the failure only affects the current frame.
    pub fn is_transient(&self) -> bool {
        matches!(self, DeviceError::FrameSkipped(_))
    }
}

impl From<SurfaceErrorAction> for DeviceError {
    fn from(action: SurfaceErrorAction) -> Self {
        match action {
            SurfaceErrorAction::Fatal => DeviceError::OutOfMemory,
            other => DeviceError::FrameSkipped(other),
        }
    }
}
