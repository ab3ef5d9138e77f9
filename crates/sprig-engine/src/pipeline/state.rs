//! Fixed-function pipeline state and the description handed to the device.

use crate::device::{Extent2D, GpuDevice, VertexAttributeDesc, VertexBindingDesc};

/// Shader entry point shared by both stages.
pub const ENTRY_POINT: &str = "main";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PrimitiveTopology {
    TriangleList,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrontFace {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlendOp {
    Add,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlendComponent {
    pub src: BlendFactor,
    pub dst: BlendFactor,
    pub op: BlendOp,
}

impl BlendComponent {
    pub const REPLACE: Self = Self {
        src: BlendFactor::One,
        dst: BlendFactor::Zero,
        op: BlendOp::Add,
    };

    pub const OVER: Self = Self {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
        op: BlendOp::Add,
    };
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlendState {
    pub color: BlendComponent,
    pub alpha: BlendComponent,
}

impl BlendState {
    /// Alpha-over for transparent pipelines, plain replacement otherwise.
    /// The alpha channel is always written as-is.
    pub fn for_mode(transparent: bool) -> Self {
        Self {
            color: if transparent {
                BlendComponent::OVER
            } else {
                BlendComponent::REPLACE
            },
            alpha: BlendComponent::REPLACE,
        }
    }

    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.color == BlendComponent::OVER
    }
}

/// Everything about a pipeline that is not shader code or layout.
///
/// Viewport and scissor are baked to `extent`; pipelines are not
/// dynamic-viewport capable and must be rebuilt when the framebuffer changes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FixedFunctionState {
    pub topology: PrimitiveTopology,
    pub primitive_restart: bool,
    pub extent: Extent2D,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub depth_test: bool,
    pub samples: u32,
    pub write_all_channels: bool,
    pub blend: BlendState,
}

impl FixedFunctionState {
    pub fn sprite(extent: Extent2D, transparent: bool) -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            primitive_restart: false,
            extent,
            cull_mode: CullMode::None,
            front_face: FrontFace::Clockwise,
            depth_test: false,
            samples: 1,
            write_all_channels: true,
            blend: BlendState::for_mode(transparent),
        }
    }
}

/// Complete description of a two-stage graphics pipeline.
pub struct PipelineDesc<'a, B: GpuDevice> {
    pub label: &'a str,
    pub vertex: &'a B::ShaderModule,
    pub fragment: &'a B::ShaderModule,
    pub entry_point: &'a str,
    pub vertex_bindings: &'a [VertexBindingDesc],
    pub vertex_attributes: &'a [VertexAttributeDesc],
    pub layout: &'a B::PipelineLayout,
    pub state: FixedFunctionState,
}
