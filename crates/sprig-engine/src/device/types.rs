//! Backend-neutral descriptions exchanged with a [`GpuDevice`](super::GpuDevice).

use bitflags::bitflags;

use super::GpuDevice;

/// Framebuffer size in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Direction of +Y in the device's normalized device coordinates.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NdcYAxis {
    /// Vulkan convention: -1 is the top edge.
    Down,
    /// GL / wgpu convention: +1 is the top edge.
    Up,
}

/// Address mode of the device-owned samplers.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SamplerMode {
    Clamp,
    Repeat,
}

impl SamplerMode {
    #[inline]
    pub fn from_repeat(repeat: bool) -> Self {
        if repeat { SamplerMode::Repeat } else { SamplerMode::Clamp }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferUsage {
    /// Host-writable uniform storage, rewritten every frame.
    Uniform,
    Vertex,
    Index,
}

bitflags! {
    /// Shader stages a binding is visible to.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct ShaderStages: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DescriptorKind {
    UniformBuffer,
    CombinedImageSampler,
}

/// One slot of a descriptor set layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DescriptorBinding {
    pub binding: u32,
    pub kind: DescriptorKind,
    pub stages: ShaderStages,
    /// Always 1: descriptor arrays are not supported.
    pub count: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
}

impl VertexFormat {
    #[inline]
    pub const fn components(self) -> u32 {
        match self {
            VertexFormat::Float32 => 1,
            VertexFormat::Float32x2 => 2,
            VertexFormat::Float32x3 => 3,
            VertexFormat::Float32x4 => 4,
        }
    }

    #[inline]
    pub const fn size(self) -> u32 {
        self.components() * 4
    }
}

/// Per-buffer vertex input description. Input rate is always per-vertex.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexBindingDesc {
    pub binding: u32,
    pub stride: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttributeDesc {
    pub binding: u32,
    pub location: u32,
    pub offset: u32,
    pub format: VertexFormat,
}

/// Resource written into one descriptor set binding.
pub enum DescriptorResource<'a, B: GpuDevice> {
    UniformBuffer {
        buffer: &'a B::Buffer,
        offset: u64,
        range: u64,
    },
    CombinedImageSampler {
        view: &'a B::TextureView,
        sampler: &'a B::Sampler,
    },
}

pub struct DescriptorWrite<'a, B: GpuDevice> {
    pub binding: u32,
    pub resource: DescriptorResource<'a, B>,
}

impl<B: GpuDevice> DescriptorWrite<'_, B> {
    #[inline]
    pub fn kind(&self) -> DescriptorKind {
        match self.resource {
            DescriptorResource::UniformBuffer { .. } => DescriptorKind::UniformBuffer,
            DescriptorResource::CombinedImageSampler { .. } => DescriptorKind::CombinedImageSampler,
        }
    }
}

/// One indexed draw (u16 indices, single instance, vertex buffer at slot 0).
pub struct DrawCall<'a, B: GpuDevice> {
    pub pipeline: &'a B::Pipeline,
    pub pipeline_layout: &'a B::PipelineLayout,
    pub vertex_buffer: &'a B::Buffer,
    pub index_buffer: &'a B::Buffer,
    pub index_count: u32,
    pub descriptor_set: &'a B::DescriptorSet,
}
