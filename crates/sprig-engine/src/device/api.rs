use crate::pipeline::PipelineDesc;

use super::{
    BufferUsage, DescriptorBinding, DescriptorWrite, DeviceError, DrawCall, Extent2D, NdcYAxis,
    SamplerMode,
};

/// Narrow device interface consumed by the sprite core.
///
/// Handles are cheap to clone and carry no lifetime; destruction is explicit.
/// The device guarantees that frame slot `current_frame()` is no longer read by
/// the GPU once `begin_frame` has returned, so per-slot storage may be rewritten.
pub trait GpuDevice: Sized {
    type Buffer: Clone;
    type TextureView: Clone;
    type Sampler: Clone;
    type ShaderModule: Clone;
    type DescriptorSetLayout: Clone;
    type PipelineLayout: Clone;
    type Pipeline: Clone;
    type DescriptorSet: Clone;

    /// Number of frame-in-flight slots (N >= 1).
    fn frames_in_flight(&self) -> usize;

    /// Slot index of the frame currently being (or next to be) recorded.
    fn current_frame(&self) -> usize;

    fn framebuffer_extent(&self) -> Extent2D;

    fn ndc_y_axis(&self) -> NdcYAxis;

    /// Shared sampler for the given address mode, owned by the device.
    fn sampler(&self, mode: SamplerMode) -> Self::Sampler;

    fn create_shader_module(
        &mut self,
        label: &str,
        blob: &[u8],
    ) -> Result<Self::ShaderModule, DeviceError>;

    fn destroy_shader_module(&mut self, module: Self::ShaderModule);

    fn create_descriptor_set_layout(
        &mut self,
        bindings: &[DescriptorBinding],
    ) -> Result<Self::DescriptorSetLayout, DeviceError>;

    /// One set, no push constants.
    fn create_pipeline_layout(
        &mut self,
        set_layout: &Self::DescriptorSetLayout,
    ) -> Result<Self::PipelineLayout, DeviceError>;

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_, Self>)
    -> Result<Self::Pipeline, DeviceError>;

    fn destroy_pipeline(&mut self, pipeline: Self::Pipeline);

    fn create_buffer(&mut self, size: u64, usage: BufferUsage)
    -> Result<Self::Buffer, DeviceError>;

    fn create_buffer_init(
        &mut self,
        contents: &[u8],
        usage: BufferUsage,
    ) -> Result<Self::Buffer, DeviceError>;

    /// Host write into a buffer created with [`BufferUsage::Uniform`].
    fn write_buffer(&self, buffer: &Self::Buffer, offset: u64, data: &[u8]);

    fn destroy_buffer(&mut self, buffer: Self::Buffer);

    /// Uploads tightly packed RGBA8 pixels into a sampled texture.
    fn create_texture_rgba8(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Self::TextureView, DeviceError>;

    fn destroy_texture(&mut self, view: Self::TextureView);

    fn allocate_descriptor_set(
        &mut self,
        layout: &Self::DescriptorSetLayout,
        writes: &[DescriptorWrite<'_, Self>],
    ) -> Result<Self::DescriptorSet, DeviceError>;

    fn free_descriptor_sets(&mut self, sets: Vec<Self::DescriptorSet>);

    /// Returns `true` between `begin_frame` and `end_frame`/`abandon_frame`.
    fn in_frame(&self) -> bool;

    fn begin_frame(&mut self) -> Result<(), DeviceError>;

    /// Submits and presents the open frame, then advances to the next slot.
    fn end_frame(&mut self) -> Result<(), DeviceError>;

    /// Drops the open frame without presenting it. The slot does not advance.
    fn abandon_frame(&mut self);

    /// Records draws into the open frame, in order.
    fn record_draws(&mut self, draws: &[DrawCall<'_, Self>]) -> Result<(), DeviceError>;
}
