use crate::device::{
    DescriptorBinding, GpuDevice, SamplerMode, VertexAttributeDesc, VertexBindingDesc,
};
use crate::RenderError;

use super::compile::{compile_uniform_bindings, compile_vertex_layout};
use super::{AttributeBindingLayout, UniformBindingLayout};

/// Compiled pipeline-input and resource-binding layout.
///
/// Immutable once built; pipelines and sprites share it through `Rc`.
pub struct DataLayout<B: GpuDevice> {
    vertex_bindings: Vec<VertexBindingDesc>,
    vertex_attributes: Vec<VertexAttributeDesc>,
    descriptor_bindings: Vec<DescriptorBinding>,
    descriptor_set_layout: B::DescriptorSetLayout,
    pipeline_layout: B::PipelineLayout,
    /// Shared device sampler per sampler binding slot.
    samplers: Vec<(u32, B::Sampler)>,
}

impl<B: GpuDevice> DataLayout<B> {
    /// Compiles the declarative layout and creates its set and pipeline layouts
    /// (one set, no push constants).
    pub fn build(
        device: &mut B,
        attribute_bindings: &[AttributeBindingLayout],
        uniform_bindings: &[UniformBindingLayout],
    ) -> Result<Self, RenderError> {
        let vertex = compile_vertex_layout(attribute_bindings);
        let descriptor_bindings = compile_uniform_bindings(uniform_bindings);

        let samplers = (0u32..)
            .zip(uniform_bindings)
            .filter(|(_, b)| b.sampler)
            .map(|(slot, b)| (slot, device.sampler(SamplerMode::from_repeat(b.repeat_sampler))))
            .collect();

        let descriptor_set_layout = device.create_descriptor_set_layout(&descriptor_bindings)?;
        let pipeline_layout = device.create_pipeline_layout(&descriptor_set_layout)?;

        log::debug!(
            "data layout built: {} vertex binding(s), {} attribute(s), {} descriptor binding(s)",
            vertex.bindings.len(),
            vertex.attributes.len(),
            descriptor_bindings.len()
        );

        Ok(Self {
            vertex_bindings: vertex.bindings,
            vertex_attributes: vertex.attributes,
            descriptor_bindings,
            descriptor_set_layout,
            pipeline_layout,
            samplers,
        })
    }

    pub fn vertex_bindings(&self) -> &[VertexBindingDesc] {
        &self.vertex_bindings
    }

    pub fn vertex_attributes(&self) -> &[VertexAttributeDesc] {
        &self.vertex_attributes
    }

    pub fn descriptor_bindings(&self) -> &[DescriptorBinding] {
        &self.descriptor_bindings
    }

    pub fn descriptor_set_layout(&self) -> &B::DescriptorSetLayout {
        &self.descriptor_set_layout
    }

    pub fn pipeline_layout(&self) -> &B::PipelineLayout {
        &self.pipeline_layout
    }

    /// Sampler fetched for a sampler binding slot, if that slot is one.
    pub fn sampler(&self, binding: u32) -> Option<&B::Sampler> {
        self.samplers
            .iter()
            .find(|(slot, _)| *slot == binding)
            .map(|(_, s)| s)
    }
}
