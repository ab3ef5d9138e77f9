//! Backend-neutral descriptions -> wgpu descriptors.

use crate::pipeline::{BlendComponent, BlendFactor, BlendOp, BlendState, CullMode, FrontFace};

use super::{
    DescriptorBinding, DescriptorKind, DeviceError, ShaderStages, VertexAttributeDesc, VertexFormat,
};

/// wgpu has no combined image-sampler; the sampler half lives at `binding + SAMPLER_BINDING_OFFSET`.
pub const SAMPLER_BINDING_OFFSET: u32 = 16;

pub(crate) fn stages(stages: ShaderStages) -> wgpu::ShaderStages {
    let mut out = wgpu::ShaderStages::NONE;
    if stages.contains(ShaderStages::VERTEX) {
        out |= wgpu::ShaderStages::VERTEX;
    }
    if stages.contains(ShaderStages::FRAGMENT) {
        out |= wgpu::ShaderStages::FRAGMENT;
    }
    out
}

pub(crate) fn vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32 => wgpu::VertexFormat::Float32,
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

/// Attributes of one vertex binding, in declaration order.
pub(crate) fn vertex_attributes(
    binding: u32,
    attributes: &[VertexAttributeDesc],
) -> Vec<wgpu::VertexAttribute> {
    attributes
        .iter()
        .filter(|a| a.binding == binding)
        .map(|a| wgpu::VertexAttribute {
            format: vertex_format(a.format),
            offset: a.offset as u64,
            shader_location: a.location,
        })
        .collect()
}

/// Bind group layout entries for `bindings`.
///
/// Fails when a sampler slot (`binding + SAMPLER_BINDING_OFFSET`) lands on a
/// slot that is already taken.
pub(crate) fn layout_entries(
    bindings: &[DescriptorBinding],
) -> Result<Vec<wgpu::BindGroupLayoutEntry>, DeviceError> {
    let mut entries = Vec::with_capacity(bindings.len() * 2);
    for b in bindings {
        let visibility = stages(b.stages);
        match b.kind {
            DescriptorKind::UniformBuffer => entries.push(wgpu::BindGroupLayoutEntry {
                binding: b.binding,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }),
            DescriptorKind::CombinedImageSampler => {
                entries.push(wgpu::BindGroupLayoutEntry {
                    binding: b.binding,
                    visibility,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                });
                entries.push(wgpu::BindGroupLayoutEntry {
                    binding: b.binding + SAMPLER_BINDING_OFFSET,
                    visibility,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                });
            }
        }
    }

    let mut slots: Vec<u32> = entries.iter().map(|e| e.binding).collect();
    slots.sort_unstable();
    if let Some(pair) = slots.windows(2).find(|w| w[0] == w[1]) {
        return Err(DeviceError::DescriptorSetLayout(format!(
            "binding slot {} is used twice (samplers occupy binding + {SAMPLER_BINDING_OFFSET})",
            pair[0]
        )));
    }
    Ok(entries)
}

fn blend_factor(f: BlendFactor) -> wgpu::BlendFactor {
    match f {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
    }
}

fn blend_component(c: BlendComponent) -> wgpu::BlendComponent {
    wgpu::BlendComponent {
        src_factor: blend_factor(c.src),
        dst_factor: blend_factor(c.dst),
        operation: match c.op {
            BlendOp::Add => wgpu::BlendOperation::Add,
        },
    }
}

pub(crate) fn blend(state: BlendState) -> wgpu::BlendState {
    wgpu::BlendState {
        color: blend_component(state.color),
        alpha: blend_component(state.alpha),
    }
}

pub(crate) fn cull_mode(mode: CullMode) -> Option<wgpu::Face> {
    match mode {
        CullMode::None => None,
        CullMode::Front => Some(wgpu::Face::Front),
        CullMode::Back => Some(wgpu::Face::Back),
    }
}

pub(crate) fn front_face(face: FrontFace) -> wgpu::FrontFace {
    match face {
        FrontFace::Clockwise => wgpu::FrontFace::Cw,
        FrontFace::CounterClockwise => wgpu::FrontFace::Ccw,
    }
}
