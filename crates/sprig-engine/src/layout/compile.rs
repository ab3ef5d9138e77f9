//! Pure layout computation, independent of any device.

use crate::device::{
    DescriptorBinding, DescriptorKind, VertexAttributeDesc, VertexBindingDesc,
};

use super::{AttributeAlignment, AttributeBindingLayout, DataType, UniformBindingLayout, UniformFieldLayout};

/// Compiled vertex input state.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct VertexLayout {
    pub bindings: Vec<VertexBindingDesc>,
    pub attributes: Vec<VertexAttributeDesc>,
}

/// Assigns binding slots, byte offsets and strides in declaration order.
///
/// # Panics
/// If an attribute is a matrix. Under `debug_assertions`, also if a
/// [`AttributeAlignment::Std140`] attribute starts at a mis-aligned offset.
pub fn compile_vertex_layout(bindings: &[AttributeBindingLayout]) -> VertexLayout {
    let mut out = VertexLayout::default();

    for (binding, group) in (0u32..).zip(bindings) {
        // Running offset in bytes.
        let mut offset = 0u32;
        for attr in &group.attributes {
            let Some(format) = attr.ty.vertex_format() else {
                panic!("vertex attribute `{}` cannot be a matrix", attr.name);
            };
            if group.alignment == AttributeAlignment::Std140 {
                debug_assert!(
                    (offset / 4) % attr.ty.alignment() == 0,
                    "vertex attribute `{}` ({:?}) starts at float {}, \
                     must be a multiple of {}",
                    attr.name,
                    attr.ty,
                    offset / 4,
                    attr.ty.alignment()
                );
            }
            out.attributes.push(VertexAttributeDesc {
                binding,
                location: attr.location,
                offset,
                format,
            });
            offset += format.size();
        }
        out.bindings.push(VertexBindingDesc {
            binding,
            stride: offset,
        });
    }

    out
}

/// One descriptor slot per entry, slot index = position.
pub fn compile_uniform_bindings(bindings: &[UniformBindingLayout]) -> Vec<DescriptorBinding> {
    (0u32..)
        .zip(bindings)
        .map(|(binding, b)| {
            if cfg!(debug_assertions) && !b.sampler {
                check_uniform_fields(binding, &b.fields);
            }
            DescriptorBinding {
                binding,
                kind: if b.sampler {
                    DescriptorKind::CombinedImageSampler
                } else {
                    DescriptorKind::UniformBuffer
                },
                stages: b.stages,
                count: 1,
            }
        })
        .collect()
}

/// Uniform block size in bytes, counting only declared fields.
pub fn uniform_block_size(fields: &[UniformFieldLayout]) -> u32 {
    fields.iter().map(|f| f.ty.size_bytes()).sum()
}

fn check_uniform_fields(binding: u32, fields: &[UniformFieldLayout]) {
    let mut offset = 0u32;
    for f in fields {
        assert!(
            offset % f.ty.alignment() == 0,
            "uniform binding {binding}: field `{}` ({:?}) starts at float {offset}, \
             must be a multiple of {}",
            f.name,
            f.ty,
            f.ty.alignment()
        );
        offset += f.ty.components();
    }
}
