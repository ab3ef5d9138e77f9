use std::rc::Rc;

use crate::device::GpuDevice;
use crate::layout::DataLayout;
use crate::texture::Texture;
use crate::NameKey;

/// Vertex and index buffers of a sprite. Indices are `u16`.
pub struct Mesh<B: GpuDevice> {
    pub vertex_buffer: B::Buffer,
    pub index_buffer: B::Buffer,
    pub index_count: u32,
}

/// Texture paired with the sampler it is read through.
pub struct SpriteTexture<B: GpuDevice> {
    pub texture: Rc<Texture<B>>,
    pub sampler: B::Sampler,
}

/// Immutable drawable template shared by every graphic showing it.
pub struct Sprite<B: GpuDevice> {
    pub(crate) name: String,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) pipeline: NameKey,
    pub(crate) layout: Rc<DataLayout<B>>,
    pub(crate) mesh: Mesh<B>,
    pub(crate) texture: Option<SpriteTexture<B>>,
}

impl<B: GpuDevice> Sprite<B> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Logical name of the pipeline in the [`PipelineCache`](crate::pipeline::PipelineCache).
    pub fn pipeline(&self) -> NameKey {
        self.pipeline
    }

    pub fn layout(&self) -> &Rc<DataLayout<B>> {
        &self.layout
    }

    pub fn mesh(&self) -> &Mesh<B> {
        &self.mesh
    }

    pub fn texture(&self) -> Option<&SpriteTexture<B>> {
        self.texture.as_ref()
    }

    /// Whether a descriptor set written for `self` is valid for `other`:
    /// same layout and same texture (or neither textured).
    pub fn same_binding_shape(&self, other: &Sprite<B>) -> bool {
        let same_texture = match (&self.texture, &other.texture) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(&a.texture, &b.texture),
            _ => false,
        };
        Rc::ptr_eq(&self.layout, &other.layout) && same_texture
    }
}
