use std::collections::HashMap;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use crate::device::{BufferUsage, DescriptorKind, GpuDevice};
use crate::layout::DataLayout;
use crate::texture::Texture;
use crate::{NameKey, RenderError};

use super::{Mesh, Sprite, SpriteTexture};

/// Binding slot of the sprite texture in sprite layouts.
pub const TEXTURE_BINDING: u32 = 1;

/// Sprite quad vertex: `position: vec2` at location 0, `uv: vec2` at location 1.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Quad centered on the origin, clockwise in +Y-down pixel space.
pub fn quad_vertices(width: f32, height: f32) -> [SpriteVertex; 4] {
    let (hw, hh) = (width * 0.5, height * 0.5);
    [
        SpriteVertex { position: [-hw, -hh], uv: [0.0, 0.0] },
        SpriteVertex { position: [hw, -hh], uv: [1.0, 0.0] },
        SpriteVertex { position: [hw, hh], uv: [1.0, 1.0] },
        SpriteVertex { position: [-hw, hh], uv: [0.0, 1.0] },
    ]
}

/// Builds quad sprites and owns their meshes.
pub struct SpriteFactory<B: GpuDevice> {
    sprites: HashMap<NameKey, Rc<Sprite<B>>>,
}

impl<B: GpuDevice> Default for SpriteFactory<B> {
    fn default() -> Self {
        Self {
            sprites: HashMap::new(),
        }
    }
}

impl<B: GpuDevice> SpriteFactory<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sprite sized to `texture`, sampled through the layout's sampler.
    ///
    /// Fails with [`RenderError::MissingTextureBinding`] unless `layout`
    /// declares a combined image-sampler at binding 1.
    pub fn create_textured(
        &mut self,
        device: &mut B,
        name: &str,
        pipeline: impl Into<NameKey>,
        layout: &Rc<DataLayout<B>>,
        texture: &Rc<Texture<B>>,
    ) -> Result<Rc<Sprite<B>>, RenderError> {
        let sampler = layout
            .sampler(TEXTURE_BINDING)
            .filter(|_| has_texture_binding(layout))
            .cloned()
            .ok_or_else(|| RenderError::MissingTextureBinding {
                sprite: name.to_owned(),
                binding: TEXTURE_BINDING,
            })?;
        let sprite_texture = SpriteTexture {
            texture: Rc::clone(texture),
            sampler,
        };
        self.create(
            device,
            name,
            pipeline.into(),
            layout,
            texture.width() as f32,
            texture.height() as f32,
            Some(sprite_texture),
        )
    }

    /// Untextured sprite of the given pixel size.
    pub fn create_flat(
        &mut self,
        device: &mut B,
        name: &str,
        pipeline: impl Into<NameKey>,
        layout: &Rc<DataLayout<B>>,
        width: f32,
        height: f32,
    ) -> Result<Rc<Sprite<B>>, RenderError> {
        debug_assert!(
            !has_texture_binding(layout),
            "sprite `{name}`: flat sprites need a layout without a texture binding"
        );
        self.create(device, name, pipeline.into(), layout, width, height, None)
    }

    pub fn sprite(&self, name: impl Into<NameKey>) -> Option<&Rc<Sprite<B>>> {
        self.sprites.get(&name.into())
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Destroys every sprite mesh. Graphics must be released first.
    pub fn deinit(&mut self, device: &mut B) {
        for (_, sprite) in self.sprites.drain() {
            release(device, sprite);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn create(
        &mut self,
        device: &mut B,
        name: &str,
        pipeline: NameKey,
        layout: &Rc<DataLayout<B>>,
        width: f32,
        height: f32,
        texture: Option<SpriteTexture<B>>,
    ) -> Result<Rc<Sprite<B>>, RenderError> {
        let vertices = quad_vertices(width, height);
        let vertex_buffer =
            device.create_buffer_init(bytemuck::cast_slice(&vertices), BufferUsage::Vertex)?;
        let index_buffer =
            match device.create_buffer_init(bytemuck::cast_slice(&QUAD_INDICES), BufferUsage::Index) {
                Ok(b) => b,
                Err(e) => {
                    device.destroy_buffer(vertex_buffer);
                    return Err(e.into());
                }
            };

        let sprite = Rc::new(Sprite {
            name: name.to_owned(),
            width,
            height,
            pipeline,
            layout: Rc::clone(layout),
            mesh: Mesh {
                vertex_buffer,
                index_buffer,
                index_count: QUAD_INDICES.len() as u32,
            },
            texture,
        });

        if let Some(old) = self.sprites.insert(NameKey::new(name), Rc::clone(&sprite)) {
            log::debug!("sprite `{name}` replaced");
            release(device, old);
        }
        log::debug!("sprite `{name}` created ({width}x{height})");
        Ok(sprite)
    }
}

fn has_texture_binding<B: GpuDevice>(layout: &DataLayout<B>) -> bool {
    layout
        .descriptor_bindings()
        .get(TEXTURE_BINDING as usize)
        .is_some_and(|b| b.kind == DescriptorKind::CombinedImageSampler)
}

fn release<B: GpuDevice>(device: &mut B, sprite: Rc<Sprite<B>>) {
    if Rc::strong_count(&sprite) > 1 {
        log::warn!(
            "sprite `{}` destroyed while {} graphic(s) still use it",
            sprite.name,
            Rc::strong_count(&sprite) - 1
        );
    }
    device.destroy_buffer(sprite.mesh.vertex_buffer.clone());
    device.destroy_buffer(sprite.mesh.index_buffer.clone());
}
