//! Shared fixtures for sprite tests.

use std::rc::Rc;

use crate::coords::{SharedTransform, Transform2D};
use crate::device::recording::RecordingDevice;
use crate::device::ShaderStages;
use crate::layout::{
    AttributeBindingLayout, AttributeLayout, DataLayout, DataType, UniformBindingLayout,
    UniformFieldLayout,
};
use crate::pipeline::{EmbeddedShaders, PipelineCache};
use crate::texture::TextureFactory;

use super::{Sprite, SpriteFactory};

pub(crate) type Dev = RecordingDevice;

/// position/uv quad layout; binding 0 is the model/projection block, binding 1
/// the texture when `textured`.
pub(crate) fn sprite_layout(dev: &mut Dev, textured: bool) -> Rc<DataLayout<Dev>> {
    let mut uniforms = vec![UniformBindingLayout::uniform(
        ShaderStages::VERTEX,
        [
            UniformFieldLayout::new("model", DataType::Mat4),
            UniformFieldLayout::new("projection", DataType::Mat4),
        ],
    )];
    if textured {
        uniforms.push(UniformBindingLayout::sampler(ShaderStages::FRAGMENT, true));
    }
    Rc::new(
        DataLayout::build(
            dev,
            &[AttributeBindingLayout::new([
                AttributeLayout::new("position", DataType::Vec2, 0),
                AttributeLayout::new("uv", DataType::Vec2, 1),
            ])],
            &uniforms,
        )
        .unwrap(),
    )
}

pub(crate) struct Fixture {
    pub dev: Dev,
    pub pipelines: PipelineCache<Dev>,
    pub textures: TextureFactory<Dev>,
    pub sprites: SpriteFactory<Dev>,
    pub flat_layout: Rc<DataLayout<Dev>>,
    pub textured_layout: Rc<DataLayout<Dev>>,
}

impl Fixture {
    pub fn new() -> Self {
        let mut dev = Dev::new();
        let flat_layout = sprite_layout(&mut dev, false);
        let textured_layout = sprite_layout(&mut dev, true);
        let mut pipelines = PipelineCache::new(
            EmbeddedShaders::new()
                .with("sprite.vert", &b"vs"[..])
                .with("flat.frag", &b"fs"[..])
                .with("textured.frag", &b"fs-tex"[..]),
        );
        pipelines
            .create_pipeline(&mut dev, "flat", "sprite.vert", "flat.frag", &flat_layout, false)
            .unwrap();
        pipelines
            .create_pipeline(
                &mut dev,
                "textured",
                "sprite.vert",
                "textured.frag",
                &textured_layout,
                true,
            )
            .unwrap();

        Self {
            dev,
            pipelines,
            textures: TextureFactory::new(),
            sprites: SpriteFactory::new(),
            flat_layout,
            textured_layout,
        }
    }

    pub fn flat(&mut self, name: &str) -> Rc<Sprite<Dev>> {
        let Self { dev, sprites, flat_layout, .. } = self;
        sprites
            .create_flat(dev, name, "flat", flat_layout, 16.0, 16.0)
            .unwrap()
    }

    pub fn textured(&mut self, name: &str) -> Rc<Sprite<Dev>> {
        let Self { dev, sprites, textures, textured_layout, .. } = self;
        let tex = textures
            .create_texture(dev, name, 2, 2, &[255; 16])
            .unwrap();
        sprites
            .create_textured(dev, name, "textured", textured_layout, &tex)
            .unwrap()
    }
}

pub(crate) fn transform_at(x: f32, y: f32) -> SharedTransform {
    Transform2D::from_position(glam::Vec2::new(x, y)).shared()
}
