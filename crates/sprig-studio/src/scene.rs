use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use glam::Vec2;
use sprig_engine::coords::{SharedTransform, Transform2D, Viewport};
use sprig_engine::core::{App, AppControl, FrameCtx};
use sprig_engine::device::{Extent2D, Gpu, ShaderStages};
use sprig_engine::layout::{
    AttributeBindingLayout, AttributeLayout, DataLayout, DataType, UniformBindingLayout,
    UniformFieldLayout,
};
use sprig_engine::pipeline::{EmbeddedShaders, PipelineCache, ShaderDir, ShaderSource};
use sprig_engine::sprite::{SpriteFactory, SpriteRenderer};
use sprig_engine::texture::{Texture, TextureFactory};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

type Device = Gpu<'static>;

const CHECKER_SIZE: u32 = 64;
const CHECKER_CELL: u32 = 8;

/// Sprite that circles an anchor point while spinning.
struct Orbiter {
    transform: SharedTransform,
    anchor: Vec2,
    radius: f32,
    phase: f32,
    spin: f32,
}

impl Orbiter {
    fn update(&self, elapsed: f32) {
        let angle = self.phase + elapsed * 0.8;
        let mut t = self.transform.get();
        t.position = self.anchor + Vec2::new(angle.cos(), angle.sin()) * self.radius;
        t.rotation = elapsed * self.spin;
        self.transform.set(t);
    }
}

struct Scene {
    pipelines: PipelineCache<Device>,
    textures: TextureFactory<Device>,
    sprites: SpriteFactory<Device>,
    renderer: SpriteRenderer<Device>,
    orbiters: Vec<Orbiter>,
}

/// Demo application: textured alpha-blended sprites orbiting over opaque tiles.
pub struct Studio {
    texture_path: Option<PathBuf>,
    scene: Option<Scene>,
}

impl Studio {
    pub fn new(texture_path: Option<PathBuf>) -> Self {
        Self {
            texture_path,
            scene: None,
        }
    }
}

/// `SPRIG_SHADER_DIR` switches to on-disk shaders for live editing.
fn shader_source() -> Box<dyn ShaderSource> {
    match std::env::var_os("SPRIG_SHADER_DIR") {
        Some(dir) => {
            log::info!("loading shaders from {}", PathBuf::from(&dir).display());
            Box::new(ShaderDir::new(dir).with_extension("wgsl"))
        }
        None => Box::new(
            EmbeddedShaders::new()
                .with("sprite.vert", &include_bytes!("../shaders/sprite.vert.wgsl")[..])
                .with("flat.frag", &include_bytes!("../shaders/flat.frag.wgsl")[..])
                .with("textured.frag", &include_bytes!("../shaders/textured.frag.wgsl")[..]),
        ),
    }
}

fn sprite_layout(gpu: &mut Device, textured: bool) -> anyhow::Result<Rc<DataLayout<Device>>> {
    let mut uniforms = vec![UniformBindingLayout::uniform(
        ShaderStages::VERTEX,
        [
            UniformFieldLayout::new("model", DataType::Mat4),
            UniformFieldLayout::new("projection", DataType::Mat4),
        ],
    )];
    if textured {
        uniforms.push(UniformBindingLayout::sampler(ShaderStages::FRAGMENT, false));
    }

    let attributes = [AttributeBindingLayout::new([
        AttributeLayout::new("position", DataType::Vec2, 0),
        AttributeLayout::new("uv", DataType::Vec2, 1),
    ])];

    let layout = DataLayout::build(gpu, &attributes, &uniforms)
        .with_context(|| format!("failed to build sprite layout (textured: {textured})"))?;
    Ok(Rc::new(layout))
}

/// RGBA checkerboard with a transparent cell pattern.
fn checker_pixels() -> Vec<u8> {
    let mut pixels = Vec::with_capacity((CHECKER_SIZE * CHECKER_SIZE * 4) as usize);
    for y in 0..CHECKER_SIZE {
        for x in 0..CHECKER_SIZE {
            let on = ((x / CHECKER_CELL) + (y / CHECKER_CELL)) % 2 == 0;
            let px = if on { [250, 200, 60, 255] } else { [40, 120, 220, 96] };
            pixels.extend_from_slice(&px);
        }
    }
    pixels
}

impl Studio {
    fn load_texture(
        &self,
        gpu: &mut Device,
        textures: &mut TextureFactory<Device>,
    ) -> anyhow::Result<Rc<Texture<Device>>> {
        if let Some(path) = &self.texture_path {
            match textures.load_texture(gpu, "user", path) {
                Ok(texture) => return Ok(texture),
                Err(e) => log::warn!("{e}; falling back to the checkerboard"),
            }
        }
        let texture = textures.create_texture(
            gpu,
            "checker",
            CHECKER_SIZE,
            CHECKER_SIZE,
            &checker_pixels(),
        )?;
        Ok(texture)
    }

    fn build_scene(&self, gpu: &mut Device) -> anyhow::Result<Scene> {
        let flat_layout = sprite_layout(gpu, false)?;
        let textured_layout = sprite_layout(gpu, true)?;

        let mut pipelines = PipelineCache::<Device>::new(shader_source());
        pipelines.create_pipeline(gpu, "flat", "sprite.vert", "flat.frag", &flat_layout, false)?;
        pipelines.create_pipeline(
            gpu,
            "textured",
            "sprite.vert",
            "textured.frag",
            &textured_layout,
            true,
        )?;

        let mut textures = TextureFactory::new();
        let texture = self.load_texture(gpu, &mut textures)?;

        let mut sprites = SpriteFactory::new();
        let tile = sprites.create_flat(gpu, "tile", "flat", &flat_layout, 96.0, 96.0)?;
        let badge = sprites.create_textured(gpu, "badge", "textured", &textured_layout, &texture)?;

        let size = gpu.size();
        let viewport = Viewport::from((size.width, size.height));
        let mut renderer = SpriteRenderer::new(gpu, viewport);

        // Opaque tiles first so the alpha sprites blend over them.
        let columns = 4;
        for i in 0..columns {
            let x = viewport.width * (i as f32 + 0.5) / columns as f32;
            let t = Transform2D::from_position(Vec2::new(x, viewport.height * 0.5)).shared();
            renderer.spawn(gpu, Rc::clone(&tile), t)?;
        }

        let center = Vec2::new(viewport.width, viewport.height) * 0.5;
        let count = 6;
        let mut orbiters = Vec::with_capacity(count);
        for i in 0..count {
            let transform = Transform2D::from_position(center).shared();
            renderer.spawn(gpu, Rc::clone(&badge), Rc::clone(&transform))?;
            orbiters.push(Orbiter {
                transform,
                anchor: center,
                radius: viewport.height * 0.3,
                phase: i as f32 * std::f32::consts::TAU / count as f32,
                spin: if i % 2 == 0 { 1.5 } else { -1.5 },
            });
        }

        log::info!(
            "scene ready: {} graphics, {} pipelines, {} shader modules",
            renderer.len(),
            pipelines.pipeline_count(),
            pipelines.module_count()
        );

        Ok(Scene {
            pipelines,
            textures,
            sprites,
            renderer,
            orbiters,
        })
    }
}

impl App for Studio {
    fn on_init(&mut self, gpu: &mut Device) -> anyhow::Result<()> {
        let scene = self.build_scene(gpu)?;
        self.scene = Some(scene);
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_resized(&mut self, gpu: &mut Device, extent: Extent2D) -> AppControl {
        let Some(scene) = self.scene.as_mut() else {
            return AppControl::Continue;
        };

        scene.pipelines.invalidate(extent);
        match scene.pipelines.rebuild_stale(gpu) {
            Ok(_) => AppControl::Continue,
            Err(e) => {
                log::error!("failed to rebuild pipelines: {e}");
                AppControl::Exit
            }
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let Some(scene) = self.scene.as_ref() else {
            return AppControl::Continue;
        };

        for orbiter in &scene.orbiters {
            orbiter.update(ctx.time.elapsed);
        }

        ctx.render(|gpu| scene.renderer.render(gpu, &scene.pipelines))
    }

    fn on_shutdown(&mut self, gpu: &mut Device) {
        let Some(mut scene) = self.scene.take() else {
            return;
        };

        // Graphics hold sprites, sprites hold textures.
        scene.renderer.deinit(gpu);
        scene.sprites.deinit(gpu);
        scene.textures.deinit(gpu);
        scene.pipelines.deinit(gpu);
    }
}
