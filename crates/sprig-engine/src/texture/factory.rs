use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::device::GpuDevice;
use crate::{NameKey, RenderError};

/// Device texture plus its pixel size.
pub struct Texture<B: GpuDevice> {
    name: String,
    width: u32,
    height: u32,
    view: B::TextureView,
}

impl<B: GpuDevice> Texture<B> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn view(&self) -> &B::TextureView {
        &self.view
    }
}

/// Owns textures by logical name. Sprites hold `Rc` clones.
pub struct TextureFactory<B: GpuDevice> {
    textures: HashMap<NameKey, Rc<Texture<B>>>,
}

impl<B: GpuDevice> Default for TextureFactory<B> {
    fn default() -> Self {
        Self {
            textures: HashMap::new(),
        }
    }
}

impl<B: GpuDevice> TextureFactory<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads tightly packed RGBA8 pixels under `name`.
    pub fn create_texture(
        &mut self,
        device: &mut B,
        name: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Rc<Texture<B>>, RenderError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RenderError::TextureSize {
                name: name.to_owned(),
                expected,
                actual: pixels.len(),
            });
        }

        let view = device.create_texture_rgba8(name, width, height, pixels)?;
        let texture = Rc::new(Texture {
            name: name.to_owned(),
            width,
            height,
            view,
        });

        if let Some(old) = self.textures.insert(NameKey::new(name), Rc::clone(&texture)) {
            log::debug!("texture `{name}` replaced");
            release(device, old);
        }
        log::debug!("texture `{name}` created ({width}x{height})");
        Ok(texture)
    }

    /// Decodes an image file (PNG) and uploads it under `name`.
    pub fn load_texture(
        &mut self,
        device: &mut B,
        name: &str,
        path: impl AsRef<Path>,
    ) -> Result<Rc<Texture<B>>, RenderError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| RenderError::TextureDecode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        self.create_texture(device, name, width, height, image.as_raw())
    }

    pub fn texture(&self, name: impl Into<NameKey>) -> Option<&Rc<Texture<B>>> {
        self.textures.get(&name.into())
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Destroys every texture. Textures still referenced by sprites are
    /// destroyed anyway; release sprites first.
    pub fn deinit(&mut self, device: &mut B) {
        for (_, texture) in self.textures.drain() {
            release(device, texture);
        }
    }
}

fn release<B: GpuDevice>(device: &mut B, texture: Rc<Texture<B>>) {
    match Rc::try_unwrap(texture) {
        Ok(t) => device.destroy_texture(t.view),
        Err(shared) => {
            log::warn!(
                "texture `{}` destroyed while still referenced ({} holders)",
                shared.name,
                Rc::strong_count(&shared) - 1
            );
            device.destroy_texture(shared.view.clone());
        }
    }
}
