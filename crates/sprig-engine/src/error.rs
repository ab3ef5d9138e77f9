use std::path::PathBuf;

use thiserror::Error;

use crate::device::DeviceError;

/// Errors surfaced by layout, pipeline, texture and sprite setup.
///
/// Programmer-contract violations (unknown pipeline names, mis-aligned layouts,
/// double registration) are not represented here; they panic.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("failed to load shader `{name}` from {path}")]
    ShaderLoad {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader `{0}` is not present in the embedded shader table")]
    ShaderMissing(String),

    #[error("failed to decode texture `{path}`")]
    TextureDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("sprite `{sprite}`: layout has no combined image-sampler at binding {binding}")]
    MissingTextureBinding { sprite: String, binding: u32 },

    #[error("texture `{name}` has {actual} bytes of pixel data, expected {expected}")]
    TextureSize {
        name: String,
        expected: usize,
        actual: usize,
    },
}

impl RenderError {
    /// Returns `true` when the failure only affects the current frame.
    pub fn is_transient(&self) -> bool {
        matches!(self, RenderError::Device(e) if e.is_transient())
    }
}
