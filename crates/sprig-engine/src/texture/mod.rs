//! Sampled textures, created from pixels or decoded from image files.

mod factory;

pub use factory::{Texture, TextureFactory};
