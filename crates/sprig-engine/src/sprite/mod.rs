//! Sprites, their per-frame GPU resources and the sprite renderer.
//!
//! - [`Sprite`]: immutable template (mesh, optional texture, pipeline name, layout)
//! - [`SpriteGraphic`]: one on-screen instance with uniform storage per frame in flight
//! - [`SpriteRenderer`]: owns graphics and walks the render list once per frame

mod factory;
mod graphic;
mod list;
mod projection;
mod renderer;
mod template;

#[cfg(test)]
pub(crate) mod test_support;

pub use factory::{quad_vertices, SpriteFactory, SpriteVertex, QUAD_INDICES, TEXTURE_BINDING};
pub use graphic::{SpriteGraphic, SpriteUniforms, UNIFORM_BINDING, UNIFORM_SIZE};
pub use list::{GraphicArena, GraphicId, RenderList};
pub use projection::ortho_projection;
pub use renderer::SpriteRenderer;
pub use template::{Mesh, Sprite, SpriteTexture};
