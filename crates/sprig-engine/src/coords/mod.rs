//! Coordinate types shared by the sprite renderer and gameplay code.
//!
//! Canonical CPU space:
//! - pixels, origin top-left
//! - +X right, +Y down
//!
//! The renderer's projection maps this space into the device's clip volume.

mod transform;
mod viewport;

pub use transform::{SharedTransform, Transform2D};
pub use viewport::Viewport;
