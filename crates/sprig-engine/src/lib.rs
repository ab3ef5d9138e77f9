//! Sprig engine crate.
//!
//! Frame-pipelined 2D sprite rendering on top of an explicit device API:
//! declarative vertex/uniform layouts, a shader/pipeline cache, per-sprite
//! uniform storage replicated per frame in flight, and an ordered render list.
//!
//! The core is written against [`device::GpuDevice`]; [`device::Gpu`] is the
//! wgpu implementation used by the window runtime.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod layout;
pub mod pipeline;
pub mod texture;
pub mod sprite;

mod error;
mod key;

pub use error::RenderError;
pub use key::NameKey;
