//! GPU device abstraction and its wgpu implementation.
//!
//! - [`GpuDevice`]: the explicit device interface the sprite core is written against
//! - [`Gpu`]: wgpu Instance/Adapter/Device/Queue + Surface, implementing [`GpuDevice`]
//! - backend-neutral descriptions of buffers, bindings and draws

mod api;
mod convert;
mod error;
mod frame;
mod gpu;
mod init;
mod surface;
mod types;

#[cfg(test)]
pub(crate) mod recording;

pub use api::GpuDevice;
pub use error::{DeviceError, SurfaceErrorAction};
pub use gpu::{Gpu, GpuPipeline, GpuTexture};
pub use init::GpuInit;
pub use types::{
    BufferUsage, DescriptorBinding, DescriptorKind, DescriptorResource, DescriptorWrite, DrawCall,
    Extent2D, NdcYAxis, SamplerMode, ShaderStages, VertexAttributeDesc, VertexBindingDesc,
    VertexFormat,
};
