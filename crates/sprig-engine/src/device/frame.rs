/// Represents a single acquired frame.
///
/// Held by [`Gpu`](super::Gpu) between `begin_frame` and `end_frame`. Holding the
/// surface texture prevents acquisition of subsequent frames.
pub(crate) struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
