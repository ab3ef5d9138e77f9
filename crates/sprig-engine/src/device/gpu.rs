use anyhow::{Context, Result};
use wgpu::util::DeviceExt;

use crate::pipeline::PipelineDesc;

use super::convert::{self, SAMPLER_BINDING_OFFSET};
use super::frame::GpuFrame;
use super::surface;
use super::{
    BufferUsage, DescriptorBinding, DescriptorResource, DescriptorWrite, DeviceError, DrawCall,
    Extent2D, GpuDevice, GpuInit, NdcYAxis, SamplerMode, SurfaceErrorAction,
};

/// Render pipeline together with the extent its viewport/scissor were baked for.
#[derive(Debug, Clone)]
pub struct GpuPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub extent: Extent2D,
}

/// Sampled texture and its default view.
#[derive(Debug, Clone)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Owns wgpu core objects and the surface configuration.
///
/// This type is the low-level rendering context:
/// - creates and stores Adapter/Device/Queue
/// - creates and configures the Surface (swapchain)
/// - implements [`GpuDevice`]: resource creation, frame-in-flight slots, draw recording
pub struct Gpu<'w> {
    /// Surface bound to the window.
    ///
    /// Surface lifetime is tied to the window; the window must outlive the `Gpu`.
    surface: wgpu::Surface<'w>,

    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: Extent2D,

    clear_color: wgpu::Color,

    frames_in_flight: usize,
    current_frame: usize,

    repeat_sampler: wgpu::Sampler,
    clamp_sampler: wgpu::Sampler,

    /// Open frame, between `begin_frame` and `end_frame`.
    frame: Option<GpuFrame>,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to a window.
    ///
    /// Passing an `Arc<Window>` yields a `Gpu<'static>` that can live next to
    /// the window in the runtime. Adapter/device acquisition is asynchronous.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'w>>,
        size: Extent2D,
        init: GpuInit,
    ) -> Result<Self> {
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");
        anyhow::ensure!(init.frames_in_flight > 0, "frames_in_flight must be at least 1");

        let swapchain = surface::SwapchainSettings::from(&init);
        let GpuInit {
            required_features,
            required_limits,
            clear_color,
            ..
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sprig-engine device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let config = surface::swapchain_config(&surface_caps, swapchain, size)
            .context("no supported surface formats")?;

        surface.configure(&device, &config);

        let repeat_sampler = create_sampler(&device, wgpu::AddressMode::Repeat, "sprig repeat sampler");
        let clamp_sampler =
            create_sampler(&device, wgpu::AddressMode::ClampToEdge, "sprig clamp sampler");

        Ok(Self {
            surface,
            adapter,
            device,
            queue,
            config,
            size,
            clear_color,
            frames_in_flight: swapchain.frames_in_flight as usize,
            current_frame: 0,
            repeat_sampler,
            clamp_sampler,
            frame: None,
        })
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> Extent2D {
        self.size
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Reconfigures the surface after a resize.
    ///
    /// Pipelines keep the extent they were baked for; callers invalidate them.
    pub fn resize(&mut self, new_size: Extent2D) {
        if self.frame.take().is_some() {
            log::debug!("resize dropped an open frame");
        }
        self.size = new_size;
        if surface::adopt_extent(&mut self.config, new_size) {
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&mut self, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        let action = surface::classify(&err);
        if action == SurfaceErrorAction::Reconfigured && self.size.width > 0 && self.size.height > 0 {
            log::debug!("surface {err}; reconfiguring");
            self.surface.configure(&self.device, &self.config);
        }
        action
    }

    fn usage(usage: BufferUsage) -> wgpu::BufferUsages {
        match usage {
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
        }
    }
}

/// Runs `create` inside a validation error scope.
///
/// wgpu reports invalid descriptors through the device's error sink; without a
/// scope they reach the uncaptured-error handler, which panics.
fn validated<T>(device: &wgpu::Device, create: impl FnOnce(&wgpu::Device) -> T) -> Result<T, String> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let out = create(device);
    match pollster::block_on(scope.pop()) {
        Some(err) => Err(err.to_string()),
        None => Ok(out),
    }
}

/// Shader blobs are WGSL source text.
fn create_wgsl_module(
    device: &wgpu::Device,
    label: &str,
    blob: &[u8],
) -> Result<wgpu::ShaderModule, DeviceError> {
    let source = std::str::from_utf8(blob).map_err(|e| DeviceError::ShaderModule {
        label: label.to_owned(),
        reason: format!("not UTF-8 WGSL source: {e}"),
    })?;

    validated(device, |device| {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    })
    .map_err(|reason| DeviceError::ShaderModule {
        label: label.to_owned(),
        reason,
    })
}

fn create_sampler(device: &wgpu::Device, mode: wgpu::AddressMode, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: mode,
        address_mode_v: mode,
        address_mode_w: mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

impl GpuDevice for Gpu<'_> {
    type Buffer = wgpu::Buffer;
    type TextureView = GpuTexture;
    type Sampler = wgpu::Sampler;
    type ShaderModule = wgpu::ShaderModule;
    type DescriptorSetLayout = wgpu::BindGroupLayout;
    type PipelineLayout = wgpu::PipelineLayout;
    type Pipeline = GpuPipeline;
    type DescriptorSet = wgpu::BindGroup;

    fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    fn current_frame(&self) -> usize {
        self.current_frame
    }

    fn framebuffer_extent(&self) -> Extent2D {
        self.size
    }

    fn ndc_y_axis(&self) -> NdcYAxis {
        NdcYAxis::Up
    }

    fn sampler(&self, mode: SamplerMode) -> wgpu::Sampler {
        match mode {
            SamplerMode::Repeat => self.repeat_sampler.clone(),
            SamplerMode::Clamp => self.clamp_sampler.clone(),
        }
    }

    /// Shader blobs are WGSL source text.
    fn create_shader_module(
        &mut self,
        label: &str,
        blob: &[u8],
    ) -> Result<wgpu::ShaderModule, DeviceError> {
        create_wgsl_module(&self.device, label, blob)
    }

    fn destroy_shader_module(&mut self, module: wgpu::ShaderModule) {
        drop(module);
    }

    fn create_descriptor_set_layout(
        &mut self,
        bindings: &[DescriptorBinding],
    ) -> Result<wgpu::BindGroupLayout, DeviceError> {
        if let Some(b) = bindings.iter().find(|b| b.count != 1) {
            return Err(DeviceError::DescriptorSetLayout(format!(
                "binding {} has count {}; descriptor arrays are not supported",
                b.binding, b.count
            )));
        }
        let entries = convert::layout_entries(bindings)?;
        validated(&self.device, |device| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sprig bind group layout"),
                entries: &entries,
            })
        })
        .map_err(DeviceError::DescriptorSetLayout)
    }

    fn create_pipeline_layout(
        &mut self,
        set_layout: &wgpu::BindGroupLayout,
    ) -> Result<wgpu::PipelineLayout, DeviceError> {
        validated(&self.device, |device| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("sprig pipeline layout"),
                bind_group_layouts: &[set_layout],
                immediate_size: 0,
            })
        })
        .map_err(DeviceError::PipelineLayout)
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_, Self>) -> Result<GpuPipeline, DeviceError> {
        let state = desc.state;
        if state.depth_test {
            return Err(DeviceError::Pipeline {
                label: desc.label.to_owned(),
                reason: "depth testing requires a depth attachment".to_owned(),
            });
        }

        // Vertex buffer slot == binding index, as compiled by the layout.
        let attributes: Vec<Vec<wgpu::VertexAttribute>> = desc
            .vertex_bindings
            .iter()
            .map(|b| convert::vertex_attributes(b.binding, desc.vertex_attributes))
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = desc
            .vertex_bindings
            .iter()
            .zip(&attributes)
            .map(|(b, attrs)| wgpu::VertexBufferLayout {
                array_stride: b.stride as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let write_mask = if state.write_all_channels {
            wgpu::ColorWrites::ALL
        } else {
            wgpu::ColorWrites::empty()
        };

        let format = self.config.format;
        let pipeline = validated(&self.device, |device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(desc.layout),

                vertex: wgpu::VertexState {
                    module: desc.vertex,
                    entry_point: Some(desc.entry_point),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },

                fragment: Some(wgpu::FragmentState {
                    module: desc.fragment,
                    entry_point: Some(desc.entry_point),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(convert::blend(state.blend)),
                        write_mask,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: convert::front_face(state.front_face),
                    cull_mode: convert::cull_mode(state.cull_mode),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: state.samples,
                    ..Default::default()
                },

                multiview_mask: None,
                cache: None,
            })
        })
        .map_err(|reason| DeviceError::Pipeline {
            label: desc.label.to_owned(),
            reason,
        })?;

        Ok(GpuPipeline {
            pipeline,
            extent: state.extent,
        })
    }

    fn destroy_pipeline(&mut self, pipeline: GpuPipeline) {
        drop(pipeline);
    }

    fn create_buffer(&mut self, size: u64, usage: BufferUsage) -> Result<wgpu::Buffer, DeviceError> {
        if size == 0 {
            return Err(DeviceError::BufferAllocation { size });
        }
        Ok(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprig buffer"),
            size,
            usage: Self::usage(usage),
            mapped_at_creation: false,
        }))
    }

    fn create_buffer_init(
        &mut self,
        contents: &[u8],
        usage: BufferUsage,
    ) -> Result<wgpu::Buffer, DeviceError> {
        if contents.is_empty() {
            return Err(DeviceError::BufferAllocation { size: 0 });
        }
        Ok(self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("sprig buffer"),
                contents,
                usage: Self::usage(usage),
            }))
    }

    fn write_buffer(&self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, offset, data);
    }

    fn destroy_buffer(&mut self, buffer: wgpu::Buffer) {
        buffer.destroy();
    }

    fn create_texture_rgba8(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<GpuTexture, DeviceError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(DeviceError::Texture {
                label: label.to_owned(),
                reason: format!(
                    "{width}x{height} RGBA8 needs {expected} bytes, got {}",
                    pixels.len()
                ),
            });
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = validated(&self.device, |device| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            })
        })
        .map_err(|reason| DeviceError::Texture {
            label: label.to_owned(),
            reason,
        })?;

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(GpuTexture { texture, view })
    }

    fn destroy_texture(&mut self, view: GpuTexture) {
        view.texture.destroy();
    }

    fn allocate_descriptor_set(
        &mut self,
        layout: &wgpu::BindGroupLayout,
        writes: &[DescriptorWrite<'_, Self>],
    ) -> Result<wgpu::BindGroup, DeviceError> {
        let mut entries = Vec::with_capacity(writes.len() * 2);
        for w in writes {
            match &w.resource {
                DescriptorResource::UniformBuffer {
                    buffer,
                    offset,
                    range,
                } => {
                    let size = wgpu::BufferSize::new(*range).ok_or_else(|| {
                        DeviceError::DescriptorSetAllocation(format!(
                            "binding {} has an empty uniform range",
                            w.binding
                        ))
                    })?;
                    entries.push(wgpu::BindGroupEntry {
                        binding: w.binding,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer,
                            offset: *offset,
                            size: Some(size),
                        }),
                    });
                }
                DescriptorResource::CombinedImageSampler { view, sampler } => {
                    entries.push(wgpu::BindGroupEntry {
                        binding: w.binding,
                        resource: wgpu::BindingResource::TextureView(&view.view),
                    });
                    entries.push(wgpu::BindGroupEntry {
                        binding: w.binding + SAMPLER_BINDING_OFFSET,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    });
                }
            }
        }

        validated(&self.device, |device| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("sprig bind group"),
                layout,
                entries: &entries,
            })
        })
        .map_err(DeviceError::DescriptorSetAllocation)
    }

    fn free_descriptor_sets(&mut self, sets: Vec<wgpu::BindGroup>) {
        drop(sets);
    }

    fn in_frame(&self) -> bool {
        self.frame.is_some()
    }

    /// Acquires the next surface texture and clears it.
    fn begin_frame(&mut self) -> Result<(), DeviceError> {
        debug_assert!(self.frame.is_none(), "begin_frame called twice");
        if self.size.width == 0 || self.size.height == 0 {
            return Err(DeviceError::FrameSkipped(SurfaceErrorAction::SkipFrame));
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => return Err(self.handle_surface_error(e).into()),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sprig frame encoder"),
            });

        {
            let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprig clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.frame = Some(GpuFrame {
            surface_texture,
            view,
            encoder,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), DeviceError> {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = self.frame.take().ok_or(DeviceError::NoFrame)?;

        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();

        self.current_frame = (self.current_frame + 1) % self.frames_in_flight;
        Ok(())
    }

    fn abandon_frame(&mut self) {
        if self.frame.take().is_some() {
            log::debug!("abandoned frame in slot {}", self.current_frame);
        }
    }

    fn record_draws(&mut self, draws: &[DrawCall<'_, Self>]) -> Result<(), DeviceError> {
        let target = self.size;
        let GpuFrame { view, encoder, .. } = self.frame.as_mut().ok_or(DeviceError::NoFrame)?;
        if draws.is_empty() {
            return Ok(());
        }

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sprig sprite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for d in draws {
            let extent = d.pipeline.extent;
            rpass.set_pipeline(&d.pipeline.pipeline);
            rpass.set_viewport(0.0, 0.0, extent.width as f32, extent.height as f32, 0.0, 1.0);
            // Scissor must stay inside the attachment even for a pipeline baked larger.
            rpass.set_scissor_rect(
                0,
                0,
                extent.width.min(target.width),
                extent.height.min(target.height),
            );
            rpass.set_bind_group(0, d.descriptor_set, &[]);
            rpass.set_vertex_buffer(0, d.vertex_buffer.slice(..));
            rpass.set_index_buffer(d.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..d.index_count, 0, 0..1);
        }

        Ok(())
    }
}
