//! Headless [`GpuDevice`] that hands out integer handles and records every call.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::pipeline::{FixedFunctionState, PipelineDesc};

use super::{
    BufferUsage, DescriptorBinding, DescriptorKind, DescriptorResource, DescriptorWrite,
    DeviceError, DrawCall, Extent2D, GpuDevice, NdcYAxis, SamplerMode, SurfaceErrorAction,
    VertexAttributeDesc, VertexBindingDesc,
};

pub(crate) type Handle = u32;

pub(crate) const CLAMP_SAMPLER: Handle = 1;
pub(crate) const REPEAT_SAMPLER: Handle = 2;

#[derive(Debug, Clone)]
pub(crate) struct RecordedPipeline {
    pub handle: Handle,
    pub label: String,
    pub vertex: Handle,
    pub fragment: Handle,
    pub entry_point: String,
    pub layout: Handle,
    pub bindings: Vec<VertexBindingDesc>,
    pub attributes: Vec<VertexAttributeDesc>,
    pub state: FixedFunctionState,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedWrite {
    pub binding: u32,
    pub kind: DescriptorKind,
    /// Buffer or texture handle.
    pub resource: Handle,
    pub range: u64,
    pub sampler: Option<Handle>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedDraw {
    pub frame: usize,
    pub pipeline: Handle,
    pub pipeline_layout: Handle,
    pub vertex_buffer: Handle,
    pub index_buffer: Handle,
    pub index_count: u32,
    pub descriptor_set: Handle,
}

/// Failure injection.
#[derive(Debug, Default)]
pub(crate) struct Failures {
    pub shader_module: bool,
    pub set_layout: bool,
    pub pipeline_layout: bool,
    pub pipeline: bool,
    /// Fail only pipelines with this label.
    pub pipeline_named: Option<String>,
    /// Fail once this many buffers have been created.
    pub buffer_after: Option<usize>,
    /// Fail once this many descriptor sets have been allocated.
    pub descriptor_set_after: Option<usize>,
    pub begin_frame: bool,
    pub record: bool,
}

pub(crate) struct RecordingDevice {
    next: Handle,
    in_frame: bool,

    pub frames_in_flight: usize,
    pub current_frame: usize,
    pub extent: Extent2D,
    pub ndc: NdcYAxis,
    pub fail: Failures,

    pub shader_modules: Vec<(Handle, String)>,
    pub destroyed_modules: Vec<Handle>,
    pub set_layouts: Vec<(Handle, Vec<DescriptorBinding>)>,
    pub pipeline_layouts: Vec<(Handle, Handle)>,
    pub pipelines: Vec<RecordedPipeline>,
    pub destroyed_pipelines: Vec<Handle>,

    pub buffers_created: usize,
    pub buffer_usage: HashMap<Handle, BufferUsage>,
    pub buffer_contents: RefCell<HashMap<Handle, Vec<u8>>>,
    pub destroyed_buffers: Vec<Handle>,

    pub textures: Vec<(Handle, String, u32, u32)>,
    pub destroyed_textures: Vec<Handle>,

    pub sets_allocated: usize,
    pub descriptor_sets: HashMap<Handle, Vec<RecordedWrite>>,
    pub freed_sets: Vec<Handle>,

    pub draws: Vec<RecordedDraw>,
    pub frames_begun: usize,
    pub frames_ended: usize,
    pub frames_abandoned: usize,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            next: REPEAT_SAMPLER + 1,
            in_frame: false,
            frames_in_flight: 2,
            current_frame: 0,
            extent: Extent2D::new(800, 600),
            ndc: NdcYAxis::Down,
            fail: Failures::default(),
            shader_modules: Vec::new(),
            destroyed_modules: Vec::new(),
            set_layouts: Vec::new(),
            pipeline_layouts: Vec::new(),
            pipelines: Vec::new(),
            destroyed_pipelines: Vec::new(),
            buffers_created: 0,
            buffer_usage: HashMap::new(),
            buffer_contents: RefCell::new(HashMap::new()),
            destroyed_buffers: Vec::new(),
            textures: Vec::new(),
            destroyed_textures: Vec::new(),
            sets_allocated: 0,
            descriptor_sets: HashMap::new(),
            freed_sets: Vec::new(),
            draws: Vec::new(),
            frames_begun: 0,
            frames_ended: 0,
            frames_abandoned: 0,
        }
    }

    fn handle(&mut self) -> Handle {
        let h = self.next;
        self.next += 1;
        h
    }

    pub fn live_buffers(&self) -> usize {
        self.buffer_usage.len()
    }

    pub fn contents(&self, buffer: Handle) -> Vec<u8> {
        self.buffer_contents
            .borrow()
            .get(&buffer)
            .cloned()
            .unwrap_or_default()
    }

    pub fn pipeline(&self, handle: Handle) -> &RecordedPipeline {
        self.pipelines
            .iter()
            .find(|p| p.handle == handle)
            .expect("unknown pipeline handle")
    }

    fn new_buffer(&mut self, usage: BufferUsage, contents: Vec<u8>) -> Result<Handle, DeviceError> {
        if self.fail.buffer_after == Some(self.buffers_created) {
            return Err(DeviceError::BufferAllocation {
                size: contents.len() as u64,
            });
        }
        self.buffers_created += 1;
        let h = self.handle();
        self.buffer_usage.insert(h, usage);
        self.buffer_contents.borrow_mut().insert(h, contents);
        Ok(h)
    }
}

impl GpuDevice for RecordingDevice {
    type Buffer = Handle;
    type TextureView = Handle;
    type Sampler = Handle;
    type ShaderModule = Handle;
    type DescriptorSetLayout = Handle;
    type PipelineLayout = Handle;
    type Pipeline = Handle;
    type DescriptorSet = Handle;

    fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    fn current_frame(&self) -> usize {
        self.current_frame
    }

    fn framebuffer_extent(&self) -> Extent2D {
        self.extent
    }

    fn ndc_y_axis(&self) -> NdcYAxis {
        self.ndc
    }

    fn sampler(&self, mode: SamplerMode) -> Handle {
        match mode {
            SamplerMode::Clamp => CLAMP_SAMPLER,
            SamplerMode::Repeat => REPEAT_SAMPLER,
        }
    }

    fn create_shader_module(&mut self, label: &str, _blob: &[u8]) -> Result<Handle, DeviceError> {
        if self.fail.shader_module {
            return Err(DeviceError::ShaderModule {
                label: label.to_owned(),
                reason: "injected".to_owned(),
            });
        }
        let h = self.handle();
        self.shader_modules.push((h, label.to_owned()));
        Ok(h)
    }

    fn destroy_shader_module(&mut self, module: Handle) {
        self.destroyed_modules.push(module);
    }

    fn create_descriptor_set_layout(
        &mut self,
        bindings: &[DescriptorBinding],
    ) -> Result<Handle, DeviceError> {
        if self.fail.set_layout {
            return Err(DeviceError::DescriptorSetLayout("injected".to_owned()));
        }
        let h = self.handle();
        self.set_layouts.push((h, bindings.to_vec()));
        Ok(h)
    }

    fn create_pipeline_layout(&mut self, set_layout: &Handle) -> Result<Handle, DeviceError> {
        if self.fail.pipeline_layout {
            return Err(DeviceError::PipelineLayout("injected".to_owned()));
        }
        let h = self.handle();
        self.pipeline_layouts.push((h, *set_layout));
        Ok(h)
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_, Self>) -> Result<Handle, DeviceError> {
        if self.fail.pipeline || self.fail.pipeline_named.as_deref() == Some(desc.label) {
            return Err(DeviceError::Pipeline {
                label: desc.label.to_owned(),
                reason: "injected".to_owned(),
            });
        }
        let handle = self.handle();
        self.pipelines.push(RecordedPipeline {
            handle,
            label: desc.label.to_owned(),
            vertex: *desc.vertex,
            fragment: *desc.fragment,
            entry_point: desc.entry_point.to_owned(),
            layout: *desc.layout,
            bindings: desc.vertex_bindings.to_vec(),
            attributes: desc.vertex_attributes.to_vec(),
            state: desc.state,
        });
        Ok(handle)
    }

    fn destroy_pipeline(&mut self, pipeline: Handle) {
        self.destroyed_pipelines.push(pipeline);
    }

    fn create_buffer(&mut self, size: u64, usage: BufferUsage) -> Result<Handle, DeviceError> {
        self.new_buffer(usage, vec![0; size as usize])
    }

    fn create_buffer_init(&mut self, contents: &[u8], usage: BufferUsage) -> Result<Handle, DeviceError> {
        self.new_buffer(usage, contents.to_vec())
    }

    fn write_buffer(&self, buffer: &Handle, offset: u64, data: &[u8]) {
        let mut contents = self.buffer_contents.borrow_mut();
        let bytes = contents.get_mut(buffer).expect("write to unknown buffer");
        let start = offset as usize;
        bytes[start..start + data.len()].copy_from_slice(data);
    }

    fn destroy_buffer(&mut self, buffer: Handle) {
        assert!(
            self.buffer_usage.remove(&buffer).is_some(),
            "buffer {buffer} destroyed twice"
        );
        self.buffer_contents.borrow_mut().remove(&buffer);
        self.destroyed_buffers.push(buffer);
    }

    fn create_texture_rgba8(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Handle, DeviceError> {
        if pixels.len() != width as usize * height as usize * 4 {
            return Err(DeviceError::Texture {
                label: label.to_owned(),
                reason: "size mismatch".to_owned(),
            });
        }
        let h = self.handle();
        self.textures.push((h, label.to_owned(), width, height));
        Ok(h)
    }

    fn destroy_texture(&mut self, view: Handle) {
        self.destroyed_textures.push(view);
    }

    fn allocate_descriptor_set(
        &mut self,
        _layout: &Handle,
        writes: &[DescriptorWrite<'_, Self>],
    ) -> Result<Handle, DeviceError> {
        if self.fail.descriptor_set_after == Some(self.sets_allocated) {
            return Err(DeviceError::DescriptorSetAllocation("injected".to_owned()));
        }
        self.sets_allocated += 1;
        let recorded = writes
            .iter()
            .map(|w| match w.resource {
                DescriptorResource::UniformBuffer { buffer, range, .. } => RecordedWrite {
                    binding: w.binding,
                    kind: w.kind(),
                    resource: *buffer,
                    range,
                    sampler: None,
                },
                DescriptorResource::CombinedImageSampler { view, sampler } => RecordedWrite {
                    binding: w.binding,
                    kind: w.kind(),
                    resource: *view,
                    range: 0,
                    sampler: Some(*sampler),
                },
            })
            .collect();
        let h = self.handle();
        self.descriptor_sets.insert(h, recorded);
        Ok(h)
    }

    fn free_descriptor_sets(&mut self, sets: Vec<Handle>) {
        for s in sets {
            assert!(
                self.descriptor_sets.remove(&s).is_some(),
                "descriptor set {s} freed twice"
            );
            self.freed_sets.push(s);
        }
    }

    fn in_frame(&self) -> bool {
        self.in_frame
    }

    fn begin_frame(&mut self) -> Result<(), DeviceError> {
        assert!(!self.in_frame, "begin_frame called twice");
        if self.fail.begin_frame {
            return Err(DeviceError::FrameSkipped(SurfaceErrorAction::SkipFrame));
        }
        self.in_frame = true;
        self.frames_begun += 1;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), DeviceError> {
        if !self.in_frame {
            return Err(DeviceError::NoFrame);
        }
        self.in_frame = false;
        self.frames_ended += 1;
        self.current_frame = (self.current_frame + 1) % self.frames_in_flight;
        Ok(())
    }

    fn abandon_frame(&mut self) {
        if self.in_frame {
            self.in_frame = false;
            self.frames_abandoned += 1;
        }
    }

    fn record_draws(&mut self, draws: &[DrawCall<'_, Self>]) -> Result<(), DeviceError> {
        if !self.in_frame {
            return Err(DeviceError::NoFrame);
        }
        if self.fail.record {
            return Err(DeviceError::FrameSkipped(SurfaceErrorAction::Reconfigured));
        }
        let frame = self.current_frame;
        self.draws.extend(draws.iter().map(|d| RecordedDraw {
            frame,
            pipeline: *d.pipeline,
            pipeline_layout: *d.pipeline_layout,
            vertex_buffer: *d.vertex_buffer,
            index_buffer: *d.index_buffer,
            index_count: d.index_count,
            descriptor_set: *d.descriptor_set,
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_slots_rotate_on_end_frame() {
        let mut dev = RecordingDevice::new();
        for expected in [1, 0, 1] {
            dev.begin_frame().unwrap();
            dev.end_frame().unwrap();
            assert_eq!(dev.current_frame(), expected);
        }
        dev.begin_frame().unwrap();
        dev.abandon_frame();
        assert_eq!(dev.current_frame(), 1);
        assert_eq!(dev.frames_abandoned, 1);
    }

    #[test]
    fn buffer_writes_land_at_offset() {
        let mut dev = RecordingDevice::new();
        let b = dev.create_buffer(8, BufferUsage::Uniform).unwrap();
        dev.write_buffer(&b, 4, &[1, 2, 3, 4]);
        assert_eq!(dev.contents(b), vec![0, 0, 0, 0, 1, 2, 3, 4]);
    }
}
