use std::collections::HashMap;
use std::rc::Rc;

use crate::device::{Extent2D, GpuDevice};
use crate::layout::DataLayout;
use crate::{NameKey, RenderError};

use super::state::{FixedFunctionState, PipelineDesc, ENTRY_POINT};
use super::ShaderSource;

/// Everything needed to rebuild a pipeline.
struct PipelineRecipe<B: GpuDevice> {
    vertex: String,
    fragment: String,
    layout: Rc<DataLayout<B>>,
    transparent: bool,
}

struct CachedPipeline<B: GpuDevice> {
    label: String,
    pipeline: B::Pipeline,
    recipe: PipelineRecipe<B>,
    /// Framebuffer extent the viewport/scissor were baked for.
    extent: Extent2D,
    stale: bool,
}

/// Shader module and pipeline cache.
///
/// Shader modules are memoized by file name, pipelines are registered under a
/// logical name. Registering a name again replaces (and destroys) the previous
/// pipeline.
pub struct PipelineCache<B: GpuDevice> {
    source: Box<dyn ShaderSource>,
    modules: HashMap<NameKey, B::ShaderModule>,
    pipelines: HashMap<NameKey, CachedPipeline<B>>,
}

impl<B: GpuDevice> PipelineCache<B> {
    pub fn new(source: impl ShaderSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            modules: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    /// Compiles (or reuses) both shader modules and links them with `layout`
    /// into a pipeline registered under `name`.
    ///
    /// Viewport and scissor are fixed to the device's current framebuffer extent.
    pub fn create_pipeline(
        &mut self,
        device: &mut B,
        name: &str,
        vertex: &str,
        fragment: &str,
        layout: &Rc<DataLayout<B>>,
        transparent: bool,
    ) -> Result<(), RenderError> {
        let recipe = PipelineRecipe {
            vertex: vertex.to_owned(),
            fragment: fragment.to_owned(),
            layout: Rc::clone(layout),
            transparent,
        };
        let extent = device.framebuffer_extent();
        let pipeline = self.build(device, name, &recipe, extent)?;

        let entry = CachedPipeline {
            label: name.to_owned(),
            pipeline,
            recipe,
            extent,
            stale: false,
        };
        match self.pipelines.insert(NameKey::new(name), entry) {
            Some(old) => {
                log::debug!("pipeline `{name}` replaced");
                device.destroy_pipeline(old.pipeline);
            }
            None => log::debug!("pipeline `{name}` created ({vertex} + {fragment})"),
        }
        Ok(())
    }

    /// Pipeline registered under `name`.
    ///
    /// # Panics
    /// If no pipeline was registered under `name`. Looking up a pipeline that
    /// was invalidated and not rebuilt fails a debug assertion.
    pub fn pipeline(&self, name: impl Into<NameKey>) -> &B::Pipeline {
        let key = name.into();
        let Some(entry) = self.pipelines.get(&key) else {
            panic!("no pipeline registered under {key:?}");
        };
        debug_assert!(
            !entry.stale,
            "pipeline `{}` is stale; call rebuild_stale after invalidate",
            entry.label
        );
        &entry.pipeline
    }

    pub fn get_pipeline(&self, name: impl Into<NameKey>) -> Option<&B::Pipeline> {
        self.pipelines.get(&name.into()).map(|e| &e.pipeline)
    }

    pub fn contains(&self, name: impl Into<NameKey>) -> bool {
        self.pipelines.contains_key(&name.into())
    }

    pub fn is_stale(&self, name: impl Into<NameKey>) -> bool {
        self.pipelines.get(&name.into()).is_some_and(|e| e.stale)
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Marks every pipeline baked for a different extent as stale.
    /// Returns the number of newly stale pipelines.
    pub fn invalidate(&mut self, extent: Extent2D) -> usize {
        let mut marked = 0;
        for entry in self.pipelines.values_mut() {
            if entry.extent != extent && !entry.stale {
                entry.stale = true;
                marked += 1;
            }
        }
        if marked > 0 {
            log::debug!("{marked} pipeline(s) invalidated for {}x{}", extent.width, extent.height);
        }
        marked
    }

    /// Rebuilds stale pipelines against the device's current extent.
    ///
    /// Every stale pipeline is attempted. One that fails keeps its old object
    /// and stays stale; the first failure is returned after the pass.
    pub fn rebuild_stale(&mut self, device: &mut B) -> Result<usize, RenderError> {
        let stale: Vec<NameKey> = self
            .pipelines
            .iter()
            .filter(|(_, e)| e.stale)
            .map(|(k, _)| *k)
            .collect();
        if stale.is_empty() {
            return Ok(0);
        }

        let extent = device.framebuffer_extent();
        let mut rebuilt = 0;
        let mut first_error = None;
        for key in &stale {
            let Some(mut entry) = self.pipelines.remove(key) else { continue };
            match self.build(device, &entry.label, &entry.recipe, extent) {
                Ok(pipeline) => {
                    let old = std::mem::replace(&mut entry.pipeline, pipeline);
                    device.destroy_pipeline(old);
                    entry.extent = extent;
                    entry.stale = false;
                    rebuilt += 1;
                }
                Err(e) => {
                    log::warn!("pipeline `{}` could not be rebuilt: {e}", entry.label);
                    first_error.get_or_insert(e);
                }
            }
            self.pipelines.insert(*key, entry);
        }

        log::info!(
            "rebuilt {rebuilt}/{} pipeline(s) for {}x{}",
            stale.len(),
            extent.width,
            extent.height
        );
        match first_error {
            Some(e) => Err(e),
            None => Ok(rebuilt),
        }
    }

    /// Releases every shader module. Later pipeline creation recompiles on demand.
    pub fn clear_modules(&mut self, device: &mut B) {
        for (_, module) in self.modules.drain() {
            device.destroy_shader_module(module);
        }
    }

    /// Releases all shader modules, then all pipelines.
    pub fn deinit(&mut self, device: &mut B) {
        self.clear_modules(device);
        for (_, entry) in self.pipelines.drain() {
            device.destroy_pipeline(entry.pipeline);
        }
    }

    fn module(&mut self, device: &mut B, file: &str) -> Result<B::ShaderModule, RenderError> {
        let key = NameKey::new(file);
        if let Some(m) = self.modules.get(&key) {
            log::trace!("shader module `{file}` reused");
            return Ok(m.clone());
        }

        let blob = self.source.load(file)?;
        let module = device.create_shader_module(file, &blob)?;
        log::debug!("shader module `{file}` compiled ({} bytes)", blob.len());
        self.modules.insert(key, module.clone());
        Ok(module)
    }

    fn build(
        &mut self,
        device: &mut B,
        label: &str,
        recipe: &PipelineRecipe<B>,
        extent: Extent2D,
    ) -> Result<B::Pipeline, RenderError> {
        let vertex = self.module(device, &recipe.vertex)?;
        let fragment = self.module(device, &recipe.fragment)?;

        let desc = PipelineDesc {
            label,
            vertex: &vertex,
            fragment: &fragment,
            entry_point: ENTRY_POINT,
            vertex_bindings: recipe.layout.vertex_bindings(),
            vertex_attributes: recipe.layout.vertex_attributes(),
            layout: recipe.layout.pipeline_layout(),
            state: FixedFunctionState::sprite(extent, recipe.transparent),
        };
        Ok(device.create_pipeline(&desc)?)
    }
}
