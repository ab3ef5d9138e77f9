//! Shader modules, fixed-function state and the pipeline cache.

mod cache;
mod source;
mod state;

pub use cache::PipelineCache;
pub use source::{EmbeddedShaders, ShaderDir, ShaderSource};
pub use state::{
    BlendComponent, BlendFactor, BlendOp, BlendState, CullMode, FixedFunctionState, FrontFace,
    PipelineDesc, PrimitiveTopology, ENTRY_POINT,
};
