//! Declarative vertex/uniform layouts compiled into device layout objects.

mod compile;
mod data_layout;
mod types;

pub use compile::{compile_uniform_bindings, compile_vertex_layout, uniform_block_size, VertexLayout};
pub use data_layout::DataLayout;
pub use types::{
    AttributeAlignment, AttributeBindingLayout, AttributeLayout, DataType, UniformBindingLayout,
    UniformFieldLayout,
};
