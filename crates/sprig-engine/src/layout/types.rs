use crate::device::{ShaderStages, VertexFormat};

/// Scalar/vector types usable in vertex attributes and uniform blocks.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DataType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    /// Uniform blocks only.
    Mat4,
}

impl DataType {
    /// One float of padding.
    pub const PAD1: DataType = DataType::Float;
    /// Two floats of padding.
    pub const PAD2: DataType = DataType::Vec2;

    /// Size in floats.
    #[inline]
    pub const fn components(self) -> u32 {
        match self {
            DataType::Float => 1,
            DataType::Vec2 => 2,
            DataType::Vec3 => 3,
            DataType::Vec4 => 4,
            DataType::Mat4 => 16,
        }
    }

    #[inline]
    pub const fn size_bytes(self) -> u32 {
        self.components() * 4
    }

    /// Required start offset, in floats.
    #[inline]
    pub const fn alignment(self) -> u32 {
        match self {
            DataType::Float => 1,
            DataType::Vec2 => 2,
            DataType::Vec3 | DataType::Vec4 | DataType::Mat4 => 4,
        }
    }

    /// Vertex fetch format, `None` for matrices.
    #[inline]
    pub const fn vertex_format(self) -> Option<VertexFormat> {
        match self {
            DataType::Float => Some(VertexFormat::Float32),
            DataType::Vec2 => Some(VertexFormat::Float32x2),
            DataType::Vec3 => Some(VertexFormat::Float32x3),
            DataType::Vec4 => Some(VertexFormat::Float32x4),
            DataType::Mat4 => None,
        }
    }
}

/// One vertex shader input.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttributeLayout {
    pub name: &'static str,
    pub ty: DataType,
    pub location: u32,
}

impl AttributeLayout {
    pub const fn new(name: &'static str, ty: DataType, location: u32) -> Self {
        Self { name, ty, location }
    }
}

/// How attribute offsets inside one binding are checked.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum AttributeAlignment {
    /// vec2 starts on an even float, vec3/vec4 on a multiple of four (debug-checked).
    #[default]
    Std140,
    /// Tightly packed, no start-offset rule.
    Packed,
}

/// Attributes fed from one vertex buffer binding, in declaration order.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct AttributeBindingLayout {
    pub attributes: Vec<AttributeLayout>,
    pub alignment: AttributeAlignment,
}

impl AttributeBindingLayout {
    pub fn new(attributes: impl Into<Vec<AttributeLayout>>) -> Self {
        Self {
            attributes: attributes.into(),
            alignment: AttributeAlignment::Std140,
        }
    }

    pub fn packed(attributes: impl Into<Vec<AttributeLayout>>) -> Self {
        Self {
            attributes: attributes.into(),
            alignment: AttributeAlignment::Packed,
        }
    }
}

/// Named member of a uniform block; only used for validation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformFieldLayout {
    pub name: &'static str,
    pub ty: DataType,
}

impl UniformFieldLayout {
    pub const fn new(name: &'static str, ty: DataType) -> Self {
        Self { name, ty }
    }
}

/// One resource binding. The slot index is the position in the list.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformBindingLayout {
    pub stages: ShaderStages,
    pub sampler: bool,
    pub repeat_sampler: bool,
    pub fields: Vec<UniformFieldLayout>,
}

impl UniformBindingLayout {
    /// Uniform buffer with the given member layout.
    pub fn uniform(stages: ShaderStages, fields: impl Into<Vec<UniformFieldLayout>>) -> Self {
        Self {
            stages,
            sampler: false,
            repeat_sampler: false,
            fields: fields.into(),
        }
    }

    /// Combined image-sampler using the device's shared repeat or clamp sampler.
    pub fn sampler(stages: ShaderStages, repeat: bool) -> Self {
        Self {
            stages,
            sampler: true,
            repeat_sampler: repeat,
            fields: Vec::new(),
        }
    }
}
