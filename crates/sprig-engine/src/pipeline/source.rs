use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::RenderError;

/// Maps a shader file name to its binary blob.
pub trait ShaderSource {
    fn load(&self, name: &str) -> Result<Cow<'_, [u8]>, RenderError>;
}

impl<S: ShaderSource + ?Sized> ShaderSource for Box<S> {
    fn load(&self, name: &str) -> Result<Cow<'_, [u8]>, RenderError> {
        (**self).load(name)
    }
}

/// Loads shader blobs from a directory on disk.
#[derive(Debug, Clone)]
pub struct ShaderDir {
    root: PathBuf,
    extension: Option<String>,
}

impl ShaderDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: None,
        }
    }

    /// Appends `.{extension}` to every requested name.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        match &self.extension {
            Some(ext) => self.root.join(format!("{name}.{ext}")),
            None => self.root.join(name),
        }
    }
}

impl ShaderSource for ShaderDir {
    fn load(&self, name: &str) -> Result<Cow<'_, [u8]>, RenderError> {
        let path = self.path_for(name);
        std::fs::read(&path)
            .map(Cow::Owned)
            .map_err(|source| RenderError::ShaderLoad {
                name: name.to_owned(),
                path,
                source,
            })
    }
}

/// In-memory shader table, typically filled with `include_bytes!`.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedShaders {
    table: HashMap<String, Cow<'static, [u8]>>,
}

impl EmbeddedShaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, blob: impl Into<Cow<'static, [u8]>>) -> Self {
        self.insert(name, blob);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, blob: impl Into<Cow<'static, [u8]>>) {
        self.table.insert(name.into(), blob.into());
    }
}

impl ShaderSource for EmbeddedShaders {
    fn load(&self, name: &str) -> Result<Cow<'_, [u8]>, RenderError> {
        self.table
            .get(name)
            .map(|blob| Cow::Borrowed(blob.as_ref()))
            .ok_or_else(|| RenderError::ShaderMissing(name.to_owned()))
    }
}
