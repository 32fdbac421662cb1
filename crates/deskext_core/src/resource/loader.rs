//! Binary resource loaders backing packaged extension files.

use super::ResourceError;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Loads packaged resources by their `/`-separated resource path.
pub trait ResourceLoader: Send + Sync {
    fn load_binary_resource(&self, resource_path: &str) -> Result<Vec<u8>, ResourceError>;
}

/// Loader reading `<root>/<resource_path>` from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryResourceLoader {
    root: PathBuf,
}

impl DirectoryResourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceLoader for DirectoryResourceLoader {
    fn load_binary_resource(&self, resource_path: &str) -> Result<Vec<u8>, ResourceError> {
        let path = resolve_under(&self.root, resource_path)?;
        read_file(&path)
    }
}

/// Loader serving resources compiled into, or registered with, the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedResourceLoader {
    entries: BTreeMap<String, Vec<u8>>,
}

impl EmbeddedResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one resource.
    pub fn insert(&mut self, resource_path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.entries.insert(resource_path.into(), contents.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for EmbeddedResourceLoader
where
    K: Into<String>,
    V: Into<Vec<u8>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut loader = Self::new();
        for (path, contents) in iter {
            loader.insert(path, contents);
        }
        loader
    }
}

impl ResourceLoader for EmbeddedResourceLoader {
    fn load_binary_resource(&self, resource_path: &str) -> Result<Vec<u8>, ResourceError> {
        self.entries
            .get(resource_path.trim_start_matches('/'))
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(resource_path.to_string()))
    }
}

/// Resolves a `/`-separated relative path under `root`, refusing escapes.
pub(crate) fn resolve_under(root: &Path, relative: &str) -> Result<PathBuf, ResourceError> {
    let relative = Path::new(relative.trim_start_matches('/'));
    let escapes = relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(ResourceError::InvalidPath(relative.display().to_string()));
    }
    Ok(root.join(relative))
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, ResourceError> {
    std::fs::read(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => ResourceError::NotFound(path.display().to_string()),
        _ => ResourceError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        },
    })
}
