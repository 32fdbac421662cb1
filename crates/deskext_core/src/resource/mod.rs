//! Packaged resource loading and request-time resource providers.
//!
//! # Responsibility
//! - Load packaged extension files by resource path.
//! - Keep the provider registry consulted when serving extension origins.
//!
//! # Invariants
//! - Resource paths are `/`-separated and never escape their root.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod loader;
mod registry;

pub(crate) use loader::read_file;
pub use loader::{DirectoryResourceLoader, EmbeddedResourceLoader, ResourceLoader};
pub use registry::{
    ProviderEntry, ProviderSource, ResourceManager, ResourceRegistry, INTERNAL_PROVIDER_PRIORITY,
};

/// Resource lookup failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    NotFound(String),
    InvalidPath(String),
    Io { path: String, message: String },
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "resource not found: {path}"),
            Self::InvalidPath(path) => write!(f, "resource path is invalid: {path}"),
            Self::Io { path, message } => write!(f, "failed to read resource `{path}`: {message}"),
        }
    }
}

impl Error for ResourceError {}
