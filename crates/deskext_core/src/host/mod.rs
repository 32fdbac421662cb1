//! Host engine collaborator contracts.
//!
//! The browser engine stays opaque: these traits cover the calls the
//! extension pipeline makes into it and the view it hands back once an
//! extension is loaded.

use crate::extension::Manifest;
use std::sync::Arc;

mod memory;

pub use memory::{extension_id_for_path, InMemoryRequestContext};

/// Loaded-extension view exposed by the host.
pub trait HostExtension {
    /// Host-assigned extension identifier.
    fn identifier(&self) -> &str;
    /// Extension root path as passed to `load_extension`.
    fn path(&self) -> &str;
    fn manifest(&self) -> &Manifest;
}

/// Snapshot of one extension loaded by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedExtension {
    pub id: String,
    pub path: String,
    pub manifest: Manifest,
}

impl HostExtension for LoadedExtension {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

/// Receives host notifications about extension loads.
pub trait ExtensionHandler: Send + Sync {
    fn on_extension_loaded(&self, _extension: &LoadedExtension) {}

    fn on_extension_load_failed(&self, _extension_path: &str, _reason: &str) {}
}

/// Request-context surface used to load extensions.
///
/// Implementations are called on the UI context.
pub trait RequestContext: Send + Sync {
    /// Loads the extension at `extension_path`.
    ///
    /// `manifest` is `None` when the host should read the manifest itself.
    fn load_extension(
        &self,
        extension_path: &str,
        manifest: Option<Manifest>,
        handler: Arc<dyn ExtensionHandler>,
    );
}
