//! Request-context resource provider registry.
//!
//! # Responsibility
//! - Own provider entries for the lifetime of the hosting request context.
//! - Serve extension resource requests from the highest-ranked provider.
//!
//! # Invariants
//! - Entries are only appended; nothing deduplicates or removes them.
//! - Lower priority values are consulted first; ties keep insertion order.

use super::loader::{read_file, resolve_under, ResourceLoader};
use super::ResourceError;
use log::debug;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Priority used for every internal extension provider.
pub const INTERNAL_PROVIDER_PRIORITY: i32 = 50;

/// Backing storage of one provider.
#[derive(Clone)]
pub enum ProviderSource {
    /// Files looked up in packaged resources under `resource_root`.
    Packaged {
        resource_root: String,
        loader: Arc<dyn ResourceLoader>,
    },
    /// Files read from an on-disk directory.
    Directory { directory: PathBuf },
}

impl Debug for ProviderSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Packaged { resource_root, .. } => f
                .debug_struct("Packaged")
                .field("resource_root", resource_root)
                .finish_non_exhaustive(),
            Self::Directory { directory } => f
                .debug_struct("Directory")
                .field("directory", directory)
                .finish(),
        }
    }
}

impl ProviderSource {
    fn load(&self, relative_path: &str) -> Result<Vec<u8>, ResourceError> {
        match self {
            Self::Packaged {
                resource_root,
                loader,
            } => {
                let resource_path = format!(
                    "{}/{}",
                    resource_root.trim_end_matches('/'),
                    relative_path.trim_start_matches('/')
                );
                loader.load_binary_resource(&resource_path)
            }
            Self::Directory { directory } => read_file(&resolve_under(directory, relative_path)?),
        }
    }
}

/// One registered provider.
#[derive(Debug, Clone)]
pub struct ProviderEntry {
    /// Origin prefix the provider answers for, e.g. `chrome-extension://id/`.
    pub origin: String,
    pub source: ProviderSource,
    pub priority: i32,
    /// Optional order key; empty when unused.
    pub identifier: String,
}

/// Registry contract exposed by a request context.
pub trait ResourceManager: Send + Sync {
    fn add_provider(&self, entry: ProviderEntry);
}

/// In-process provider registry.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: Mutex<Vec<ProviderEntry>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns a snapshot of entries in registration order.
    pub fn entries(&self) -> Vec<ProviderEntry> {
        self.lock().clone()
    }

    /// Returns entries registered for `origin`.
    pub fn entries_for_origin(&self, origin: &str) -> Vec<ProviderEntry> {
        self.lock()
            .iter()
            .filter(|entry| entry.origin == origin)
            .cloned()
            .collect()
    }

    /// Resolves `url` against registered providers.
    ///
    /// Query strings and fragments are ignored. Returns `None` when no
    /// provider matches or none has the file.
    pub fn resolve(&self, url: &str) -> Option<Vec<u8>> {
        let path_end = url.find(['?', '#']).unwrap_or(url.len());
        let url = &url[..path_end];

        let mut candidates = self.entries();
        candidates.sort_by_key(|entry| entry.priority);
        for entry in candidates {
            let Some(relative) = url.strip_prefix(entry.origin.as_str()) else {
                continue;
            };
            match entry.source.load(relative) {
                Ok(contents) => return Some(contents),
                Err(err) => {
                    debug!(
                        "event=resource_resolve module=resource status=miss origin={} priority={} error={}",
                        entry.origin, entry.priority, err
                    );
                }
            }
        }
        None
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ProviderEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResourceManager for ResourceRegistry {
    fn add_provider(&self, entry: ProviderEntry) {
        debug!(
            "event=provider_add module=resource status=ok origin={} priority={}",
            entry.origin, entry.priority
        );
        self.lock().push(entry);
    }
}
