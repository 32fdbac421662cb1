//! Context-affine extension loading pipeline.
//!
//! # Responsibility
//! - Read and parse internal extension manifests on the file context.
//! - Hand manifests to continuations on the UI context.
//! - Drive host extension loads on the UI context.
//! - Register internal extension resource providers on the IO context.
//!
//! # Invariants
//! - Manifest continuations run exactly once, always on the UI context.
//! - Manifest failures are logged once and delivered as `None`.
//! - Provider registration requires an internal extension path.
//! - Nothing here caches manifests or deduplicates providers.

use crate::config::ExtensionConfig;
use crate::dispatch::{ContextId, Dispatcher, UiContinuation};
use crate::extension::{extension_origin, ExtensionPaths, Manifest, ManifestError};
use crate::host::{ExtensionHandler, RequestContext};
use crate::resource::{
    read_file, ProviderEntry, ProviderSource, ResourceError, ResourceLoader, ResourceManager,
    INTERNAL_PROVIDER_PRIORITY,
};
use log::{debug, error, info};
use std::path::Path;
use std::sync::Arc;

/// Continuation receiving a loaded manifest, or `None` on failure.
pub type ManifestContinuation = UiContinuation<Option<Manifest>>;

/// Extension loading pipeline bound to one dispatcher.
#[derive(Clone)]
pub struct ExtensionService {
    dispatcher: Arc<Dispatcher>,
    paths: ExtensionPaths,
    resources: Arc<dyn ResourceLoader>,
    config: ExtensionConfig,
}

impl ExtensionService {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        resources: Arc<dyn ResourceLoader>,
        config: ExtensionConfig,
    ) -> Self {
        Self {
            dispatcher,
            paths: config.extension_paths(),
            resources,
            config,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn paths(&self) -> &ExtensionPaths {
        &self.paths
    }

    pub fn config(&self) -> &ExtensionConfig {
        &self.config
    }

    /// Loads the extension at `extension_path` into `request_context`.
    ///
    /// Callable from any context. Internal extensions get their packaged
    /// manifest read first; external extensions are handed to the host with
    /// no manifest so it reads them from disk.
    pub fn load_extension(
        &self,
        request_context: Arc<dyn RequestContext>,
        extension_path: &str,
        handler: Arc<dyn ExtensionHandler>,
    ) {
        let service = self.clone();
        let extension_path = extension_path.to_string();
        self.dispatcher.run_on(ContextId::Ui, move || {
            if !service.paths.is_internal(&extension_path) {
                info!(
                    "event=extension_load module=extension status=start kind=external path={}",
                    extension_path
                );
                request_context.load_extension(&extension_path, None, handler);
                return;
            }

            info!(
                "event=extension_load module=extension status=start kind=internal path={}",
                extension_path
            );
            let dispatcher = Arc::clone(&service.dispatcher);
            let path = extension_path.clone();
            service.load_manifest(
                &extension_path,
                UiContinuation::new(move |manifest| {
                    dispatcher.assert_on(ContextId::Ui);
                    request_context.load_extension(&path, manifest, handler);
                }),
            );
        });
    }

    /// Reads the packaged manifest of `extension_path` on the file context and
    /// delivers it to `continuation` on the UI context.
    ///
    /// Every call performs its own read.
    pub fn load_manifest(&self, extension_path: &str, continuation: ManifestContinuation) {
        let service = self.clone();
        let extension_path = extension_path.to_string();
        self.dispatcher.run_on(ContextId::File, move || {
            let manifest_path = service
                .paths
                .internal_resource_path(&service.paths.manifest_path(&extension_path));
            let manifest = match service.read_manifest(&manifest_path) {
                Ok(manifest) => {
                    debug!(
                        "event=manifest_load module=extension status=ok path={}",
                        manifest_path
                    );
                    Some(manifest)
                }
                Err(err) => {
                    error!(
                        "event=manifest_load module=extension status=error path={} error={}",
                        manifest_path, err
                    );
                    None
                }
            };
            continuation.deliver(&service.dispatcher, manifest);
        });
    }

    /// Registers a provider serving the packaged files of an internal
    /// extension under `chrome-extension://<extension_id>/`.
    ///
    /// Runs on the IO context. Registration is skipped when directory-backed
    /// providers are selected and no resource directory is configured.
    ///
    /// # Panics
    /// - When `extension_path` is not an internal extension path.
    pub fn register_internal_provider(
        &self,
        extension_id: &str,
        extension_path: &str,
        manager: Arc<dyn ResourceManager>,
    ) {
        assert!(
            self.paths.is_internal(extension_path),
            "resource provider requested for non-internal extension path `{extension_path}`"
        );

        let service = self.clone();
        let extension_id = extension_id.to_string();
        let extension_path = extension_path.to_string();
        self.dispatcher.run_on(ContextId::Io, move || {
            let origin = extension_origin(&extension_id);
            let resource_root = service.paths.internal_resource_path(&extension_path);

            let source = if service.config.packaged_resources {
                ProviderSource::Packaged {
                    resource_root,
                    loader: Arc::clone(&service.resources),
                }
            } else {
                let Some(resource_dir) = service.config.resource_dir.as_ref() else {
                    debug!(
                        "event=provider_register module=extension status=skip origin={} reason=no_resource_dir",
                        origin
                    );
                    return;
                };
                ProviderSource::Directory {
                    directory: resource_dir.join(&resource_root),
                }
            };

            info!(
                "event=provider_register module=extension status=ok origin={} priority={}",
                origin, INTERNAL_PROVIDER_PRIORITY
            );
            manager.add_provider(ProviderEntry {
                origin,
                source,
                priority: INTERNAL_PROVIDER_PRIORITY,
                identifier: String::new(),
            });
        });
    }

    /// Reads one extension file.
    ///
    /// Internal paths are read from packaged resources, external paths from
    /// disk. Must be called on the file context.
    pub fn extension_resource_contents(&self, extension_path: &str) -> Result<Vec<u8>, ResourceError> {
        self.dispatcher.assert_on(ContextId::File);

        if self.paths.is_internal(extension_path) {
            let resource_path = self.paths.internal_resource_path(extension_path);
            return self.resources.load_binary_resource(&resource_path);
        }
        read_file(Path::new(extension_path))
    }

    fn read_manifest(&self, manifest_path: &str) -> Result<Manifest, ManifestError> {
        let contents = self.resources.load_binary_resource(manifest_path)?;
        Manifest::parse(&contents)
    }
}
