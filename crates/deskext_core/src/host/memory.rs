//! In-process request context used by the CLI and tests.

use super::{ExtensionHandler, LoadedExtension, RequestContext};
use crate::extension::{join_path, Manifest, MANIFEST_FILE_NAME};
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Returns the deterministic identifier assigned to `extension_path`.
pub fn extension_id_for_path(extension_path: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, extension_path.as_bytes())
        .simple()
        .to_string()
}

/// Request context keeping loaded extensions in memory.
///
/// When no manifest is supplied, `<path>/manifest.json` is read from disk.
#[derive(Debug, Default)]
pub struct InMemoryRequestContext {
    extensions: Mutex<Vec<LoadedExtension>>,
}

impl InMemoryRequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns loaded extensions in load order.
    pub fn loaded(&self) -> Vec<LoadedExtension> {
        self.lock().clone()
    }

    pub fn get(&self, extension_id: &str) -> Option<LoadedExtension> {
        self.lock()
            .iter()
            .find(|extension| extension.id == extension_id)
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LoadedExtension>> {
        self.extensions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl RequestContext for InMemoryRequestContext {
    fn load_extension(
        &self,
        extension_path: &str,
        manifest: Option<Manifest>,
        handler: Arc<dyn ExtensionHandler>,
    ) {
        let manifest = match manifest {
            Some(manifest) => manifest,
            None => {
                let manifest_path = join_path(extension_path, MANIFEST_FILE_NAME);
                let loaded = std::fs::read(&manifest_path)
                    .map_err(|err| err.to_string())
                    .and_then(|bytes| Manifest::parse(&bytes).map_err(|err| err.to_string()));
                match loaded {
                    Ok(manifest) => manifest,
                    Err(reason) => {
                        warn!(
                            "event=host_load_extension module=host status=error path={} error={}",
                            extension_path, reason
                        );
                        handler.on_extension_load_failed(extension_path, &reason);
                        return;
                    }
                }
            }
        };

        let extension = LoadedExtension {
            id: extension_id_for_path(extension_path),
            path: extension_path.to_string(),
            manifest,
        };
        info!(
            "event=host_load_extension module=host status=ok path={} extension_id={}",
            extension.path, extension.id
        );
        self.lock().push(extension.clone());
        handler.on_extension_loaded(&extension);
    }
}

#[cfg(test)]
mod tests {
    use super::{extension_id_for_path, InMemoryRequestContext};
    use crate::extension::Manifest;
    use crate::host::{ExtensionHandler, LoadedExtension, RequestContext};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingHandler {
        loaded: Mutex<Vec<String>>,
        failed: Mutex<Vec<String>>,
    }

    impl ExtensionHandler for RecordingHandler {
        fn on_extension_loaded(&self, extension: &LoadedExtension) {
            self.loaded.lock().expect("loaded lock").push(extension.id.clone());
        }

        fn on_extension_load_failed(&self, extension_path: &str, _reason: &str) {
            self.failed
                .lock()
                .expect("failed lock")
                .push(extension_path.to_string());
        }
    }

    #[test]
    fn extension_ids_are_deterministic_hex() {
        let id = extension_id_for_path("set_page_color");
        assert_eq!(id, extension_id_for_path("set_page_color"));
        assert_ne!(id, extension_id_for_path("other"));
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn loads_with_supplied_manifest() {
        let context = InMemoryRequestContext::new();
        let handler = Arc::new(RecordingHandler::default());
        context.load_extension("set_page_color", Some(Manifest::default()), handler.clone());

        let loaded = context.loaded();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].path, "set_page_color");
        assert_eq!(*handler.loaded.lock().expect("loaded lock"), vec![loaded[0].id.clone()]);
    }

    #[test]
    fn reads_manifest_from_disk_when_absent() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(
            dir.path().join("manifest.json"),
            br#"{"browser_action":{"default_popup":"p.html"}}"#,
        )
        .expect("write manifest");
        let path = dir.path().to_string_lossy().into_owned();

        let context = InMemoryRequestContext::new();
        context.load_extension(&path, None, Arc::new(RecordingHandler::default()));

        let loaded = context
            .get(&extension_id_for_path(&path))
            .expect("extension should load");
        assert_eq!(loaded.manifest.default_popup(), "p.html");
    }

    #[test]
    fn reports_failure_when_disk_manifest_missing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().to_string_lossy().into_owned();
        let handler = Arc::new(RecordingHandler::default());

        let context = InMemoryRequestContext::new();
        context.load_extension(&path, None, handler.clone());

        assert!(context.loaded().is_empty());
        assert_eq!(*handler.failed.lock().expect("failed lock"), vec![path]);
    }
}
