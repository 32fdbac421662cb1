//! Extension resolution and thread-affine loading for the desktop shell.
//! This crate owns path classification, manifest loading, resource provider
//! registration and lifecycle delegate broadcast.

pub mod app;
pub mod config;
pub mod dispatch;
pub mod extension;
pub mod host;
pub mod logging;
pub mod resource;
pub mod service;

pub use app::{BrowserApp, BrowserDelegate, CommandLine};
pub use config::{ConfigError, ExtensionConfig};
pub use dispatch::{ContextId, DispatchError, Dispatcher, UiContinuation};
pub use extension::{
    extension_icon_path, extension_origin, extension_url, ExtensionPaths, Manifest, ManifestError,
};
pub use host::{
    ExtensionHandler, HostExtension, InMemoryRequestContext, LoadedExtension, RequestContext,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use resource::{
    DirectoryResourceLoader, EmbeddedResourceLoader, ProviderEntry, ProviderSource,
    ResourceError, ResourceLoader, ResourceManager, ResourceRegistry, INTERNAL_PROVIDER_PRIORITY,
};
pub use service::extension_service::{ExtensionService, ManifestContinuation};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
