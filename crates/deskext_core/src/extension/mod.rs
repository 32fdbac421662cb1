//! Extension identity, manifests and resource paths.
//!
//! This module holds the pure parts of extension loading. Context-affine
//! loading lives in `service::extension_service`.

pub mod manifest;
pub mod path;
pub mod url;

pub use manifest::{Manifest, ManifestError};
pub use path::{
    extension_origin, join_path, ExtensionPaths, EXTENSION_SCHEME,
    INTERNAL_EXTENSIONS, INTERNAL_RESOURCE_PREFIX, MANIFEST_FILE_NAME,
};
pub use url::{extension_icon_path, extension_url};
