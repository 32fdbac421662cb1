//! Popup URL and icon path lookups for loaded extensions.

use super::path::{extension_origin, join_path, ExtensionPaths};
use crate::host::HostExtension;

/// Returns the popup URL for `extension`, or `""` when it declares none.
pub fn extension_url(extension: &dyn HostExtension) -> String {
    let popup = extension.manifest().default_popup();
    if popup.is_empty() {
        return String::new();
    }
    format!("{}{popup}", extension_origin(extension.identifier()))
}

/// Returns the icon path for `extension` and whether it is packaged.
///
/// Packaged icons map to `extensions/...` resource paths; external icons keep
/// their on-disk path. Returns `("", false)` when no icon is declared.
pub fn extension_icon_path(paths: &ExtensionPaths, extension: &dyn HostExtension) -> (String, bool) {
    let icon = extension.manifest().default_icon();
    if icon.is_empty() {
        return (String::new(), false);
    }
    paths.resource_file_path(&join_path(extension.path(), icon))
}

#[cfg(test)]
mod tests {
    use super::{extension_icon_path, extension_url};
    use crate::extension::{ExtensionPaths, Manifest};
    use crate::host::LoadedExtension;
    use serde_json::json;
    use std::path::MAIN_SEPARATOR;

    fn extension(path: &str, manifest: serde_json::Value) -> LoadedExtension {
        LoadedExtension {
            id: "abc123".to_string(),
            path: path.to_string(),
            manifest: Manifest::try_from(manifest).expect("object manifest"),
        }
    }

    #[test]
    fn popup_url_joins_origin_and_popup() {
        let ext = extension(
            "set_page_color",
            json!({ "browser_action": { "default_popup": "popup.html" } }),
        );
        assert_eq!(extension_url(&ext), "chrome-extension://abc123/popup.html");
    }

    #[test]
    fn missing_browser_action_yields_empty_results() {
        let paths = ExtensionPaths::without_resources_dir();
        for manifest in [json!({}), json!({ "browser_action": {} })] {
            let ext = extension("set_page_color", manifest);
            assert_eq!(extension_url(&ext), "");
            assert_eq!(extension_icon_path(&paths, &ext), (String::new(), false));
        }
    }

    #[test]
    fn internal_icon_maps_to_packaged_resource() {
        let paths = ExtensionPaths::without_resources_dir();
        let ext = extension(
            "set_page_color",
            json!({ "browser_action": { "default_icon": "icon.png" } }),
        );
        assert_eq!(
            extension_icon_path(&paths, &ext),
            ("extensions/set_page_color/icon.png".to_string(), true)
        );
    }

    #[test]
    fn external_icon_keeps_disk_path() {
        let paths = ExtensionPaths::without_resources_dir();
        let ext = extension(
            "/srv/ext",
            json!({ "browser_action": { "default_icon": "icon.png" } }),
        );
        assert_eq!(
            extension_icon_path(&paths, &ext),
            (format!("/srv/ext{MAIN_SEPARATOR}icon.png"), false)
        );
    }
}
