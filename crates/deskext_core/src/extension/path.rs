//! Extension path classification and resource path derivation.
//!
//! # Responsibility
//! - Decide whether an extension path names a bundled (internal) extension.
//! - Derive packaged resource paths and origins for extensions.
//!
//! # Invariants
//! - Classification depends only on the path, the bundled-resources root and
//!   the compiled-in allowlist.
//! - Internal paths always use `/` as separator.
//! - Every function is total: empty or malformed input classifies as external.

use std::path::{Path, MAIN_SEPARATOR};

/// Names of extensions bundled with the application.
pub const INTERNAL_EXTENSIONS: &[&str] = &["set_page_color"];

/// Prefix of every packaged extension resource path.
pub const INTERNAL_RESOURCE_PREFIX: &str = "extensions/";

/// Manifest file name inside an extension root.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// URL scheme used for extension origins.
pub const EXTENSION_SCHEME: &str = "chrome-extension";

/// Path resolver bound to one bundled-resources root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionPaths {
    resources_prefix: Option<String>,
}

impl ExtensionPaths {
    /// Creates a resolver that strips `resources_dir` from internal paths.
    ///
    /// An empty or missing directory disables prefix stripping. Trailing
    /// separators on `resources_dir` collapse into one.
    pub fn new(resources_dir: Option<&Path>) -> Self {
        let resources_prefix = resources_dir
            .map(|dir| dir.to_string_lossy().into_owned())
            .filter(|dir| !dir.is_empty())
            .map(|dir| {
                let mut prefix = dir.trim_end_matches(['/', '\\']).to_string();
                prefix.push(MAIN_SEPARATOR);
                prefix
            });
        Self { resources_prefix }
    }

    /// Resolver without a bundled-resources root.
    pub fn without_resources_dir() -> Self {
        Self::default()
    }

    /// Returns `true` when `extension_path` names an allowlisted extension,
    /// either exactly or through its first directory component.
    pub fn is_internal(&self, extension_path: &str) -> bool {
        let internal_path = self.internal_path(extension_path);
        INTERNAL_EXTENSIONS.iter().any(|name| {
            internal_path == *name
                || internal_path
                    .strip_prefix(name)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Returns `extensions/<relative path>` for `extension_path`.
    ///
    /// Does not check classification; callers test `is_internal` first when
    /// that matters.
    pub fn internal_resource_path(&self, extension_path: &str) -> String {
        format!(
            "{INTERNAL_RESOURCE_PREFIX}{}",
            self.internal_path(extension_path)
        )
    }

    /// Returns the packaged resource path for internal extensions and the
    /// original path otherwise, together with the classification.
    pub fn resource_file_path(&self, extension_path: &str) -> (String, bool) {
        if self.is_internal(extension_path) {
            (self.internal_resource_path(extension_path), true)
        } else {
            (extension_path.to_string(), false)
        }
    }

    /// Returns the path of the manifest inside `extension_path`.
    pub fn manifest_path(&self, extension_path: &str) -> String {
        join_path(extension_path, MANIFEST_FILE_NAME)
    }

    fn internal_path(&self, extension_path: &str) -> String {
        let relative = match self.resources_prefix.as_deref() {
            Some(prefix) => extension_path
                .strip_prefix(prefix)
                .unwrap_or(extension_path),
            None => extension_path,
        };
        relative.replace('\\', "/")
    }
}

/// Joins two path segments with exactly one platform separator.
pub fn join_path(base: &str, child: &str) -> String {
    if base.is_empty() {
        return child.to_string();
    }
    if child.is_empty() {
        return base.to_string();
    }

    let mut joined = base.to_string();
    if !joined.ends_with(MAIN_SEPARATOR) {
        joined.push(MAIN_SEPARATOR);
    }
    joined.push_str(child.strip_prefix(MAIN_SEPARATOR).unwrap_or(child));
    joined
}

/// Returns `chrome-extension://<extension_id>/`.
pub fn extension_origin(extension_id: &str) -> String {
    format!("{EXTENSION_SCHEME}://{extension_id}/")
}

#[cfg(test)]
mod tests {
    use super::{
        extension_origin, join_path, ExtensionPaths, INTERNAL_EXTENSIONS,
        INTERNAL_RESOURCE_PREFIX, MAIN_SEPARATOR,
    };
    use std::path::Path;

    fn rooted() -> (ExtensionPaths, String) {
        let root = Path::new("/opt/deskext/resources");
        let prefix = format!("{}{MAIN_SEPARATOR}", root.display());
        (ExtensionPaths::new(Some(root)), prefix)
    }

    #[test]
    fn allowlisted_names_are_internal_with_and_without_root() {
        let (paths, prefix) = rooted();
        for name in INTERNAL_EXTENSIONS {
            assert!(paths.is_internal(name));
            assert!(paths.is_internal(&format!("{prefix}{name}")));
            assert!(paths.is_internal(&format!("{prefix}{name}/icon.png")));
            assert!(paths.is_internal(&format!("{name}/nested/dir/file.js")));
        }
    }

    #[test]
    fn trailing_separators_on_root_are_collapsed() {
        for root in ["/opt/deskext/resources/", "/opt/deskext/resources//", "/opt/deskext/resources\\"] {
            let paths = ExtensionPaths::new(Some(Path::new(root)));
            let prefix = format!("/opt/deskext/resources{MAIN_SEPARATOR}");
            assert!(paths.is_internal(&format!("{prefix}set_page_color")), "root {root}");
            assert_eq!(
                paths.internal_resource_path(&format!("{prefix}set_page_color/popup.html")),
                "extensions/set_page_color/popup.html"
            );
        }
    }

    #[test]
    fn non_allowlisted_names_are_external() {
        let (paths, prefix) = rooted();
        assert!(!paths.is_internal("set_page_colour"));
        assert!(!paths.is_internal("set_page_color_extra"));
        assert!(!paths.is_internal(&format!("{prefix}other/set_page_color")));
        assert!(!paths.is_internal("/home/user/extensions/set_page_color"));
    }

    #[test]
    fn empty_and_separator_only_paths_are_external() {
        let paths = ExtensionPaths::without_resources_dir();
        assert!(!paths.is_internal(""));
        assert!(!paths.is_internal("/"));
        assert!(!paths.is_internal("\\"));
    }

    #[test]
    fn backslash_separators_are_normalized() {
        let paths = ExtensionPaths::without_resources_dir();
        assert!(paths.is_internal("set_page_color\\popup.html"));
        assert_eq!(
            paths.internal_resource_path("set_page_color\\popup.html"),
            "extensions/set_page_color/popup.html"
        );
    }

    #[test]
    fn internal_resource_path_strips_resources_root() {
        let (paths, prefix) = rooted();
        assert_eq!(
            paths.internal_resource_path(&format!("{prefix}set_page_color")),
            "extensions/set_page_color"
        );
        assert_eq!(
            paths.internal_resource_path("unrelated/ext"),
            "extensions/unrelated/ext"
        );
    }

    #[test]
    fn internal_resource_path_is_stable_under_renormalization() {
        let paths = ExtensionPaths::without_resources_dir();
        for input in ["set_page_color/a\\b.png", "x\\y", "plain", ""] {
            let first = paths.internal_resource_path(input);
            let suffix = first
                .strip_prefix(INTERNAL_RESOURCE_PREFIX)
                .expect("prefix present");
            let second = paths.internal_resource_path(suffix);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn resource_file_path_reports_classification() {
        let paths = ExtensionPaths::without_resources_dir();
        assert_eq!(
            paths.resource_file_path("set_page_color/icon.png"),
            ("extensions/set_page_color/icon.png".to_string(), true)
        );
        assert_eq!(
            paths.resource_file_path("/srv/ext/icon.png"),
            ("/srv/ext/icon.png".to_string(), false)
        );
    }

    #[test]
    fn join_path_uses_single_separator() {
        let sep = MAIN_SEPARATOR;
        assert_eq!(join_path("a", "b"), format!("a{sep}b"));
        assert_eq!(join_path(&format!("a{sep}"), "b"), format!("a{sep}b"));
        assert_eq!(join_path("a", &format!("{sep}b")), format!("a{sep}b"));
        assert_eq!(join_path("", "b"), "b");
        assert_eq!(join_path("a", ""), "a");
    }

    #[test]
    fn origin_uses_extension_scheme() {
        assert_eq!(extension_origin("abc123"), "chrome-extension://abc123/");
    }
}
