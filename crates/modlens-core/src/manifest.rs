//! Package manifest (`package.json`) reading.
//!
//! Only the fields module resolution looks at are kept. Exports and imports
//! maps keep their key order, since conditions are matched in declaration
//! order.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::Error;

pub const MANIFEST_FILE: &str = "package.json";

/// A node of an `exports` or `imports` map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportsNode {
    /// A target path such as `"./dist/index.js"`.
    Target(String),
    /// Subpath keys or condition names, in declaration order.
    Branch(Vec<(String, ExportsNode)>),
    /// Alternatives tried in order.
    Fallback(Vec<ExportsNode>),
    /// Explicitly excluded.
    Null,
}

impl ExportsNode {
    /// Build from JSON. Numbers and booleans are not valid targets and
    /// become [`ExportsNode::Null`].
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(target) => Self::Target(target.clone()),
            Value::Object(map) => Self::Branch(
                map.iter()
                    .map(|(key, value)| (key.clone(), Self::from_value(value)))
                    .collect(),
            ),
            Value::Array(items) => Self::Fallback(items.iter().map(Self::from_value).collect()),
            Value::Null | Value::Bool(_) | Value::Number(_) => Self::Null,
        }
    }

    /// Entries of a branch node.
    #[must_use]
    pub fn entries(&self) -> Option<&[(String, ExportsNode)]> {
        match self {
            Self::Branch(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a key of a branch node.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ExportsNode> {
        self.entries()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }
}

/// The fields of a package manifest that affect module resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: Option<String>,
    /// The `type` field (`"module"` or `"commonjs"`).
    pub module_type: Option<String>,
    pub main: Option<String>,
    pub exports: Option<ExportsNode>,
    pub imports: Option<ExportsNode>,
}

impl PackageManifest {
    /// Build from a parsed manifest. Fields of the wrong JSON type are
    /// ignored rather than rejected.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let string_field = |key: &str| value.get(key).and_then(Value::as_str).map(String::from);
        Self {
            name: string_field("name"),
            module_type: string_field("type"),
            main: string_field("main"),
            exports: value
                .get("exports")
                .filter(|v| !v.is_null())
                .map(ExportsNode::from_value),
            imports: value
                .get("imports")
                .filter(|v| v.is_object())
                .map(ExportsNode::from_value),
        }
    }

    /// Parse manifest text. `path` is only used for error reporting.
    pub fn parse(content: &str, path: &Path) -> Result<Self, Error> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| Error::InvalidPackageConfig {
                manifest: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(Self::from_value(&value))
    }

    /// Load the manifest at `path`.
    ///
    /// A missing or unreadable file is [`Error::ManifestAbsent`]; malformed
    /// JSON is [`Error::InvalidPackageConfig`].
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "manifest absent");
                return Err(Error::ManifestAbsent {
                    path: path.to_path_buf(),
                });
            }
        };
        Self::parse(&content, path)
    }

    /// Whether the package declares itself an ES module package.
    #[must_use]
    pub fn is_module(&self) -> bool {
        self.module_type.as_deref() == Some("module")
    }
}

/// The package that owns a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageScope {
    /// Directory holding the manifest.
    pub dir: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: PackageManifest,
}

/// Find the nearest manifest at or above `start`.
///
/// The walk stops at a `node_modules` directory: a package never belongs
/// to a manifest outside the `node_modules` it was installed into.
/// Directories whose manifest is absent are skipped; a malformed manifest
/// is an error.
pub fn find_package_scope(start: &Path) -> Result<Option<PackageScope>, Error> {
    for dir in start.ancestors() {
        if dir.file_name().is_some_and(|name| name == "node_modules") {
            break;
        }
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            continue;
        }
        match PackageManifest::load(&manifest_path) {
            Ok(manifest) => {
                return Ok(Some(PackageScope {
                    dir: dir.to_path_buf(),
                    manifest_path,
                    manifest,
                }));
            }
            Err(Error::ManifestAbsent { .. }) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_from_value_keeps_condition_order() {
        let manifest = PackageManifest::from_value(&json!({
            "name": "pkg",
            "type": "module",
            "exports": {
                ".": { "require": "./a.cjs", "import": "./a.mjs", "default": "./a.js" }
            }
        }));
        assert!(manifest.is_module());
        let root = manifest.exports.as_ref().unwrap().get(".").unwrap();
        let keys: Vec<_> = root.entries().unwrap().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["require", "import", "default"]);
    }

    #[test]
    fn test_from_value_tolerates_wrong_types() {
        let manifest = PackageManifest::from_value(&json!({
            "name": 42,
            "main": ["index.js"],
            "exports": { "./x": [ "./x.js", 7, null ] },
            "imports": "./not-a-map.js"
        }));
        assert_eq!(manifest.name, None);
        assert_eq!(manifest.main, None);
        assert_eq!(manifest.imports, None);
        assert_eq!(
            manifest.exports.unwrap().get("./x"),
            Some(&ExportsNode::Fallback(vec![
                ExportsNode::Target("./x.js".into()),
                ExportsNode::Null,
                ExportsNode::Null,
            ]))
        );
    }

    #[test]
    fn test_load_missing_is_absent() {
        let dir = tempdir().unwrap();
        let err = PackageManifest::load(&dir.path().join("package.json")).unwrap_err();
        assert!(matches!(err, Error::ManifestAbsent { .. }));
    }

    #[test]
    fn test_load_malformed_is_invalid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, "{ not json").unwrap();
        let err = PackageManifest::load(&path).unwrap_err();
        assert_eq!(err.code().as_str(), "ERR_INVALID_PACKAGE_CONFIG");
    }

    #[test]
    fn test_find_package_scope_nearest() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name":"outer"}"#).unwrap();
        let inner = dir.path().join("packages/inner/src");
        fs::create_dir_all(&inner).unwrap();
        fs::write(
            dir.path().join("packages/inner/package.json"),
            r#"{"name":"inner","type":"module"}"#,
        )
        .unwrap();

        let scope = find_package_scope(&inner).unwrap().unwrap();
        assert_eq!(scope.manifest.name.as_deref(), Some("inner"));
        assert_eq!(scope.dir, dir.path().join("packages/inner"));
    }

    #[test]
    fn test_find_package_scope_stops_at_node_modules() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name":"app"}"#).unwrap();
        let loose = dir.path().join("node_modules/loose/lib");
        fs::create_dir_all(&loose).unwrap();

        assert_eq!(find_package_scope(&loose).unwrap(), None);
    }
}
