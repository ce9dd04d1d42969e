//! Reverse lookup from a file inside `node_modules` to the package subpath
//! that exports it.

use std::path::Path;

use serde::Serialize;

use crate::error::Error;
use crate::manifest::{ExportsNode, PackageManifest, MANIFEST_FILE};
use crate::utils::file_url_to_path;

/// A path split at its owning `node_modules` package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestPath {
    /// Everything up to and including the last `node_modules/`.
    pub dir: String,
    /// Package name, scoped names included.
    pub name: String,
    /// `./`-prefixed remainder, or empty.
    pub subpath: String,
}

impl ManifestPath {
    /// Directory of the package itself.
    #[must_use]
    pub fn package_dir(&self) -> String {
        format!("{}{}", self.dir, self.name)
    }
}

/// Split `path` (a path or `file:` URL) at the last `node_modules/<name>`.
pub fn parse_manifest_path(path: &str) -> Result<Option<ManifestPath>, Error> {
    const MARKER: &str = "/node_modules/";
    let path = file_url_to_path(path)?;
    let Some(at) = path.rfind(MARKER) else {
        return Ok(None);
    };
    let (dir, rest) = path.split_at(at + MARKER.len());

    let (name, remainder) = if let Some(scoped) = rest.strip_prefix('@') {
        let mut parts = scoped.splitn(3, '/');
        let scope = parts.next().unwrap_or_default();
        let Some(package) = parts.next().filter(|p| !p.is_empty()) else {
            return Ok(None);
        };
        if scope.is_empty() {
            return Ok(None);
        }
        (format!("@{scope}/{package}"), parts.next())
    } else {
        match rest.split_once('/') {
            Some((name, remainder)) => (name.to_string(), Some(remainder)),
            None => (rest.to_string(), None),
        }
    };
    if name.is_empty() || name.rfind('@').is_some_and(|i| i > 0) {
        return Ok(None);
    }

    let subpath = match remainder {
        Some(rest) if !rest.is_empty() => format!("./{rest}"),
        _ => String::new(),
    };
    Ok(Some(ManifestPath {
        dir: dir.to_string(),
        name,
        subpath,
    }))
}

/// The exports-map key under which `path` is published, or `path` without
/// its extension when there is none.
///
/// An unreadable or malformed manifest falls back too.
pub fn resolve_subpath(path: &str) -> Result<String, Error> {
    let normalized = file_url_to_path(path)?;
    let fallback = || modlens_util::path::strip_extension(&normalized).to_string();

    let Some(parsed) = parse_manifest_path(&normalized)? else {
        return Ok(fallback());
    };
    if parsed.subpath.is_empty() {
        return Ok(fallback());
    }

    let manifest_path = Path::new(&parsed.package_dir()).join(MANIFEST_FILE);
    let manifest = match PackageManifest::load(&manifest_path) {
        Ok(manifest) => manifest,
        Err(e @ (Error::ManifestAbsent { .. } | Error::InvalidPackageConfig { .. })) => {
            tracing::debug!(manifest = %manifest_path.display(), error = %e, "ignoring package manifest");
            return Ok(fallback());
        }
        Err(e) => return Err(e),
    };
    let Some(exports) = manifest.exports else {
        return Ok(fallback());
    };

    let found = flatten_exports(&exports)
        .into_iter()
        .find_map(|(key, target)| match_target(&key, &target, &parsed.subpath));
    Ok(found.unwrap_or_else(fallback))
}

/// `(subpath key, target)` pairs of an exports map. Condition branches
/// inherit the nearest enclosing subpath key.
#[must_use]
pub fn flatten_exports(exports: &ExportsNode) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    flatten_into(exports, ".", &mut pairs);
    pairs
}

fn flatten_into(node: &ExportsNode, key: &str, pairs: &mut Vec<(String, String)>) {
    match node {
        ExportsNode::Target(target) => pairs.push((key.to_string(), target.clone())),
        ExportsNode::Branch(entries) => {
            for (entry_key, value) in entries {
                let key = if entry_key.starts_with('.') {
                    entry_key.as_str()
                } else {
                    key
                };
                flatten_into(value, key, pairs);
            }
        }
        ExportsNode::Fallback(items) => {
            for item in items {
                flatten_into(item, key, pairs);
            }
        }
        ExportsNode::Null => {}
    }
}

/// The key that publishes `subpath` through `target`, expanding a `*`
/// pattern when both sides carry one.
fn match_target(key: &str, target: &str, subpath: &str) -> Option<String> {
    let target = target.strip_prefix("./").unwrap_or(target);
    let subpath = subpath.strip_prefix("./").unwrap_or(subpath);
    match target.split_once('*') {
        None => (target == subpath).then(|| key.to_string()),
        Some((prefix, suffix)) => {
            let middle = subpath.strip_prefix(prefix)?.strip_suffix(suffix)?;
            key.contains('*').then(|| key.replacen('*', middle, 1))
        }
    }
}
