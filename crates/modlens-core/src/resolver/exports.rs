//! Package.json `exports` and `imports` map evaluation.
//!
//! Implements Node.js-compatible map resolution:
//! - Root exports, including the conditions-only and string shorthands
//! - Exact subpath keys
//! - Pattern keys with a single `*`, most specific key first
//! - Nested conditions, matched in declaration order, with `default`
//! - Fallback arrays and `null` exclusions

use std::cmp::Ordering;
use std::path::Path;

use url::Url;

use crate::error::Error;
use crate::manifest::ExportsNode;

/// Result of evaluating one map target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    Resolved(Url),
    /// An explicit `null` target.
    Excluded,
    /// No condition matched.
    Unmatched,
}

impl Resolution {
    fn into_url(self) -> Option<Url> {
        match self {
            Self::Resolved(url) => Some(url),
            Self::Excluded | Self::Unmatched => None,
        }
    }
}

/// Resolves a bare `imports` target such as `"lodash/fp"` as a package.
pub(crate) type PackageResolveFn<'a> = &'a dyn Fn(&str) -> Result<Url, Error>;

/// Everything map evaluation needs to know about the owning package.
pub(crate) struct MapContext<'a> {
    /// `file:` URL of the package's `package.json`.
    pub manifest_url: &'a Url,
    pub manifest_path: &'a Path,
    /// Module the request came from, for error messages.
    pub base: &'a Url,
    pub conditions: &'a [String],
    /// Set when evaluating an `imports` map.
    pub package_resolve: Option<PackageResolveFn<'a>>,
}

impl MapContext<'_> {
    fn is_imports(&self) -> bool {
        self.package_resolve.is_some()
    }

    /// Resolve `subpath` (`"."` or `"./feature"`) through an `exports` map.
    pub(crate) fn exports_resolve(&self, subpath: &str, exports: &ExportsNode) -> Result<Url, Error> {
        let sugar;
        let exports = if is_conditional_sugar(exports, self.manifest_path)? {
            sugar = ExportsNode::Branch(vec![(".".to_string(), exports.clone())]);
            &sugar
        } else {
            exports
        };

        if !subpath.contains('*') && !subpath.ends_with('/') {
            if let Some(target) = exports.get(subpath) {
                return self
                    .resolve_target(target, "", subpath, false)?
                    .into_url()
                    .ok_or_else(|| self.not_exported(subpath));
            }
        }

        let entries = exports.entries().unwrap_or_default();
        if let Some((key, target, matched)) = best_pattern_match(entries, subpath) {
            return self
                .resolve_target(target, matched, key, true)?
                .into_url()
                .ok_or_else(|| self.not_exported(subpath));
        }

        Err(self.not_exported(subpath))
    }

    /// Resolve a `#name` through an `imports` map. `None` means the map
    /// does not define it.
    pub(crate) fn imports_resolve(
        &self,
        name: &str,
        imports: &ExportsNode,
    ) -> Result<Option<Url>, Error> {
        if !name.contains('*') {
            if let Some(target) = imports.get(name) {
                return Ok(self.resolve_target(target, "", name, false)?.into_url());
            }
        }

        let entries = imports.entries().unwrap_or_default();
        match best_pattern_match(entries, name) {
            Some((key, target, matched)) => {
                Ok(self.resolve_target(target, matched, key, true)?.into_url())
            }
            None => Ok(None),
        }
    }

    fn resolve_target(
        &self,
        target: &ExportsNode,
        subpath: &str,
        key: &str,
        pattern: bool,
    ) -> Result<Resolution, Error> {
        match target {
            ExportsNode::Target(target) => self
                .resolve_target_string(target, subpath, key, pattern)
                .map(Resolution::Resolved),
            ExportsNode::Fallback(items) => {
                if items.is_empty() {
                    return Ok(Resolution::Excluded);
                }
                let mut last_error = None;
                for item in items {
                    match self.resolve_target(item, subpath, key, pattern) {
                        Ok(Resolution::Resolved(url)) => return Ok(Resolution::Resolved(url)),
                        Ok(Resolution::Unmatched) => {}
                        Ok(Resolution::Excluded) => last_error = None,
                        Err(e @ Error::InvalidPackageTarget { .. }) => last_error = Some(e),
                        Err(e) => return Err(e),
                    }
                }
                match last_error {
                    Some(e) => Err(e),
                    None => Ok(Resolution::Unmatched),
                }
            }
            ExportsNode::Branch(entries) => {
                if entries.iter().any(|(condition, _)| is_array_index(condition)) {
                    return Err(Error::InvalidPackageConfig {
                        manifest: self.manifest_path.to_path_buf(),
                        reason: "\"exports\" cannot contain numeric property keys".to_string(),
                    });
                }
                for (condition, value) in entries {
                    if condition != "default" && !self.conditions.iter().any(|c| c == condition) {
                        continue;
                    }
                    match self.resolve_target(value, subpath, key, pattern)? {
                        Resolution::Unmatched => {}
                        resolution => return Ok(resolution),
                    }
                }
                Ok(Resolution::Unmatched)
            }
            ExportsNode::Null => Ok(Resolution::Excluded),
        }
    }

    fn resolve_target_string(
        &self,
        target: &str,
        subpath: &str,
        key: &str,
        pattern: bool,
    ) -> Result<Url, Error> {
        if !subpath.is_empty() && !pattern && !target.ends_with('/') {
            return Err(self.invalid_target(target, key));
        }

        if !target.starts_with("./") {
            if let Some(package_resolve) = self.package_resolve {
                let bare = !target.starts_with("../") && !target.starts_with('/');
                if bare && Url::parse(target).is_err() {
                    let request = if pattern {
                        target.replace('*', subpath)
                    } else {
                        format!("{target}{subpath}")
                    };
                    return package_resolve(&request);
                }
            }
            return Err(self.invalid_target(target, key));
        }

        if has_invalid_segment(&target[2..]) {
            return Err(self.invalid_target(target, key));
        }

        let resolved = self
            .manifest_url
            .join(target)
            .map_err(|_| self.invalid_target(target, key))?;
        let package_url = self
            .manifest_url
            .join(".")
            .map_err(|_| self.invalid_target(target, key))?;
        if !resolved.path().starts_with(package_url.path()) {
            return Err(self.invalid_target(target, key));
        }

        if subpath.is_empty() {
            return Ok(resolved);
        }

        if has_invalid_segment(subpath) {
            let request = if pattern {
                key.replacen('*', subpath, 1)
            } else {
                format!("{key}{subpath}")
            };
            let field = if self.is_imports() { "imports" } else { "exports" };
            return Err(Error::invalid_specifier(
                request,
                format!(
                    "request is not a valid match in pattern \"{key}\" for the \"{field}\" resolution of {}",
                    self.manifest_path.display()
                ),
            ));
        }

        if pattern {
            let href = resolved.as_str().replace('*', subpath);
            return Url::parse(&href).map_err(|e| Error::invalid_specifier(href, e.to_string()));
        }
        resolved
            .join(subpath)
            .map_err(|e| Error::invalid_specifier(subpath, e.to_string()))
    }

    fn invalid_target(&self, target: &str, key: &str) -> Error {
        Error::InvalidPackageTarget {
            target: target.to_string(),
            key: key.to_string(),
            manifest: self.manifest_path.to_path_buf(),
        }
    }

    fn not_exported(&self, subpath: &str) -> Error {
        Error::PackagePathNotExported {
            subpath: subpath.to_string(),
            manifest: self.manifest_path.to_path_buf(),
            base: self.base.to_string(),
        }
    }
}

/// Whether `exports` is shorthand for `{ ".": exports }`.
///
/// True for strings, arrays and objects whose keys are all condition
/// names. Mixing subpath and condition keys is a config error.
fn is_conditional_sugar(exports: &ExportsNode, manifest_path: &Path) -> Result<bool, Error> {
    let entries = match exports {
        ExportsNode::Target(_) | ExportsNode::Fallback(_) => return Ok(true),
        ExportsNode::Null => return Ok(false),
        ExportsNode::Branch(entries) => entries,
    };

    let mut sugar = None;
    for (key, _) in entries {
        let is_condition = !key.starts_with('.');
        match sugar {
            None => sugar = Some(is_condition),
            Some(previous) if previous != is_condition => {
                return Err(Error::InvalidPackageConfig {
                    manifest: manifest_path.to_path_buf(),
                    reason: "\"exports\" cannot contain some keys starting with '.' and some not"
                        .to_string(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(sugar.unwrap_or(false))
}

/// The most specific pattern key matching `name`, with its target and the
/// text matched by `*`.
fn best_pattern_match<'a, 'n>(
    entries: &'a [(String, ExportsNode)],
    name: &'n str,
) -> Option<(&'a str, &'a ExportsNode, &'n str)> {
    let mut best: Option<(&str, &ExportsNode, &str)> = None;
    for (key, target) in entries {
        let Some(star) = key.find('*') else {
            continue;
        };
        if key.rfind('*') != Some(star) || !name.starts_with(&key[..star]) {
            continue;
        }
        let trailer = &key[star + 1..];
        if name.len() < key.len() || !name.ends_with(trailer) {
            continue;
        }
        let best_key = best.map_or("", |(k, _, _)| k);
        if pattern_key_compare(best_key, key) == Ordering::Greater {
            best = Some((key, target, &name[star..name.len() - trailer.len()]));
        }
    }
    best
}

/// Node's ordering of pattern keys. `Greater` means `b` is more specific.
pub(crate) fn pattern_key_compare(a: &str, b: &str) -> Ordering {
    let a_star = a.find('*');
    let b_star = b.find('*');
    let base_a = a_star.map_or(a.len(), |i| i + 1);
    let base_b = b_star.map_or(b.len(), |i| i + 1);

    match base_a.cmp(&base_b) {
        Ordering::Greater => return Ordering::Less,
        Ordering::Less => return Ordering::Greater,
        Ordering::Equal => {}
    }
    if a_star.is_none() {
        return Ordering::Greater;
    }
    if b_star.is_none() {
        return Ordering::Less;
    }
    b.len().cmp(&a.len())
}

fn is_array_index(key: &str) -> bool {
    key.parse::<u32>()
        .is_ok_and(|n| n != u32::MAX && n.to_string() == key)
}

/// Whether any `/`- or `\`-separated segment is `.`, `..` or
/// `node_modules`, percent-encoded or not, in any case.
fn has_invalid_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        let decoded = percent_decode(segment).to_ascii_lowercase();
        matches!(decoded.as_str(), "." | ".." | "node_modules")
    })
}

fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
