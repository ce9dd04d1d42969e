//! Node's ESM resolution algorithm for a single specifier and base.

use std::path::Path;
use std::sync::Arc;

use url::Url;

use super::exports::MapContext;
use super::{file_url, url_to_path, ModuleResolve};
use crate::builtins::BuiltinModules;
use crate::error::Error;
use crate::manifest::{find_package_scope, ExportsNode, PackageManifest, MANIFEST_FILE};
use crate::utils::get_protocol;

/// Schemes a resolution may produce besides `file:`.
const PASSTHROUGH_SCHEMES: &[&str] = &["node", "data", "http", "https"];

const LEGACY_INDEX: &[&str] = &["./index.js", "./index.json", "./index.node"];

/// The default [`ModuleResolve`]: relative and absolute specifiers,
/// `#imports`, URLs and packages in `node_modules`, as Node resolves them.
#[derive(Debug, Clone, Default)]
pub struct NodeModuleResolve {
    builtins: Arc<BuiltinModules>,
}

impl NodeModuleResolve {
    #[must_use]
    pub fn new(builtins: Arc<BuiltinModules>) -> Self {
        Self { builtins }
    }

    fn package_imports_resolve(
        &self,
        name: &str,
        base: &Url,
        conditions: &[String],
    ) -> Result<Url, Error> {
        if name == "#" || name.starts_with("#/") || name.ends_with('/') {
            return Err(Error::invalid_specifier(
                name,
                "is not a valid internal imports specifier name",
            ));
        }

        if let Some(scope) = find_package_scope(&base_dir(base)?)? {
            if let Some(imports) = &scope.manifest.imports {
                let manifest_url = file_url(&scope.manifest_path)?;
                let package_resolve =
                    |target: &str| self.package_resolve(target, &manifest_url, conditions);
                let ctx = MapContext {
                    manifest_url: &manifest_url,
                    manifest_path: &scope.manifest_path,
                    base,
                    conditions,
                    package_resolve: Some(&package_resolve),
                };
                if let Some(url) = ctx.imports_resolve(name, imports)? {
                    return Ok(url);
                }
            }
        }

        Err(Error::PackageImportNotDefined {
            specifier: name.to_string(),
            base: base.to_string(),
        })
    }

    fn package_resolve(&self, specifier: &str, base: &Url, conditions: &[String]) -> Result<Url, Error> {
        if let Some(builtin) = self.builtins.canonical(specifier) {
            return Url::parse(&builtin).map_err(|e| Error::invalid_specifier(specifier, e.to_string()));
        }

        let (name, subpath) = parse_package_name(specifier)?;
        let start = base_dir(base)?;

        // A package may import itself by name through its own exports.
        if let Some(scope) = find_package_scope(&start)? {
            if scope.manifest.name.as_deref() == Some(name) {
                if let Some(exports) = &scope.manifest.exports {
                    tracing::trace!(package = name, "self-reference");
                    return exports_resolve(&scope.manifest_path, &subpath, exports, base, conditions);
                }
            }
        }

        for dir in start.ancestors() {
            let package_dir = dir.join("node_modules").join(name);
            if !modlens_util::fs::is_dir(&package_dir) {
                continue;
            }
            tracing::trace!(package = name, dir = %package_dir.display(), "package found");

            let manifest_path = package_dir.join(MANIFEST_FILE);
            let manifest = match PackageManifest::load(&manifest_path) {
                Ok(manifest) => manifest,
                Err(Error::ManifestAbsent { .. }) => PackageManifest::default(),
                Err(e) => return Err(e),
            };
            if let Some(exports) = &manifest.exports {
                return exports_resolve(&manifest_path, &subpath, exports, base, conditions);
            }

            let manifest_url = file_url(&manifest_path)?;
            if subpath == "." {
                return legacy_main_resolve(&manifest_url, &manifest, base);
            }
            return manifest_url
                .join(&subpath)
                .map_err(|e| Error::invalid_specifier(specifier, e.to_string()));
        }

        Err(Error::ModuleNotFound {
            target: name.to_string(),
            base: base.to_string(),
        })
    }
}

impl ModuleResolve for NodeModuleResolve {
    fn resolve(&self, specifier: &str, base: &Url, conditions: &[String]) -> Result<Url, Error> {
        let resolved = if is_relative_or_absolute(specifier) {
            base.join(specifier)
                .map_err(|e| Error::invalid_specifier(specifier, e.to_string()))?
        } else if base.scheme() == "file" && specifier.starts_with('#') {
            self.package_imports_resolve(specifier, base, conditions)?
        } else if let Some(url) = parse_url_specifier(specifier) {
            url
        } else {
            self.package_resolve(specifier, base, conditions)?
        };

        match resolved.scheme() {
            "file" => finalize_resolution(resolved, base),
            scheme if PASSTHROUGH_SCHEMES.contains(&scheme) => Ok(resolved),
            scheme => Err(Error::InvalidProtocol {
                specifier: specifier.to_string(),
                protocol: format!("{scheme}:"),
            }),
        }
    }
}

fn exports_resolve(
    manifest_path: &Path,
    subpath: &str,
    exports: &ExportsNode,
    base: &Url,
    conditions: &[String],
) -> Result<Url, Error> {
    let manifest_url = file_url(manifest_path)?;
    MapContext {
        manifest_url: &manifest_url,
        manifest_path,
        base,
        conditions,
        package_resolve: None,
    }
    .exports_resolve(subpath, exports)
}

/// Probe `main` and the `index` files of a package without `exports`.
fn legacy_main_resolve(manifest_url: &Url, manifest: &PackageManifest, base: &Url) -> Result<Url, Error> {
    let main_guesses = manifest
        .main
        .as_deref()
        .filter(|main| !main.is_empty())
        .map(|main| {
            vec![
                main.to_string(),
                format!("./{main}.js"),
                format!("./{main}.json"),
                format!("./{main}.node"),
                format!("./{main}/index.js"),
                format!("./{main}/index.json"),
                format!("./{main}/index.node"),
            ]
        })
        .unwrap_or_default();

    let guesses = main_guesses
        .iter()
        .map(String::as_str)
        .chain(LEGACY_INDEX.iter().copied());
    for guess in guesses {
        let Ok(url) = manifest_url.join(guess) else {
            continue;
        };
        if url.to_file_path().is_ok_and(|path| modlens_util::fs::is_file(&path)) {
            return Ok(url);
        }
    }

    let package_dir = manifest_url
        .join(".")
        .map_or_else(|_| manifest_url.to_string(), |url| url.to_string());
    Err(Error::ModuleNotFound {
        target: package_dir,
        base: base.to_string(),
    })
}

/// Check a `file:` result exists as a file and canonicalize it.
fn finalize_resolution(resolved: Url, base: &Url) -> Result<Url, Error> {
    let encoded = resolved.path().to_ascii_lowercase();
    if encoded.contains("%2f") || encoded.contains("%5c") {
        return Err(Error::invalid_specifier(
            resolved.path(),
            "must not include encoded \"/\" or \"\\\" characters",
        ));
    }

    let path = url_to_path(&resolved)?;
    let display = path.display().to_string();
    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => Err(Error::UnsupportedDirImport {
            path: display,
            base: base.to_string(),
        }),
        Ok(meta) if meta.is_file() => {
            let mut real = file_url(&modlens_util::fs::real_path(&path)?)?;
            real.set_query(resolved.query());
            real.set_fragment(resolved.fragment());
            Ok(real)
        }
        _ => Err(Error::ModuleNotFound {
            target: display,
            base: base.to_string(),
        }),
    }
}

/// Split a bare specifier into package name and `"."`-prefixed subpath.
///
/// `"lodash/fp"` is `("lodash", "./fp")`, `"@scope/pkg"` is
/// `("@scope/pkg", ".")`.
pub(crate) fn parse_package_name(specifier: &str) -> Result<(&str, String), Error> {
    let mut separator = specifier.find('/');
    let mut valid = !specifier.is_empty();

    if specifier.starts_with('@') {
        match separator {
            None => valid = false,
            Some(first) => separator = specifier[first + 1..].find('/').map(|i| first + 1 + i),
        }
    }

    let name = separator.map_or(specifier, |i| &specifier[..i]);
    if name.starts_with('.') || name.contains('%') || name.contains('\\') {
        valid = false;
    }
    if !valid {
        return Err(Error::invalid_specifier(specifier, "is not a valid package name"));
    }

    let subpath = format!(".{}", separator.map_or("", |i| &specifier[i..]));
    Ok((name, subpath))
}

fn is_relative_or_absolute(specifier: &str) -> bool {
    specifier.starts_with('/')
        || specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// A specifier that is already a URL. Single-letter schemes are Windows
/// drive letters, not URLs.
fn parse_url_specifier(specifier: &str) -> Option<Url> {
    get_protocol(specifier)?;
    Url::parse(specifier).ok()
}

/// Directory of `base`: itself for directory URLs, the parent otherwise.
fn base_dir(base: &Url) -> Result<std::path::PathBuf, Error> {
    let dir = base
        .join("./")
        .map_err(|e| Error::invalid_specifier(base.as_str(), e.to_string()))?;
    url_to_path(&dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn conditions() -> Vec<String> {
        vec!["node".to_string(), "import".to_string()]
    }

    fn dir_url(path: &Path) -> Url {
        Url::from_directory_path(modlens_util::fs::real_path(path).unwrap()).unwrap()
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_relative_file() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("dep.mjs"), "export {}");

        let resolved = NodeModuleResolve::default()
            .resolve("./dep.mjs", &dir_url(dir.path()), &conditions())
            .unwrap();
        assert!(resolved.path().ends_with("/dep.mjs"));
    }

    #[test]
    fn test_relative_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let err = NodeModuleResolve::default()
            .resolve("./dep", &dir_url(dir.path()), &conditions())
            .unwrap_err();
        assert_eq!(err.code().as_str(), "ERR_MODULE_NOT_FOUND");
    }

    #[test]
    fn test_directory_import_rejected() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("utils")).unwrap();
        let err = NodeModuleResolve::default()
            .resolve("./utils", &dir_url(dir.path()), &conditions())
            .unwrap_err();
        assert_eq!(err.code().as_str(), "ERR_UNSUPPORTED_DIR_IMPORT");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_bare_specifier_legacy_main() {
        let dir = tempdir().unwrap();
        let lodash = dir.path().join("node_modules/lodash");
        write(&lodash.join("package.json"), r#"{"name": "lodash", "main": "lodash"}"#);
        write(&lodash.join("lodash.js"), "module.exports = _");
        write(&lodash.join("fp.js"), "module.exports = fp");

        let resolver = NodeModuleResolve::default();
        let base = dir_url(dir.path());
        let main = resolver.resolve("lodash", &base, &conditions()).unwrap();
        assert!(main.path().ends_with("/node_modules/lodash/lodash.js"));

        let sub = resolver.resolve("lodash/fp.js", &base, &conditions()).unwrap();
        assert!(sub.path().ends_with("/node_modules/lodash/fp.js"));
    }

    #[test]
    fn test_bare_specifier_walks_up() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules/@scope/pkg");
        write(&pkg.join("package.json"), r#"{"exports": {".": {"import": "./esm.mjs"}}}"#);
        write(&pkg.join("esm.mjs"), "export {}");
        let nested = dir.path().join("src/deep");
        fs::create_dir_all(&nested).unwrap();

        let resolved = NodeModuleResolve::default()
            .resolve("@scope/pkg", &dir_url(&nested), &conditions())
            .unwrap();
        assert!(resolved.path().ends_with("/node_modules/@scope/pkg/esm.mjs"));
    }

    #[test]
    fn test_exports_not_exported_subpath() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules/pkg");
        write(&pkg.join("package.json"), r#"{"exports": {".": "./index.js"}}"#);
        write(&pkg.join("index.js"), "");
        write(&pkg.join("private.js"), "");

        let err = NodeModuleResolve::default()
            .resolve("pkg/private.js", &dir_url(dir.path()), &conditions())
            .unwrap_err();
        assert_eq!(err.code().as_str(), "ERR_PACKAGE_PATH_NOT_EXPORTED");
    }

    #[test]
    fn test_self_reference() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join("package.json"),
            r#"{"name": "app", "exports": {"./util": "./src/util.js"}}"#,
        );
        write(&dir.path().join("src/util.js"), "");

        let resolved = NodeModuleResolve::default()
            .resolve("app/util", &dir_url(&dir.path().join("src")), &conditions())
            .unwrap();
        assert!(resolved.path().ends_with("/src/util.js"));
    }

    #[test]
    fn test_hash_imports() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join("package.json"),
            r##"{"imports": {"#config": {"node": "./config.node.js", "default": "./config.js"}}}"##,
        );
        write(&dir.path().join("config.node.js"), "");

        let resolver = NodeModuleResolve::default();
        let base = dir_url(dir.path());
        let resolved = resolver.resolve("#config", &base, &conditions()).unwrap();
        assert!(resolved.path().ends_with("/config.node.js"));

        let err = resolver.resolve("#missing", &base, &conditions()).unwrap_err();
        assert_eq!(err.code().as_str(), "ERR_PACKAGE_IMPORT_NOT_DEFINED");

        let err = resolver.resolve("#/bad", &base, &conditions()).unwrap_err();
        assert_eq!(err.code().as_str(), "ERR_INVALID_MODULE_SPECIFIER");
    }

    #[test]
    fn test_url_specifiers() {
        let dir = tempdir().unwrap();
        let base = dir_url(dir.path());
        let resolver = NodeModuleResolve::default();

        let remote = resolver
            .resolve("https://cdn.example/x.js", &base, &conditions())
            .unwrap();
        assert_eq!(remote.as_str(), "https://cdn.example/x.js");

        let err = resolver.resolve("ftp://host/x.js", &base, &conditions()).unwrap_err();
        assert_eq!(err.code().as_str(), "ERR_UNSUPPORTED_ESM_URL_SCHEME");
    }

    #[test]
    fn test_builtin_package() {
        let dir = tempdir().unwrap();
        let resolved = NodeModuleResolve::default()
            .resolve("fs", &dir_url(dir.path()), &conditions())
            .unwrap();
        assert_eq!(resolved.as_str(), "node:fs");
    }

    #[test]
    fn test_parse_package_name() {
        assert_eq!(parse_package_name("lodash").unwrap(), ("lodash", ".".to_string()));
        assert_eq!(
            parse_package_name("lodash/fp/map").unwrap(),
            ("lodash", "./fp/map".to_string())
        );
        assert_eq!(
            parse_package_name("@scope/pkg").unwrap(),
            ("@scope/pkg", ".".to_string())
        );
        assert_eq!(
            parse_package_name("@scope/pkg/sub").unwrap(),
            ("@scope/pkg", "./sub".to_string())
        );
        for invalid in ["@scope", ".hidden", "bad%name", "a\\b", ""] {
            assert!(parse_package_name(invalid).is_err(), "{invalid}");
        }
    }
}
