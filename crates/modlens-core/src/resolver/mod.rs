//! Module resolver.
//!
//! [`Resolver`] orchestrates a [`ModuleResolve`] delegate (by default
//! [`NodeModuleResolve`]) across a list of anchors and extension variants:
//! protocol and builtin short-circuits first, then a verbatim pass over
//! every anchor, then an extension/index pass, and finally symlink
//! canonicalization of the winner.

mod exports;
mod node;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::config::{directory_url, ResolveOptions, ResolverConfig};
use crate::error::Error;
use crate::utils::{file_url_to_path, get_protocol};

pub use node::NodeModuleResolve;

/// Specifiers with these prefixes are returned without resolution.
const PASSTHROUGH_PREFIXES: &[&str] = &["node:", "data:", "http:", "https:"];

/// Resolves one specifier against one base URL.
///
/// Implementations signal "try the next candidate" with a not-found class
/// error (see [`Error::is_not_found`]); any other error aborts resolution.
pub trait ModuleResolve: Send + Sync + fmt::Debug {
    fn resolve(&self, specifier: &str, base: &Url, conditions: &[String]) -> Result<Url, Error>;
}

/// Resolves specifiers to canonical module locations.
///
/// Cheap to clone; configuration and delegate are shared.
#[derive(Debug, Clone)]
pub struct Resolver {
    config: Arc<ResolverConfig>,
    delegate: Arc<dyn ModuleResolve>,
    defaults: ResolveOptions,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl Resolver {
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        let delegate = NodeModuleResolve::new(Arc::clone(&config.builtins));
        Self {
            config: Arc::new(config),
            delegate: Arc::new(delegate),
            defaults: ResolveOptions::default(),
        }
    }

    /// Replace the single-specifier resolution step.
    #[must_use]
    pub fn with_delegate(mut self, delegate: impl ModuleResolve + 'static) -> Self {
        self.delegate = Arc::new(delegate);
        self
    }

    /// Bind options used whenever a call leaves them unset.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ResolveOptions) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `specifier` to a URL string.
    pub fn resolve_sync(&self, specifier: &str, options: &ResolveOptions) -> Result<String, Error> {
        if PASSTHROUGH_PREFIXES.iter().any(|prefix| specifier.starts_with(prefix)) {
            return Ok(specifier.to_string());
        }

        if let Some(builtin) = self.config.builtins.canonical(specifier) {
            return Ok(builtin);
        }

        let path = Path::new(specifier);
        if path.is_absolute() && modlens_util::fs::is_file(path) {
            let real = modlens_util::fs::real_path(path)?;
            return Ok(file_url(&real)?.into());
        }

        let options = options.or(&self.defaults);
        let conditions = options
            .conditions
            .clone()
            .unwrap_or_else(|| self.config.conditions.clone());
        let extensions = options
            .extensions
            .clone()
            .unwrap_or_else(|| self.config.extensions.clone());
        let anchors = self.anchors(&options)?;

        let resolved = self
            .resolve_across_anchors(specifier, &anchors, &conditions, &extensions)?
            .ok_or_else(|| Error::NotFound {
                specifier: specifier.to_string(),
                anchors: anchors.iter().map(ToString::to_string).collect(),
            })?;

        if resolved.scheme() != "file" {
            return Ok(resolved.into());
        }
        let real = modlens_util::fs::real_path(&url_to_path(&resolved)?)?;
        Ok(file_url(&real)?.into())
    }

    /// Async form of [`Resolver::resolve_sync`]; the filesystem work runs on
    /// the blocking pool.
    pub async fn resolve(&self, specifier: &str, options: &ResolveOptions) -> Result<String, Error> {
        let resolver = self.clone();
        let specifier = specifier.to_string();
        let options = options.clone();
        tokio::task::spawn_blocking(move || resolver.resolve_sync(&specifier, &options))
            .await
            .map_err(|e| Error::other(format!("resolve task failed: {e}")))?
    }

    /// Resolve `specifier` to a filesystem path. Non-file results such as
    /// `node:fs` are returned unchanged.
    pub fn resolve_path_sync(&self, specifier: &str, options: &ResolveOptions) -> Result<String, Error> {
        file_url_to_path(&self.resolve_sync(specifier, options)?)
    }

    /// Async form of [`Resolver::resolve_path_sync`].
    pub async fn resolve_path(&self, specifier: &str, options: &ResolveOptions) -> Result<String, Error> {
        file_url_to_path(&self.resolve(specifier, options).await?)
    }

    /// The full ordered anchor list for `options`: the given anchors (or
    /// the default anchor), then for each `file:` anchor its directory, an
    /// index probe and its `node_modules` sibling. Duplicates are dropped.
    pub fn anchors(&self, options: &ResolveOptions) -> Result<Vec<Url>, Error> {
        let mut primary = options
            .anchors
            .iter()
            .map(|anchor| anchor_url(anchor))
            .collect::<Result<Vec<_>, _>>()?;
        if primary.is_empty() {
            primary.push(self.config.default_anchor()?);
        }

        let mut anchors = primary.clone();
        for url in primary.iter().filter(|url| url.scheme() == "file") {
            let derived = [
                url.join("./"),
                Ok(index_probe(url)),
                url.join("node_modules"),
            ];
            for anchor in derived {
                anchors.push(anchor.map_err(|e| Error::invalid_specifier(url.as_str(), e.to_string()))?);
            }
        }

        let mut unique: Vec<Url> = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            if !unique.contains(&anchor) {
                unique.push(anchor);
            }
        }
        Ok(unique)
    }

    fn resolve_across_anchors(
        &self,
        specifier: &str,
        anchors: &[Url],
        conditions: &[String],
        extensions: &[String],
    ) -> Result<Option<Url>, Error> {
        for anchor in anchors {
            if let Some(url) = self.try_resolve(specifier, anchor, conditions)? {
                return Ok(Some(url));
            }
        }

        tracing::debug!(specifier, "verbatim resolution failed, probing extensions");
        let index_base = specifier.trim_end_matches('/');
        for anchor in anchors {
            for extension in extensions {
                let candidate = format!("{specifier}{extension}");
                if let Some(url) = self.try_resolve(&candidate, anchor, conditions)? {
                    return Ok(Some(url));
                }
            }
            for extension in extensions {
                let candidate = format!("{index_base}/index{extension}");
                if let Some(url) = self.try_resolve(&candidate, anchor, conditions)? {
                    return Ok(Some(url));
                }
            }
        }
        Ok(None)
    }

    fn try_resolve(&self, specifier: &str, anchor: &Url, conditions: &[String]) -> Result<Option<Url>, Error> {
        match self.delegate.resolve(specifier, anchor, conditions) {
            Ok(url) => Ok(Some(url)),
            Err(e) if e.is_not_found() => {
                tracing::trace!(specifier, anchor = %anchor, error = %e, "not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Parse an anchor given as a URL or a path. Existing directories become
/// directory URLs so relative specifiers resolve inside them.
fn anchor_url(anchor: &str) -> Result<Url, Error> {
    let url = if get_protocol(anchor).is_some() {
        Url::parse(anchor).map_err(|e| Error::invalid_specifier(anchor, e.to_string()))?
    } else {
        let path = std::path::absolute(anchor)?;
        if modlens_util::fs::is_dir(&path) {
            return directory_url(&path);
        }
        file_url(&path)?
    };

    if url.scheme() == "file" && !url.path().ends_with('/') {
        if let Ok(path) = url.to_file_path() {
            if modlens_util::fs::is_dir(&path) {
                return directory_url(&path);
            }
        }
    }
    Ok(url)
}

/// `<anchor path>/_index.js`, for anchors that name a directory without a
/// trailing slash.
fn index_probe(url: &Url) -> Url {
    let mut probe = url.clone();
    probe.set_path(&format!("{}/_index.js", url.path().trim_end_matches('/')));
    probe
}

pub(crate) fn file_url(path: &Path) -> Result<Url, Error> {
    Url::from_file_path(path)
        .map_err(|()| Error::invalid_specifier(path.display().to_string(), "not an absolute path"))
}

pub(crate) fn url_to_path(url: &Url) -> Result<PathBuf, Error> {
    url.to_file_path()
        .map_err(|()| Error::invalid_specifier(url.as_str(), "not a valid file URL"))
}
