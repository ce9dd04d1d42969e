//! CommonJS module context: `__filename`, `__dirname` and `require.resolve`
//! for a module location.

use std::sync::OnceLock;

use crate::config::{ResolveOptions, ResolverConfig};
use crate::error::Error;
use crate::resolver::Resolver;
use crate::utils::file_url_to_path;

/// Conditions `require` resolves with.
pub const REQUIRE_CONDITIONS: &[&str] = &["node", "require"];

/// The CommonJS bindings of one module.
#[derive(Debug)]
pub struct CommonJsContext {
    url: String,
    filename: String,
    dirname: String,
    config: ResolverConfig,
    /// Built on first `require_resolve`.
    resolver: OnceLock<Resolver>,
}

impl CommonJsContext {
    /// Context for the module at `url` (a `file:` URL or path).
    pub fn new(url: &str, config: ResolverConfig) -> Result<Self, Error> {
        let filename = file_url_to_path(url)?;
        let dirname = match filename.rsplit_once('/') {
            Some(("", _)) => "/".to_string(),
            Some((dir, _)) => dir.to_string(),
            None => ".".to_string(),
        };
        Ok(Self {
            url: url.to_string(),
            filename,
            dirname,
            config,
            resolver: OnceLock::new(),
        })
    }

    /// `__filename`.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// `__dirname`.
    #[must_use]
    pub fn dirname(&self) -> &str {
        &self.dirname
    }

    fn resolver(&self) -> &Resolver {
        self.resolver.get_or_init(|| {
            tracing::trace!(url = %self.url, "creating require resolver");
            let config = self.config.clone().with_conditions(REQUIRE_CONDITIONS.iter().copied());
            Resolver::new(config).with_defaults(ResolveOptions::default().with_anchor(&self.url))
        })
    }

    /// `require.resolve(id)`: the filesystem path `id` resolves to from
    /// this module, or the `node:` id of a builtin.
    pub fn require_resolve(&self, id: &str) -> Result<String, Error> {
        self.resolver().resolve_path_sync(id, &ResolveOptions::default())
    }

    /// Async form of [`CommonJsContext::require_resolve`].
    pub async fn require_resolve_async(&self, id: &str) -> Result<String, Error> {
        self.resolver().resolve_path(id, &ResolveOptions::default()).await
    }
}
