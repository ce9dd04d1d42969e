use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::builtins::BuiltinModules;
use crate::error::Error;

/// Conditions used when a request names none.
pub const DEFAULT_CONDITIONS: &[&str] = &["node", "import"];

/// Extension probe order used when a request names none.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".mjs", ".cjs", ".js", ".json"];

/// Process-wide resolver configuration.
///
/// Built once and shared read-only by every resolution; nothing here
/// changes after construction.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Default anchor: the working directory snapshotted at construction.
    pub cwd: PathBuf,

    /// Modules supplied by the host runtime.
    pub builtins: Arc<BuiltinModules>,

    /// Default condition set.
    pub conditions: Vec<String>,

    /// Default extension probe order.
    pub extensions: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            builtins: Arc::new(BuiltinModules::node()),
            conditions: DEFAULT_CONDITIONS.iter().map(ToString::to_string).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ResolverConfig {
    /// Create a new config anchored at the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set the builtin registry.
    #[must_use]
    pub fn with_builtins(mut self, builtins: BuiltinModules) -> Self {
        self.builtins = Arc::new(builtins);
        self
    }

    /// Set the default condition set.
    #[must_use]
    pub fn with_conditions<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = conditions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the default extension probe order.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// The default anchor as a directory URL.
    pub fn default_anchor(&self) -> Result<Url, Error> {
        directory_url(&self.cwd)
    }
}

pub(crate) fn directory_url(dir: &Path) -> Result<Url, Error> {
    let absolute = std::path::absolute(dir)?;
    Url::from_directory_path(&absolute).map_err(|()| {
        Error::invalid_specifier(absolute.display().to_string(), "not a valid directory path")
    })
}

/// Per-call resolution options. Unset fields fall back to the resolver's
/// bound defaults, then to [`ResolverConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Anchors (paths or URLs) to resolve from, in order.
    pub anchors: Vec<String>,

    /// Condition set for exports/imports maps.
    pub conditions: Option<Vec<String>>,

    /// Extension probe order.
    pub extensions: Option<Vec<String>>,
}

impl ResolveOptions {
    /// Add an anchor.
    #[must_use]
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchors.push(anchor.into());
        self
    }

    /// Replace the anchors.
    #[must_use]
    pub fn with_anchors<I, S>(mut self, anchors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.anchors = anchors.into_iter().map(Into::into).collect();
        self
    }

    /// Set the condition set.
    #[must_use]
    pub fn with_conditions<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = Some(conditions.into_iter().map(Into::into).collect());
        self
    }

    /// Set the extension probe order.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Fill unset fields from `defaults`.
    #[must_use]
    pub fn or(&self, defaults: &ResolveOptions) -> ResolveOptions {
        ResolveOptions {
            anchors: if self.anchors.is_empty() {
                defaults.anchors.clone()
            } else {
                self.anchors.clone()
            },
            conditions: self.conditions.clone().or_else(|| defaults.conditions.clone()),
            extensions: self.extensions.clone().or_else(|| defaults.extensions.clone()),
        }
    }
}
