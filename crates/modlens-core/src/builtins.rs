//! Builtin module registry.

use std::collections::HashSet;

/// Package names of Node's builtin modules. Subpath modules such as
/// `fs/promises` are matched through their package entry.
pub const NODE_BUILTINS: &[&str] = &[
    "_http_agent",
    "_http_client",
    "_http_common",
    "_http_incoming",
    "_http_outgoing",
    "_http_server",
    "_stream_duplex",
    "_stream_passthrough",
    "_stream_readable",
    "_stream_transform",
    "_stream_wrap",
    "_stream_writable",
    "_tls_common",
    "_tls_wrap",
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Package name part of a builtin id: `node:` prefix and subpath removed.
pub(crate) fn builtin_name(id: &str) -> &str {
    let id = id.strip_prefix("node:").unwrap_or(id);
    id.split('/').next().unwrap_or(id)
}

/// Names of modules supplied by the host runtime.
///
/// Lookups ignore a `node:` prefix and any subpath, so `fs`, `node:fs`
/// and `fs/promises` all hit the `fs` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinModules {
    names: HashSet<String>,
}

impl Default for BuiltinModules {
    fn default() -> Self {
        Self::node()
    }
}

impl BuiltinModules {
    /// Registry of Node's builtin modules.
    #[must_use]
    pub fn node() -> Self {
        Self::new(NODE_BUILTINS.iter().copied())
    }

    /// Registry with exactly the given names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a name to the registry.
    #[must_use]
    pub fn with_module(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.names.contains(builtin_name(id))
    }

    /// The canonical `node:`-prefixed form of a builtin id.
    #[must_use]
    pub fn canonical(&self, id: &str) -> Option<String> {
        if !self.contains(id) {
            return None;
        }
        let bare = id.strip_prefix("node:").unwrap_or(id);
        Some(format!("node:{bare}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_with_prefix_and_subpath() {
        let builtins = BuiltinModules::node();
        assert!(builtins.contains("fs"));
        assert!(builtins.contains("node:fs"));
        assert!(builtins.contains("fs/promises"));
        assert!(builtins.contains("fs/fake"));
        assert!(!builtins.contains("node:fake"));
        assert!(!builtins.contains("vue"));
    }

    #[test]
    fn test_registry_holds_package_names_only() {
        assert!(NODE_BUILTINS.iter().all(|name| !name.contains('/')));
        let builtins = BuiltinModules::node();
        for id in ["assert/strict", "node:stream/web", "path/posix", "util/types"] {
            assert!(builtins.contains(id), "{id}");
        }
    }

    #[test]
    fn test_canonical() {
        let builtins = BuiltinModules::node();
        assert_eq!(builtins.canonical("fs").as_deref(), Some("node:fs"));
        assert_eq!(
            builtins.canonical("node:fs/promises").as_deref(),
            Some("node:fs/promises")
        );
        assert_eq!(builtins.canonical("lodash"), None);
    }

    #[test]
    fn test_custom_registry() {
        let builtins = BuiltinModules::new(["bun"]).with_module("electron");
        assert!(builtins.contains("electron"));
        assert!(builtins.contains("bun"));
        assert!(!builtins.contains("fs"));
    }
}
