//! Helpers for slash-separated path strings.
//!
//! Module locations are compared and reported with `/` separators on every
//! platform, so these operate on `str` rather than `std::path::Path`.

/// Replace every backslash with a forward slash.
#[must_use]
pub fn normalize_slash(path: &str) -> String {
    path.replace('\\', "/")
}

/// The last path segment.
#[must_use]
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Extension of the last segment including the dot (`".js"`), or `""`.
///
/// Dotfiles like `.npmrc` have no extension.
#[must_use]
pub fn extname(path: &str) -> &str {
    let name = basename(path);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(i) => &name[i..],
    }
}

/// `path` without the extension of its last segment.
#[must_use]
pub fn strip_extension(path: &str) -> &str {
    &path[..path.len() - extname(path).len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_slash() {
        assert_eq!(normalize_slash("C:\\src\\a.js"), "C:/src/a.js");
        assert_eq!(normalize_slash("/already/fine"), "/already/fine");
    }

    #[test]
    fn test_extname() {
        assert_eq!(extname("/a/b/index.mjs"), ".mjs");
        assert_eq!(extname("/a/b.d/index"), "");
        assert_eq!(extname("/a/.npmrc"), "");
        assert_eq!(extname("x.esm.js"), ".js");
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("./dist/sub.js"), "./dist/sub");
        assert_eq!(strip_extension("./lib/subpath.json5"), "./lib/subpath");
        assert_eq!(strip_extension("./lib.d/noext"), "./lib.d/noext");
    }
}
