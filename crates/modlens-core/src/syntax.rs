//! ESM/CommonJS syntax detection and the "can Node import this" check.

use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

use crate::config::ResolveOptions;
use crate::error::Error;
use crate::manifest::find_package_scope;
use crate::resolver::Resolver;
use crate::utils::{get_protocol, is_node_builtin};

static ESM_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)(?:[\s;]|^)(?:import[\s\w*,{}]*from|import\s*["'*{]|export\b\s*(?:[*{]|default|class|type|interface|enum|function|const|var|let|async function)|import\.meta\b)"#,
    )
    .unwrap_or_else(|e| panic!("invalid ESM pattern: {e}"))
});

static CJS_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:[\s;]|^)(?:module\.exports\b|exports\.\w|require\s*\(|global\.\w)")
        .unwrap_or_else(|e| panic!("invalid CommonJS pattern: {e}"))
});

/// Comment pattern used when the source cannot be tokenized.
static COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/\*.+?\*/|//[^\n\r]*").unwrap_or_else(|e| panic!("invalid comment pattern: {e}"))
});

static ESM_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(\w+-)?esm?(-\w+)?\.js$|/esm?/")
        .unwrap_or_else(|e| panic!("invalid filename pattern: {e}"))
});

/// Extensions Node loads regardless of package type.
const NATIVE_EXTENSIONS: &[&str] = &[".mjs", ".cjs", ".node", ".wasm"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyntaxOptions {
    /// Remove comments before matching.
    pub strip_comments: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxDetection {
    pub has_esm: bool,
    pub has_cjs: bool,
    pub is_mixed: bool,
}

fn prepare<'a>(code: &'a str, options: SyntaxOptions) -> Cow<'a, str> {
    if options.strip_comments {
        strip_comments(code)
    } else {
        Cow::Borrowed(code)
    }
}

/// `code` with every comment removed.
///
/// Comment positions come from the tokenizer; source it rejects falls back
/// to a line/block comment pattern.
#[must_use]
pub fn strip_comments(code: &str) -> Cow<'_, str> {
    match modlens_lexer::comment_spans(code) {
        Ok(spans) if spans.is_empty() => Cow::Borrowed(code),
        Ok(spans) => {
            let mut out = String::with_capacity(code.len());
            let mut last = 0;
            for span in spans {
                let range = span.range();
                out.push_str(&code[last..range.start]);
                last = range.end;
            }
            out.push_str(&code[last..]);
            Cow::Owned(out)
        }
        Err(e) => {
            tracing::debug!(error = %e, "falling back to pattern comment stripping");
            COMMENT.replace_all(code, "")
        }
    }
}

/// Whether `code` contains import/export statements or `import.meta`.
#[must_use]
pub fn has_esm_syntax(code: &str, options: SyntaxOptions) -> bool {
    ESM_SYNTAX.is_match(&prepare(code, options))
}

/// Whether `code` uses `module.exports`, `exports.x`, `require(..)` or
/// `global.x`.
#[must_use]
pub fn has_cjs_syntax(code: &str, options: SyntaxOptions) -> bool {
    CJS_SYNTAX.is_match(&prepare(code, options))
}

#[must_use]
pub fn detect_syntax(code: &str, options: SyntaxOptions) -> SyntaxDetection {
    let code = prepare(code, options);
    let has_esm = ESM_SYNTAX.is_match(&code);
    let has_cjs = CJS_SYNTAX.is_match(&code);
    SyntaxDetection {
        has_esm,
        has_cjs,
        is_mixed: has_esm && has_cjs,
    }
}

/// Options for [`is_valid_node_import_sync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeImportOptions {
    /// Protocols Node can load. Anything else is rejected outright.
    pub allowed_protocols: Vec<String>,
    /// Module source, when the caller already has it.
    pub code: Option<String>,
    pub strip_comments: bool,
    pub resolve: ResolveOptions,
}

impl Default for NodeImportOptions {
    fn default() -> Self {
        Self {
            allowed_protocols: ["node", "file", "data"].map(String::from).to_vec(),
            code: None,
            strip_comments: false,
            resolve: ResolveOptions::default(),
        }
    }
}

enum Verdict {
    Decided(bool),
    /// Only the module content can tell.
    Inspect(String),
}

fn precheck(id: &str, resolver: &Resolver, options: &NodeImportOptions) -> Option<bool> {
    if is_node_builtin(id, &resolver.config().builtins) {
        return Some(true);
    }
    match get_protocol(id) {
        Some(protocol) if !options.allowed_protocols.iter().any(|p| p == protocol) => Some(false),
        Some("data") => Some(true),
        _ => None,
    }
}

fn classify_path(resolved: &str) -> Verdict {
    let extension = modlens_util::path::extname(resolved);
    if NATIVE_EXTENSIONS.contains(&extension) {
        return Verdict::Decided(true);
    }
    if extension != ".js" {
        return Verdict::Decided(false);
    }

    let path = Path::new(resolved);
    let scope = match find_package_scope(path.parent().unwrap_or(path)) {
        Ok(scope) => scope,
        Err(e) => {
            tracing::debug!(path = resolved, error = %e, "ignoring unreadable package scope");
            None
        }
    };
    if scope.is_some_and(|scope| scope.manifest.is_module()) {
        return Verdict::Decided(true);
    }
    if ESM_FILENAME.is_match(resolved) {
        return Verdict::Decided(false);
    }
    Verdict::Inspect(resolved.to_string())
}

fn classify_code(code: &str, options: &NodeImportOptions) -> bool {
    let syntax = SyntaxOptions {
        strip_comments: options.strip_comments,
    };
    let code = prepare(code, syntax);
    CJS_SYNTAX.is_match(&code) || !ESM_SYNTAX.is_match(&code)
}

/// Whether Node can `import` the module `id` without a loader.
///
/// Builtins and `data:` URLs are accepted and other disallowed protocols
/// rejected without touching the filesystem. Otherwise the module is
/// resolved (resolution errors propagate) and judged by extension, package
/// type, file name and finally its content.
pub fn is_valid_node_import_sync(
    id: &str,
    resolver: &Resolver,
    options: &NodeImportOptions,
) -> Result<bool, Error> {
    if let Some(decided) = precheck(id, resolver, options) {
        return Ok(decided);
    }
    let resolved = resolver.resolve_path_sync(id, &options.resolve)?;
    match classify_path(&resolved) {
        Verdict::Decided(valid) => Ok(valid),
        Verdict::Inspect(path) => {
            let code = match &options.code {
                Some(code) => code.clone(),
                None => read_or_empty(modlens_util::fs::read_to_string_lossy(Path::new(&path)), &path),
            };
            Ok(classify_code(&code, options))
        }
    }
}

/// Async form of [`is_valid_node_import_sync`].
pub async fn is_valid_node_import(
    id: &str,
    resolver: &Resolver,
    options: &NodeImportOptions,
) -> Result<bool, Error> {
    if let Some(decided) = precheck(id, resolver, options) {
        return Ok(decided);
    }
    let resolved = resolver.resolve_path(id, &options.resolve).await?;
    let verdict = tokio::task::spawn_blocking(move || classify_path(&resolved))
        .await
        .map_err(|e| Error::other(format!("classify task failed: {e}")))?;
    match verdict {
        Verdict::Decided(valid) => Ok(valid),
        Verdict::Inspect(path) => {
            let code = match &options.code {
                Some(code) => code.clone(),
                None => read_or_empty(
                    tokio::fs::read(&path)
                        .await
                        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
                    &path,
                ),
            };
            Ok(classify_code(&code, options))
        }
    }
}

fn read_or_empty(read: std::io::Result<String>, path: &str) -> String {
    read.unwrap_or_else(|e| {
        tracing::debug!(path, error = %e, "treating unreadable module as empty");
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use std::fs;
    use tempfile::tempdir;

    fn detect(code: &str) -> (bool, bool, bool) {
        let d = detect_syntax(code, SyntaxOptions::default());
        (d.has_esm, d.has_cjs, d.is_mixed)
    }

    #[test]
    fn test_detect_esm() {
        for code in [
            r#"import defaultExport from "module-name";"#,
            r#"import * as name from "module-name";"#,
            r#"import { export1, export2 as alias2, export3 } from "module-name";"#,
            r#"import defaultExport, * as name from"module-name";"#,
            r#"import"module-name""#,
            r#"import "./file.mjs""#,
            r#"export default b="""#,
            "export const a = 1",
            "export async function foo() {}",
            "export class",
            "const url = import.meta.url",
        ] {
            assert_eq!(detect(code), (true, false, false), "{code}");
        }
    }

    #[test]
    fn test_detect_cjs_mixed_and_unknown() {
        assert_eq!(detect("exports.c={}"), (false, true, false));
        assert_eq!(detect("const b=true;module.exports={b};"), (false, true, false));
        assert_eq!(detect("const fs = require('fs')"), (false, true, false));
        assert_eq!(detect(r#"import"module-name";module.exports={};"#), (true, true, true));
        assert_eq!(detect(r#"import("./file.mjs")"#), (false, false, false));
        assert_eq!(detect("console.log(process.version)"), (false, false, false));
        assert_eq!(detect("const a={};"), (false, false, false));
    }

    #[test]
    fn test_strip_comments() {
        let code = "// export const a = 1\n/* module.exports = {} */\nconst x = 1";
        assert!(has_esm_syntax(code, SyntaxOptions::default()));
        let stripped = SyntaxOptions {
            strip_comments: true,
        };
        assert!(!has_esm_syntax(code, stripped));
        assert!(!has_cjs_syntax(code, stripped));
        assert_eq!(strip_comments(code), "\n\nconst x = 1");
    }

    #[test]
    fn test_node_import_shortcuts() {
        let dir = tempdir().unwrap();
        let resolver = Resolver::new(ResolverConfig::new(dir.path().to_path_buf()));
        let options = NodeImportOptions::default();
        for id in ["node:fs", "fs", "fs/promises", "node:fs/fake", "fs/fake"] {
            assert!(is_valid_node_import_sync(id, &resolver, &options).unwrap(), "{id}");
        }
        assert!(is_valid_node_import_sync(
            r#"data:text/javascript,console.log("hello!");"#,
            &resolver,
            &options
        )
        .unwrap());
        assert!(!is_valid_node_import_sync("https://cdn.example/x.js", &resolver, &options).unwrap());
        assert!(is_valid_node_import_sync("vue", &resolver, &options).is_err());
    }

    #[test]
    fn test_node_import_by_file() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("cjs")).unwrap();
        fs::write(root.join("cjs/index.js"), "module.exports = {}").unwrap();
        fs::create_dir_all(root.join("js-esm/es")).unwrap();
        fs::write(root.join("js-esm/index.js"), "export default 1").unwrap();
        fs::write(root.join("js-esm/es/index.js"), "const a = 1").unwrap();
        fs::write(root.join("js-esm/es/index.mjs"), "export default 1").unwrap();
        fs::create_dir_all(root.join("esm-module")).unwrap();
        fs::write(root.join("esm-module/package.json"), r#"{"type":"module"}"#).unwrap();
        fs::write(root.join("esm-module/index.js"), "export default 1").unwrap();
        fs::write(root.join("data.json"), "{}").unwrap();

        let resolver = Resolver::new(ResolverConfig::new(root.to_path_buf()));
        let options = NodeImportOptions::default();
        let check = |id: &str| is_valid_node_import_sync(id, &resolver, &options).unwrap();
        assert!(check("./cjs/index.js"));
        assert!(!check("./js-esm/index.js"));
        assert!(check("./js-esm/es/index.mjs"));
        assert!(!check("./js-esm/es/index.js"));
        assert!(check("./esm-module/index.js"));
        assert!(!check("./data.json"));

        let mixed = NodeImportOptions {
            code: Some("import a from 'a'; module.exports = a".into()),
            ..NodeImportOptions::default()
        };
        assert!(is_valid_node_import_sync("./js-esm/index.js", &resolver, &mixed).unwrap());
    }

    #[tokio::test]
    async fn test_node_import_async() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "export const a = 1").unwrap();
        fs::write(dir.path().join("b.js"), "exports.b = 1").unwrap();
        let resolver = Resolver::new(ResolverConfig::new(dir.path().to_path_buf()));
        let options = NodeImportOptions::default();
        assert!(!is_valid_node_import("./a.js", &resolver, &options).await.unwrap());
        assert!(is_valid_node_import("./b.js", &resolver, &options).await.unwrap());
    }

    #[tokio::test]
    async fn test_node_import_invalid_utf8_agrees() {
        let dir = tempdir().unwrap();
        let mut bytes = b"export const a = 1\n// ".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        fs::write(dir.path().join("a.js"), bytes).unwrap();
        let resolver = Resolver::new(ResolverConfig::new(dir.path().to_path_buf()));
        let options = NodeImportOptions::default();
        let sync = is_valid_node_import_sync("./a.js", &resolver, &options).unwrap();
        let async_ = is_valid_node_import("./a.js", &resolver, &options).await.unwrap();
        assert!(!sync);
        assert_eq!(sync, async_);
    }
}
