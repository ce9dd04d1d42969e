//! Candidate patterns for import/export declarations.
//!
//! These over-match on purpose: text inside strings and comments is
//! removed afterwards by keyword-span validation.

use std::ops::Range;
use std::sync::LazyLock;

use regex_lite::{Captures, Regex};

/// Identifier characters: `$`, ASCII alphanumerics, `_` and anything
/// outside ASCII.
const IDENT: &str = r"[^\x00-\x23\x25-\x2F\x3A-\x40\x5B-\x5E\x60\x7B-\x7F]";

/// A quoted specifier, surrounding whitespace excluded from the capture.
const SPECIFIER: &str = r#"(?:"\s*(?P<dq>[^"\n]*[^\s"])\s*"|'\s*(?P<sq>[^'\n]*[^\s'])\s*')"#;

fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => panic!("invalid built-in pattern {pattern:?}: {e}"),
    }
}

pub(crate) static STATIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r#"import\s*(?:[\s"']*(?P<imports>[^"'`;()=\[\]<>!%^&|?~\\]+)from\s*)?{SPECIFIER}[\s;]*"#
    ))
});

pub(crate) static TYPE_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"import\s*type\s+(?P<imports>[\w$*{{}}\n\r\t, ]+)from\s*{SPECIFIER}[\s;]*"
    ))
});

pub(crate) static DYNAMIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"import\s*\((?P<expression>(?:[^)(]+|\((?:[^)(]+|\([^)(]*\))*\))*)\)")
});

/// A clause carrying an inline `type` entry.
pub(crate) static INLINE_TYPE: LazyLock<Regex> = LazyLock::new(|| compile(r"[^A-Za-z]type\s"));

pub(crate) static EXPORT_DECL: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"\bexport\s+(?P<declaration>async function\s*\*?|function\s*\*?|let|const enum|const|enum|var|class)\s+\*?(?P<name>{IDENT}+)(?P<extra>.*,\s*[\s\w:\[\]{{}}]*[\w$\]}}]+)*"
    ))
});

pub(crate) static EXPORT_DECL_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"\bexport\s+(?P<declaration>interface|type|declare (?:async function|function|let|const enum|const|enum|var|class))\s+(?P<name>{IDENT}+)"
    ))
});

pub(crate) static EXPORT_DEFAULT_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"\bexport\s+default\s+(?P<declaration>class)\s+(?P<name>{IDENT}+)"
    ))
});

pub(crate) static EXPORT_NAMED: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r#"\bexport\s*\{{(?P<exports>[^}}"'`]+?)[\s,]*\}}(?:\s*from\s*{SPECIFIER}[^\n;]*)?"#
    ))
});

pub(crate) static EXPORT_NAMED_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r#"\bexport\s+type\s+\{{(?P<exports>[^}}"'`]+?)[\s,]*\}}(?:\s*from\s*{SPECIFIER}[^\n;]*)?"#
    ))
});

pub(crate) static EXPORT_DESTRUCT: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"\bexport\s+(?:let|var|const)\s+(?:\{(?P<object>[^}]+?)[\s,]*\}|\[(?P<array>[^\]]+?)[\s,]*\])\s+=",
    )
});

pub(crate) static EXPORT_STAR: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"\bexport\s*\*(?:\s*as\s+(?P<name>{IDENT}+)\s+)?\s*(?:\s*from\s*{SPECIFIER}[^\n;]*)?"
    ))
});

pub(crate) static EXPORT_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"\bexport\s+default\s+(?:async function|function|class|true|false|\W|\d)|\bexport\s+default\s+(?P<default_name>.*)",
    )
});

/// Extra declarators after the first: bracketed initializers are skipped,
/// `, name` is a declarator.
pub(crate) static EXTRA_DECLARATOR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(\{.*?\})|(\[.*?\])|(,\s*(?P<name>\w+))"));

pub(crate) static LINE_COMMENT_OR_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| compile(r"//[^\n]*\n|/\*.*\*/"));

pub(crate) static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));

pub(crate) static NAMESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\* as \s*(?P<name>\S*)"));

pub(crate) static BRACES: LazyLock<Regex> = LazyLock::new(|| compile(r"\{(?P<inner>[^}]*)\}"));

/// Every match of `re`, skipping matches whose preceding character is not
/// whitespace, `;` or `}`. Stands in for a lookbehind.
pub(crate) fn statement_captures<'h>(re: &Regex, haystack: &'h str) -> Vec<Captures<'h>> {
    let mut found = Vec::new();
    let mut at = 0;
    while at <= haystack.len() {
        let Some(caps) = re.captures_at(haystack, at) else {
            break;
        };
        let Some(m) = caps.get(0) else {
            break;
        };
        let start = m.start();
        let boundary = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| c.is_whitespace() || c == ';' || c == '}');
        if boundary {
            at = m.end().max(start + 1);
            found.push(caps);
        } else {
            at = start + 1;
        }
        while at < haystack.len() && !haystack.is_char_boundary(at) {
            at += 1;
        }
    }
    found
}

/// The quoted specifier of a match and its byte range.
pub(crate) fn specifier<'h>(caps: &Captures<'h>) -> Option<(&'h str, Range<usize>)> {
    caps.name("dq")
        .or_else(|| caps.name("sq"))
        .map(|m| (m.as_str(), m.range()))
}

/// Text of a named group, or `""`.
pub(crate) fn group<'h>(caps: &Captures<'h>, name: &str) -> &'h str {
    caps.name(name).map_or("", |m| m.as_str())
}
