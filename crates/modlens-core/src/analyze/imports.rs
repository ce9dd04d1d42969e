//! Import declaration records.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::Serialize;

use super::patterns::{
    group, specifier, statement_captures, BRACES, DYNAMIC_IMPORT, INLINE_TYPE,
    LINE_COMMENT_OR_BLOCK, NAMESPACE, STATIC_IMPORT, TYPE_IMPORT, WHITESPACE,
};
use super::validate::Located;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Static,
    Dynamic,
    /// `import type ... from`.
    Type,
}

/// A static `import` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticImport {
    #[serde(rename = "type")]
    pub kind: ImportKind,
    pub code: String,
    pub start: usize,
    pub end: usize,
    /// Raw clause between `import` and `from`; empty for `import "x"`.
    pub imports: String,
    pub specifier: String,
    /// Byte range of the specifier text, quotes excluded.
    #[serde(skip)]
    pub specifier_range: Range<usize>,
}

/// A static import with its clause split into bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedStaticImport {
    #[serde(flatten)]
    pub import: StaticImport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_import: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespaced_import: Option<String>,
    /// Source name to local name.
    pub named_imports: BTreeMap<String, String>,
}

/// An `import(...)` expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DynamicImport {
    #[serde(rename = "type")]
    pub kind: ImportKind,
    pub code: String,
    pub start: usize,
    pub end: usize,
    /// Raw argument text.
    pub expression: String,
    #[serde(skip)]
    pub expression_range: Range<usize>,
}

impl DynamicImport {
    /// The argument when it is a single string literal.
    #[must_use]
    pub fn literal_specifier(&self) -> Option<&str> {
        let expr = self.expression.trim();
        let quote = expr.chars().next().filter(|c| matches!(c, '"' | '\'' | '`'))?;
        let inner = expr.strip_prefix(quote)?.strip_suffix(quote)?;
        if inner.contains(quote) || (quote == '`' && inner.contains("${")) {
            return None;
        }
        Some(inner)
    }

    /// Byte range of [`DynamicImport::literal_specifier`] in the source.
    #[must_use]
    pub fn literal_specifier_range(&self) -> Option<Range<usize>> {
        let inner = self.literal_specifier()?;
        let lead = self.expression.len() - self.expression.trim_start().len();
        let start = self.expression_range.start + lead + 1;
        Some(start..start + inner.len())
    }
}

impl Located for StaticImport {
    fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl Located for DynamicImport {
    fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

pub(crate) fn static_candidates(code: &str) -> Vec<StaticImport> {
    import_candidates(code, &STATIC_IMPORT, ImportKind::Static)
}

/// `import type` declarations followed by static imports carrying inline
/// `type` entries, in source order.
pub(crate) fn type_candidates(code: &str) -> Vec<StaticImport> {
    let mut found = import_candidates(code, &TYPE_IMPORT, ImportKind::Type);
    found.extend(
        static_candidates(code)
            .into_iter()
            .filter(|import| INLINE_TYPE.is_match(&import.imports)),
    );
    found.sort_by_key(|import| import.start);
    found
}

fn import_candidates(code: &str, re: &regex_lite::Regex, kind: ImportKind) -> Vec<StaticImport> {
    statement_captures(re, code)
        .iter()
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let (spec, specifier_range) = specifier(caps)?;
            Some(StaticImport {
                kind,
                code: whole.as_str().to_string(),
                start: whole.start(),
                end: whole.end(),
                imports: group(caps, "imports").to_string(),
                specifier: spec.to_string(),
                specifier_range,
            })
        })
        .collect()
}

pub(crate) fn dynamic_candidates(code: &str) -> Vec<DynamicImport> {
    DYNAMIC_IMPORT
        .captures_iter(code)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let expression = caps.name("expression")?;
            Some(DynamicImport {
                kind: ImportKind::Dynamic,
                code: whole.as_str().to_string(),
                start: whole.start(),
                end: whole.end(),
                expression: expression.as_str().to_string(),
                expression_range: expression.range(),
            })
        })
        .collect()
}

/// Split a static import clause into default, namespace and named
/// bindings. `type` entries are left out.
#[must_use]
pub fn parse_static_import(import: &StaticImport) -> ParsedStaticImport {
    let cleaned = clear_imports(&import.imports);
    let named_imports = named_entries(&cleaned)
        .filter(|entry| !entry.is_type)
        .map(|entry| (entry.source, entry.local))
        .collect();
    bindings(import, &cleaned, named_imports)
}

/// Like [`parse_static_import`], but for a record from
/// [`Analyzer::find_type_imports`](super::Analyzer::find_type_imports):
/// a static record keeps only its inline `type` entries.
#[must_use]
pub fn parse_type_import(import: &StaticImport) -> ParsedStaticImport {
    if import.kind == ImportKind::Type {
        return parse_static_import(import);
    }
    let cleaned = clear_imports(&import.imports);
    let named_imports = named_entries(&cleaned)
        .filter(|entry| entry.is_type)
        .map(|entry| (entry.source, entry.local))
        .collect();
    bindings(import, &cleaned, named_imports)
}

fn bindings(
    import: &StaticImport,
    cleaned: &str,
    named_imports: BTreeMap<String, String>,
) -> ParsedStaticImport {
    let top_level = BRACES.replace(cleaned, "");
    let namespaced_import = NAMESPACE
        .captures(&top_level)
        .map(|caps| group(&caps, "name").to_string())
        .filter(|name| !name.is_empty());
    let default_import = top_level
        .split(',')
        .find(|part| !part.contains(['*', '{', '}']))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from);
    ParsedStaticImport {
        import: import.clone(),
        default_import,
        namespaced_import,
        named_imports,
    }
}

/// Drop comments and collapse whitespace.
fn clear_imports(imports: &str) -> String {
    let without_comments = LINE_COMMENT_OR_BLOCK.replace_all(imports, "");
    WHITESPACE.replace_all(&without_comments, " ").into_owned()
}

struct NamedEntry {
    is_type: bool,
    source: String,
    local: String,
}

fn named_entries(cleaned: &str) -> impl Iterator<Item = NamedEntry> + '_ {
    let inner = BRACES
        .captures(cleaned)
        .and_then(|caps| caps.name("inner"))
        .map_or("", |m| m.as_str());
    inner.split(',').filter_map(|entry| {
        let entry = entry.trim();
        let (is_type, entry) = match strip_type_prefix(entry) {
            Some(rest) => (true, rest),
            None => (false, entry),
        };
        let (source, local) = entry
            .split_once(" as ")
            .map_or((entry, entry), |(source, local)| (source.trim(), local.trim()));
        if source.is_empty() {
            return None;
        }
        Some(NamedEntry {
            is_type,
            source: source.to_string(),
            local: local.to_string(),
        })
    })
}

fn strip_type_prefix(entry: &str) -> Option<&str> {
    let rest = entry.strip_prefix("type")?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim_start())
}
