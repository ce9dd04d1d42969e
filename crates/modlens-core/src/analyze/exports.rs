//! Export declaration records.

use std::ops::Range;

use regex_lite::Captures;
use serde::Serialize;

use super::patterns::{
    group, specifier, EXPORT_DECL, EXPORT_DECL_TYPE, EXPORT_DEFAULT, EXPORT_DEFAULT_CLASS,
    EXPORT_DESTRUCT, EXPORT_NAMED, EXPORT_NAMED_TYPE, EXPORT_STAR, EXTRA_DECLARATOR,
};
use super::validate::Located;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Declaration,
    Named,
    Default,
    Star,
}

/// An `export` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    #[serde(rename = "type")]
    pub kind: ExportKind,
    /// Kind the record had before being retyped to `default`.
    #[serde(rename = "_type", skip_serializing_if = "Option::is_none")]
    pub original_kind: Option<ExportKind>,
    pub code: String,
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration: Option<String>,
    /// `declaration` without a leading `declare`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration_type: Option<String>,
    /// Expression text of `export default <expr>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_name: Option<String>,
    /// Byte range of the re-export specifier text, quotes excluded.
    #[serde(skip)]
    pub specifier_range: Option<Range<usize>>,
}

impl ExportRecord {
    fn from_match(kind: ExportKind, caps: &Captures<'_>) -> Option<Self> {
        let whole = caps.get(0)?;
        let (specifier, specifier_range) = match specifier(caps) {
            Some((spec, range)) => (Some(spec.to_string()), Some(range)),
            None => (None, None),
        };
        Some(Self {
            kind,
            original_kind: None,
            code: whole.as_str().to_string(),
            start: whole.start(),
            end: whole.end(),
            name: caps.name("name").map(|m| m.as_str().to_string()),
            names: Vec::new(),
            specifier,
            declaration: caps.name("declaration").map(|m| m.as_str().to_string()),
            declaration_type: None,
            default_name: None,
            specifier_range,
        })
    }

    fn normalize(mut self) -> Self {
        if self.name.is_none() && self.names.len() == 1 {
            self.name = Some(self.names[0].clone());
        }
        if self.name.as_deref() == Some("default") && self.kind != ExportKind::Default {
            self.original_kind = Some(self.kind);
            self.kind = ExportKind::Default;
        }
        if self.names.is_empty() {
            if let Some(name) = &self.name {
                self.names = vec![name.clone()];
            }
        }
        if self.kind == ExportKind::Declaration {
            self.declaration_type = self.declaration.as_deref().map(|declaration| {
                declaration
                    .strip_prefix("declare")
                    .map_or(declaration, str::trim_start)
                    .to_string()
            });
        }
        self
    }
}

impl Located for ExportRecord {
    fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Value export candidates, normalized but not yet validated or ordered.
pub(crate) fn export_candidates(code: &str) -> Vec<ExportRecord> {
    let mut records = Vec::new();
    records.extend(declarations(code));
    records.extend(named(code, &EXPORT_NAMED));
    records.extend(destructured(code));
    records.extend(defaults(code));
    records.extend(
        EXPORT_STAR
            .captures_iter(code)
            .filter_map(|caps| ExportRecord::from_match(ExportKind::Star, &caps)),
    );
    records.into_iter().map(ExportRecord::normalize).collect()
}

/// Type-only export candidates: declarations first, then named lists.
pub(crate) fn type_export_candidates(code: &str) -> Vec<ExportRecord> {
    let mut records: Vec<_> = EXPORT_DECL_TYPE
        .captures_iter(code)
        .filter_map(|caps| ExportRecord::from_match(ExportKind::Declaration, &caps))
        .collect();
    records.extend(named(code, &EXPORT_NAMED_TYPE));
    records.into_iter().map(ExportRecord::normalize).collect()
}

fn declarations(code: &str) -> impl Iterator<Item = ExportRecord> + '_ {
    EXPORT_DECL.captures_iter(code).filter_map(|caps| {
        let mut record = ExportRecord::from_match(ExportKind::Declaration, &caps)?;
        let declares_variables = matches!(
            record.declaration.as_deref(),
            Some("let" | "const" | "var")
        );
        if let (true, Some(extra), Some(name)) = (declares_variables, caps.name("extra"), &record.name) {
            let mut names = vec![name.clone()];
            names.extend(
                EXTRA_DECLARATOR
                    .captures_iter(extra.as_str())
                    .filter_map(|m| m.name("name").map(|n| n.as_str().to_string())),
            );
            record.names = names;
        }
        Some(record)
    })
}

fn named<'c>(code: &'c str, re: &'static regex_lite::Regex) -> impl Iterator<Item = ExportRecord> + 'c {
    re.captures_iter(code).filter_map(|caps| {
        let mut record = ExportRecord::from_match(ExportKind::Named, &caps)?;
        record.names = list_names(group(&caps, "exports"), |entry| {
            strip_alias(entry).to_string()
        });
        Some(record)
    })
}

fn destructured(code: &str) -> impl Iterator<Item = ExportRecord> + '_ {
    EXPORT_DESTRUCT.captures_iter(code).filter_map(|caps| {
        let mut record = ExportRecord::from_match(ExportKind::Named, &caps)?;
        let pattern = caps.name("object").or_else(|| caps.name("array"))?;
        record.names = list_names(pattern.as_str(), |entry| {
            let binding = entry.split_once(':').map_or(entry, |(_, binding)| binding);
            let binding = binding.split_once('=').map_or(binding, |(binding, _)| binding);
            binding.trim().to_string()
        });
        Some(record)
    })
}

fn defaults(code: &str) -> impl Iterator<Item = ExportRecord> + '_ {
    let expressions = EXPORT_DEFAULT.captures_iter(code).filter_map(|caps| {
        let mut record = ExportRecord::from_match(ExportKind::Default, &caps)?;
        record.name = Some("default".to_string());
        record.default_name = caps
            .name("default_name")
            .map(|m| m.as_str().trim().trim_end_matches(';').trim_end().to_string())
            .filter(|name| !name.is_empty());
        Some(record)
    });
    let classes = EXPORT_DEFAULT_CLASS
        .captures_iter(code)
        .filter_map(|caps| ExportRecord::from_match(ExportKind::Declaration, &caps));
    expressions.chain(classes)
}

/// Comma-separated entries, `type` entries and empty names dropped.
fn list_names(list: &str, binding: impl Fn(&str) -> String) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !is_type_entry(entry))
        .map(binding)
        .filter(|name| !name.is_empty())
        .collect()
}

fn is_type_entry(entry: &str) -> bool {
    entry
        .strip_prefix("type")
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

/// `local as exported` to `exported`.
fn strip_alias(entry: &str) -> &str {
    entry
        .char_indices()
        .filter(|(_, c)| c.is_whitespace())
        .find_map(|(i, _)| {
            let rest = entry[i..].trim_start();
            let rest = rest.strip_prefix("as")?;
            rest.starts_with(char::is_whitespace).then(|| rest.trim())
        })
        .unwrap_or(entry)
}

/// Drop a record when the next one has the same kind and name.
pub(crate) fn collapse_duplicates(records: Vec<ExportRecord>) -> Vec<ExportRecord> {
    let mut kept = Vec::with_capacity(records.len());
    let mut iter = records.into_iter().peekable();
    while let Some(record) = iter.next() {
        let shadowed = iter.peek().is_some_and(|next| {
            next.kind == record.kind && record.name.is_some() && next.name == record.name
        });
        if !shadowed {
            kept.push(record);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(code: &str) -> ExportRecord {
        let mut records = export_candidates(code);
        assert_eq!(records.len(), 1, "{records:#?}");
        records.remove(0)
    }

    #[test]
    fn test_declarations() {
        let record = only("export function useA () { return 'a' }");
        assert_eq!(record.kind, ExportKind::Declaration);
        assert_eq!(record.name.as_deref(), Some("useA"));
        assert_eq!(record.names, ["useA"]);
        assert_eq!(record.declaration_type.as_deref(), Some("function"));

        let record = only("export async function* foo () {}");
        assert_eq!(record.declaration.as_deref(), Some("async function*"));
        assert_eq!(record.name.as_deref(), Some("foo"));

        let record = only("export const enum Foo { A }");
        assert_eq!(record.declaration_type.as_deref(), Some("const enum"));

        assert_eq!(only("export const $foo = () => {}").name.as_deref(), Some("$foo"));
    }

    #[test]
    fn test_multiple_declarators() {
        assert_eq!(only("export const foo = 1, bar,baz=3;").names, ["foo", "bar", "baz"]);
        assert_eq!(only("export const foo = [ 1, bar, baz ];").names, ["foo"]);
        assert_eq!(only("export const foo = [ 1, bar ], baz = 2;").names, ["foo", "baz"]);
        assert_eq!(
            only("export const foo = { bar, bar1: [ qux , qux1 ] }, baz = 2;").names,
            ["foo", "baz"]
        );
        assert_eq!(only("export function foo(a, b, c) {}").names, ["foo"]);
    }

    #[test]
    fn test_destructured() {
        let record = only("export const { a, b } = foo");
        assert_eq!(record.kind, ExportKind::Named);
        assert_eq!(record.names, ["a", "b"]);
        assert_eq!(only("export const [ a:b,\nc = 1] = foo").names, ["b", "c"]);
    }

    #[test]
    fn test_named_lists() {
        let record = only("export { useB, _useC as useC }");
        assert_eq!(record.kind, ExportKind::Named);
        assert_eq!(record.names, ["useB", "useC"]);
        assert_eq!(record.name, None);

        let record = only("export { type AType, type B as BType, foo } from 'foo'");
        assert_eq!(record.names, ["foo"]);
        assert_eq!(record.name.as_deref(), Some("foo"));
        assert_eq!(record.specifier.as_deref(), Some("foo"));

        assert_eq!(
            only("export{a as globalMiddleware,d as namedMiddleware};").names,
            ["globalMiddleware", "namedMiddleware"]
        );
    }

    #[test]
    fn test_named_list_does_not_start_in_string() {
        let record = only(r#"const s = "export { a"; export const b = 1; }"#);
        assert_eq!(record.kind, ExportKind::Declaration);
        assert_eq!(record.names, ["b"]);

        let code = "const t = `export { x`; export { y }";
        let records = export_candidates(code);
        assert!(records.iter().all(|r| r.names.iter().all(|n| !n.contains('`'))), "{records:#?}");
        assert_eq!(records.last().map(|r| r.names.clone()), Some(vec!["y".to_string()]));
    }

    #[test]
    fn test_default_retype() {
        let record = only("export { x as default }");
        assert_eq!(record.kind, ExportKind::Default);
        assert_eq!(record.original_kind, Some(ExportKind::Named));
        assert_eq!(record.name.as_deref(), Some("default"));
        assert_eq!(record.names, ["default"]);

        let record = only(r#"export { default , } from "./other""#);
        assert_eq!(record.kind, ExportKind::Default);
        assert_eq!(record.specifier.as_deref(), Some("./other"));
    }

    #[test]
    fn test_default_expression() {
        let record = only("export default something");
        assert_eq!(record.kind, ExportKind::Default);
        assert_eq!(record.names, ["default"]);
        assert_eq!(record.default_name.as_deref(), Some("something"));

        let record = only("export default true;");
        assert_eq!(record.default_name, None);
        assert_eq!(record.code, "export default true");
    }

    #[test]
    fn test_default_class_yields_two_records() {
        let records = export_candidates("export default class Foo {}");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, ExportKind::Default);
        assert_eq!(records[0].code, "export default class");
        assert_eq!(records[0].end, 20);
        assert_eq!(records[1].kind, ExportKind::Declaration);
        assert_eq!(records[1].name.as_deref(), Some("Foo"));
    }

    #[test]
    fn test_star() {
        let record = only(r#"export * as ns from "./m""#);
        assert_eq!(record.kind, ExportKind::Star);
        assert_eq!(record.name.as_deref(), Some("ns"));
        assert_eq!(record.specifier.as_deref(), Some("./m"));

        let record = only("export * from './other'");
        assert_eq!(record.name, None);
        assert!(record.names.is_empty());
        let range = record.specifier_range.unwrap();
        assert_eq!(&"export * from './other'"[range], "./other");
    }

    #[test]
    fn test_type_exports() {
        let code = "export interface Qux {}\nexport type { Foo } from './foo'\nexport declare const enum Bar { A }";
        let records = type_export_candidates(code);
        let summary: Vec<_> = records
            .iter()
            .map(|r| (r.kind, r.name.as_deref(), r.declaration_type.as_deref()))
            .collect();
        assert_eq!(
            summary,
            [
                (ExportKind::Declaration, Some("Qux"), Some("interface")),
                (ExportKind::Declaration, Some("Bar"), Some("const enum")),
                (ExportKind::Named, Some("Foo"), None),
            ]
        );
        assert!(export_candidates(code).is_empty());
    }

    #[test]
    fn test_collapse_keeps_later() {
        let records = export_candidates("export const a = 1\nexport { a }\nexport { a }");
        let collapsed = collapse_duplicates(records);
        assert_eq!(collapsed.len(), 2);
        assert_eq!(collapsed[1].start, 32);
    }
}
