//! `modlens imports` command implementation.

use std::path::Path;

use miette::Result;
use modlens_core::{parse_static_import, parse_type_import, Analyzer, DynamicImport, ParsedStaticImport};
use serde::Serialize;

use super::{analyze_path, print_json};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportsReport {
    static_imports: Vec<ParsedStaticImport>,
    dynamic_imports: Vec<DynamicImport>,
    type_imports: Vec<ParsedStaticImport>,
}

fn analyze(analyzer: &Analyzer, code: &str) -> ImportsReport {
    ImportsReport {
        static_imports: analyzer
            .find_static_imports(code)
            .iter()
            .map(parse_static_import)
            .collect(),
        dynamic_imports: analyzer.find_dynamic_imports(code),
        type_imports: analyzer
            .find_type_imports(code)
            .iter()
            .map(parse_type_import)
            .collect(),
    }
}

/// Print the imports of every source file at `path`.
pub fn run(path: &Path, json: bool) -> Result<()> {
    let analyzer = Analyzer::default();
    let reports = analyze_path(path, |code| analyze(&analyzer, code))?;

    if json {
        return print_json(&reports);
    }
    for file in &reports {
        println!("{}", file.file);
        for import in &file.report.static_imports {
            println!("  static   {}{}", import.import.specifier, bindings(import));
        }
        for import in &file.report.dynamic_imports {
            println!("  dynamic  {}", import.expression.trim());
        }
        for import in &file.report.type_imports {
            println!("  type     {}{}", import.import.specifier, bindings(import));
        }
    }
    Ok(())
}

/// ` default=a namespace=b named={x, y as z}`, or empty for a bare import.
fn bindings(import: &ParsedStaticImport) -> String {
    let mut out = String::new();
    if let Some(default) = &import.default_import {
        out.push_str(&format!(" default={default}"));
    }
    if let Some(namespace) = &import.namespaced_import {
        out.push_str(&format!(" namespace={namespace}"));
    }
    if !import.named_imports.is_empty() {
        let named: Vec<String> = import
            .named_imports
            .iter()
            .map(|(source, local)| {
                if source == local {
                    source.clone()
                } else {
                    format!("{source} as {local}")
                }
            })
            .collect();
        out.push_str(&format!(" named={{{}}}", named.join(", ")));
    }
    out
}
