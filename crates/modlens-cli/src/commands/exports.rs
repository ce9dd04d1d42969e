//! `modlens exports` and `modlens export-names` command implementations.

use std::collections::BTreeSet;
use std::path::Path;

use miette::Result;
use modlens_core::{Analyzer, ExportKind, ExportRecord, Resolver, ResolverConfig};
use serde::Serialize;

use super::{analyze_path, fail, print_json, runtime, ResolveArgs};

#[derive(Debug, Serialize)]
struct ExportsReport {
    exports: Vec<ExportRecord>,
}

#[derive(Debug, Serialize)]
struct NamesReport {
    names: Vec<String>,
}

#[derive(Serialize)]
struct ExportNamesResult<'a> {
    ok: bool,
    specifier: &'a str,
    names: BTreeSet<String>,
}

fn kind_label(kind: ExportKind) -> &'static str {
    match kind {
        ExportKind::Declaration => "declaration",
        ExportKind::Named => "named",
        ExportKind::Default => "default",
        ExportKind::Star => "star",
    }
}

fn find(analyzer: &Analyzer, code: &str, types: bool) -> Vec<ExportRecord> {
    if types {
        analyzer.find_type_exports(code)
    } else {
        analyzer.find_exports(code)
    }
}

/// Print the exports of every source file at `path`: full records, or
/// with `names` only the exported names. `types` selects type-only exports.
pub fn run(path: &Path, types: bool, names: bool, json: bool) -> Result<()> {
    let analyzer = Analyzer::default();

    if names {
        let reports = analyze_path(path, |code| NamesReport {
            names: find(&analyzer, code, types)
                .into_iter()
                .flat_map(|record| record.names)
                .collect(),
        })?;
        if json {
            return print_json(&reports);
        }
        for file in &reports {
            println!("{}: {}", file.file, file.report.names.join(", "));
        }
        return Ok(());
    }

    let reports = analyze_path(path, |code| ExportsReport {
        exports: find(&analyzer, code, types),
    })?;
    if json {
        return print_json(&reports);
    }
    for file in &reports {
        println!("{}", file.file);
        for record in &file.report.exports {
            println!("  {}", describe(record));
        }
    }
    Ok(())
}

fn describe(record: &ExportRecord) -> String {
    let mut line = format!("{:<12} ", kind_label(record.kind));
    if let Some(declaration) = &record.declaration_type {
        line.push_str(declaration);
        line.push(' ');
    }
    if record.names.is_empty() {
        line.push('*');
    } else {
        line.push_str(&record.names.join(", "));
    }
    if let Some(specifier) = &record.specifier {
        line.push_str(" from ");
        line.push_str(specifier);
    }
    line.trim_end().to_string()
}

/// Print every name `specifier` exports, following star re-exports.
pub fn run_names(config: ResolverConfig, specifier: &str, args: &ResolveArgs, json: bool) -> Result<()> {
    let options = args.options(&config.cwd);
    let resolver = Resolver::new(config);
    let analyzer = Analyzer::default();

    let rt = runtime()?;
    let names = match rt.block_on(analyzer.resolve_module_export_names(&resolver, specifier, &options)) {
        Ok(names) => names,
        Err(e) => return fail(&e, json),
    };

    if json {
        return print_json(&ExportNamesResult {
            ok: true,
            specifier,
            names,
        });
    }
    for name in &names {
        println!("{name}");
    }
    Ok(())
}
