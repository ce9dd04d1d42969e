//! Subcommand implementations and the plumbing they share.

pub mod check;
pub mod exports;
pub mod imports;
pub mod resolve;
pub mod rewrite;
pub mod subpath;
pub mod syntax;

use std::path::{Path, PathBuf};

use clap::Args;
use miette::{IntoDiagnostic, Result};
use modlens_core::{Error, ResolveOptions};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

/// Extensions scanned when a directory is given.
const SOURCE_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx"];

/// Resolution flags shared by every command that resolves specifiers.
#[derive(Args, Debug, Clone, Default)]
pub struct ResolveArgs {
    /// Anchor to resolve from, a path or URL (repeatable; default: working directory)
    #[arg(long = "from", value_name = "ANCHOR")]
    pub from: Vec<String>,

    /// Export condition (repeatable; default: node, import)
    #[arg(long = "condition", value_name = "CONDITION")]
    pub conditions: Vec<String>,

    /// Extension to probe, in order (repeatable; default: .mjs .cjs .js .json)
    #[arg(long = "extension", value_name = "EXT")]
    pub extensions: Vec<String>,
}

impl ResolveArgs {
    /// Options for these flags. Relative anchors are taken from `cwd`.
    pub fn options(&self, cwd: &Path) -> ResolveOptions {
        let mut options = ResolveOptions::default().with_anchors(
            self.from
                .iter()
                .map(|anchor| absolute_anchor(cwd, anchor)),
        );
        if !self.conditions.is_empty() {
            options = options.with_conditions(self.conditions.iter().cloned());
        }
        if !self.extensions.is_empty() {
            options = options.with_extensions(self.extensions.iter().map(|ext| {
                if ext.starts_with('.') {
                    ext.clone()
                } else {
                    format!(".{ext}")
                }
            }));
        }
        options
    }
}

fn absolute_anchor(cwd: &Path, anchor: &str) -> String {
    if anchor.contains(':') && !Path::new(anchor).is_absolute() {
        return anchor.to_string();
    }
    cwd.join(anchor).to_string_lossy().into_owned()
}

/// Analysis result for one file.
#[derive(Debug, Serialize)]
pub struct FileReport<T> {
    pub file: String,
    #[serde(flatten)]
    pub report: T,
}

/// `path` itself when it is a file, otherwise every source file below it
/// in a stable order. `node_modules` and hidden directories are skipped.
pub fn source_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(miette::miette!("No such file or directory: {}", path.display()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));
    for entry in walker {
        let entry = entry.into_diagnostic()?;
        if entry.file_type().is_file() && is_source_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    tracing::debug!(root = %path.display(), count = files.len(), "collected source files");
    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name == "node_modules" || name.starts_with('.'))
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Read and analyze every file under `path` in parallel. Output order
/// follows [`source_files`].
pub fn analyze_path<T, F>(path: &Path, analyze: F) -> Result<Vec<FileReport<T>>>
where
    T: Send,
    F: Fn(&str) -> T + Sync,
{
    let files = source_files(path)?;
    files
        .par_iter()
        .map(|file| -> Result<FileReport<T>> {
            let code = modlens_util::fs::read_to_string_lossy(file)
                .map_err(|e| miette::miette!("Failed to read {}: {e}", file.display()))?;
            Ok(FileReport {
                file: modlens_util::path::normalize_slash(&file.to_string_lossy()),
                report: analyze(&code),
            })
        })
        .collect()
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

/// Report a core error: a JSON error object and exit status 1 with
/// `--json`, a diagnostic otherwise.
pub fn fail(err: &Error, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": false,
                "error": {
                    "code": err.code().as_str(),
                    "message": err.to_string(),
                }
            })
        );
        std::process::exit(1);
    }
    Err(miette::miette!(code = err.code().as_str(), "{err}"))
}

/// Current-thread runtime for commands that use the async API.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()
}
