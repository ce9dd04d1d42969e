//! `modlens syntax` command implementation.

use std::path::Path;

use miette::Result;
use modlens_core::{detect_syntax, SyntaxDetection, SyntaxOptions};

use super::{analyze_path, print_json};

fn label(detection: SyntaxDetection) -> &'static str {
    match (detection.has_esm, detection.has_cjs) {
        (true, true) => "mixed",
        (true, false) => "esm",
        (false, true) => "cjs",
        (false, false) => "none",
    }
}

/// Print the module syntax of every source file at `path`.
pub fn run(path: &Path, strip_comments: bool, json: bool) -> Result<()> {
    let options = SyntaxOptions { strip_comments };
    let reports = analyze_path(path, |code| detect_syntax(code, options))?;

    if json {
        return print_json(&reports);
    }
    for file in &reports {
        println!("{}: {}", file.file, label(file.report));
    }
    Ok(())
}
