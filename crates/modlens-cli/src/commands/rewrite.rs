//! `modlens rewrite` command implementation.

use std::path::Path;

use miette::Result;
use modlens_core::{resolve_imports, Resolver, ResolverConfig};
use serde::Serialize;

use super::{fail, print_json, runtime, ResolveArgs};

#[derive(Serialize)]
struct RewriteResult {
    ok: bool,
    file: String,
    code: String,
}

/// Print `file` with every import specifier replaced by its resolved
/// location. Specifiers resolve from the file itself unless `--from` is
/// given.
pub fn run(config: ResolverConfig, file: &Path, args: &ResolveArgs, json: bool) -> Result<()> {
    let code = modlens_util::fs::read_to_string_lossy(file)
        .map_err(|e| miette::miette!("Failed to read {}: {e}", file.display()))?;

    let mut options = args.options(&config.cwd);
    if options.anchors.is_empty() {
        options = options.with_anchor(file.to_string_lossy());
    }
    let resolver = Resolver::new(config);

    let rt = runtime()?;
    let rewritten = match rt.block_on(resolve_imports(&code, &resolver, &options)) {
        Ok(rewritten) => rewritten,
        Err(e) => return fail(&e, json),
    };

    if json {
        print_json(&RewriteResult {
            ok: true,
            file: modlens_util::path::normalize_slash(&file.to_string_lossy()),
            code: rewritten,
        })
    } else {
        print!("{rewritten}");
        Ok(())
    }
}
