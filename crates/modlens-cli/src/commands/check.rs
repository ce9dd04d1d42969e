//! `modlens check` command implementation.

use miette::Result;
use modlens_core::{is_valid_node_import_sync, NodeImportOptions, Resolver, ResolverConfig};
use serde::Serialize;

use super::{fail, print_json, ResolveArgs};

#[derive(Serialize)]
struct CheckResult<'a> {
    ok: bool,
    specifier: &'a str,
    valid: bool,
}

/// Print whether Node can import `specifier` natively.
pub fn run(
    config: ResolverConfig,
    specifier: &str,
    args: &ResolveArgs,
    allow_protocols: Vec<String>,
    json: bool,
) -> Result<()> {
    let mut options = NodeImportOptions {
        resolve: args.options(&config.cwd),
        ..NodeImportOptions::default()
    };
    if !allow_protocols.is_empty() {
        options.allowed_protocols = allow_protocols
            .into_iter()
            .map(|p| p.trim_end_matches(':').to_string())
            .collect();
    }
    let resolver = Resolver::new(config);

    let valid = match is_valid_node_import_sync(specifier, &resolver, &options) {
        Ok(valid) => valid,
        Err(e) => return fail(&e, json),
    };

    if json {
        print_json(&CheckResult {
            ok: true,
            specifier,
            valid,
        })
    } else {
        println!("{}", if valid { "valid" } else { "invalid" });
        Ok(())
    }
}
