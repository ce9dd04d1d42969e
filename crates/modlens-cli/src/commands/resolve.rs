//! `modlens resolve` command implementation.

use miette::Result;
use modlens_core::{Resolver, ResolverConfig};
use serde::Serialize;

use super::{fail, print_json, ResolveArgs};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveResult<'a> {
    ok: bool,
    specifier: &'a str,
    resolved: String,
}

/// Resolve `specifier` and print the location, as a URL or with `path` as
/// a filesystem path.
pub fn run(config: ResolverConfig, specifier: &str, args: &ResolveArgs, path: bool, json: bool) -> Result<()> {
    let options = args.options(&config.cwd);
    let resolver = Resolver::new(config);

    let result = if path {
        resolver.resolve_path_sync(specifier, &options)
    } else {
        resolver.resolve_sync(specifier, &options)
    };
    let resolved = match result {
        Ok(resolved) => resolved,
        Err(e) => return fail(&e, json),
    };

    if json {
        print_json(&ResolveResult {
            ok: true,
            specifier,
            resolved,
        })
    } else {
        println!("{resolved}");
        Ok(())
    }
}
