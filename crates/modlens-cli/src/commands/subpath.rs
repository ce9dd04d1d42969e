//! `modlens subpath` command implementation.

use miette::Result;
use modlens_core::{parse_manifest_path, resolve_subpath, ManifestPath};
use serde::Serialize;

use super::{fail, print_json};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubpathResult<'a> {
    ok: bool,
    path: &'a str,
    package: Option<ManifestPath>,
    subpath: String,
}

/// Print the package subpath that publishes `path`.
pub fn run(path: &str, json: bool) -> Result<()> {
    let lookup = parse_manifest_path(path).and_then(|package| Ok((package, resolve_subpath(path)?)));
    let (package, subpath) = match lookup {
        Ok(found) => found,
        Err(e) => return fail(&e, json),
    };

    if json {
        return print_json(&SubpathResult {
            ok: true,
            path,
            package,
            subpath,
        });
    }
    println!("{subpath}");
    Ok(())
}
