//! Recursive star re-export resolution over on-disk module graphs.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use modlens_core::{Analyzer, ResolveOptions, Resolver, ResolverConfig};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(ToString::to_string).collect()
}

#[test]
fn test_star_union_with_own_exports() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.mjs", "export * from './b.mjs'\nexport const z = 1\n");
    write(dir.path(), "b.mjs", "export const x = 1\nexport function y() {}\nexport const x2 = x\n");
    let resolver = Resolver::new(ResolverConfig::new(dir.path().to_path_buf()));

    let result = Analyzer::default()
        .resolve_module_export_names_sync(&resolver, "./a.mjs", &ResolveOptions::default())
        .unwrap();
    assert_eq!(result, names(&["x", "x2", "y", "z"]));
}

#[test]
fn test_diamond_and_cycle_terminate() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "src/index.mjs",
        "export * from './left.mjs'\nexport * from './right.mjs'\n",
    );
    write(dir.path(), "src/left.mjs", "export * from './shared.mjs'\nexport const left = 1\n");
    write(dir.path(), "src/right.mjs", "export * from './shared.mjs'\nexport const right = 1\n");
    write(
        dir.path(),
        "src/shared.mjs",
        "export * from './index.mjs'\nexport { shared, other as renamed }\nconst shared = 1, other = 2\n",
    );
    let resolver = Resolver::new(ResolverConfig::new(dir.path().to_path_buf()));
    let analyzer = Analyzer::default();
    let options = ResolveOptions::default();

    let expected = names(&["left", "renamed", "right", "shared"]);
    let sync = analyzer
        .resolve_module_export_names_sync(&resolver, "./src/index.mjs", &options)
        .unwrap();
    assert_eq!(sync, expected);

    let from_shared = analyzer
        .resolve_module_export_names_sync(&resolver, "./src/shared.mjs", &options)
        .unwrap();
    assert_eq!(from_shared, expected);
}

#[tokio::test]
async fn test_async_graph_matches_sync() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "node_modules/lib/package.json",
        r#"{"exports":{".":"./index.mjs","./extra":"./extra.mjs"}}"#,
    );
    write(
        dir.path(),
        "node_modules/lib/index.mjs",
        "export * from './extra.mjs'\nexport * as util from 'node:util'\nexport default 1\n",
    );
    write(dir.path(), "node_modules/lib/extra.mjs", "export class Extra {}\n");
    write(dir.path(), "entry.mjs", "export * from 'lib'\nexport * from 'fs'\nexport let own\n");
    let resolver = Resolver::new(ResolverConfig::new(dir.path().to_path_buf()));
    let analyzer = Analyzer::default();
    let options = ResolveOptions::default();

    let sync = analyzer
        .resolve_module_export_names_sync(&resolver, "./entry.mjs", &options)
        .unwrap();
    let async_names = analyzer
        .resolve_module_export_names(&resolver, "./entry.mjs", &options)
        .await
        .unwrap();
    assert_eq!(sync, async_names);
    assert_eq!(sync, names(&["Extra", "default", "own", "util"]));
}

#[test]
fn test_missing_star_target_is_an_error() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.mjs", "export * from './gone.mjs'\n");
    let resolver = Resolver::new(ResolverConfig::new(dir.path().to_path_buf()));

    let err = Analyzer::default()
        .resolve_module_export_names_sync(&resolver, "./a.mjs", &ResolveOptions::default())
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
}
