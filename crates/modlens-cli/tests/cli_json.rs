//! Integration tests for `modlens --json` output.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn modlens(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_modlens"))
        .arg("--json")
        .arg("--cwd")
        .arg(cwd)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run modlens")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("stdout should be valid JSON ({e}): {stdout}"))
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_resolve_json() {
    let dir = tempdir().unwrap();
    write(dir.path(), "src/util.mjs", "export const a = 1");

    let output = modlens(dir.path(), &["resolve", "./src/util"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json = stdout_json(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(json["specifier"], "./src/util");
    let resolved = json["resolved"].as_str().unwrap();
    assert!(resolved.starts_with("file://"), "{resolved}");
    assert!(resolved.ends_with("/src/util.mjs"), "{resolved}");

    let output = modlens(dir.path(), &["resolve", "fs"]);
    assert_eq!(stdout_json(&output)["resolved"], "node:fs");
}

#[test]
fn test_resolve_failure_reports_code() {
    let dir = tempdir().unwrap();

    let output = modlens(dir.path(), &["resolve", "./nope"]);
    assert!(!output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "ERR_MODULE_NOT_FOUND");
    assert!(json["error"]["message"].as_str().unwrap().contains("./nope"));
}

#[test]
fn test_imports_and_exports_json() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "mod.mjs",
        "import { a as b } from 'm'\nconst s = \"import foo from 'x'\"\nconst x = 1\nexport { x as default }\n",
    );

    let output = modlens(dir.path(), &["imports", "mod.mjs"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    let files = json.as_array().unwrap();
    assert_eq!(files.len(), 1);
    let imports = files[0]["staticImports"].as_array().unwrap();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0]["specifier"], "m");
    assert_eq!(imports[0]["namedImports"]["a"], "b");
    assert!(imports[0].get("defaultImport").is_none());

    let output = modlens(dir.path(), &["exports", "mod.mjs"]);
    let json = stdout_json(&output);
    let exports = json[0]["exports"].as_array().unwrap();
    assert_eq!(exports.len(), 1);
    assert_eq!(exports[0]["type"], "default");
    assert_eq!(exports[0]["name"], "default");
    assert_eq!(exports[0]["names"], serde_json::json!(["default"]));
}

#[test]
fn test_export_names_follows_stars() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.mjs", "export * from './b.mjs'\nexport const z = 1\n");
    write(dir.path(), "b.mjs", "export const x = 1, y = 2\n");

    let output = modlens(dir.path(), &["export-names", "./a.mjs"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json = stdout_json(&output);
    assert_eq!(json["names"], serde_json::json!(["x", "y", "z"]));
}

#[test]
fn test_syntax_over_directory() {
    let dir = tempdir().unwrap();
    write(dir.path(), "src/a.mjs", "export default 1\n");
    write(dir.path(), "src/b.cjs", "module.exports = 1\n");
    write(dir.path(), "node_modules/dep/index.js", "module.exports = 1\n");

    let output = modlens(dir.path(), &["syntax", "src"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    let files = json.as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0]["file"].as_str().unwrap().ends_with("src/a.mjs"));
    assert_eq!(files[0]["hasEsm"], true);
    assert_eq!(files[0]["hasCjs"], false);
    assert_eq!(files[1]["hasCjs"], true);
    assert_eq!(files[1]["isMixed"], false);
}

#[test]
fn test_check_json() {
    let dir = tempdir().unwrap();
    write(dir.path(), "esm.mjs", "export default 1\n");
    write(dir.path(), "data.json", "{}\n");

    let valid = stdout_json(&modlens(dir.path(), &["check", "./esm.mjs"]));
    assert_eq!(valid["valid"], true);

    let json_file = stdout_json(&modlens(dir.path(), &["check", "./data.json"]));
    assert_eq!(json_file["valid"], false);

    let builtin = stdout_json(&modlens(dir.path(), &["check", "node:fs"]));
    assert_eq!(builtin["valid"], true);

    let remote = stdout_json(&modlens(dir.path(), &["check", "https://example.com/x.js"]));
    assert_eq!(remote["valid"], false);
}

#[test]
fn test_subpath_json() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "node_modules/pkg/package.json",
        r#"{"exports":{"./sub":"./dist/sub.js"}}"#,
    );
    write(dir.path(), "node_modules/pkg/dist/sub.js", "");
    let file = dir.path().join("node_modules/pkg/dist/sub.js");

    let output = modlens(dir.path(), &["subpath", file.to_str().unwrap()]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["subpath"], "./sub");
    assert_eq!(json["package"]["name"], "pkg");
    assert_eq!(json["package"]["subpath"], "./dist/sub.js");
}

#[test]
fn test_rewrite_resolves_from_file() {
    let dir = tempdir().unwrap();
    write(dir.path(), "lib/dep.mjs", "export const d = 1\n");
    write(
        dir.path(),
        "lib/main.mjs",
        "import { d } from './dep'\nimport fs from 'fs'\n",
    );

    let output = modlens(dir.path(), &["rewrite", "lib/main.mjs"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json = stdout_json(&output);
    let code = json["code"].as_str().unwrap();
    assert!(code.contains("/lib/dep.mjs'"), "{code}");
    assert!(code.starts_with("import { d } from 'file://"), "{code}");
    assert!(code.contains("import fs from 'node:fs'"), "{code}");
}

#[test]
fn test_logs_stay_off_stdout() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.mjs", "");

    let output = Command::new(env!("CARGO_BIN_EXE_modlens"))
        .args(["--json", "-vv", "--cwd"])
        .arg(dir.path())
        .args(["resolve", "./a"])
        .output()
        .expect("Failed to run modlens");
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["ok"], true);
}
