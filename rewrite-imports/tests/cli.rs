//! Drives the `rewrite-imports` binary against temporary project trees.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const STACK: &str = "import { Construct } from '@aws-cdk/core';\nimport * as s3 from '@aws-cdk/aws-s3';\n";
const STACK_REWRITTEN: &str = "import { Construct } from 'constructs';\nimport { Construct } from 'aws-cdk-lib';\nimport * as s3 from 'aws-cdk-lib/aws-s3';\n";
const PLAIN: &str = "export const answer = 42;\n";

fn run(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rewrite-imports"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run rewrite-imports")
}

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("lib")).unwrap();
    fs::create_dir_all(dir.path().join("node_modules/dep")).unwrap();
    fs::write(dir.path().join("lib/stack.ts"), STACK).unwrap();
    fs::write(dir.path().join("lib/plain.ts"), PLAIN).unwrap();
    fs::write(dir.path().join("node_modules/dep/index.ts"), STACK).unwrap();
    dir
}

#[test]
fn rewrites_files_in_place() {
    let dir = project();
    let out = run(&["."], dir.path());
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));

    assert_eq!(fs::read_to_string(dir.path().join("lib/stack.ts")).unwrap(), STACK_REWRITTEN);
    assert_eq!(fs::read_to_string(dir.path().join("lib/plain.ts")).unwrap(), PLAIN);
    assert_eq!(
        fs::read_to_string(dir.path().join("node_modules/dep/index.ts")).unwrap(),
        STACK
    );
}

#[test]
fn check_mode_reports_without_writing() {
    let dir = project();
    let out = run(&["--check", "lib"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("would rewrite"));
    assert_eq!(fs::read_to_string(dir.path().join("lib/stack.ts")).unwrap(), STACK);
}

#[test]
fn check_mode_clean_tree_succeeds() {
    let dir = project();
    let out = run(&["--check", "lib/plain.ts"], dir.path());
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn diff_output() {
    let dir = project();
    let out = run(&["--check", "--diff", "lib/stack.ts"], dir.path());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("-import * as s3 from '@aws-cdk/aws-s3';"));
    assert!(stdout.contains("+import * as s3 from 'aws-cdk-lib/aws-s3';"));
    assert!(stdout.contains("+import { Construct } from 'constructs';"));
}

#[test]
fn stdout_mode_prints_and_leaves_file() {
    let dir = project();
    let out = run(&["--stdout", "lib/stack.ts"], dir.path());
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&out.stdout), STACK_REWRITTEN);
    assert_eq!(fs::read_to_string(dir.path().join("lib/stack.ts")).unwrap(), STACK);
}

#[test]
fn json_report() {
    let dir = project();
    let out = run(&["--check", "--format", "json", "lib"], dir.path());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["changed"], 1);
    assert_eq!(report["failed"], 0);

    let files = report["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    let stack = files
        .iter()
        .find(|f| f["path"].as_str().unwrap().ends_with("stack.ts"))
        .unwrap();
    assert_eq!(stack["status"], "rewritten");
    assert_eq!(stack["replacements"], 2);
    assert_eq!(stack["insertions"], 1);
}

#[test]
fn unparsable_file_fails_without_blocking_others() {
    let dir = project();
    fs::write(dir.path().join("lib/broken.ts"), "const = require('@aws-cdk/core');\n").unwrap();
    let out = run(&["lib"], dir.path());
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("broken.ts"));
    assert_eq!(fs::read_to_string(dir.path().join("lib/stack.ts")).unwrap(), STACK_REWRITTEN);
}

#[test]
fn custom_rules_file() {
    let dir = project();
    fs::write(
        dir.path().join("rules.json"),
        r#"{ "legacyPrefix": "@acme/", "rootModule": "@acme/core", "consolidatedRoot": "acme", "relocations": [] }"#,
    )
    .unwrap();
    fs::write(dir.path().join("lib/acme.ts"), "import * as ui from '@acme/ui';\n").unwrap();

    let out = run(&["--rules", "rules.json", "lib/acme.ts", "lib/stack.ts"], dir.path());
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        fs::read_to_string(dir.path().join("lib/acme.ts")).unwrap(),
        "import * as ui from 'acme/ui';\n"
    );
    assert_eq!(fs::read_to_string(dir.path().join("lib/stack.ts")).unwrap(), STACK);
}

#[test]
fn invalid_rules_file_is_rejected() {
    let dir = project();
    fs::write(dir.path().join("rules.json"), r#"{ "legacyPrefix": "" }"#).unwrap();
    let out = run(&["--rules", "rules.json", "lib"], dir.path());
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid rule table"));
}
