//! Unit tests for CLI commands

use crate::cli::{run, Cli, Commands};
use clap::Parser;
use std::io::Write as _;
use tempfile::NamedTempFile;

const MANIFEST: &str = r#"
resources:
  - name: widgets
    path: /widgets
    operations:
      - name: get_widget
        method: GET
        path: /{id}
        produces: [application/json]
        params:
          - { kind: path, name: id, type: integer }
          - { kind: query, name: fields, type: { list: string } }
      - name: parts
        path: /{id}/parts
        locates: parts
  - name: parts
    root: false
    operations:
      - name: list_parts
        method: GET
"#;

fn manifest() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(MANIFEST.as_bytes()).unwrap();
    file
}

fn run_args(args: &[&str]) -> (anyhow::Result<()>, String) {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    let result = run(&cli, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_resolve_command_parses() {
    let cli = Cli::try_parse_from([
        "brrtresolver",
        "resolve",
        "--manifest",
        "r.yaml",
        "-X",
        "post",
        "--path",
        "/a",
        "--content-type",
        "application/json",
    ])
    .unwrap();

    match cli.command {
        Commands::Resolve {
            manifest,
            method,
            path,
            content_type,
            accept,
            config,
        } => {
            assert_eq!(manifest.to_string_lossy(), "r.yaml");
            assert_eq!(method, "post");
            assert_eq!(path, "/a");
            assert_eq!(content_type.as_deref(), Some("application/json"));
            assert!(accept.is_none());
            assert!(config.is_none());
        }
        Commands::Inspect { .. } => panic!("Expected Resolve command"),
    }
}

#[test]
fn test_resolve_prints_selection() {
    let file = manifest();
    let path = file.path().to_str().unwrap();
    let (result, out) = run_args(&["brrtresolver", "resolve", "--manifest", path, "--path", "/widgets/7"]);

    result.unwrap();
    assert!(out.contains("operation: get_widget"));
    assert!(out.contains("variable:  id=7"));
    assert!(out.contains("produces:  application/json"));
}

#[test]
fn test_resolve_follows_locators() {
    let file = manifest();
    let path = file.path().to_str().unwrap();
    let (result, out) =
        run_args(&["brrtresolver", "resolve", "--manifest", path, "--path", "/widgets/7/parts"]);

    result.unwrap();
    assert!(out.contains("resource:  parts"));
    assert!(out.contains("locators:  parts"));
    assert!(out.contains("frame:     widgets parts [7]"));
}

#[test]
fn test_resolve_reports_status() {
    let file = manifest();
    let path = file.path().to_str().unwrap();

    let (result, out) = run_args(&[
        "brrtresolver", "resolve", "--manifest", path, "-X", "DELETE", "--path", "/widgets/7",
    ]);
    assert!(result.is_err());
    assert!(out.contains("405"));
    assert!(out.contains("allow:     GET, HEAD, OPTIONS"));

    let (result, out) = run_args(&[
        "brrtresolver", "resolve", "--manifest", path, "-X", "OPTIONS", "--path", "/widgets/7",
    ]);
    assert!(result.is_ok());
    assert!(out.contains("allow:     GET, HEAD, OPTIONS"));
}

#[test]
fn test_inspect_lists_operations() {
    let file = manifest();
    let path = file.path().to_str().unwrap();
    let (result, out) = run_args(&["brrtresolver", "inspect", "--manifest", path]);

    result.unwrap();
    assert!(out.contains("widgets /widgets (root)"));
    assert!(out.contains("  GET /{id} get_widget consumes=*/* produces=application/json"));
    assert!(out.contains("  LOCATE /{id}/parts parts -> parts"));
    assert!(out.contains("parts / (sub)"));
}

#[test]
fn test_missing_manifest_fails() {
    let (result, _) = run_args(&["brrtresolver", "inspect", "--manifest", "/nonexistent/r.yaml"]);
    assert!(result.is_err());
}
