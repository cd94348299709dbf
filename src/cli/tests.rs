//! Unit tests for CLI commands

use crate::cli::{execute, Cli, Commands};
use crate::runtime_config::GroupMatching;
use clap::{CommandFactory, Parser};
use std::io::Write;
use tempfile::NamedTempFile;

const MANIFEST: &str = r#"
routes:
  - { method: GET, path: /health, reply: "ok" }
groups:
  - prefix: /v1
    routes:
      - { method: GET, path: /hello/:name }
      - { method: POST, path: /files/*path, status: 201 }
  - prefix: /v2
    routes:
      - { method: get, path: /hello/:name, reply: "v2" }
"#;

fn manifest_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(MANIFEST.as_bytes()).unwrap();
    file
}

fn run(args: &[&str]) -> String {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    execute(&cli, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_resolve_defaults_to_get() {
    let cli = Cli::try_parse_from(["switchyard", "resolve", "-m", "r.yaml", "/x"]).unwrap();
    match cli.command {
        Commands::Resolve {
            engine,
            method,
            target,
            headers,
        } => {
            assert_eq!(engine.manifest.to_string_lossy(), "r.yaml");
            assert_eq!(method, "GET");
            assert_eq!(target, "/x");
            assert!(headers.is_empty());
            assert!(engine.group_matching.is_none());
            assert!(!engine.no_root_fallback);
        }
        _ => panic!("Expected Resolve command"),
    }
}

#[test]
fn test_resolve_parses_headers_and_overrides() {
    let cli = Cli::try_parse_from([
        "switchyard",
        "resolve",
        "--manifest",
        "r.yaml",
        "-X",
        "POST",
        "-H",
        "x-request-id: abc",
        "--group-matching",
        "prefix",
        "--no-root-fallback",
        "/files/a",
    ])
    .unwrap();
    match cli.command {
        Commands::Resolve {
            engine,
            method,
            headers,
            ..
        } => {
            assert_eq!(method, "POST");
            assert_eq!(headers, vec![("x-request-id".to_string(), "abc".to_string())]);
            assert_eq!(engine.group_matching, Some(GroupMatching::Prefix));
            assert!(engine.no_root_fallback);
        }
        _ => panic!("Expected Resolve command"),
    }
}

#[test]
fn test_malformed_header_is_rejected() {
    let result = Cli::try_parse_from([
        "switchyard",
        "resolve",
        "-m",
        "r.yaml",
        "-H",
        "no-colon",
        "/",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_unknown_group_matching_is_rejected() {
    let result = Cli::try_parse_from([
        "switchyard",
        "groups",
        "-m",
        "r.yaml",
        "--group-matching",
        "fuzzy",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_group_matching_reads_environment() {
    let command = Cli::command();
    for name in ["routes", "groups", "resolve"] {
        let sub = command.find_subcommand(name).unwrap();
        let arg = sub
            .get_arguments()
            .find(|arg| arg.get_id() == "group_matching")
            .unwrap();
        assert_eq!(
            arg.get_env().and_then(|v| v.to_str()),
            Some("SWITCHYARD_GROUP_MATCHING"),
            "subcommand {name}"
        );
    }
}

#[test]
fn test_resolve_prints_metrics_when_installed() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
middleware: [recovery]
groups:
  - prefix: /v1
    middleware: [metrics]
    routes:
      - { method: GET, path: /missing-reply/:id, status: 404 }
  - prefix: /v2
    middleware: [metrics]
"#,
    )
    .unwrap();
    let path = file.path().to_str().unwrap();

    let output = run(&["switchyard", "resolve", "-m", path, "/v1/missing-reply/3"]);
    assert!(output.contains("status: 404"));
    // only the /v1 group covers this path
    assert!(output.contains("switchyard_requests_total 1"));
    assert!(output.contains("switchyard_responses_total{class=\"4xx\"} 1"));

    let plain = manifest_file();
    let without = run(&[
        "switchyard",
        "resolve",
        "-m",
        plain.path().to_str().unwrap(),
        "/health",
    ]);
    assert!(!without.contains("switchyard_requests_total"));
}

#[test]
fn test_routes_grouped_by_method_in_registration_order() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();
    let output = run(&["switchyard", "routes", "-m", path]);
    let lines: Vec<&str> = output.lines().map(str::trim_end).collect();
    assert_eq!(
        lines,
        vec![
            "GET     /health",
            "GET     /v1/hello/:name",
            "GET     /v2/hello/:name",
            "POST    /v1/files/*path",
        ]
    );

    let posts = run(&["switchyard", "routes", "-m", path, "--method", "post"]);
    assert_eq!(posts.trim_end(), "POST    /v1/files/*path");
}

#[test]
fn test_groups_lists_prefixes() {
    let file = manifest_file();
    let output = run(&["switchyard", "groups", "-m", file.path().to_str().unwrap()]);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines, vec!["  0 (root)", "  1 /v1", "  2 /v2"]);
}

#[test]
fn test_resolve_prints_route_and_response() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();

    let output = run(&["switchyard", "resolve", "-m", path, "/v2/hello/abc"]);
    assert!(output.starts_with("route: GET /v2/hello/:name [name=abc]\nstatus: 200\n"));
    assert!(output.trim_end().ends_with("v2"));

    let missing = run(&["switchyard", "resolve", "-m", path, "/nope"]);
    assert!(missing.starts_with("route: -\nstatus: 404\n"));
    assert!(missing.contains("404 NOT FOUND"));

    let root = run(&["switchyard", "resolve", "-m", path, "--no-root-fallback", "/"]);
    assert!(root.contains("status: 404"));
}

#[test]
fn test_missing_manifest_is_an_error() {
    let cli =
        Cli::try_parse_from(["switchyard", "routes", "-m", "/definitely/not/here.yaml"]).unwrap();
    let mut out = Vec::new();
    let err = execute(&cli, &mut out).unwrap_err();
    assert!(format!("{err:#}").contains("failed to read route manifest"));
}
