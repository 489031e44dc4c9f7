//! CLI subprocess integration tests.
//!
//! These tests invoke the `rns` binary as a subprocess and verify exit codes,
//! stdout content and JSON output against a canned local gateway.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const ACCOUNT: &str = "account_tdx_2_1aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const RNS: &str = "component_tdx_2_1cccccccccccccccccccccccccccccccccccccccccccccccccccccc";
const LOCKER: &str = "locker_tdx_2_1dddddddddddddddddddddddddddddddddddddddddddddddddddddd";
const DOMAINS: &str = "resource_tdx_2_1eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
const BADGES: &str = "resource_tdx_2_1ffffffffffffffffffffffffffffffffffffffffffffffffffffff";
const IMPORTS: &str = "resource_tdx_2_1gggggggggggggggggggggggggggggggggggggggggggggggggggggg";
const XRD: &str = "resource_tdx_2_1hhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhh";
const REGISTRY: &str =
    "internal_keyvaluestore_tdx_2_1kkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkk";

fn rns_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rns"));
    cmd.env_remove("RNS_LOG");
    cmd
}

fn write_config(dir: &Path, gateway_url: &str) -> PathBuf {
    let path = dir.join("ledger.toml");
    std::fs::write(
        &path,
        format!(
            r#"network = "stokenet"
gateway_url = "{gateway_url}"

[components]
rns = "{RNS}"
domain_resource = "{DOMAINS}"
registrar_badge_resource = "{BADGES}"
import_domain_resource = "{IMPORTS}"
registry_store = "{REGISTRY}"
locker = "{LOCKER}"

[payment]
accepted_resources = ["{XRD}"]

[price_ladder]
"2" = "120"
"3" = "60"
"#
        ),
    )
    .unwrap();
    path
}

/// Answers every request for a path with the same canned response.
fn serve(routes: Vec<(&'static str, u16, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());
    let routes: HashMap<&str, (u16, String)> =
        routes.into_iter().map(|(p, c, b)| (p, (c, b))).collect();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            let path = request_line.split(' ').nth(1).unwrap_or("").to_owned();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).is_err() || line.trim().is_empty() {
                    break;
                }
                if let Some(v) = line.to_lowercase().strip_prefix("content-length: ") {
                    content_length = v.trim().parse().unwrap_or(0);
                }
            }
            let mut body = vec![0u8; content_length];
            let _ = reader.read_exact(&mut body);
            let (code, payload) = routes
                .get(path.as_str())
                .cloned()
                .unwrap_or((404, String::new()));
            let response = format!(
                "HTTP/1.1 {code} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                payload.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    addr
}

fn empty_ledger() -> String {
    serve(vec![
        ("/state/key-value-store/data", 200, r#"{"entries": []}"#.to_owned()),
        ("/state/non-fungible/data", 200, r#"{"non_fungible_ids": []}"#.to_owned()),
    ])
}

fn run(config: &Path, args: &[&str]) -> Output {
    rns_bin()
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn cli_version_exits_zero() {
    let output = rns_bin().arg("--version").output().unwrap();
    assert!(output.status.success(), "rns --version must exit 0");
    assert!(stdout(&output).contains("rns"));
}

#[test]
fn cli_help_lists_commands() {
    let output = rns_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    for cmd in ["status", "details", "records", "price", "manifest", "completions"] {
        assert!(text.contains(cmd), "help must list '{cmd}'");
    }
}

#[test]
fn cli_id_is_offline_and_deterministic() {
    let output = rns_bin().args(["id", "ab.xrd"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "[6465bd958aa122fa49eee0aa7676c4c4]");

    let output = rns_bin()
        .args(["--json", "id", "  AB.XRD "])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "ab.xrd");
    assert_eq!(json["kind"], "root");
}

#[test]
fn cli_id_raw_formats_local_ids() {
    let output = rns_bin().args(["id", "--raw", "42"]).output().unwrap();
    assert_eq!(stdout(&output).trim(), "#42#");
}

#[test]
fn cli_invalid_name_exits_two() {
    let output = rns_bin().args(["id", "a_b.xrd"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_missing_config_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(&dir.path().join("absent.toml"), &["status", "ab.xrd"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("config error"));
}

#[test]
fn cli_validation_happens_before_gateway() {
    let dir = tempfile::tempdir().unwrap();
    // Nothing listens here; a gateway call would exit 3.
    let config = write_config(dir.path(), "http://127.0.0.1:1");
    let output = run(&config, &["status", "x.xrd"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_unreachable_gateway_exits_three() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:1");
    let output = run(&config, &["status", "free.xrd"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn cli_gateway_error_status_exits_three() {
    let url = serve(vec![("/state/key-value-store/data", 500, String::new())]);
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &url);
    let output = run(&config, &["status", "free.xrd"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn cli_status_reports_available() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &empty_ledger());

    let output = run(&config, &["--json", "status", "free.xrd"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["domain"], "free.xrd");
    assert_eq!(json["status"], "available");
}

#[test]
fn cli_account_domains_empty() {
    let url = serve(vec![(
        "/state/entity/page/non-fungibles/",
        200,
        r#"{"items": []}"#.to_owned(),
    )]);
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &url);
    let output = run(&config, &["account-domains", ACCOUNT]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("no domains held"));
}

#[test]
fn cli_manifest_requires_ownership() {
    let url = serve(vec![
        (
            "/state/non-fungible/data",
            200,
            serde_json::json!({
                "non_fungible_ids": [{
                    "non_fungible_id": "[6465bd958aa122fa49eee0aa7676c4c4]",
                    "is_burned": false,
                    "data": {"raw_hex": "", "programmatic_json": {
                        "kind": "Tuple",
                        "fields": [
                            {"kind": "String", "field_name": "name", "value": "ab.xrd"},
                            {"kind": "Reference", "field_name": "subregistry_component_address", "value": RNS}
                        ]
                    }}
                }]
            })
            .to_string(),
        ),
        (
            "/state/entity/details",
            200,
            serde_json::json!({"items": [{"address": RNS, "details": {"state": {
                "kind": "Tuple",
                "fields": [
                    {"kind": "Reference", "field_name": "records", "value": REGISTRY},
                    {"kind": "Reference", "field_name": "subdomains", "value": REGISTRY}
                ]
            }}}]})
            .to_string(),
        ),
        (
            "/state/entity/page/non-fungibles/",
            200,
            r#"{"items": []}"#.to_owned(),
        ),
    ]);
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &url);
    let output = run(
        &config,
        &["manifest", "--account", ACCOUNT, "unbond", "ab.xrd"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not hold"));
}

#[test]
fn cli_completions_bash() {
    let output = rns_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("rns"));
}
