//! End-to-end: the built binary against a scripted stand-in for adb.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use rmcp::ServiceExt;
use rmcp::model::CallToolRequestParam;
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use serde_json::{Value, json};
use tokio::process::Command;

const BIN: &str = env!("CARGO_BIN_EXE_adb-mcp");

const FAKE_ADB: &str = r#"#!/bin/sh
if [ "$1" = "-s" ]; then shift 2; fi
case "$1" in
  version) echo "Android Debug Bridge version 1.0.41"; exit 0 ;;
  devices) printf 'List of devices attached\nemulator-5554\tdevice\n'; exit 0 ;;
  shell)
    shift
    case "$1" in
      input) exit 0 ;;
      pm) printf 'package:com.android.chrome\npackage:com.example.app\npackage:org.chromium.webview\n'; exit 0 ;;
      *) echo "$*"; exit 0 ;;
    esac ;;
  *) echo "error: unknown command $1" >&2; exit 1 ;;
esac
"#;

fn write_fake_adb(dir: &Path) -> PathBuf {
    let path = dir.join("fake-adb");
    std::fs::write(&path, FAKE_ADB).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn call(name: &'static str, args: Value) -> CallToolRequestParam {
    CallToolRequestParam {
        name: name.into(),
        arguments: args.as_object().cloned(),
    }
}

/// (text, isError) of a call result.
fn text_of(result: &impl serde::Serialize) -> (String, bool) {
    let v = serde_json::to_value(result).unwrap();
    let text = v["content"][0]["text"].as_str().unwrap_or_default().to_string();
    (text, v["isError"].as_bool().unwrap_or(false))
}

#[tokio::test]
async fn serves_catalog_and_dispatches_calls() {
    let dir = tempfile::tempdir().unwrap();
    let adb = write_fake_adb(dir.path());
    let home = dir.path().to_path_buf();

    let service = ()
        .serve(
            TokioChildProcess::new(Command::new(BIN).configure(|c| {
                c.arg("--adb")
                    .arg(&adb)
                    .arg("serve")
                    .env("HOME", &home)
                    .env("NO_COLOR", "1")
                    .stderr(Stdio::null());
            }))
            .unwrap(),
        )
        .await
        .unwrap();

    let tools = service.list_tools(Default::default()).await.unwrap();
    assert_eq!(tools.tools.len(), 16);
    assert!(tools.tools.iter().any(|t| t.name == "capture_screen_to_clipboard"));

    let result = service
        .call_tool(call("list_devices", json!({})))
        .await
        .unwrap();
    let (text, is_error) = text_of(&result);
    assert!(!is_error);
    let devices: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(devices, json!([{"id": "emulator-5554", "state": "device"}]));

    let result = service
        .call_tool(call("run_shell", json!({})))
        .await
        .unwrap();
    let (text, is_error) = text_of(&result);
    assert!(is_error);
    assert_eq!(
        text,
        "Error: Invalid parameters: command is required and must be a string"
    );

    let result = service
        .call_tool(call("go_home", json!({"device": "emulator-5554"})))
        .await
        .unwrap();
    let (text, is_error) = text_of(&result);
    assert!(!is_error);
    assert!(text.starts_with("Navigated to home screen"));

    let result = service
        .call_tool(call("list_packages", json!({"filter": "CHROM"})))
        .await
        .unwrap();
    let (text, _) = text_of(&result);
    let packages: Vec<String> = serde_json::from_str(&text).unwrap();
    assert_eq!(packages, vec!["com.android.chrome", "org.chromium.webview"]);

    let result = service
        .call_tool(call("force_stop_app", json!({"package_name": "com.x", "device": "nope"})))
        .await
        .unwrap();
    let (text, is_error) = text_of(&result);
    assert!(is_error);
    assert_eq!(text, "Error: Device with ID \"nope\" not found");

    let _ = service.cancel().await;
}

#[tokio::test]
async fn missing_bridge_is_fatal_at_startup() {
    let output = Command::new(BIN)
        .args(["--adb", "/nonexistent/adb", "exec", "list_devices"])
        .env("NO_COLOR", "1")
        .output()
        .await
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[tokio::test]
async fn tools_listing_needs_no_bridge() {
    let output = Command::new(BIN)
        .args(["--adb", "/nonexistent/adb", "tools", "--json"])
        .output()
        .await
        .unwrap();
    assert!(output.status.success());
    let v: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["count"], 16);
}

#[tokio::test]
async fn exec_prints_json_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let adb = write_fake_adb(dir.path());
    let output = Command::new(BIN)
        .arg("--adb")
        .arg(&adb)
        .args(["exec", "run_shell", "--param", "command=getprop ro.product.model", "--json"])
        .env("HOME", dir.path())
        .output()
        .await
        .unwrap();
    assert!(output.status.success());
    let v: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["status"], "ok");
    assert_eq!(v["result"]["text"], "getprop ro.product.model");
}
