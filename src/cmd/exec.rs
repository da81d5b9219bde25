/*!
`exec.rs`

Implements the `exec` subcommand: runs one catalog operation in-process
through the same dispatcher the MCP server uses.

Parameters:
  --param KEY=VALUE               (repeatable)
  --param-file params.(json|yaml) (merged; --param overrides file entries)

The bridge is probed first; a failed probe aborts with status 1. An
error result also exits non-zero.

JSON Output:
{
  "status": "ok" | "error",
  "tool": "list_packages",
  "elapsed_ms": 42,
  "arguments": { ... },
  "result": { "text": "...", "is_error": false }
}
*/

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value, json};

use crate::cmd::shared::{build_dispatcher, collect_params, runtime};
use crate::cmd::style::{Role, StyleOptions, box_header, color};
use crate::config::Config;
use crate::tools::{Operation, TextResult};

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Tool name to invoke (see `adb-mcp tools`)
    #[arg(value_name = "TOOL")]
    pub tool: String,

    /// Provide parameter (KEY=VALUE), repeatable
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Load parameters from file (JSON or YAML). CLI --param overrides file entries
    #[arg(long = "param-file", value_name = "PATH")]
    pub param_file: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute_exec(args: ExecArgs, config: &Config) -> Result<ExitCode> {
    let Some(op) = Operation::from_name_ci(&args.tool) else {
        return Ok(output_error(
            args.json,
            &format!("tool '{}' not found (see `adb-mcp tools`)", args.tool.trim()),
        ));
    };

    let arguments = match collect_params(&args.params, args.param_file.as_deref()) {
        Ok(m) => m,
        Err(e) => return Ok(output_error(args.json, &format!("{e:#}"))),
    };

    let rt = runtime()?;
    let started = Instant::now();
    let result = rt.block_on(async {
        let dispatcher = build_dispatcher(config).await?;
        anyhow::Ok(
            dispatcher
                .dispatch(op.name(), Some(Value::Object(arguments.clone())))
                .await,
        )
    })?;
    let elapsed_ms = started.elapsed().as_millis();

    let code = if result.is_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    };
    if args.json {
        let out = json_envelope(op, elapsed_ms, &arguments, &result);
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_human(op, elapsed_ms, &result);
    }
    Ok(code)
}

fn json_envelope(
    op: Operation,
    elapsed_ms: u128,
    arguments: &Map<String, Value>,
    result: &TextResult,
) -> Value {
    json!({
        "status": if result.is_error { "error" } else { "ok" },
        "tool": op.name(),
        "elapsed_ms": elapsed_ms,
        "arguments": arguments,
        "result": result,
    })
}

fn print_human(op: Operation, elapsed_ms: u128, result: &TextResult) {
    let style = StyleOptions::detect();
    let (title, role) = if result.is_error {
        (format!("Exec Error ({op})"), Role::Error)
    } else {
        (format!("Exec Success ({op})"), Role::Success)
    };
    let timing = format!("{elapsed_ms}ms");
    println!("{}", box_header(&title, Some(&timing), role, &style));
    println!("{}", result.text);
}

fn output_error(json: bool, msg: &str) -> ExitCode {
    if json {
        let err = json!({"status": "error", "error": msg});
        println!(
            "{}",
            serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string())
        );
    } else {
        let style = StyleOptions::detect();
        println!(
            "{}",
            box_header("Exec Error", Some(msg), Role::Error, &style)
        );
        println!(
            "{}",
            color(Role::Dim, "Re-run with --json for machine-readable output.", &style)
        );
    }
    ExitCode::from(2)
}
