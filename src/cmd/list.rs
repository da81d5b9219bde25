/*!
`list.rs`

Implements the `tools` subcommand: prints the fixed operation catalog.
Never touches the bridge, so it works without a device or adb.

JSON Output Shape:
{
  "status": "ok",
  "count": 16,
  "tools": [
    { "name": "run_shell", "description": "...", "required": ["command"], "optional": ["device"] }
  ]
}
*/

use anyhow::Result;
use clap::Args;
use serde_json::{Value, json};

use crate::cmd::style::{Role, StyleOptions, box_header, color, table};
use crate::tools::Operation;
use crate::tools::catalog::Param;

/// CLI arguments for `adb-mcp tools`
#[derive(Args, Debug, Default)]
pub struct ToolsArgs {
    /// Output JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

fn tool_json(op: Operation) -> Value {
    let (required, optional): (Vec<&Param>, Vec<&Param>) = op.params().iter().partition(|p| p.required);
    json!({
        "name": op.name(),
        "description": op.description(),
        "required": required.iter().map(|p| p.name).collect::<Vec<_>>(),
        "optional": optional.iter().map(|p| p.name).collect::<Vec<_>>(),
    })
}

/// `command*, device` (required marked with `*`).
fn param_summary(op: Operation) -> String {
    let params: Vec<String> = op
        .params()
        .iter()
        .map(|p| {
            if p.required {
                format!("{}*", p.name)
            } else {
                p.name.to_string()
            }
        })
        .collect();
    if params.is_empty() {
        "-".into()
    } else {
        params.join(", ")
    }
}

pub fn render_json() -> Value {
    json!({
        "status": "ok",
        "count": Operation::ALL.len(),
        "tools": Operation::ALL.into_iter().map(tool_json).collect::<Vec<_>>(),
    })
}

pub fn render_human(style: &StyleOptions) -> String {
    let rows: Vec<Vec<String>> = Operation::ALL
        .into_iter()
        .enumerate()
        .map(|(idx, op)| {
            vec![
                (idx + 1).to_string(),
                op.name().to_string(),
                param_summary(op),
                op.description().to_string(),
            ]
        })
        .collect();
    let header = box_header(
        &format!("Tools ({})", Operation::ALL.len()),
        Some(concat!("adb-mcp ", env!("CARGO_PKG_VERSION"))),
        Role::Primary,
        style,
    );
    let hint = color(Role::Dim, "* = required parameter", style);
    format!(
        "{header}\n{}\n\n{hint}",
        table(&["#", "NAME", "PARAMS", "DESCRIPTION"], &rows, style)
    )
}

/// Entry point for the tools subcommand.
pub fn execute_tools(args: ToolsArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&render_json())?);
    } else {
        println!("{}", render_human(&StyleOptions::detect()));
    }
    Ok(())
}
