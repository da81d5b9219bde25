/*!
shared.rs - helpers shared by the subcommands.

  - runtime(): tokio runtime for the sync command entry points
  - build_dispatcher(): startup gate + wiring of the tool dispatcher
  - collect_params(): --param KEY=VALUE pairs merged over a param file
*/

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use tracing::info;

use crate::bridge::ProcessBridge;
use crate::capture::{ImageCrateConverter, SystemClipboard};
use crate::config::Config;
use crate::paths::PathResolver;
use crate::tools::{DispatcherParts, ToolDispatcher};

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")
}

/// Probe the bridge, then wire the dispatcher. A failed probe is the
/// caller's cue to exit before accepting any operation.
pub async fn build_dispatcher(config: &Config) -> Result<ToolDispatcher> {
    let command = config.bridge_command()?;
    let bridge = ProcessBridge::probe(command, config.command_timeout()).await?;
    info!(bridge = %config.adb, "bridge ready");
    Ok(ToolDispatcher::new(DispatcherParts {
        bridge: Arc::new(bridge),
        paths: PathResolver::from_env()?,
        converter: Arc::new(ImageCrateConverter),
        clipboard: Arc::new(SystemClipboard),
        temp_dir: config.temp_dir(),
        relaunch_delay: config.relaunch_delay(),
    }))
}

/// Parse `KEY=VALUE` entries. Values are kept as strings.
pub fn parse_param_pairs(params: &[String]) -> Result<Map<String, Value>> {
    let mut out = Map::new();
    for kv in params {
        let Some((k, v)) = kv.split_once('=') else {
            bail!("invalid --param (expected KEY=VALUE): {kv}");
        };
        let key = k.trim();
        if key.is_empty() {
            bail!("invalid --param (empty key): {kv}");
        }
        out.insert(key.to_string(), Value::String(v.trim().to_string()));
    }
    Ok(out)
}

/// Load a JSON or YAML object of parameters. Non-string scalars are
/// stringified; every catalog parameter is a string.
pub fn load_param_file(path: &Path) -> Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read param file: {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let value: Value = if is_yaml {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&raw).context("failed to parse YAML param file")?;
        serde_json::to_value(yaml).context("failed to convert YAML to JSON")?
    } else {
        serde_json::from_str(&raw).context("failed to parse JSON param file")?
    };

    let Value::Object(obj) = value else {
        bail!("param file root must be an object");
    };
    Ok(obj
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(_) | Value::Null => v,
                other => Value::String(other.to_string()),
            };
            (k, v)
        })
        .collect())
}

/// `--param` entries override file entries.
pub fn collect_params(params: &[String], param_file: Option<&Path>) -> Result<Map<String, Value>> {
    let mut merged = match param_file {
        Some(p) => load_param_file(p)?,
        None => Map::new(),
    };
    merged.extend(parse_param_pairs(params)?);
    Ok(merged)
}
