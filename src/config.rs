//! Runtime configuration.
//!
//! Sources, lowest precedence first:
//!   1. built-in defaults
//!   2. YAML file (`--config` / ADB_MCP_CONFIG)
//!   3. CLI flags / env (`--adb` / ADB_MCP_ADB)
//!
//! The bridge command line may carry leading arguments
//! (e.g. `adb -H 10.0.0.2 -P 5037`); it is split with shell-word rules.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use shell_words::split as shell_split;

pub const DEFAULT_ADB: &str = "adb";
pub const DEFAULT_RELAUNCH_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Bridge command line.
    pub adb: String,
    /// Settle delay between the primary action and relaunch.
    pub relaunch_delay_ms: u64,
    /// Per-call bridge timeout. Absent means calls may block indefinitely.
    pub command_timeout_secs: Option<u64>,
    /// Directory for clipboard temp artifacts (OS temp dir when absent).
    pub temp_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adb: DEFAULT_ADB.to_string(),
            relaunch_delay_ms: DEFAULT_RELAUNCH_DELAY_MS,
            command_timeout_secs: None,
            temp_dir: None,
        }
    }
}

impl Config {
    /// Load from an optional YAML file, then apply the `--adb` override.
    pub fn load(path: Option<&Path>, adb_override: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        if let Some(adb) = adb_override.filter(|s| !s.trim().is_empty()) {
            config.adb = adb.to_string();
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config file: {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).context("failed to parse YAML config")
    }

    pub fn bridge_command(&self) -> Result<BridgeCommand> {
        BridgeCommand::parse(&self.adb)
    }

    pub fn relaunch_delay(&self) -> Duration {
        Duration::from_millis(self.relaunch_delay_ms)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Bridge executable plus leading arguments applied to every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeCommand {
    pub program: String,
    pub base_args: Vec<String>,
}

impl BridgeCommand {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            bail!("Bridge command is empty");
        }
        let parts =
            shell_split(trimmed).context("Failed to parse bridge command line (shell splitting)")?;
        let Some((program, rest)) = parts.split_first() else {
            bail!("No tokens produced when parsing bridge command");
        };
        if program.is_empty() {
            bail!("Empty program name in bridge command");
        }
        Ok(Self {
            program: program.clone(),
            base_args: rest.to_vec(),
        })
    }
}

impl fmt::Display for BridgeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.base_args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.base_args.join(" "))
        }
    }
}
