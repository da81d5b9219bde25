//! Process-backed bridge: one `tokio::process` child per call, argv only
//! (no shell), optional kill-on-timeout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use super::{Bridge, CommandRequest, CommandResult};
use crate::config::BridgeCommand;
use crate::error::{ToolError, ToolResult};

#[derive(Debug, Clone)]
pub struct ProcessBridge {
    command: BridgeCommand,
    timeout: Option<Duration>,
}

impl ProcessBridge {
    /// Startup gate: the bridge must be resolvable and answer `version`.
    ///
    /// Only a bridge that passed this check is handed to the dispatcher.
    pub async fn probe(command: BridgeCommand, timeout: Option<Duration>) -> Result<Self> {
        let resolved = locate_program(&command.program)?;
        debug!(program = %resolved.display(), "bridge executable located");

        let bridge = Self { command, timeout };
        let result = bridge
            .run(&CommandRequest::new("version"))
            .await
            .with_context(|| format!("Failed to run '{} version'", bridge.command))?;
        if !result.exit_succeeded {
            bail!(
                "'{} version' exited with failure: {}",
                bridge.command,
                result.stderr.trim()
            );
        }
        let banner = result.stdout.lines().next().unwrap_or_default().trim();
        debug!(version = %banner, "bridge ready");
        Ok(bridge)
    }

    fn command(&self, request: &CommandRequest) -> Command {
        let mut argv = Vec::with_capacity(self.command.base_args.len() + request.args.len() + 3);
        // Device selector directly after the executable name.
        if let Some(device) = &request.device {
            argv.push("-s".to_string());
            argv.push(device.clone());
        }
        argv.extend(self.command.base_args.iter().cloned());
        argv.push(request.verb.clone());
        argv.extend(request.args.iter().cloned());
        trace!(program = %self.command.program, ?argv, "spawning bridge");

        let mut cmd = Command::new(&self.command.program);
        cmd.args(argv).stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    async fn bounded<F, T>(&self, fut: F) -> ToolResult<T>
    where
        F: std::future::Future<Output = ToolResult<T>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ToolError::Timeout(limit))?,
            None => fut.await,
        }
    }
}

#[async_trait]
impl Bridge for ProcessBridge {
    async fn run(&self, request: &CommandRequest) -> ToolResult<CommandResult> {
        let mut cmd = self.command(request);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        self.bounded(async move {
            let output = cmd
                .output()
                .await
                .map_err(|e| ToolError::Bridge(format!("failed to spawn bridge: {e}")))?;
            Ok(CommandResult {
                exit_succeeded: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
        .await
    }

    async fn capture_screen(&self, device: Option<&str>, dest: &Path) -> ToolResult<()> {
        let file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| ToolError::path(format!("Failed to create {}: {e}", dest.display())))?
            .into_std()
            .await;
        let request = CommandRequest::new("exec-out")
            .args(["screencap", "-p"])
            .device(device);
        let mut cmd = self.command(&request);
        cmd.stdout(Stdio::from(file)).stderr(Stdio::piped());
        self.bounded(async move {
            let output = cmd
                .output()
                .await
                .map_err(|e| ToolError::Capture(format!("failed to spawn bridge: {e}")))?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                return Err(ToolError::Capture(if stderr.is_empty() {
                    "screen capture exited with failure".to_string()
                } else {
                    stderr
                }));
            }
            Ok(())
        })
        .await
    }
}

/// Accept an explicit file path, or look the name up on PATH.
fn locate_program(program: &str) -> Result<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        if path.is_dir() {
            bail!("ADB path must point to an executable file: {program}");
        }
        if !path.exists() {
            bail!("ADB executable not found at the configured path: {program}");
        }
        return Ok(path.to_path_buf());
    }
    which::which(program).with_context(|| {
        format!(
            "'{program}' is not available. Please install Android SDK Platform Tools and add it to your PATH."
        )
    })
}
