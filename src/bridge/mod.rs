//! Bridge (adb) command execution.
//!
//! `Bridge` is the raw capability: spawn one process per call and hand
//! back its output unclassified. `BridgeExecutor` sits on top and owns
//! the success/failure classification, output trimming and the device
//! list query. Tests swap the process-backed bridge for scripted fakes.

pub mod device;
pub mod process;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ToolError, ToolResult};

pub use device::{Device, DeviceResolver, DeviceState, parse_device_list};
pub use process::ProcessBridge;

/// One bridge invocation: `<bridge> [-s device] <verb> <args...>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub verb: String,
    pub args: Vec<String>,
    pub device: Option<String>,
}

impl CommandRequest {
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            args: Vec::new(),
            device: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn device(mut self, device: Option<&str>) -> Self {
        self.device = device.map(str::to_string);
        self
    }

    /// Full argv after the program name. The device selector goes first.
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 3);
        if let Some(device) = &self.device {
            argv.push("-s".to_string());
            argv.push(device.clone());
        }
        argv.push(self.verb.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// Captured output of one bridge process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_succeeded: bool,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait Bridge: Send + Sync {
    /// Spawn the bridge and collect its output. Only spawn/IO failures
    /// are errors here; exit status is reported in the result.
    async fn run(&self, request: &CommandRequest) -> ToolResult<CommandResult>;

    /// Stream the raw screen capture (PNG bytes) straight into `dest`.
    async fn capture_screen(&self, device: Option<&str>, dest: &Path) -> ToolResult<()>;
}

/// Advisory stderr lines that never fail a call.
///
/// Substring heuristic: any line mentioning "Warning" is tolerated. A
/// line that mixes a real failure with that word is misread as advisory.
pub fn is_advisory_warning(line: &str) -> bool {
    line.contains("Warning")
}

/// Classify a finished process: failure only when the exit is non-zero
/// and stderr has at least one non-empty, non-advisory line.
pub fn classify(result: CommandResult) -> ToolResult<CommandResult> {
    let stderr = result.stderr.trim();
    if !result.exit_succeeded
        && stderr
            .lines()
            .map(str::trim)
            .any(|line| !line.is_empty() && !is_advisory_warning(line))
    {
        return Err(ToolError::Bridge(stderr.to_string()));
    }
    Ok(CommandResult {
        exit_succeeded: result.exit_succeeded,
        stdout: result.stdout.trim().to_string(),
        stderr: stderr.to_string(),
    })
}

/// Classifying front of a `Bridge`.
#[derive(Clone)]
pub struct BridgeExecutor {
    bridge: Arc<dyn Bridge>,
}

impl BridgeExecutor {
    pub fn new(bridge: Arc<dyn Bridge>) -> Self {
        Self { bridge }
    }

    pub async fn execute(&self, request: CommandRequest) -> ToolResult<CommandResult> {
        debug!(verb = %request.verb, device = ?request.device, "bridge call");
        let raw = self.bridge.run(&request).await?;
        classify(raw)
    }

    /// Run and return trimmed stdout only.
    pub async fn output(&self, request: CommandRequest) -> ToolResult<String> {
        Ok(self.execute(request).await?.stdout)
    }

    /// Shell shorthand: `<bridge> [-s device] shell <args...>`.
    pub async fn shell<I, S>(&self, device: Option<&str>, args: I) -> ToolResult<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output(CommandRequest::new("shell").args(args).device(device))
            .await
    }

    /// Fresh device list; never cached.
    pub async fn list_devices(&self) -> ToolResult<Vec<Device>> {
        let out = self.output(CommandRequest::new("devices")).await?;
        Ok(parse_device_list(&out))
    }

    pub async fn capture_screen(&self, device: Option<&str>, dest: &Path) -> ToolResult<()> {
        self.bridge.capture_screen(device, dest).await
    }
}
