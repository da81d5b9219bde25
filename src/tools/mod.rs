//! Operation dispatch.
//!
//! `ToolDispatcher::dispatch` is the single boundary every call crosses:
//! arguments are validated per operation, the call is routed, and any
//! `ToolError` is rendered as text. Nothing below this point escapes as
//! an error value.

pub mod args;
pub mod catalog;
pub mod device_ops;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::bridge::{Bridge, BridgeExecutor};
use crate::capture::{Clipboard, ImageCapturePipeline, ImageConverter};
use crate::error::{ToolError, ToolResult};
use crate::lifecycle::AppLifecycleOrchestrator;
use crate::paths::PathResolver;

pub use args::ToolArguments;
pub use catalog::Operation;
pub use device_ops::DeviceOps;

/// Outcome of one dispatched call. Errors carry the `"Error: "` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextResult {
    pub text: String,
    pub is_error: bool,
}

impl TextResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(err: &ToolError) -> Self {
        Self {
            text: format!("Error: {err}"),
            is_error: true,
        }
    }
}

/// Collaborators the dispatcher is built from.
pub struct DispatcherParts {
    pub bridge: Arc<dyn Bridge>,
    pub paths: PathResolver,
    pub converter: Arc<dyn ImageConverter>,
    pub clipboard: Arc<dyn Clipboard>,
    pub temp_dir: PathBuf,
    pub relaunch_delay: Duration,
}

#[derive(Clone)]
pub struct ToolDispatcher {
    device_ops: DeviceOps,
    capture: ImageCapturePipeline,
    lifecycle: AppLifecycleOrchestrator,
}

impl ToolDispatcher {
    pub fn new(parts: DispatcherParts) -> Self {
        let executor = BridgeExecutor::new(parts.bridge);
        Self {
            device_ops: DeviceOps::new(executor.clone(), parts.paths.clone()),
            capture: ImageCapturePipeline::new(
                executor.clone(),
                parts.paths,
                parts.converter,
                parts.clipboard,
                parts.temp_dir,
            ),
            lifecycle: AppLifecycleOrchestrator::new(executor, parts.relaunch_delay),
        }
    }

    /// Run one operation by name; never fails.
    pub async fn dispatch(&self, name: &str, arguments: Option<Value>) -> TextResult {
        let started = Instant::now();
        let result = match Operation::from_name(name) {
            Some(op) => match ToolArguments::from_value(arguments) {
                Ok(args) => self.run(op, &args).await,
                Err(e) => Err(e),
            },
            None => Err(ToolError::UnknownTool(name.to_string())),
        };
        let elapsed_ms = started.elapsed().as_millis();
        match result {
            Ok(text) => {
                debug!(tool = name, elapsed_ms, "tool call succeeded");
                TextResult::success(text)
            }
            Err(e) => {
                warn!(tool = name, elapsed_ms, error = %e, "tool call failed");
                TextResult::error(&e)
            }
        }
    }

    async fn run(&self, op: Operation, args: &ToolArguments) -> ToolResult<String> {
        let ops = &self.device_ops;
        match op {
            Operation::ListDevices => ops.list_devices().await,
            Operation::RunShell => {
                let command = args.required_str("command")?;
                ops.run_shell(command, args.device()?).await
            }
            Operation::InstallPackage => {
                let path = args.required_str("path")?;
                ops.install_package(path, args.device()?).await
            }
            Operation::UninstallPackage => {
                let package = args.required_str("package_name")?;
                ops.uninstall_package(package, args.device()?).await
            }
            Operation::ListPackages => {
                let filter = args.optional_str("filter")?;
                ops.list_packages(args.device()?, filter).await
            }
            Operation::PullFile => {
                let remote = args.required_str("remote_path")?;
                let local = args.required_str("local_path")?;
                ops.pull_file(remote, local, args.device()?).await
            }
            Operation::PushFile => {
                let local = args.required_str("local_path")?;
                let remote = args.required_str("remote_path")?;
                ops.push_file(local, remote, args.device()?).await
            }
            Operation::LaunchApp => {
                let package = args.required_str("package_name")?;
                self.lifecycle.launch_app(package, args.device()?).await
            }
            Operation::CaptureScreenToFile => {
                let output = args.required_str("output_path")?;
                let format = args.format()?;
                self.capture
                    .capture_to_file(output, args.device()?, format)
                    .await
            }
            Operation::CaptureScreenToClipboard => {
                let format = args.format()?;
                self.capture
                    .capture_to_clipboard(args.device()?, format)
                    .await
            }
            Operation::ClearAppData => {
                let package = args.required_str("package_name")?;
                ops.clear_app_data(package, args.device()?).await
            }
            Operation::ForceStopApp => {
                let package = args.required_str("package_name")?;
                ops.force_stop_app(package, args.device()?).await
            }
            Operation::GoHome => ops.go_home(args.required_device()?).await,
            Operation::OpenSettings => ops.open_settings(args.required_device()?).await,
            Operation::ClearAndRestart => {
                let package = args.required_str("package_name")?;
                self.lifecycle
                    .clear_and_restart(package, args.device()?)
                    .await
            }
            Operation::ForceRestart => {
                let package = args.required_str("package_name")?;
                self.lifecycle.force_restart(package, args.device()?).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::{FakeBridge, fail, ok};
    use crate::capture::CaptureFormat;
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::Path;

    struct NoClipboard;

    #[async_trait]
    impl Clipboard for NoClipboard {
        async fn put_image(&self, _: &Path, _: CaptureFormat) -> ToolResult<()> {
            Err(ToolError::Clipboard("unavailable".into()))
        }
    }

    fn dispatcher(fake: Arc<FakeBridge>, root: &Path) -> ToolDispatcher {
        ToolDispatcher::new(DispatcherParts {
            bridge: fake,
            paths: PathResolver::new(root),
            converter: Arc::new(crate::capture::ImageCrateConverter),
            clipboard: Arc::new(NoClipboard),
            temp_dir: root.join("tmp"),
            relaunch_delay: Duration::ZERO,
        })
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result() {
        let root = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeBridge::new());
        let result = dispatcher(fake, root.path())
            .dispatch("adb_teleport", None)
            .await;
        assert!(result.is_error);
        assert_eq!(result.text, "Error: Unknown tool: adb_teleport");
    }

    #[tokio::test]
    async fn validation_happens_before_any_bridge_call() {
        let root = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeBridge::new().with_devices(&["emulator-5554\tdevice"]));
        let d = dispatcher(fake.clone(), root.path());

        let result = d.dispatch("run_shell", Some(json!({"command": 7}))).await;
        assert_eq!(
            result.text,
            "Error: Invalid parameters: command must be a string"
        );
        let result = d.dispatch("pull_file", Some(json!({"remote_path": "/x"}))).await;
        assert!(result.text.contains("local_path is required"));
        let result = d.dispatch("go_home", Some(json!({}))).await;
        assert!(result.text.contains("device is required"));
        let result = d
            .dispatch(
                "capture_screen_to_file",
                Some(json!({"output_path": "a.png", "format": "tiff"})),
            )
            .await;
        assert!(result.is_error);

        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn device_errors_surface_as_text() {
        let root = tempfile::tempdir().unwrap();
        let fake = Arc::new(
            FakeBridge::new().with_devices(&["emulator-5554\tdevice", "emulator-5556\tdevice"]),
        );
        let result = dispatcher(fake, root.path())
            .dispatch("force_stop_app", Some(json!({"package_name": "com.example.app"})))
            .await;
        assert!(result.is_error);
        assert_eq!(
            result.text,
            "Error: Multiple devices connected. Please specify a device ID"
        );
    }

    #[tokio::test]
    async fn bridge_failures_are_rendered_not_raised() {
        let root = tempfile::tempdir().unwrap();
        let fake = Arc::new(
            FakeBridge::new()
                .with_devices(&["emulator-5554\tdevice"])
                .on(&["uninstall"], fail("Failure [DELETE_FAILED_INTERNAL_ERROR]")),
        );
        let result = dispatcher(fake, root.path())
            .dispatch(
                "uninstall_package",
                Some(json!({"package_name": "com.example.app", "device_id": "emulator-5554"})),
            )
            .await;
        assert_eq!(
            result.text,
            "Error: ADB command failed: Failure [DELETE_FAILED_INTERNAL_ERROR]"
        );
    }

    #[tokio::test]
    async fn composite_restart_succeeds_when_relaunch_fails_but_launch_does_not() {
        let root = tempfile::tempdir().unwrap();
        let fake = Arc::new(
            FakeBridge::new()
                .with_devices(&["emulator-5554\tdevice"])
                .on(&["shell", "pm", "clear"], ok("Success"))
                .on(&["shell", "monkey"], fail("monkey: no activities"))
                .on(&["shell", "dumpsys"], ok("")),
        );
        let d = dispatcher(fake, root.path());
        let args = json!({"package_name": "com.example.app"});

        let restart = d.dispatch("clear_and_restart", Some(args.clone())).await;
        assert!(!restart.is_error);
        assert!(restart.text.contains("Could not determine main activity to restart"));

        let launch = d.dispatch("launch_app", Some(args)).await;
        assert!(launch.is_error);
        assert!(launch.text.starts_with("Error: Failed to launch app:"));
    }

    #[tokio::test]
    async fn clipboard_failure_leaves_no_temp_files() {
        let root = tempfile::tempdir().unwrap();
        let png = {
            let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]));
            let mut buf = std::io::Cursor::new(Vec::new());
            image::DynamicImage::ImageRgba8(img)
                .write_to(&mut buf, image::ImageFormat::Png)
                .unwrap();
            buf.into_inner()
        };
        let fake = Arc::new(
            FakeBridge::new()
                .with_devices(&["emulator-5554\tdevice"])
                .with_capture(png),
        );
        let result = dispatcher(fake, root.path())
            .dispatch("capture_screen_to_clipboard", Some(json!({"format": "jpg"})))
            .await;
        assert!(result.is_error);
        assert_eq!(
            result.text,
            "Error: Failed to take screenshot: Failed to copy image to clipboard: unavailable"
        );
        let leftovers = std::fs::read_dir(root.path().join("tmp")).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
