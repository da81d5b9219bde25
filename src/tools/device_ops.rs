//! Single-call device operations: shell, packages, transfers, navigation.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::bridge::{BridgeExecutor, CommandRequest, DeviceResolver};
use crate::error::{HOME_DIR_HINT, ToolError, ToolResult};
use crate::paths::{PathResolver, ensure_writable, parent_dir};

/// Package names from `pm list packages` output.
pub fn parse_packages(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("package:"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Case-insensitive substring filter.
pub fn filter_packages(packages: Vec<String>, filter: Option<&str>) -> Vec<String> {
    let Some(needle) = filter.map(str::to_lowercase) else {
        return packages;
    };
    packages
        .into_iter()
        .filter(|p| p.to_lowercase().contains(&needle))
        .collect()
}

fn pretty_json<T: serde::Serialize>(value: &T) -> ToolResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| ToolError::Io(e.into()))
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[derive(Clone)]
pub struct DeviceOps {
    executor: BridgeExecutor,
    resolver: DeviceResolver,
    paths: PathResolver,
}

impl DeviceOps {
    pub fn new(executor: BridgeExecutor, paths: PathResolver) -> Self {
        Self {
            resolver: DeviceResolver::new(executor.clone()),
            executor,
            paths,
        }
    }

    pub async fn list_devices(&self) -> ToolResult<String> {
        let devices = self.executor.list_devices().await?;
        pretty_json(&devices)
    }

    /// The command line goes to the device shell as one argument.
    pub async fn run_shell(&self, command: &str, device: Option<&str>) -> ToolResult<String> {
        let device = self.resolver.resolve(device).await?;
        self.executor.shell(Some(&device), [command]).await
    }

    pub async fn install_package(&self, path: &str, device: Option<&str>) -> ToolResult<String> {
        let device = self.resolver.resolve(device).await?;
        let (verb, files) = self.install_targets(path).await?;
        debug!(verb, count = files.len(), "installing");
        self.executor
            .output(
                CommandRequest::new(verb)
                    .args(files.iter().map(|f| path_arg(f)))
                    .device(Some(&device)),
            )
            .await
    }

    /// Directory or wildcard installs go through `install-multiple`.
    async fn install_targets(&self, raw: &str) -> ToolResult<(&'static str, Vec<PathBuf>)> {
        let resolved = self.paths.resolve(raw);

        if raw.contains('*') {
            let pattern = path_arg(&resolved);
            let mut files: Vec<PathBuf> = glob::glob(&pattern)
                .map_err(|e| ToolError::validation(format!("invalid path pattern: {e}")))?
                .filter_map(Result::ok)
                .collect();
            files.sort();
            if files.is_empty() {
                return Err(ToolError::path(format!("No files match pattern: {pattern}")));
            }
            return Ok(("install-multiple", files));
        }

        if tokio::fs::metadata(&resolved)
            .await
            .is_ok_and(|m| m.is_dir())
        {
            let mut files = Vec::new();
            let mut entries = tokio::fs::read_dir(&resolved).await?;
            while let Some(entry) = entries.next_entry().await? {
                let p = entry.path();
                if p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("apk")) {
                    files.push(p);
                }
            }
            files.sort();
            if files.is_empty() {
                return Err(ToolError::path(format!(
                    "No APK files found in directory: {}",
                    resolved.display()
                )));
            }
            return Ok(("install-multiple", files));
        }

        if !tokio::fs::try_exists(&resolved).await.unwrap_or(false) {
            return Err(ToolError::path(format!(
                "Local file does not exist: {}",
                resolved.display()
            )));
        }
        Ok(("install", vec![resolved]))
    }

    pub async fn uninstall_package(
        &self,
        package: &str,
        device: Option<&str>,
    ) -> ToolResult<String> {
        let device = self.resolver.resolve(device).await?;
        self.executor
            .output(
                CommandRequest::new("uninstall")
                    .arg(package)
                    .device(Some(&device)),
            )
            .await
    }

    pub async fn list_packages(
        &self,
        device: Option<&str>,
        filter: Option<&str>,
    ) -> ToolResult<String> {
        let device = self.resolver.resolve(device).await?;
        let out = self
            .executor
            .shell(Some(&device), ["pm", "list", "packages"])
            .await?;
        pretty_json(&filter_packages(parse_packages(&out), filter))
    }

    pub async fn pull_file(
        &self,
        remote_path: &str,
        local_path: &str,
        device: Option<&str>,
    ) -> ToolResult<String> {
        let device = self.resolver.resolve(device).await?;
        let local = self.paths.resolve(local_path);
        let dir = parent_dir(&local);
        if !ensure_writable(&dir).await {
            return Err(ToolError::Writability(dir));
        }
        let output = self
            .executor
            .output(
                CommandRequest::new("pull")
                    .args([remote_path.to_string(), path_arg(&local)])
                    .device(Some(&device)),
            )
            .await
            .map_err(|e| ToolError::path(format!("Failed to pull file: {e}. {HOME_DIR_HINT}")))?;
        Ok(format!(
            "File pulled successfully to: {}\n{output}",
            local.display()
        ))
    }

    pub async fn push_file(
        &self,
        local_path: &str,
        remote_path: &str,
        device: Option<&str>,
    ) -> ToolResult<String> {
        let device = self.resolver.resolve(device).await?;
        let local = self.paths.resolve(local_path);
        if !tokio::fs::try_exists(&local).await.unwrap_or(false) {
            return Err(ToolError::path(format!(
                "Local file does not exist: {}",
                local.display()
            )));
        }
        self.executor
            .output(
                CommandRequest::new("push")
                    .args([path_arg(&local), remote_path.to_string()])
                    .device(Some(&device)),
            )
            .await
    }

    pub async fn clear_app_data(&self, package: &str, device: Option<&str>) -> ToolResult<String> {
        let device = self.resolver.resolve(device).await?;
        let out = self
            .executor
            .shell(Some(&device), ["pm", "clear", package])
            .await?;
        Ok(format!("App data cleared for {package}\n{out}"))
    }

    pub async fn force_stop_app(&self, package: &str, device: Option<&str>) -> ToolResult<String> {
        let device = self.resolver.resolve(device).await?;
        let out = self
            .executor
            .shell(Some(&device), ["am", "force-stop", package])
            .await?;
        Ok(format!("App force stopped: {package}\n{out}"))
    }

    pub async fn go_home(&self, device: &str) -> ToolResult<String> {
        let device = self.resolver.resolve(Some(device)).await?;
        let out = self
            .executor
            .shell(Some(&device), ["input", "keyevent", "KEYCODE_HOME"])
            .await?;
        Ok(format!("Navigated to home screen\n{out}"))
    }

    pub async fn open_settings(&self, device: &str) -> ToolResult<String> {
        let device = self.resolver.resolve(Some(device)).await?;
        let out = self
            .executor
            .shell(Some(&device), ["am", "start", "-a", "android.settings.SETTINGS"])
            .await?;
        Ok(format!("Settings app opened\n{out}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::{FakeBridge, fail, ok};
    use std::sync::Arc;

    const PM_OUTPUT: &str = "package:com.android.chrome\npackage:com.example.app\n\
package:org.Chromium.Webview\nnot-a-package-line\npackage:com.google.android.gms";

    fn ops(fake: Arc<FakeBridge>, home: &Path) -> DeviceOps {
        DeviceOps::new(BridgeExecutor::new(fake), PathResolver::new(home))
    }

    fn one_device() -> FakeBridge {
        FakeBridge::new().with_devices(&["emulator-5554\tdevice"])
    }

    #[test]
    fn package_lines_are_parsed_and_filtered_case_insensitively() {
        let all = parse_packages(PM_OUTPUT);
        assert_eq!(all.len(), 4);
        let chrome = filter_packages(all, Some("chrome"));
        assert_eq!(chrome, vec!["com.android.chrome", "org.Chromium.Webview"]);
    }

    #[test]
    fn no_filter_keeps_everything() {
        assert_eq!(filter_packages(parse_packages(PM_OUTPUT), None).len(), 4);
    }

    #[tokio::test]
    async fn list_devices_is_a_json_array() {
        let fake = Arc::new(
            FakeBridge::new().with_devices(&["emulator-5554\tdevice", "R58M\toffline"]),
        );
        let home = tempfile::tempdir().unwrap();
        let text = ops(fake, home.path()).list_devices().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([
                {"id": "emulator-5554", "state": "device"},
                {"id": "R58M", "state": "offline"}
            ])
        );
    }

    #[tokio::test]
    async fn list_packages_returns_filtered_json() {
        let fake = Arc::new(one_device().on(&["shell", "pm", "list", "packages"], ok(PM_OUTPUT)));
        let home = tempfile::tempdir().unwrap();
        let text = ops(fake, home.path())
            .list_packages(None, Some("CHROME"))
            .await
            .unwrap();
        let parsed: Vec<String> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, vec!["com.android.chrome", "org.Chromium.Webview"]);
    }

    #[tokio::test]
    async fn run_shell_passes_command_as_one_argument() {
        let fake = Arc::new(one_device().on(&["shell"], ok("hello\n")));
        let home = tempfile::tempdir().unwrap();
        let out = ops(fake.clone(), home.path())
            .run_shell("echo hello && ls /sdcard", None)
            .await
            .unwrap();
        assert_eq!(out, "hello");
        let last = fake.calls().pop().unwrap();
        assert_eq!(
            last,
            vec!["-s", "emulator-5554", "shell", "echo hello && ls /sdcard"]
        );
    }

    #[tokio::test]
    async fn unknown_device_hint_never_reaches_the_shell() {
        let fake = Arc::new(one_device().on(&["shell"], ok("")));
        let home = tempfile::tempdir().unwrap();
        let err = ops(fake.clone(), home.path())
            .run_shell("id", Some("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::DeviceNotFound(ref d) if d == "nope"));
        assert!(!fake.called("shell"));
    }

    #[tokio::test]
    async fn install_directory_uses_install_multiple_sorted() {
        let home = tempfile::tempdir().unwrap();
        let dir = home.path().join("apks");
        std::fs::create_dir(&dir).unwrap();
        for name in ["b.apk", "a.APK", "notes.txt"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
        let fake = Arc::new(one_device().on(&["install-multiple"], ok("Success")));
        let out = ops(fake.clone(), home.path())
            .install_package("apks", None)
            .await
            .unwrap();
        assert_eq!(out, "Success");
        let call = fake.calls().pop().unwrap();
        assert_eq!(call[2], "install-multiple");
        assert_eq!(
            call[3..],
            [path_arg(&dir.join("a.APK")), path_arg(&dir.join("b.apk"))]
        );
    }

    #[tokio::test]
    async fn install_wildcard_is_glob_expanded() {
        let home = tempfile::tempdir().unwrap();
        for name in ["base.apk", "split_en.apk", "other.zip"] {
            std::fs::write(home.path().join(name), b"x").unwrap();
        }
        let fake = Arc::new(one_device().on(&["install-multiple"], ok("Success")));
        ops(fake.clone(), home.path())
            .install_package("~/*.apk", None)
            .await
            .unwrap();
        let call = fake.calls().pop().unwrap();
        assert_eq!(call.len(), 5);
        assert!(call[3].ends_with("base.apk") && call[4].ends_with("split_en.apk"));
    }

    #[tokio::test]
    async fn install_single_file_and_missing_file() {
        let home = tempfile::tempdir().unwrap();
        let apk = home.path().join("app.apk");
        std::fs::write(&apk, b"x").unwrap();
        let fake = Arc::new(one_device().on(&["install"], ok("Performing Streamed Install\nSuccess")));
        let ops = ops(fake.clone(), home.path());

        ops.install_package(apk.to_str().unwrap(), None).await.unwrap();
        assert_eq!(fake.calls().pop().unwrap()[2], "install");

        let err = ops.install_package("missing.apk", None).await.unwrap_err();
        assert!(matches!(err, ToolError::Path(ref m) if m.starts_with("Local file does not exist")));
    }

    #[tokio::test]
    async fn pull_reports_resolved_destination() {
        let home = tempfile::tempdir().unwrap();
        let fake = Arc::new(one_device().on(&["pull"], ok("1 file pulled")));
        let text = ops(fake.clone(), home.path())
            .pull_file("/sdcard/log.txt", "out/log.txt", None)
            .await
            .unwrap();
        let expected = home.path().join("out/log.txt");
        assert_eq!(
            text,
            format!("File pulled successfully to: {}\n1 file pulled", expected.display())
        );
        assert!(fake.called(&path_arg(&expected)));
    }

    #[tokio::test]
    async fn pull_failure_carries_the_hint() {
        let home = tempfile::tempdir().unwrap();
        let fake = Arc::new(one_device().on(&["pull"], fail("remote object does not exist")));
        let err = ops(fake, home.path())
            .pull_file("/sdcard/nope", "x.txt", None)
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("Failed to pull file: ADB command failed: remote object"));
        assert!(text.ends_with(HOME_DIR_HINT));
    }

    #[tokio::test]
    async fn push_requires_an_existing_local_file() {
        let home = tempfile::tempdir().unwrap();
        let fake = Arc::new(one_device().on(&["push"], ok("1 file pushed")));
        let ops = ops(fake.clone(), home.path());
        let err = ops.push_file("nothing.bin", "/sdcard/", None).await.unwrap_err();
        assert!(err.is_path_related());
        assert!(!fake.called("push"));

        std::fs::write(home.path().join("data.bin"), b"x").unwrap();
        let out = ops.push_file("data.bin", "/sdcard/", None).await.unwrap();
        assert_eq!(out, "1 file pushed");
    }

    #[tokio::test]
    async fn navigation_and_app_control_texts() {
        let home = tempfile::tempdir().unwrap();
        let fake = Arc::new(
            one_device()
                .on(&["shell", "input", "keyevent", "KEYCODE_HOME"], ok(""))
                .on(&["shell", "am", "start", "-a"], ok("Starting: Intent"))
                .on(&["shell", "pm", "clear"], ok("Success"))
                .on(&["shell", "am", "force-stop"], ok("")),
        );
        let ops = ops(fake, home.path());
        assert_eq!(
            ops.go_home("emulator-5554").await.unwrap(),
            "Navigated to home screen\n"
        );
        assert_eq!(
            ops.open_settings("emulator-5554").await.unwrap(),
            "Settings app opened\nStarting: Intent"
        );
        assert_eq!(
            ops.clear_app_data("com.example.app", None).await.unwrap(),
            "App data cleared for com.example.app\nSuccess"
        );
        assert_eq!(
            ops.force_stop_app("com.example.app", None).await.unwrap(),
            "App force stopped: com.example.app\n"
        );
    }
}
