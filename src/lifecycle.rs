//! App launch and restart.
//!
//! Launching is an ordered chain of strategies. Each attempt either
//! launches the app or reports why the next strategy should run:
//!
//!   1. launcher intent via `monkey` on the LAUNCHER category
//!   2. component lookup in `dumpsys package`, then `am start -n`
//!
//! Clear/force restart run their destructive step first and then the
//! same chain after a settle delay; a failed relaunch is reported inside
//! the composite text rather than failing the call.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info};

use crate::bridge::{BridgeExecutor, DeviceResolver};
use crate::error::{ToolError, ToolResult};

const LAUNCHER_CATEGORY: &str = "android.intent.category.LAUNCHER";
const MAIN_ACTION: &str = "android.intent.action.MAIN";
const NO_MAIN_ACTIVITY: &str = "Could not determine main activity";

/// How a launch succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchStrategy {
    LauncherIntent,
    MainComponent(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Launched {
        strategy: LaunchStrategy,
        output: String,
    },
    NeedsFallback {
        reason: String,
    },
}

/// Terminal result of the whole chain.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChainResult {
    Launched {
        strategy: LaunchStrategy,
        output: String,
    },
    Exhausted {
        first: String,
        last: String,
    },
}

static COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9_.]+/[a-zA-Z0-9_.]+").expect("component pattern is valid")
});

/// Lines mentioning the MAIN action plus the line after each.
pub fn main_action_lines(dumpsys: &str) -> Vec<&str> {
    let lines: Vec<&str> = dumpsys.lines().collect();
    let mut picked = Vec::new();
    let mut last = None;
    for (i, line) in lines.iter().enumerate() {
        if !line.contains(MAIN_ACTION) {
            continue;
        }
        for j in [i, i + 1] {
            if j < lines.len() && last.is_none_or(|l| j > l) {
                picked.push(lines[j]);
                last = Some(j);
            }
        }
    }
    picked
}

/// First `<package>/<activity>` token near a MAIN action entry.
pub fn extract_component(dumpsys: &str) -> Option<String> {
    let excerpt = main_action_lines(dumpsys).join("\n");
    COMPONENT
        .find(&excerpt)
        .map(|m| m.as_str().to_string())
}

/// `monkey` exits cleanly even when the package has no launcher entry.
fn monkey_aborted(output: &str) -> bool {
    output.contains("No activities found") || output.contains("monkey aborted")
}

#[derive(Clone)]
pub struct AppLifecycleOrchestrator {
    executor: BridgeExecutor,
    resolver: DeviceResolver,
    settle_delay: Duration,
}

impl AppLifecycleOrchestrator {
    pub fn new(executor: BridgeExecutor, settle_delay: Duration) -> Self {
        Self {
            resolver: DeviceResolver::new(executor.clone()),
            executor,
            settle_delay,
        }
    }

    async fn try_launcher_intent(&self, package: &str, device: &str) -> LaunchOutcome {
        let result = self
            .executor
            .shell(
                Some(device),
                ["monkey", "-p", package, "-c", LAUNCHER_CATEGORY, "1"],
            )
            .await;
        match result {
            Ok(output) if monkey_aborted(&output) => LaunchOutcome::NeedsFallback { reason: output },
            Ok(output) => LaunchOutcome::Launched {
                strategy: LaunchStrategy::LauncherIntent,
                output,
            },
            Err(e) => LaunchOutcome::NeedsFallback {
                reason: e.to_string(),
            },
        }
    }

    async fn try_main_component(&self, package: &str, device: &str) -> LaunchOutcome {
        let dump = match self
            .executor
            .shell(Some(device), ["dumpsys", "package", package])
            .await
        {
            Ok(dump) => dump,
            Err(e) => {
                return LaunchOutcome::NeedsFallback {
                    reason: e.to_string(),
                };
            }
        };
        let Some(component) = extract_component(&dump) else {
            return LaunchOutcome::NeedsFallback {
                reason: NO_MAIN_ACTIVITY.to_string(),
            };
        };
        debug!(%component, "main component found");
        match self
            .executor
            .shell(Some(device), ["am", "start", "-n", component.as_str()])
            .await
        {
            Ok(output) => LaunchOutcome::Launched {
                strategy: LaunchStrategy::MainComponent(component),
                output,
            },
            Err(e) => LaunchOutcome::NeedsFallback {
                reason: e.to_string(),
            },
        }
    }

    async fn launch_chain(&self, package: &str, device: &str) -> ChainResult {
        let first = match self.try_launcher_intent(package, device).await {
            LaunchOutcome::Launched { strategy, output } => {
                return ChainResult::Launched { strategy, output };
            }
            LaunchOutcome::NeedsFallback { reason } => reason,
        };
        debug!(package, reason = %first, "launcher intent failed, trying main component");
        match self.try_main_component(package, device).await {
            LaunchOutcome::Launched { strategy, output } => ChainResult::Launched { strategy, output },
            LaunchOutcome::NeedsFallback { reason } => ChainResult::Exhausted {
                first,
                last: reason,
            },
        }
    }

    pub async fn launch_app(&self, package: &str, device: Option<&str>) -> ToolResult<String> {
        let device = self.resolver.resolve(device).await?;
        match self.launch_chain(package, &device).await {
            ChainResult::Launched {
                strategy: LaunchStrategy::LauncherIntent,
                output,
            } => Ok(format!("App launched: {package}\n{output}")),
            ChainResult::Launched {
                strategy: LaunchStrategy::MainComponent(component),
                output,
            } => Ok(format!("App launched with activity: {component}\n{output}")),
            ChainResult::Exhausted { first, .. } => Err(ToolError::Launch(first)),
        }
    }

    /// `pm clear`, settle, relaunch.
    pub async fn clear_and_restart(
        &self,
        package: &str,
        device: Option<&str>,
    ) -> ToolResult<String> {
        let device = self.resolver.resolve(device).await?;
        let clear = self
            .executor
            .shell(Some(&device), ["pm", "clear", package])
            .await?;
        let start = self.relaunch(package, &device).await;
        Ok(format!(
            "App data cleared and restarted: {package}\nClear: {clear}\nStart: {start}"
        ))
    }

    /// `am force-stop`, settle, relaunch.
    pub async fn force_restart(&self, package: &str, device: Option<&str>) -> ToolResult<String> {
        let device = self.resolver.resolve(device).await?;
        let stop = self
            .executor
            .shell(Some(&device), ["am", "force-stop", package])
            .await?;
        let start = self.relaunch(package, &device).await;
        Ok(format!(
            "App force restarted: {package}\nStop: {stop}\nStart: {start}"
        ))
    }

    async fn relaunch(&self, package: &str, device: &str) -> String {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        match self.launch_chain(package, device).await {
            ChainResult::Launched { output, .. } => {
                info!(package, "app relaunched");
                output
            }
            ChainResult::Exhausted { last, .. } if last == NO_MAIN_ACTIVITY => {
                format!("{NO_MAIN_ACTIVITY} to restart")
            }
            ChainResult::Exhausted { last, .. } => format!("Failed to restart app: {last}"),
        }
    }
}
