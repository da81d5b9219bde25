//! Connected devices and target resolution.

use std::fmt;

use serde::{Serialize, Serializer};
use tracing::debug;

use super::BridgeExecutor;
use crate::error::{ToolError, ToolResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceState {
    Device,
    Offline,
    Unauthorized,
    Other(String),
}

impl DeviceState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "device" => DeviceState::Device,
            "offline" => DeviceState::Offline,
            "unauthorized" => DeviceState::Unauthorized,
            other => DeviceState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeviceState::Device => "device",
            DeviceState::Offline => "offline",
            DeviceState::Unauthorized => "unauthorized",
            DeviceState::Other(s) => s,
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeviceState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub id: String,
    pub state: DeviceState,
}

/// Parse `devices` output: daemon banners (`* daemon ...`) dropped, then
/// the header line, then `<id> <state>` per line. Short lines are skipped.
pub fn parse_device_list(output: &str) -> Vec<Device> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('*'))
        .skip(1)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let id = tokens.next()?;
            let state = tokens.next()?;
            Some(Device {
                id: id.to_string(),
                state: DeviceState::parse(state),
            })
        })
        .collect()
}

/// Pick exactly one device identifier for an invocation.
pub fn select_device(devices: &[Device], hint: Option<&str>) -> ToolResult<String> {
    if devices.is_empty() {
        return Err(ToolError::NoDevice);
    }
    match hint {
        Some(hint) => devices
            .iter()
            .find(|d| d.id == hint)
            .map(|d| d.id.clone())
            .ok_or_else(|| ToolError::DeviceNotFound(hint.to_string())),
        None => match devices {
            [only] => Ok(only.id.clone()),
            _ => Err(ToolError::AmbiguousDevice),
        },
    }
}

/// Re-queries the bridge on every call; connectivity changes between
/// invocations must be observed.
#[derive(Clone)]
pub struct DeviceResolver {
    executor: BridgeExecutor,
}

impl DeviceResolver {
    pub fn new(executor: BridgeExecutor) -> Self {
        Self { executor }
    }

    pub async fn resolve(&self, hint: Option<&str>) -> ToolResult<String> {
        let devices = self.executor.list_devices().await?;
        let id = select_device(&devices, hint)?;
        debug!(device = %id, hinted = hint.is_some(), "device resolved");
        Ok(id)
    }
}
