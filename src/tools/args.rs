use serde_json::{Map, Value};

use crate::capture::CaptureFormat;
use crate::error::{ToolError, ToolResult};

/// Legacy spelling of the `device` parameter.
const DEVICE_ALIAS: &str = "device_id";

/// Read-only view of one call's argument bag.
#[derive(Debug, Clone, Default)]
pub struct ToolArguments {
    values: Map<String, Value>,
}

impl ToolArguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn from_value(value: Option<Value>) -> ToolResult<Self> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::Object(map)) => Ok(Self::new(map)),
            Some(_) => Err(ToolError::validation("arguments must be an object")),
        }
    }

    /// Present, non-empty string.
    pub fn required_str(&self, key: &str) -> ToolResult<&str> {
        match self.optional_str(key)? {
            Some(v) => Ok(v),
            None => Err(ToolError::validation(format!(
                "{key} is required and must be a string"
            ))),
        }
    }

    /// Absent, null and empty strings all read as `None`.
    pub fn optional_str(&self, key: &str) -> ToolResult<Option<&str>> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(ToolError::validation(format!("{key} must be a string"))),
        }
    }

    /// Device hint from `device`, falling back to `device_id`.
    pub fn device(&self) -> ToolResult<Option<&str>> {
        match self.optional_str("device")? {
            Some(d) => Ok(Some(d)),
            None => self.optional_str(DEVICE_ALIAS),
        }
    }

    pub fn required_device(&self) -> ToolResult<&str> {
        self.device()?
            .ok_or_else(|| ToolError::validation("device is required and must be a string"))
    }

    /// Capture format, `png` when absent.
    pub fn format(&self) -> ToolResult<CaptureFormat> {
        self.optional_str("format")?
            .map(str::parse)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}
