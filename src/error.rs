//! Error taxonomy for tool operations.
//!
//! Every failure raised below the dispatcher is a `ToolError`; the
//! dispatcher renders it as `"Error: <display>"` and never lets it escape.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Hint appended to local filesystem failures.
pub const HOME_DIR_HINT: &str = "Try using an absolute path or a path in your home directory.";

#[derive(Debug, Error)]
pub enum ToolError {
    /// Bad or missing argument. Raised before any bridge interaction.
    #[error("Invalid parameters: {0}")]
    Validation(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("No Android devices connected")]
    NoDevice,

    #[error("Device with ID \"{0}\" not found")]
    DeviceNotFound(String),

    #[error("Multiple devices connected. Please specify a device ID")]
    AmbiguousDevice,

    /// Non-zero exit with non-advisory stderr, or a spawn failure.
    #[error("ADB command failed: {0}")]
    Bridge(String),

    #[error("{0}")]
    Path(String),

    #[error("Directory is not writable: {}. {HOME_DIR_HINT}", .0.display())]
    Writability(PathBuf),

    #[error("Failed to convert image: {0}")]
    Conversion(String),

    #[error("Failed to copy image to clipboard: {0}")]
    Clipboard(String),

    #[error("Failed to take screenshot: {0}")]
    Capture(String),

    /// Every launch strategy failed.
    #[error("Failed to launch app: {0}")]
    Launch(String),

    #[error("ADB command timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ToolError::Validation(msg.into())
    }

    pub fn path(msg: impl Into<String>) -> Self {
        ToolError::Path(msg.into())
    }

    /// Failures that originate from resolving or writing local paths.
    pub fn is_path_related(&self) -> bool {
        matches!(
            self,
            ToolError::Path(_) | ToolError::Writability(_) | ToolError::Io(_)
        )
    }

    /// Wrap a pipeline failure as a capture failure naming the operation.
    ///
    /// Path-related causes get the home-directory hint unless their own
    /// message already carries it.
    pub fn into_capture(self) -> Self {
        match self {
            ToolError::Capture(_) => self,
            ToolError::Writability(_) => ToolError::Capture(self.to_string()),
            other if other.is_path_related() => {
                ToolError::Capture(format!("{other}. {HOME_DIR_HINT}"))
            }
            other => ToolError::Capture(other.to_string()),
        }
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
