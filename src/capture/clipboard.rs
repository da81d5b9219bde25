use std::path::{Path, PathBuf};

use async_trait::async_trait;
use clipboard_rs::common::{RustImage, RustImageData};
use clipboard_rs::{Clipboard as _, ClipboardContext};
use tracing::debug;

use super::CaptureFormat;
use crate::error::{ToolError, ToolResult};

/// Opaque `putImage(path, format)` capability.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn put_image(&self, path: &Path, format: CaptureFormat) -> ToolResult<()>;
}

/// The system clipboard via `clipboard-rs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

fn set_image_from(path: &Path) -> ToolResult<()> {
    let file = path
        .to_str()
        .ok_or_else(|| ToolError::Clipboard(format!("non UTF-8 path: {}", path.display())))?;
    let image = RustImageData::from_path(file)
        .map_err(|e| ToolError::Clipboard(format!("cannot load {file}: {e}")))?;
    let ctx = ClipboardContext::new().map_err(|e| ToolError::Clipboard(e.to_string()))?;
    ctx.set_image(image)
        .map_err(|e| ToolError::Clipboard(e.to_string()))
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn put_image(&self, path: &Path, format: CaptureFormat) -> ToolResult<()> {
        debug!(path = %path.display(), %format, "copying image to clipboard");
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || set_image_from(&path))
            .await
            .map_err(|e| ToolError::Clipboard(format!("clipboard task failed: {e}")))?
    }
}
