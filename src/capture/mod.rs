//! Screen capture pipeline.
//!
//! Both entry points capture a PNG first, then branch:
//!   - to file: hidden sibling capture, optional convert, rename into place
//!   - to clipboard: temp artifact, optional convert, hand-off, always removed
//!
//! Temporary artifacts are owned by `TempArtifact` guards so every exit
//! path (including early `?` returns and panics) removes them.

pub mod clipboard;
pub mod convert;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::bridge::{BridgeExecutor, DeviceResolver};
use crate::error::{ToolError, ToolResult};
use crate::paths::{PathResolver, ensure_writable, parent_dir};
use crate::utils::unique_suffix;

pub use clipboard::{Clipboard, SystemClipboard};
pub use convert::{ImageConverter, ImageCrateConverter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureFormat {
    #[default]
    Png,
    Jpg,
    Jpeg,
    Webp,
    Bmp,
    Gif,
}

impl CaptureFormat {
    pub const ALL: [CaptureFormat; 6] = [
        CaptureFormat::Png,
        CaptureFormat::Jpg,
        CaptureFormat::Jpeg,
        CaptureFormat::Webp,
        CaptureFormat::Bmp,
        CaptureFormat::Gif,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureFormat::Png => "png",
            CaptureFormat::Jpg => "jpg",
            CaptureFormat::Jpeg => "jpeg",
            CaptureFormat::Webp => "webp",
            CaptureFormat::Bmp => "bmp",
            CaptureFormat::Gif => "gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn is_png(&self) -> bool {
        matches!(self, CaptureFormat::Png)
    }
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureFormat {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        CaptureFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == norm)
            .ok_or_else(|| {
                ToolError::validation(format!(
                    "format must be one of png, jpg, jpeg, webp, bmp, gif (got '{s}')"
                ))
            })
    }
}

/// A file removed when the guard drops unless it was persisted.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    armed: bool,
}

impl TempArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the file to `dest`, replacing whatever is there. On failure
    /// the guard still removes the temp file.
    pub async fn persist(mut self, dest: &Path) -> std::io::Result<PathBuf> {
        tokio::fs::rename(&self.path, dest).await?;
        self.armed = false;
        Ok(dest.to_path_buf())
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "temp artifact removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove temp artifact"),
        }
    }
}

/// Where a capture in `format` is saved for a resolved output path.
///
/// PNG keeps the path as given. Other formats swap an image extension
/// for their own and append one to anything else (`build.1.2` gains
/// `.jpg` rather than losing `.2`).
pub fn save_path(resolved: PathBuf, format: CaptureFormat) -> PathBuf {
    if format.is_png() {
        return resolved;
    }
    let has_image_ext = resolved
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.parse::<CaptureFormat>().is_ok());
    if has_image_ext {
        return resolved.with_extension(format.extension());
    }
    let mut raw = resolved.into_os_string();
    raw.push(".");
    raw.push(format.extension());
    PathBuf::from(raw)
}

/// Final artifact of a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureArtifact {
    pub local_path: PathBuf,
    pub format: CaptureFormat,
}

#[derive(Clone)]
pub struct ImageCapturePipeline {
    executor: BridgeExecutor,
    resolver: DeviceResolver,
    paths: PathResolver,
    converter: Arc<dyn ImageConverter>,
    clipboard: Arc<dyn Clipboard>,
    temp_dir: PathBuf,
}

impl ImageCapturePipeline {
    pub fn new(
        executor: BridgeExecutor,
        paths: PathResolver,
        converter: Arc<dyn ImageConverter>,
        clipboard: Arc<dyn Clipboard>,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            resolver: DeviceResolver::new(executor.clone()),
            executor,
            paths,
            converter,
            clipboard,
            temp_dir,
        }
    }

    /// Capture and save to `output_path` (see `save_path`).
    pub async fn capture_to_file(
        &self,
        output_path: &str,
        device: Option<&str>,
        format: CaptureFormat,
    ) -> ToolResult<String> {
        let artifact = self
            .capture_to_file_inner(output_path, device, format)
            .await
            .map_err(ToolError::into_capture)?;
        Ok(format!(
            "Screenshot saved to: {} in {} format",
            artifact.local_path.display(),
            artifact.format
        ))
    }

    async fn capture_to_file_inner(
        &self,
        output_path: &str,
        device: Option<&str>,
        format: CaptureFormat,
    ) -> ToolResult<CaptureArtifact> {
        let device = self.resolver.resolve(device).await?;

        let final_path = save_path(self.paths.resolve(output_path), format);
        let dir = parent_dir(&final_path);
        if !ensure_writable(&dir).await {
            return Err(ToolError::Writability(dir));
        }

        // Hidden sibling work files; user paths change only at the final rename.
        let stem = format!(".adb-capture-{}", unique_suffix());
        let png = TempArtifact::new(dir.join(&stem).with_extension("png"));
        self.executor
            .capture_screen(Some(&device), png.path())
            .await?;

        let finished = if format.is_png() {
            png
        } else {
            let converted = TempArtifact::new(dir.join(&stem).with_extension(format.extension()));
            self.converter
                .convert(png.path(), converted.path(), format)
                .await?;
            converted
        };
        let local_path = finished.persist(&final_path).await?;
        debug!(path = %local_path.display(), "capture saved");
        Ok(CaptureArtifact { local_path, format })
    }

    /// Capture into a temp artifact and place it on the clipboard. The
    /// temp files never outlive the call.
    pub async fn capture_to_clipboard(
        &self,
        device: Option<&str>,
        format: CaptureFormat,
    ) -> ToolResult<String> {
        self.capture_to_clipboard_inner(device, format)
            .await
            .map_err(ToolError::into_capture)?;
        Ok(format!("Screenshot copied to clipboard in {format} format"))
    }

    async fn capture_to_clipboard_inner(
        &self,
        device: Option<&str>,
        format: CaptureFormat,
    ) -> ToolResult<()> {
        let device = self.resolver.resolve(device).await?;

        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let stem = format!("adb-screenshot-{}", unique_suffix());
        let target = TempArtifact::new(
            self.temp_dir
                .join(&stem)
                .with_extension(format.extension()),
        );
        let png = (!format.is_png())
            .then(|| TempArtifact::new(self.temp_dir.join(&stem).with_extension("png")));

        let capture_path = png.as_ref().map_or(target.path(), TempArtifact::path);
        self.executor
            .capture_screen(Some(&device), capture_path)
            .await?;

        if let Some(png) = png {
            self.converter
                .convert(png.path(), target.path(), format)
                .await?;
        }

        self.clipboard.put_image(target.path(), format).await
    }
}
