use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};

use super::CaptureFormat;
use crate::error::{ToolError, ToolResult};

/// Opaque `convert(input, output, format)` capability.
#[async_trait]
pub trait ImageConverter: Send + Sync {
    async fn convert(&self, input: &Path, output: &Path, format: CaptureFormat) -> ToolResult<()>;
}

/// Decodes with the `image` crate and re-encodes on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateConverter;

fn image_format(format: CaptureFormat) -> ImageFormat {
    match format {
        CaptureFormat::Png => ImageFormat::Png,
        CaptureFormat::Jpg | CaptureFormat::Jpeg => ImageFormat::Jpeg,
        CaptureFormat::Webp => ImageFormat::WebP,
        CaptureFormat::Bmp => ImageFormat::Bmp,
        CaptureFormat::Gif => ImageFormat::Gif,
    }
}

fn convert_blocking(input: &Path, output: &Path, format: CaptureFormat) -> ToolResult<()> {
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ToolError::Conversion(e.to_string()))?;
    }
    let img = image::open(input).map_err(|e| ToolError::Conversion(e.to_string()))?;
    let target = image_format(format);
    // JPEG has no alpha channel.
    let img = match target {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img,
    };
    img.save_with_format(output, target)
        .map_err(|e| ToolError::Conversion(e.to_string()))
}

#[async_trait]
impl ImageConverter for ImageCrateConverter {
    async fn convert(&self, input: &Path, output: &Path, format: CaptureFormat) -> ToolResult<()> {
        let (input, output): (PathBuf, PathBuf) = (input.into(), output.into());
        tokio::task::spawn_blocking(move || convert_blocking(&input, &output, format))
            .await
            .map_err(|e| ToolError::Conversion(format!("conversion task failed: {e}")))?
    }
}
