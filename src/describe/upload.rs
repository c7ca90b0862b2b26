//! Image preparation before upload to the describer.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

use super::{DocumentImage, PdfRasterizer};
use crate::error::DescribeError;
use crate::scan::ScanFile;

/// Images above this size are downscaled before upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Longest side of a downscaled image, in pixels.
pub const MAX_DIMENSION: u32 = 1600;

/// MIME type for a lower-case scan extension.
#[must_use]
pub fn mime_type_for(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Make an encoded image small enough for upload.
///
/// Images within [`MAX_UPLOAD_BYTES`] are passed through untouched; larger
/// ones are scaled to fit [`MAX_DIMENSION`] and re-encoded as JPEG.
///
/// # Errors
///
/// Returns [`DescribeError::Image`] if a large image cannot be decoded or
/// re-encoded.
pub fn prepare_image(bytes: Vec<u8>, mime_type: &'static str) -> Result<DocumentImage, DescribeError> {
    prepare_with_limit(bytes, mime_type, MAX_UPLOAD_BYTES)
}

fn prepare_with_limit(
    bytes: Vec<u8>,
    mime_type: &'static str,
    limit: usize,
) -> Result<DocumentImage, DescribeError> {
    if bytes.len() <= limit {
        return Ok(DocumentImage::new(bytes, mime_type));
    }

    let original_len = bytes.len();
    let img = image::load_from_memory(&bytes)
        .map_err(|e| DescribeError::Image(format!("failed to decode image: {e}")))?;
    let img = resize_if_needed(img);

    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .map_err(|e| DescribeError::Image(format!("failed to encode image: {e}")))?;

    tracing::debug!(from = original_len, to = buffer.len(), "Downscaled image for upload");
    Ok(DocumentImage::new(buffer, "image/jpeg"))
}

fn resize_if_needed(img: DynamicImage) -> DynamicImage {
    if img.width() <= MAX_DIMENSION && img.height() <= MAX_DIMENSION {
        return img;
    }
    img.resize(
        MAX_DIMENSION,
        MAX_DIMENSION,
        image::imageops::FilterType::Lanczos3,
    )
}

/// Read an image file and prepare it for upload.
///
/// # Errors
///
/// Returns [`DescribeError::Image`] if the file cannot be read or prepared.
pub async fn load_image(path: &Path, extension: &str) -> Result<DocumentImage, DescribeError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DescribeError::Image(format!("failed to read {}: {e}", path.display())))?;
    let mime_type = mime_type_for(extension);

    tokio::task::spawn_blocking(move || prepare_image(bytes, mime_type))
        .await
        .map_err(|e| DescribeError::Image(format!("image task failed: {e}")))?
}

/// Image of the page that represents `file` to the describer.
///
/// PDFs go through `rasterizer`; images are read from disk.
///
/// # Errors
///
/// Returns a [`DescribeError`] if the page cannot be produced.
pub async fn load_representative(
    file: &ScanFile,
    rasterizer: &dyn PdfRasterizer,
) -> Result<DocumentImage, DescribeError> {
    if file.is_pdf() {
        tracing::debug!(path = %file.path.display(), "Rasterizing first PDF page");
        let page = rasterizer.first_page(&file.path).await?;
        let DocumentImage { bytes, mime_type } = page;
        return tokio::task::spawn_blocking(move || prepare_image(bytes, mime_type))
            .await
            .map_err(|e| DescribeError::Image(format!("image task failed: {e}")))?;
    }

    load_image(&file.path, &file.extension).await
}
