//! Persistence: serialize the assembled document, write it atomically, and
//! export per-page PNG copies.
//!
//! The PDF itself is the primary artifact and any failure writing it is
//! fatal. The side-by-side PNG directory is a convenience for spot-checking
//! pages without a PDF viewer, so every failure there degrades to a
//! [`PipelineWarning`] instead of aborting a conversion whose PDF already
//! landed on disk.

use crate::error::{Pdf2GrayError, PipelineWarning};
use crate::pipeline::substitute::RenderedPage;
use lopdf::Document;
use std::path::Path;
use tracing::{debug, warn};

/// Inches per meter, for PNG pixel-density metadata.
const METERS_PER_INCH: f32 = 0.0254;

/// Garbage-collect, renumber, and compress the document, then serialize it.
///
/// Blocking; call from a blocking context.
pub fn serialize_document(mut doc: Document) -> Result<Vec<u8>, Pdf2GrayError> {
    doc.prune_objects();
    doc.renumber_objects();
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(lopdf::Error::from)?;
    debug!(bytes = bytes.len(), "Serialized output document");
    Ok(bytes)
}

/// Write `bytes` to `path` via a sibling temp file and rename, so readers
/// never observe a half-written PDF.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Pdf2GrayError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|source| {
                Pdf2GrayError::OutputWriteFailed {
                    path: parent.to_path_buf(),
                    source,
                }
            })?;
        }
    }

    let tmp = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|source| Pdf2GrayError::OutputWriteFailed {
            path: tmp.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| Pdf2GrayError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}

/// Export each substituted page under `dir` as `page_NNNN.png` (numbered
/// from 1), stamping the render DPI into the PNG density header.
///
/// Best-effort: returns one warning per page that could not be written.
/// Blocking; call from a blocking context.
pub fn save_side_images(pages: &[RenderedPage], dir: &Path, dpi: u32) -> Vec<PipelineWarning> {
    let mut warnings = Vec::new();

    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "Could not create side-image directory");
        warnings.push(PipelineWarning::SideImageSave {
            path: dir.display().to_string(),
            reason: e.to_string(),
        });
        return warnings;
    }

    for page in pages {
        let path = dir.join(format!("page_{:04}.png", page.index + 1));
        let result = encode_gray_png(&page.image, dpi)
            .map_err(|e| e.to_string())
            .and_then(|data| std::fs::write(&path, data).map_err(|e| e.to_string()));
        if let Err(reason) = result {
            warn!(path = %path.display(), %reason, "Could not save side image");
            warnings.push(PipelineWarning::SideImageSave {
                path: path.display().to_string(),
                reason,
            });
        }
    }

    warnings
}

/// Encode a grayscale page as PNG with a `pHYs` chunk carrying `dpi`.
fn encode_gray_png(image: &image::GrayImage, dpi: u32) -> Result<Vec<u8>, png::EncodingError> {
    let pixels_per_meter = (dpi as f32 / METERS_PER_INCH).round() as u32;
    let mut out = Vec::new();

    let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: pixels_per_meter,
        yppu: pixels_per_meter,
        unit: png::Unit::Meter,
    }));

    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())?;
    writer.finish()?;

    Ok(out)
}
