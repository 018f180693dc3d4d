//! Embedded-image extraction entry points.
//!
//! ## Why typed records instead of JSON?
//!
//! The library hands back [`ExtractionOutput`] with one [`ExtractedImage`]
//! per qualifying embedded image; the JSON envelope consumers see on stdout
//! is the CLI's concern (see [`crate::output::ExtractionResponse`]). That
//! split keeps the walk testable without string-matching serialized output.
//!
//! [`ExtractedImage`]: crate::output::ExtractedImage

use crate::error::Pdf2GrayError;
use crate::output::ExtractionOutput;
use crate::pipeline::images;
use std::path::PathBuf;
use tracing::info;

/// Extract every qualifying embedded image from `pdf_path`.
///
/// Images smaller than
/// [`MIN_IMAGE_DIMENSION`](crate::pipeline::images::MIN_IMAGE_DIMENSION)
/// on either side are skipped. Per-image decode failures become warnings
/// on the returned output, not errors.
///
/// # Errors
/// Returns `Err(Pdf2GrayError)` when the file is missing, pdfium cannot be
/// bound, or the document cannot be opened at all.
pub async fn extract_images(pdf_path: impl AsRef<str>) -> Result<ExtractionOutput, Pdf2GrayError> {
    let pdf_path = pdf_path.as_ref();
    info!("Extracting embedded images: {}", pdf_path);

    let path = PathBuf::from(pdf_path);
    if !path.exists() {
        return Err(Pdf2GrayError::FileNotFound { path });
    }

    // pdfium is not async-safe; the whole walk runs on a blocking thread.
    let collected = tokio::task::spawn_blocking(move || images::collect_document_images(&path))
        .await
        .map_err(|e| Pdf2GrayError::Internal(format!("Extraction task panicked: {}", e)))??;

    info!(
        "Extracted {} images ({} warnings)",
        collected.images.len(),
        collected.warnings.len()
    );
    Ok(ExtractionOutput {
        images: collected.images,
        warnings: collected.warnings,
    })
}
