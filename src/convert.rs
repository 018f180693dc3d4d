//! Grayscale conversion entry points.
//!
//! ## Why a single eager pass?
//!
//! The pipeline's cost is dominated by the rasterizer, and Ghostscript
//! renders the whole document in one invocation. Streaming pages back
//! one-by-one would buy nothing, so the API waits for the complete run and
//! returns one [`ConversionOutput`] with the artifact paths, stats, and
//! any non-fatal warnings collected along the way.

use crate::config::ConversionConfig;
use crate::error::{Pdf2GrayError, PipelineWarning};
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::ghostscript::Ghostscript;
use crate::pipeline::substitute::RenderedPage;
use crate::pipeline::{assemble, input, persist, substitute};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a PDF to a gray-background grayscale PDF.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input` — Local path to the source PDF
/// * `output` — Path the converted PDF is written to
/// * `config` — Conversion configuration
///
/// # Returns
/// `Ok(ConversionOutput)` once the PDF is on disk, even if side images or
/// verification produced warnings (check `output.warnings`).
///
/// # Errors
/// Returns `Err(Pdf2GrayError)` only for fatal errors:
/// - File not found / permission denied / not a valid PDF
/// - Ghostscript missing, failing, or timing out
/// - The output PDF could not be assembled or written
pub async fn convert(
    input: impl AsRef<str>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2GrayError> {
    let total_start = Instant::now();
    let input = input.as_ref();
    let output_path = output.as_ref().to_path_buf();
    info!("Starting grayscale conversion: {}", input);

    // ── Step 1: Validate input ───────────────────────────────────────────
    let resolved = input::resolve_input(input)?;
    let input_bytes = resolved.size_bytes;

    // ── Step 2: Locate Ghostscript ───────────────────────────────────────
    let engine = Ghostscript::locate().await?;
    debug!("Using Ghostscript binary: {}", engine.binary());

    // ── Step 3: Rasterize pages ──────────────────────────────────────────
    let rasterize_start = Instant::now();
    let work_dir = tempfile::TempDir::new()
        .map_err(|e| Pdf2GrayError::Internal(format!("Failed to create work directory: {}", e)))?;
    let page_files = engine
        .rasterize(&resolved.path, work_dir.path(), config.dpi)
        .await?;
    let rasterize_ms = rasterize_start.elapsed().as_millis() as u64;
    let total_pages = page_files.len();
    info!("Rasterized {} pages in {}ms", total_pages, rasterize_ms);

    // Fire on_conversion_start only now: the page count is not known until
    // the rasterizer has run.
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total_pages);
    }

    // ── Steps 4-6: Substitute, assemble, serialize ───────────────────────
    // PNG decode, pixel substitution, and Flate compression are CPU-bound,
    // so the whole middle of the pipeline runs on a blocking thread.
    let dpi = config.dpi;
    let gray_level = config.gray_level;
    let gray_value = config.gray_value();
    let callback = config.progress_callback.clone();
    let assembled = tokio::task::spawn_blocking(
        move || -> Result<(Vec<u8>, Vec<RenderedPage>), Pdf2GrayError> {
            let mut pages = substitute::load_pages(&page_files)?;
            let mut builder = assemble::DocumentBuilder::new(pages.len(), gray_level)?;

            for page in &mut pages {
                let page_num = page.index + 1;
                if let Some(ref cb) = callback {
                    cb.on_page_start(page_num, total_pages);
                }
                substitute::substitute_white(&mut page.image, gray_value);
                builder.place_page(page, dpi)?;
                if let Some(ref cb) = callback {
                    cb.on_page_complete(page_num, total_pages, page.width(), page.height());
                }
            }

            let bytes = persist::serialize_document(builder.finish()?)?;
            Ok((bytes, pages))
        },
    )
    .await
    .map_err(|e| Pdf2GrayError::Internal(format!("Conversion task panicked: {}", e)))?;
    let (pdf_bytes, pages) = assembled?;

    // ── Step 7: Persist the PDF, then the side images ────────────────────
    persist::write_atomic(&output_path, &pdf_bytes).await?;
    info!("Wrote converted PDF to {}", output_path.display());

    let images_dir = images_dir_for(&output_path);
    let side_dir = images_dir.clone();
    let mut warnings =
        tokio::task::spawn_blocking(move || persist::save_side_images(&pages, &side_dir, dpi))
            .await
            .map_err(|e| Pdf2GrayError::Internal(format!("Side-image task panicked: {}", e)))?;

    // ── Step 8: Verify the output is actually grayscale ──────────────────
    let ink_coverage = if config.verify {
        match engine.ink_coverage(&output_path).await {
            Ok(coverage) => {
                if !coverage.is_grayscale() {
                    warnings.push(PipelineWarning::ColorDetected {
                        cyan: coverage.cyan,
                        magenta: coverage.magenta,
                        yellow: coverage.yellow,
                    });
                }
                Some(coverage)
            }
            // The PDF is already on disk; a broken verifier must not fail
            // the run.
            Err(e) => {
                warn!("Ink-coverage verification failed: {}", e);
                warnings.push(PipelineWarning::VerificationFailed {
                    reason: e.to_string(),
                });
                None
            }
        }
    } else {
        None
    };

    // ── Step 9: Compute stats ────────────────────────────────────────────
    let stats = ConversionStats {
        total_pages,
        input_bytes,
        output_bytes: pdf_bytes.len() as u64,
        dpi: config.dpi,
        rasterize_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Conversion complete: {} pages, {}ms total",
        total_pages, stats.total_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total_pages);
    }

    Ok(ConversionOutput {
        output_path,
        images_dir,
        ink_coverage,
        stats,
        warnings,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<str>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2GrayError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2GrayError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, output, config))
}

/// The side-image directory lives next to the output PDF.
fn images_dir_for(output_path: &Path) -> PathBuf {
    output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join("converted_images")
}
