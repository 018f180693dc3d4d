//! Error types for the pdf2gray library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2GrayError`] — **Fatal**: the run cannot proceed at all (missing
//!   input, no rasterizer installed, the engine failed or timed out, the
//!   output could not be written). Returned as `Err(Pdf2GrayError)` from the
//!   top-level `convert*` / `extract_images` functions; nothing is retried.
//!
//! * [`PipelineWarning`] — **Non-fatal**: a best-effort side operation failed
//!   (a side-directory image could not be saved, the verification pass could
//!   not run, one embedded image could not be decoded). Collected into
//!   [`crate::output::ConversionOutput`] / [`crate::output::ExtractionOutput`]
//!   and surfaced at the end of the run, never aborting it.
//!
//! The rule throughout: a run whose primary artifact succeeded is a success,
//! no matter how many side operations had to be skipped along the way.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2gray library.
///
/// Best-effort failures use [`PipelineWarning`] and are stored in the run
/// output rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2GrayError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Rasterizer errors ─────────────────────────────────────────────────
    /// No Ghostscript executable responded to a version probe.
    #[error(
        "Ghostscript not found!\n\n\
Installation instructions:\n\
  Windows: Download from https://ghostscript.com/releases/gsdnld.html\n\
  Linux:   sudo apt-get install ghostscript\n\
  Mac:     brew install ghostscript"
    )]
    GhostscriptNotFound,

    /// Ghostscript exited with a non-zero status while rasterizing pages.
    ///
    /// `stderr`/`stdout` carry the engine's captured diagnostic output
    /// verbatim.
    #[error("Ghostscript rasterization failed ({status})\nstderr: {stderr}\nstdout: {stdout}")]
    RasterizeFailed {
        status: String,
        stderr: String,
        stdout: String,
    },

    /// The rasterization run exceeded its time budget.
    #[error("Ghostscript rasterization timed out after {secs}s\nThe input may be very large; try a lower --dpi.")]
    RasterizeTimeout { secs: u64 },

    /// Ghostscript exited cleanly but produced no page images.
    #[error("Ghostscript produced no page images\nTemp directory contents: {listing}")]
    NoPagesRendered { listing: String },

    // ── Assembly / persistence errors ─────────────────────────────────────
    /// Building or serializing the output document failed.
    #[error("PDF assembly failed: {0}")]
    Assembly(#[from] lopdf::Error),

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to the pdfium library: {reason}\n\n\
Install pdfium as a system library, or place the shared library next to\n\
the executable. Prebuilt binaries:\n\
  https://github.com/bblanchon/pdfium-binaries/releases"
    )]
    PdfiumUnavailable { reason: String },

    /// The document could not be opened for extraction.
    #[error("Failed to open PDF '{path}': {reason}")]
    PdfOpenFailed { path: PathBuf, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal warning from a best-effort pipeline step.
///
/// Warnings accumulate in the run output; callers surface them after the
/// primary artifact has been produced. A warning never fails a run.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PipelineWarning {
    /// A side-directory page image could not be written.
    #[error("could not save page image '{path}': {reason}")]
    SideImageSave { path: String, reason: String },

    /// The grayscale verification pass could not run at all.
    #[error("grayscale verification could not run: {reason}")]
    VerificationFailed { reason: String },

    /// The verification pass ran and found residual color ink coverage.
    #[error("color detected in output: C={cyan:.4} M={magenta:.4} Y={yellow:.4}")]
    ColorDetected { cyan: f32, magenta: f32, yellow: f32 },

    /// One embedded image could not be decoded; the rest continue.
    #[error("page {page}: skipped embedded image {index}: {reason}")]
    ImageSkipped {
        page: usize,
        index: usize,
        reason: String,
    },

    /// JPEG re-encoding failed for one image; its bytes were used as-is.
    #[error("'{filename}': JPEG re-encode failed, using unrecoded image bytes: {reason}")]
    ImageRecodeFallback { filename: String, reason: String },
}
