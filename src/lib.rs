//! # pdf2gray
//!
//! Convert PDF documents to print-friendly grayscale and extract their
//! embedded images.
//!
//! ## Why this crate?
//!
//! Color-managed PDFs are hostile to bulk printing and annotation review: a
//! stark white background dominates toner-saving drivers and glares on
//! e-paper, and "convert to grayscale" filters in viewers miss vector art,
//! shading, and transparency. This crate rasterizes every page through
//! Ghostscript's grayscale device, swaps the paper white for a configurable
//! soft gray, and reassembles a compact image-backed PDF, then verifies the
//! result really carries no chromatic ink. A second entry point walks a
//! PDF's embedded images and hands them back as base64 JPEG records for
//! downstream tooling.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Conversion                                 Extraction
//! PDF                                        PDF
//!  │                                          │
//!  ├─ 1. Input      validate path + magic     ├─ 1. Input    existence check
//!  ├─ 2. Rasterize  Ghostscript pnggray       └─ 2. Images   pdfium decode,
//!  ├─ 3. Substitute white → gray pixels                      white-flatten,
//!  ├─ 4. Assemble   lopdf DeviceGray pages                   JPEG + base64
//!  ├─ 5. Persist    atomic PDF + side PNGs
//!  └─ 6. Verify     inkcov coverage check
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2gray::{convert, extract_images, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().dpi(300).build()?;
//!     let output = convert("report.pdf", "report_gray.pdf", &config).await?;
//!     eprintln!(
//!         "{} pages in {}ms, {} warnings",
//!         output.stats.total_pages,
//!         output.stats.total_ms,
//!         output.warnings.len()
//!     );
//!
//!     let extraction = extract_images("report.pdf").await?;
//!     eprintln!("{} embedded images", extraction.images.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2gray` and `pdf2gray-extract` binaries (clap + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2gray = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, MAX_DPI, MIN_DPI};
pub use convert::{convert, convert_sync};
pub use error::{Pdf2GrayError, PipelineWarning};
pub use extract::extract_images;
pub use output::{
    ConversionOutput, ConversionStats, ExtractedImage, ExtractionOutput, ExtractionResponse,
};
pub use pipeline::ghostscript::InkCoverage;
pub use progress::{ConversionProgressCallback, NoopProgressCallback};
