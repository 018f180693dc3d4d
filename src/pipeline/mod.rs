//! Pipeline stages for grayscale conversion and image extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch rasterization backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! Conversion:
//! input ──▶ ghostscript ──▶ substitute ──▶ assemble ──▶ persist
//! (path)    (page PNGs)     (white→gray)   (lopdf doc)  (PDF + PNGs)
//!
//! Extraction:
//! input ──▶ images
//! (path)    (pdfium ──▶ base64 JPEG records)
//! ```
//!
//! 1. [`input`] — validate the user-supplied path and read its magic bytes
//! 2. [`ghostscript`] — locate the engine, rasterize pages, measure ink
//!    coverage; the only stage that spawns subprocesses
//! 3. [`substitute`] — replace background white with the configured gray
//! 4. [`assemble`] — build the output document from scratch with `lopdf`
//! 5. [`persist`] — serialize, write atomically, export per-page PNGs
//! 6. [`images`] — decode embedded images; runs in `spawn_blocking`
//!    because pdfium is not async-safe

pub mod assemble;
pub mod ghostscript;
pub mod images;
pub mod input;
pub mod persist;
pub mod substitute;
