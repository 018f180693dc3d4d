//! Input resolution: validate a user-supplied path before heavy work begins.
//!
//! ## Why validate up front?
//!
//! The rasterizer is an external process with its own error reporting; fed a
//! missing or non-PDF file it produces a wall of engine diagnostics instead
//! of a one-line answer. Checking existence, readability, and the `%PDF`
//! magic bytes here means every invalid-input failure surfaces before the
//! engine is even probed, with an actionable message.

use crate::error::Pdf2GrayError;
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;

/// A validated input document.
#[derive(Debug)]
pub struct ResolvedInput {
    /// The input path as given.
    pub path: PathBuf,
    /// File size in bytes, for the run report.
    pub size_bytes: u64,
}

/// Validate a local PDF path: existence, readability, and magic bytes.
pub fn resolve_input(path_str: &str) -> Result<ResolvedInput, Pdf2GrayError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(Pdf2GrayError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2GrayError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2GrayError::FileNotFound { path });
        }
    };

    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) if &magic == b"%PDF" => {}
        Ok(()) => return Err(Pdf2GrayError::NotAPdf { path, magic }),
        // Shorter than the magic itself: cannot be a PDF.
        Err(_) => {
            return Err(Pdf2GrayError::NotAPdf {
                path,
                magic: [0; 4],
            })
        }
    }

    let size_bytes = file
        .metadata()
        .map_err(|e| Pdf2GrayError::Internal(format!("Failed to stat input: {}", e)))?
        .len();

    debug!(path = %path.display(), size_bytes, "Resolved input PDF");
    Ok(ResolvedInput { path, size_bytes })
}
