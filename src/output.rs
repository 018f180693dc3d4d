//! Output records for both pipelines.
//!
//! [`ConversionOutput`] is what a grayscale conversion run hands back:
//! where the artifacts landed, the run's statistics, the verification
//! verdict, and every non-fatal warning collected along the way.
//!
//! [`ExtractionResponse`] is the extraction command's stdout contract. Its
//! JSON shape is frozen — downstream consumers parse these exact keys — so
//! it gets its own type with smart constructors instead of being assembled
//! ad hoc at the print site.

use crate::error::PipelineWarning;
use crate::pipeline::ghostscript::InkCoverage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Conversion ───────────────────────────────────────────────────────────

/// Statistics for a completed conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages rasterized, substituted, and placed in the output.
    pub total_pages: usize,
    /// Size of the input PDF in bytes.
    pub input_bytes: u64,
    /// Size of the written output PDF in bytes.
    pub output_bytes: u64,
    /// Resolution the pages were rendered at.
    pub dpi: u32,
    /// Wall-clock time spent inside the rasterizer.
    pub rasterize_ms: u64,
    /// Wall-clock time for the whole run.
    pub total_ms: u64,
}

/// Result of a grayscale conversion run.
///
/// Returned by [`crate::convert`] once the primary output PDF has been
/// written. `warnings` holds every best-effort failure that occurred after
/// that point (side images, verification); an empty vector means a fully
/// clean run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Path the output PDF was written to.
    pub output_path: PathBuf,
    /// Sibling directory holding the per-page PNG images.
    pub images_dir: PathBuf,
    /// Ink coverage reported by the verification pass, when it ran.
    pub ink_coverage: Option<InkCoverage>,
    /// Run statistics.
    pub stats: ConversionStats,
    /// Non-fatal warnings collected during the run.
    pub warnings: Vec<PipelineWarning>,
}

// ── Extraction ───────────────────────────────────────────────────────────

/// One embedded image lifted out of the document.
///
/// Field names (and the `mimeType` casing) mirror the JSON contract exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// Synthetic filename: `image_p<page>_<counter>.jpg`.
    pub filename: String,
    /// Base64 (standard alphabet) of the encoded image bytes.
    pub base64: String,
    /// Originating page number, 1-indexed.
    pub page: usize,
    /// Pixel width before normalization.
    pub width: u32,
    /// Pixel height before normalization.
    pub height: u32,
    /// Always `"jpg"`.
    pub format: String,
    /// Always `"image/jpeg"`.
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Decoded pixel layout before normalization (`gray`, `rgb`, `rgba`, …).
    pub colorspace: String,
    /// Byte length of the encoded image (before base64 expansion).
    pub size: usize,
}

/// Library-level result of an extraction run.
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutput {
    /// Qualifying images in page order, then in-page encounter order.
    pub images: Vec<ExtractedImage>,
    /// Per-image failures and fallbacks that did not abort the run.
    pub warnings: Vec<PipelineWarning>,
}

/// The extraction command's single stdout JSON object.
///
/// Construct via [`ExtractionResponse::success`] or
/// [`ExtractionResponse::failure`]; the `success` field is part of the wire
/// shape and is set by the constructors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractionResponse {
    /// `{"success": true, "images": [...], "count": N}`
    Success {
        success: bool,
        images: Vec<ExtractedImage>,
        count: usize,
    },
    /// `{"success": false, "error": "..."}`
    Failure { success: bool, error: String },
}

impl ExtractionResponse {
    /// Wrap a completed image list (even an empty one — that is still a
    /// structural success).
    pub fn success(images: Vec<ExtractedImage>) -> Self {
        let count = images.len();
        Self::Success {
            success: true,
            images,
            count,
        }
    }

    /// Wrap a fatal extraction error.
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            success: false,
            error: error.into(),
        }
    }

    /// Pretty-printed JSON, ready for stdout.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    fn sample_image() -> ExtractedImage {
        let payload = vec![0xFFu8, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        ExtractedImage {
            filename: "image_p1_1.jpg".into(),
            base64: STANDARD.encode(&payload),
            page: 1,
            width: 640,
            height: 480,
            format: "jpg".into(),
            mime_type: "image/jpeg".into(),
            colorspace: "rgb".into(),
            size: payload.len(),
        }
    }

    #[test]
    fn success_response_has_contract_keys() {
        let resp = ExtractionResponse::success(vec![sample_image()]);
        let v = serde_json::to_value(&resp).unwrap();

        assert_eq!(v["success"], true);
        assert_eq!(v["count"], 1);
        assert_eq!(v["images"][0]["mimeType"], "image/jpeg");
        assert_eq!(v["images"][0]["format"], "jpg");
        assert_eq!(v["images"][0]["page"], 1);
        assert!(v.get("error").is_none());
    }

    #[test]
    fn empty_success_is_count_zero() {
        let resp = ExtractionResponse::success(vec![]);
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["success"], true);
        assert_eq!(v["count"], 0);
        assert_eq!(v["images"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn failure_response_has_contract_keys() {
        let resp = ExtractionResponse::failure("PDF file not found: x.pdf");
        let v = serde_json::to_value(&resp).unwrap();

        assert_eq!(v["success"], false);
        assert_eq!(v["error"], "PDF file not found: x.pdf");
        assert!(v.get("images").is_none());
        assert!(v.get("count").is_none());
    }

    #[test]
    fn base64_decodes_to_declared_size() {
        let img = sample_image();
        let decoded = STANDARD.decode(&img.base64).unwrap();
        assert_eq!(decoded.len(), img.size);
    }

    #[test]
    fn stats_round_trip_through_serde() {
        let stats = ConversionStats {
            total_pages: 4,
            input_bytes: 1_048_576,
            output_bytes: 900_000,
            dpi: 300,
            rasterize_ms: 1234,
            total_ms: 2345,
        };
        let json = serde_json::to_string(&stats).unwrap();
        let back: ConversionStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total_pages, 4);
        assert_eq!(back.dpi, 300);
    }
}
