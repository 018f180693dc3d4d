//! White-pixel substitution on rasterized pages.
//!
//! ## Why substitute instead of invert or tint?
//!
//! The target output is a document whose paper background is a light gray
//! while ink stays exactly as rendered. Antialiased glyph edges leave
//! near-white halo pixels around text, so substituting only pure white
//! (255) would leave a white fringe on every letter. The threshold of
//! [`WHITE_THRESHOLD`] catches the halo as well; everything below it is
//! treated as content and left untouched.

use crate::error::Pdf2GrayError;
use image::GrayImage;
use std::path::PathBuf;

/// Luma value at and above which a pixel counts as background white.
pub const WHITE_THRESHOLD: u8 = 240;

/// One rasterized page, in source order.
#[derive(Debug)]
pub struct RenderedPage {
    /// Zero-based position in the document.
    pub index: usize,
    /// 8-bit grayscale pixels at the configured resolution.
    pub image: GrayImage,
}

impl RenderedPage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decode the rasterizer's PNG files into page bitmaps.
///
/// `paths` must already be sorted; the returned pages keep that order and
/// record it in [`RenderedPage::index`].
pub fn load_pages(paths: &[PathBuf]) -> Result<Vec<RenderedPage>, Pdf2GrayError> {
    let mut pages = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        let image = image::open(path)
            .map_err(|e| {
                Pdf2GrayError::Internal(format!(
                    "Failed to decode rendered page {}: {}",
                    path.display(),
                    e
                ))
            })?
            .to_luma8();
        pages.push(RenderedPage { index, image });
    }
    Ok(pages)
}

/// Replace every background-white pixel with `gray`, in place.
///
/// Idempotent for any `gray` below [`WHITE_THRESHOLD`]: a second pass finds
/// no remaining white to substitute.
pub fn substitute_white(image: &mut GrayImage, gray: u8) {
    for pixel in image.pixels_mut() {
        if pixel.0[0] >= WHITE_THRESHOLD {
            pixel.0[0] = gray;
        }
    }
}
