//! Embedded-image extraction via pdfium.
//!
//! ## Why pdfium?
//!
//! Embedded PDF images arrive in whatever codec the producer chose (DCT,
//! JPX, CCITT, raw Flate) with optional soft masks and palette color
//! spaces. Pdfium decodes all of them to a plain bitmap through
//! `get_processed_image`, which is the same engine browsers ship for the
//! job.
//!
//! Extraction is tolerant by design: one undecodable image produces a
//! warning and the walk continues, so a single corrupt object never costs
//! the caller the rest of the document.

use crate::error::{Pdf2GrayError, PipelineWarning};
use crate::output::ExtractedImage;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

/// Images with either side below this are decorative (bullets, rules,
/// spacers) and are not extracted.
pub const MIN_IMAGE_DIMENSION: u32 = 50;

/// JPEG quality for re-encoded images.
const JPEG_QUALITY: u8 = 85;

/// Density stamped into re-encoded JPEGs.
const JPEG_DPI: u16 = 300;

/// Everything the extraction walk produced.
#[derive(Debug, Default)]
pub struct CollectedImages {
    pub images: Vec<ExtractedImage>,
    pub warnings: Vec<PipelineWarning>,
}

/// Locate a pdfium library to bind against.
///
/// Tries next to the executable first, then the conventional install
/// prefix, then the system loader path.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2GrayError> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib/",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Pdf2GrayError::PdfiumUnavailable {
            reason: e.to_string(),
        })?;
    Ok(Pdfium::new(bindings))
}

/// Walk every page of `pdf_path` and extract its qualifying embedded
/// images as base64 JPEG records.
///
/// Image numbering is document-global and counts only qualifying images,
/// so filenames stay dense even when small images are interleaved.
/// Blocking; call from a blocking context.
pub fn collect_document_images(pdf_path: &Path) -> Result<CollectedImages, Pdf2GrayError> {
    let pdfium = bind_pdfium()?;
    let document =
        pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| Pdf2GrayError::PdfOpenFailed {
                path: pdf_path.to_path_buf(),
                reason: e.to_string(),
            })?;

    let mut collected = CollectedImages::default();
    let mut counter = 0usize;

    for (page_index, page) in document.pages().iter().enumerate() {
        let page_number = page_index + 1;
        let mut image_index = 0usize;

        for object in page.objects().iter() {
            let Some(image_object) = object.as_image_object() else {
                continue;
            };

            match extract_one(image_object, &document, page_number, &mut counter) {
                Ok(Some((record, warning))) => {
                    collected.images.push(record);
                    collected.warnings.extend(warning);
                }
                Ok(None) => {
                    debug!(page = page_number, index = image_index, "Skipped small image");
                }
                Err(reason) => {
                    warn!(
                        page = page_number,
                        index = image_index,
                        %reason,
                        "Failed to extract embedded image"
                    );
                    collected.warnings.push(PipelineWarning::ImageSkipped {
                        page: page_number,
                        index: image_index,
                        reason,
                    });
                }
            }
            image_index += 1;
        }
    }

    debug!(
        images = collected.images.len(),
        warnings = collected.warnings.len(),
        "Extraction walk complete"
    );
    Ok(collected)
}

/// Decode, filter, normalize, and encode a single image object.
///
/// `Ok(None)` means the image fell below [`MIN_IMAGE_DIMENSION`]; the
/// counter is only advanced for images that qualify.
fn extract_one(
    image_object: &PdfPageImageObject,
    document: &PdfDocument,
    page_number: usize,
    counter: &mut usize,
) -> Result<Option<(ExtractedImage, Option<PipelineWarning>)>, String> {
    let decoded = image_object
        .get_processed_image(document)
        .map_err(|e| e.to_string())?;

    let (width, height) = (decoded.width(), decoded.height());
    if width < MIN_IMAGE_DIMENSION || height < MIN_IMAGE_DIMENSION {
        return Ok(None);
    }

    *counter += 1;
    let filename = image_filename(page_number, *counter);
    let colorspace = colorspace_name(decoded.color());
    let normalized = flatten_onto_white(decoded);

    let (bytes, warning) = match encode_jpeg(&normalized) {
        Ok(bytes) => (bytes, None),
        Err(reason) => {
            // Keep the decoded pixels losslessly rather than dropping the
            // image; the record keeps its JPEG labels.
            let bytes = encode_png(&normalized).map_err(|png_reason| {
                format!("JPEG encode failed ({reason}); PNG fallback failed ({png_reason})")
            })?;
            warn!(%filename, %reason, "Falling back to lossless re-encode");
            let warning = PipelineWarning::ImageRecodeFallback {
                filename: filename.clone(),
                reason,
            };
            (bytes, Some(warning))
        }
    };

    let record = ExtractedImage {
        base64: BASE64_STANDARD.encode(&bytes),
        size: bytes.len(),
        filename,
        page: page_number,
        width,
        height,
        format: "jpg".to_string(),
        mime_type: "image/jpeg".to_string(),
        colorspace: colorspace.to_string(),
    };
    Ok(Some((record, warning)))
}

fn image_filename(page_number: usize, counter: usize) -> String {
    format!("image_p{}_{}.jpg", page_number, counter)
}

/// The decoded bitmap's layout, recorded before normalization.
fn colorspace_name(color: image::ColorType) -> &'static str {
    match color {
        image::ColorType::L8 | image::ColorType::L16 => "gray",
        image::ColorType::La8 | image::ColorType::La16 => "gray-alpha",
        image::ColorType::Rgb8 | image::ColorType::Rgb16 | image::ColorType::Rgb32F => "rgb",
        image::ColorType::Rgba8 | image::ColorType::Rgba16 | image::ColorType::Rgba32F => "rgba",
        _ => "other",
    }
}

/// Composite any transparency onto a white background and return plain RGB.
///
/// JPEG has no alpha channel; compositing matches how the image looks on a
/// printed page, where the background behind it is paper.
fn flatten_onto_white(image: DynamicImage) -> image::RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut rgb = image::RgbImage::new(rgba.width(), rgba.height());
    for (source, target) in rgba.pixels().zip(rgb.pixels_mut()) {
        let [r, g, b, a] = source.0;
        let alpha = u32::from(a);
        let blend = |fg: u8| ((u32::from(fg) * alpha + 255 * (255 - alpha)) / 255) as u8;
        target.0 = [blend(r), blend(g), blend(b)];
    }
    rgb
}

fn encode_jpeg(image: &image::RgbImage) -> Result<Vec<u8>, String> {
    let width = u16::try_from(image.width()).map_err(|_| "image too wide for JPEG".to_string())?;
    let height =
        u16::try_from(image.height()).map_err(|_| "image too tall for JPEG".to_string())?;

    let mut out = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut out, JPEG_QUALITY);
    encoder.set_density(jpeg_encoder::Density::Inch {
        x: JPEG_DPI,
        y: JPEG_DPI,
    });
    encoder.set_optimized_huffman_tables(true);
    encoder
        .encode(image.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| e.to_string())?;
    Ok(out)
}

fn encode_png(image: &image::RgbImage) -> Result<Vec<u8>, String> {
    let mut out = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| e.to_string())?;
    Ok(out.into_inner())
}
