//! Output document assembly: build a fresh PDF whose pages are the
//! substituted bitmaps.
//!
//! ## Why build from scratch instead of editing the source?
//!
//! The source document's page objects drag along fonts, annotations, color
//! spaces, and link trees that no longer apply once the page is a single
//! grayscale image. Starting from an empty [`lopdf::Document`] keeps the
//! output minimal: per page, one background stream, one image stream, and
//! one `DeviceGray` XObject.
//!
//! Pages are created on an A4 canvas with the configured gray painted
//! across it, then the media box is shrunk to the placed image's extent
//! when the bitmap arrives. The background stays first in the `Contents`
//! array so the image always paints over it.

use crate::error::Pdf2GrayError;
use crate::pipeline::substitute::RenderedPage;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::GrayImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

const A4_WIDTH_PT: f32 = 595.0;
const A4_HEIGHT_PT: f32 = 842.0;
const POINTS_PER_INCH: f32 = 72.0;

/// Convert a pixel extent at `dpi` into PDF points.
pub(crate) fn px_to_points(px: u32, dpi: u32) -> f32 {
    px as f32 / dpi as f32 * POINTS_PER_INCH
}

/// Incremental builder for the grayscale output document.
///
/// Create it with the final page count, call [`place_page`] once per
/// rendered page, then [`finish`] to obtain the complete document.
///
/// [`place_page`]: DocumentBuilder::place_page
/// [`finish`]: DocumentBuilder::finish
pub struct DocumentBuilder {
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl DocumentBuilder {
    /// Start a document with `page_count` A4 pages, each pre-painted with
    /// the background gray (`0.0` black to `1.0` white).
    pub fn new(page_count: usize, gray_level: f32) -> Result<Self, Pdf2GrayError> {
        let mut doc = Document::with_version("1.5");
        let mut page_ids = Vec::with_capacity(page_count);

        for _ in 0..page_count {
            let encoded = Content {
                operations: background_ops(gray_level),
            }
            .encode()?;
            let content_id = doc.add_object(Object::Stream(Stream::new(
                Dictionary::new(),
                encoded,
            )));

            let mut page = Dictionary::new();
            page.set("Type", Object::Name(b"Page".to_vec()));
            page.set(
                "MediaBox",
                Object::Array(vec![
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(A4_WIDTH_PT),
                    Object::Real(A4_HEIGHT_PT),
                ]),
            );
            page.set("Contents", Object::Reference(content_id));
            page.set("Resources", Object::Dictionary(Dictionary::new()));
            page_ids.push(doc.add_object(Object::Dictionary(page)));
        }

        Ok(Self { doc, page_ids })
    }

    /// Place a substituted page bitmap onto its slot.
    ///
    /// Shrinks the page's media box to the image's physical extent at `dpi`
    /// and appends an image-drawing stream after the background stream.
    pub fn place_page(&mut self, page: &RenderedPage, dpi: u32) -> Result<(), Pdf2GrayError> {
        let page_id = *self.page_ids.get(page.index).ok_or_else(|| {
            Pdf2GrayError::Internal(format!(
                "page index {} out of range for {}-page document",
                page.index,
                self.page_ids.len()
            ))
        })?;

        let width_pt = px_to_points(page.width(), dpi);
        let height_pt = px_to_points(page.height(), dpi);

        let image_id = self
            .doc
            .add_object(Object::Stream(grayscale_xobject(&page.image)?));

        let name = format!("Im{}", page.index);
        let encoded = Content {
            operations: image_ops(&name, width_pt, height_pt),
        }
        .encode()?;
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(Dictionary::new(), encoded)));

        let mut xobjects = Dictionary::new();
        xobjects.set(name, Object::Reference(image_id));
        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        let page_dict = self.doc.get_object_mut(page_id)?.as_dict_mut()?;
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(width_pt),
                Object::Real(height_pt),
            ]),
        );
        page_dict.set("Resources", Object::Dictionary(resources));

        let existing = page_dict.get(b"Contents").ok().cloned();
        match existing {
            Some(Object::Reference(background_id)) => {
                page_dict.set(
                    "Contents",
                    Object::Array(vec![
                        Object::Reference(background_id),
                        Object::Reference(content_id),
                    ]),
                );
            }
            Some(Object::Array(mut streams)) => {
                streams.push(Object::Reference(content_id));
                page_dict.set("Contents", Object::Array(streams));
            }
            _ => {
                page_dict.set("Contents", Object::Reference(content_id));
            }
        }

        Ok(())
    }

    /// Wire up the page tree and catalog, consuming the builder.
    pub fn finish(mut self) -> Result<Document, Pdf2GrayError> {
        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|id| Object::Reference(*id))
            .collect();

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(kids));
        pages.set("Count", Object::Integer(self.page_ids.len() as i64));
        let pages_id = self.doc.add_object(Object::Dictionary(pages));

        for page_id in &self.page_ids {
            if let Some(Object::Dictionary(dict)) = self.doc.objects.get_mut(page_id) {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = self.doc.add_object(Object::Dictionary(catalog));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        Ok(self.doc)
    }
}

/// Pack a grayscale bitmap into a Flate-compressed `DeviceGray` image
/// XObject stream.
fn grayscale_xobject(image: &GrayImage) -> Result<Stream, Pdf2GrayError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(image.as_raw())
        .and_then(|_| encoder.finish())
        .map_err(|e| Pdf2GrayError::Internal(format!("Failed to compress page image: {}", e)))
        .map(|compressed| {
            let mut dict = Dictionary::new();
            dict.set("Type", Object::Name(b"XObject".to_vec()));
            dict.set("Subtype", Object::Name(b"Image".to_vec()));
            dict.set("Width", Object::Integer(i64::from(image.width())));
            dict.set("Height", Object::Integer(i64::from(image.height())));
            dict.set("ColorSpace", Object::Name(b"DeviceGray".to_vec()));
            dict.set("BitsPerComponent", Object::Integer(8));
            dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
            Stream::new(dict, compressed)
        })
}

fn background_ops(gray: f32) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("g", vec![Object::Real(gray)]),
        Operation::new(
            "re",
            vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(A4_WIDTH_PT),
                Object::Real(A4_HEIGHT_PT),
            ],
        ),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ]
}

fn image_ops(name: &str, width_pt: f32, height_pt: f32) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                Object::Real(width_pt),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(height_pt),
                Object::Real(0.0),
                Object::Real(0.0),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}
