//! End-to-end integration tests for pdf2gray.
//!
//! The conversion tests shell out to a real Ghostscript binary and the
//! extraction tests load a real pdfium library, so everything heavyweight is
//! gated behind the `E2E_ENABLED` environment variable plus a per-tool
//! availability probe. Fixture PDFs are generated in memory with lopdf, so
//! there is nothing to download.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_convert_color_document -- --nocapture

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdf2gray::pipeline::ghostscript::Ghostscript;
use pdf2gray::pipeline::images::bind_pdfium;
use pdf2gray::{
    convert, convert_sync, extract_images, ConversionConfig, ConversionProgressCallback,
    ExtractionResponse, NoopProgressCallback, PipelineWarning,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_enabled {
    () => {
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    };
}

async fn ghostscript_available() -> bool {
    Ghostscript::locate().await.is_ok()
}

fn pdfium_available() -> bool {
    bind_pdfium().is_ok()
}

fn workspace() -> tempfile::TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Wire a page list into a pages tree plus catalog and serialize.
fn finish_fixture(mut doc: Document, page_ids: Vec<ObjectId>) -> Vec<u8> {
    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Kids", Object::Array(kids));
    pages.set("Count", Object::Integer(page_ids.len() as i64));
    let pages_id = doc.add_object(Object::Dictionary(pages));

    for page_id in &page_ids {
        if let Some(Object::Dictionary(dict)) = doc.objects.get_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("fixture must serialize");
    bytes
}

/// Build a PDF with `pages` A4 pages, each painting a red rectangle on the
/// default white background. Chromatic on purpose: conversion must flatten
/// it to pure grayscale.
fn color_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let mut page_ids = Vec::with_capacity(pages);

    for _ in 0..pages {
        let encoded = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "rg",
                    vec![Object::Real(1.0), Object::Real(0.0), Object::Real(0.0)],
                ),
                Operation::new(
                    "re",
                    vec![
                        Object::Real(100.0),
                        Object::Real(500.0),
                        Object::Real(300.0),
                        Object::Real(200.0),
                    ],
                ),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ],
        }
        .encode()
        .expect("content must encode");
        let content_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), encoded)));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(595.0),
                Object::Real(842.0),
            ]),
        );
        page.set("Contents", Object::Reference(content_id));
        page.set("Resources", Object::Dictionary(Dictionary::new()));
        page_ids.push(doc.add_object(Object::Dictionary(page)));
    }

    finish_fixture(doc, page_ids)
}

/// Build a one-page PDF embedding one uncompressed `DeviceRGB` image
/// XObject per `(width, height)` entry, each drawn at its native pixel size
/// so pdfium reports the same dimensions back.
fn image_pdf(dims: &[(u32, u32)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");

    let mut xobjects = Dictionary::new();
    let mut operations = Vec::new();
    let mut x_offset = 40.0f32;
    for (i, &(w, h)) in dims.iter().enumerate() {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(i64::from(w)));
        dict.set("Height", Object::Integer(i64::from(h)));
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        let data = vec![0x7Fu8; (w * h * 3) as usize];
        let image_id = doc.add_object(Object::Stream(Stream::new(dict, data)));

        let name = format!("Im{i}");
        xobjects.set(name.clone(), Object::Reference(image_id));
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "cm",
            vec![
                Object::Real(w as f32),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(h as f32),
                Object::Real(x_offset),
                Object::Real(40.0),
            ],
        ));
        operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        operations.push(Operation::new("Q", vec![]));
        x_offset += w as f32 + 20.0;
    }

    let encoded = Content { operations }.encode().expect("content must encode");
    let content_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), encoded)));

    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set(
        "MediaBox",
        Object::Array(vec![
            Object::Real(0.0),
            Object::Real(0.0),
            Object::Real(595.0),
            Object::Real(842.0),
        ]),
    );
    page.set("Contents", Object::Reference(content_id));
    page.set("Resources", Object::Dictionary(resources));
    let page_id = doc.add_object(Object::Dictionary(page));

    finish_fixture(doc, vec![page_id])
}

// ── Conversion e2e (needs Ghostscript) ───────────────────────────────────────

/// Full pipeline on a three-page color document: output keeps the page
/// count, writes a PNG per page, and carries zero chromatic ink.
#[tokio::test]
async fn test_convert_color_document() {
    e2e_skip_unless_enabled!();
    if !ghostscript_available().await {
        println!("SKIP — Ghostscript not found on PATH");
        return;
    }

    let dir = workspace();
    let input = dir.path().join("color.pdf");
    std::fs::write(&input, color_pdf(3)).expect("write fixture");
    let output = dir.path().join("out/color_gray.pdf");

    let config = ConversionConfig::builder()
        .dpi(72) // keep the raster small
        .build()
        .expect("valid config");

    let result = convert(input.to_str().unwrap(), &output, &config)
        .await
        .expect("conversion should succeed");

    // Page count survives the round trip.
    assert_eq!(result.stats.total_pages, 3);
    let converted = Document::load(&output).expect("output must parse as a PDF");
    assert_eq!(converted.get_pages().len(), 3);

    // One PNG per page, next to the output.
    assert_eq!(result.images_dir, dir.path().join("out/converted_images"));
    for n in 1..=3 {
        let png = result.images_dir.join(format!("page_{n:04}.png"));
        assert!(png.exists(), "missing side image {}", png.display());
    }

    // The red rectangle must be gone: ink coverage reports zero CMY.
    let coverage = result.ink_coverage.expect("verification ran");
    assert!(
        coverage.is_grayscale(),
        "output still carries color: {coverage:?}"
    );
    assert!(
        !result
            .warnings
            .iter()
            .any(|w| matches!(w, PipelineWarning::ColorDetected { .. })),
        "unexpected warnings: {:?}",
        result.warnings
    );

    assert!(result.stats.input_bytes > 0);
    assert!(result.stats.output_bytes > 0);
    assert!(result.stats.total_ms >= result.stats.rasterize_ms);

    println!(
        "[convert-color] {} pages, {} -> {} bytes, {} ms",
        result.stats.total_pages,
        result.stats.input_bytes,
        result.stats.output_bytes,
        result.stats.total_ms
    );
}

/// Every page fires a start and a complete hook, and the bracketing
/// conversion hooks carry the page total.
#[tokio::test]
async fn test_progress_callbacks_fire_per_page() {
    e2e_skip_unless_enabled!();
    if !ghostscript_available().await {
        println!("SKIP — Ghostscript not found on PATH");
        return;
    }

    struct CountingCallback {
        announced: AtomicUsize,
        started: AtomicUsize,
        completed: AtomicUsize,
        finished: AtomicUsize,
    }

    impl ConversionProgressCallback for CountingCallback {
        fn on_conversion_start(&self, total_pages: usize) {
            self.announced.store(total_pages, Ordering::SeqCst);
        }
        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, width: u32, height: u32) {
            assert!(width > 0 && height > 0, "page dimensions must be reported");
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_conversion_complete(&self, total_pages: usize) {
            self.finished.store(total_pages, Ordering::SeqCst);
        }
    }

    let dir = workspace();
    let input = dir.path().join("two_pages.pdf");
    std::fs::write(&input, color_pdf(2)).expect("write fixture");
    let output = dir.path().join("two_pages_gray.pdf");

    let callback = Arc::new(CountingCallback {
        announced: AtomicUsize::new(0),
        started: AtomicUsize::new(0),
        completed: AtomicUsize::new(0),
        finished: AtomicUsize::new(0),
    });

    let config = ConversionConfig::builder()
        .dpi(72)
        .verify(false)
        .progress_callback(Arc::clone(&callback) as Arc<dyn ConversionProgressCallback>)
        .build()
        .expect("valid config");

    convert(input.to_str().unwrap(), &output, &config)
        .await
        .expect("conversion should succeed");

    assert_eq!(callback.announced.load(Ordering::SeqCst), 2);
    assert_eq!(callback.started.load(Ordering::SeqCst), 2);
    assert_eq!(callback.completed.load(Ordering::SeqCst), 2);
    assert_eq!(callback.finished.load(Ordering::SeqCst), 2);

    println!("[callbacks] all hooks fired for 2 pages");
}

/// `verify(false)` skips the ink-coverage pass entirely.
#[tokio::test]
async fn test_no_verify_skips_ink_check() {
    e2e_skip_unless_enabled!();
    if !ghostscript_available().await {
        println!("SKIP — Ghostscript not found on PATH");
        return;
    }

    let dir = workspace();
    let input = dir.path().join("one_page.pdf");
    std::fs::write(&input, color_pdf(1)).expect("write fixture");
    let output = dir.path().join("one_page_gray.pdf");

    let config = ConversionConfig::builder()
        .dpi(72)
        .verify(false)
        .build()
        .expect("valid config");

    let result = convert(input.to_str().unwrap(), &output, &config)
        .await
        .expect("conversion should succeed");

    assert!(result.ink_coverage.is_none(), "verification must not run");
    assert!(
        !result
            .warnings
            .iter()
            .any(|w| matches!(w, PipelineWarning::VerificationFailed { .. })),
        "no verification warning expected: {:?}",
        result.warnings
    );
}

/// Two runs over the same input at the same DPI produce the same page count
/// and bit-identical page pixels, observed through the side PNGs.
#[tokio::test]
async fn test_conversion_is_reproducible() {
    e2e_skip_unless_enabled!();
    if !ghostscript_available().await {
        println!("SKIP — Ghostscript not found on PATH");
        return;
    }

    let dir = workspace();
    let input = dir.path().join("repeat.pdf");
    std::fs::write(&input, color_pdf(2)).expect("write fixture");

    let config = ConversionConfig::builder()
        .dpi(72)
        .verify(false)
        .build()
        .expect("valid config");

    let first = convert(
        input.to_str().unwrap(),
        &dir.path().join("a/out.pdf"),
        &config,
    )
    .await
    .expect("first run should succeed");
    let second = convert(
        input.to_str().unwrap(),
        &dir.path().join("b/out.pdf"),
        &config,
    )
    .await
    .expect("second run should succeed");

    assert_eq!(first.stats.total_pages, second.stats.total_pages);
    for n in 1..=2 {
        let name = format!("page_{n:04}.png");
        let a = std::fs::read(first.images_dir.join(&name)).expect("first side image");
        let b = std::fs::read(second.images_dir.join(&name)).expect("second side image");
        assert_eq!(a, b, "page {n} pixels must be bit-identical across runs");
    }
}

/// The blocking wrapper drives the same pipeline from a plain thread.
#[test]
fn test_convert_sync_from_a_plain_thread() {
    e2e_skip_unless_enabled!();
    let available = tokio::runtime::Runtime::new()
        .expect("probe runtime")
        .block_on(ghostscript_available());
    if !available {
        println!("SKIP — Ghostscript not found on PATH");
        return;
    }

    let dir = workspace();
    let input = dir.path().join("sync.pdf");
    std::fs::write(&input, color_pdf(1)).expect("write fixture");
    let output = dir.path().join("sync_gray.pdf");

    let config = ConversionConfig::builder()
        .dpi(72)
        .verify(false)
        .build()
        .expect("valid config");

    let result = convert_sync(input.to_str().unwrap(), &output, &config)
        .expect("conversion should succeed");

    assert_eq!(result.stats.total_pages, 1);
    assert!(output.exists(), "output PDF must be on disk");
}

// ── Extraction e2e (needs pdfium) ────────────────────────────────────────────

/// A 64x64 embedded image is re-encoded as JPEG; a 16x16 one is skipped and
/// does not consume a filename slot.
#[tokio::test]
async fn test_extract_embedded_images_skips_small() {
    e2e_skip_unless_enabled!();
    if !pdfium_available() {
        println!("SKIP — pdfium library not found");
        return;
    }

    let dir = workspace();
    let input = dir.path().join("images.pdf");
    std::fs::write(&input, image_pdf(&[(16, 16), (64, 64)])).expect("write fixture");

    let result = extract_images(input.to_str().unwrap())
        .await
        .expect("extraction should succeed");

    assert_eq!(result.images.len(), 1, "only the 64x64 image qualifies");
    let record = &result.images[0];
    assert_eq!(record.filename, "image_p1_1.jpg");
    assert_eq!(record.page, 1);
    assert_eq!(record.width, 64);
    assert_eq!(record.height, 64);
    assert_eq!(record.format, "jpg");
    assert_eq!(record.mime_type, "image/jpeg");

    // The payload is real JPEG bytes and `size` counts exactly those bytes.
    let decoded = BASE64_STANDARD
        .decode(&record.base64)
        .expect("payload must be valid base64");
    assert_eq!(decoded.len(), record.size);
    assert_eq!(&decoded[..2], &[0xFF, 0xD8], "JPEG SOI marker");

    println!("[extract] 1 image, {} bytes re-encoded", record.size);
}

/// A document with no raster images still succeeds, with an empty array and
/// a zero count in the response JSON.
#[tokio::test]
async fn test_extract_zero_image_document() {
    e2e_skip_unless_enabled!();
    if !pdfium_available() {
        println!("SKIP — pdfium library not found");
        return;
    }

    let dir = workspace();
    let input = dir.path().join("vector_only.pdf");
    std::fs::write(&input, color_pdf(1)).expect("write fixture");

    let result = extract_images(input.to_str().unwrap())
        .await
        .expect("extraction should succeed");

    assert!(result.images.is_empty(), "vector art is not an embedded image");
    assert!(result.warnings.is_empty(), "nothing to warn about");

    let json = ExtractionResponse::success(result.images)
        .to_json()
        .expect("response must serialize");
    assert!(json.contains("\"success\": true"));
    assert!(json.contains("\"count\": 0"));
}

// ── Callback API structural tests (always run) ───────────────────────────────

/// `Arc<dyn ConversionProgressCallback>` must move into a spawned task.
/// The pipeline hands the callback to `spawn_blocking` the same way.
#[tokio::test]
async fn test_callback_send_in_tokio_spawn() {
    use std::sync::Mutex;

    struct SizeLogger {
        log: Arc<Mutex<Vec<(u32, u32)>>>,
    }

    impl ConversionProgressCallback for SizeLogger {
        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, width: u32, height: u32) {
            self.log.lock().unwrap().push((width, height));
        }
    }

    let log = Arc::new(Mutex::new(Vec::new()));
    let cb: Arc<dyn ConversionProgressCallback> = Arc::new(SizeLogger {
        log: Arc::clone(&log),
    });

    tokio::spawn(async move {
        cb.on_page_complete(1, 2, 640, 480);
    })
    .await
    .expect("spawn must succeed");

    assert_eq!(log.lock().unwrap().clone(), vec![(640, 480)]);
}

/// The no-op callback implements every hook and stays Send + Sync.
#[test]
fn test_noop_callback_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<NoopProgressCallback>();

    let cb: Arc<dyn ConversionProgressCallback> = Arc::new(NoopProgressCallback);
    cb.on_conversion_start(3);
    cb.on_page_start(1, 3);
    cb.on_page_complete(1, 3, 100, 100);
    cb.on_conversion_complete(3);
}
