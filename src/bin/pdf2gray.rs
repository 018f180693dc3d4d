//! CLI binary for pdf2gray.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and prints the conversion report. The report goes to
//! stdout; tracing logs and the optional progress bar go to stderr.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2gray::pipeline::ghostscript::Ghostscript;
use pdf2gray::{
    convert, ConversionConfig, ConversionOutput, ConversionProgressCallback, Pdf2GrayError,
    PipelineWarning, MAX_DPI, MIN_DPI,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const RULE: &str = "============================================================";

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion at the default 300 DPI
  pdf2gray document.pdf document_gray.pdf

  # Higher resolution for small print
  pdf2gray --dpi 600 scan.pdf scan_gray.pdf

  # Skip the ink-coverage verification pass
  pdf2gray --no-verify slides.pdf slides_gray.pdf

  # Progress bar on stderr instead of per-page report lines
  pdf2gray --progress book.pdf book_gray.pdf

OUTPUT:
  Besides the converted PDF, every page is written as
  converted_images/page_NNNN.png next to the output file, stamped with the
  rendering DPI. The run ends with an ink-coverage check confirming the
  output carries no cyan, magenta, or yellow.

ENVIRONMENT VARIABLES:
  PDF2GRAY_DPI   Default rendering resolution
  RUST_LOG       Tracing filter for diagnostic logs (stderr)

SETUP:
  Ghostscript must be installed and on PATH:
    Windows: Download from https://ghostscript.com/releases/gsdnld.html
    Linux:   sudo apt-get install ghostscript
    Mac:     brew install ghostscript
"#;

/// Convert a PDF to a gray-background 8-bit grayscale PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2gray",
    version,
    about = "Convert PDF documents to print-friendly 8-bit grayscale",
    long_about = "Convert a PDF into an image-backed 8-bit grayscale PDF whose paper-white \
background is replaced with a light gray, using Ghostscript for rasterization. Writes the \
converted PDF plus a directory of per-page PNG copies, then verifies the output carries no \
chromatic ink.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source PDF file.
    input: String,

    /// Path the converted PDF is written to.
    output: PathBuf,

    /// Rendering resolution in DPI (72-2400).
    #[arg(long, env = "PDF2GRAY_DPI", default_value_t = 300)]
    dpi: u32,

    /// Skip the ink-coverage verification pass.
    #[arg(long, env = "PDF2GRAY_NO_VERIFY")]
    no_verify: bool,

    /// Render a progress bar instead of per-page report lines.
    #[arg(long, env = "PDF2GRAY_PROGRESS")]
    progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2GRAY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2GRAY_QUIET")]
    quiet: bool,
}

// ── Progress callbacks ───────────────────────────────────────────────────────

/// Default reporter: one stdout line per page, in the report's register.
struct ReportCallback;

impl ConversionProgressCallback for ReportCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        println!("[PDF Converter] Rasterized {} pages, converting...", total_pages);
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, width: u32, height: u32) {
        println!(
            "[PDF Converter]   Page {}/{}: {}x{} px",
            page_num, total_pages, width, height
        );
    }
}

/// Opt-in progress bar on stderr, for long documents. Keeps stdout owned by
/// the banner and summary alone.
struct BarCallback {
    bar: ProgressBar,
}

impl BarCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_conversion_start
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for BarCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _width: u32, _height: u32) {
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, _total_pages: usize) {
        self.bar.finish_and_clear();
    }
}

// ── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The stdout report already narrates the run, so library logs stay at
    // WARN unless --verbose asks for more.
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Pre-flight DPI check ─────────────────────────────────────────────
    // Checked manually rather than via a clap value_parser so the failure
    // is the documented [ERROR] line with exit code 1, not a usage error.
    if cli.dpi < MIN_DPI || cli.dpi > MAX_DPI {
        println!("[ERROR] DPI must be between {} and {}", MIN_DPI, MAX_DPI);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli).await {
        println!("[ERROR] {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), Pdf2GrayError> {
    let report = !cli.quiet;

    // ── Banner ───────────────────────────────────────────────────────────
    if report {
        println!("{RULE}");
        println!("[PDF Converter] PDF to 8-bit Grayscale Conversion");
        println!("{RULE}");
        println!("[PDF Converter] Input:  {}", cli.input);
        println!("[PDF Converter] Output: {}", cli.output.display());
        println!("[PDF Converter] DPI:    {}", cli.dpi);
        if let Ok(meta) = std::fs::metadata(&cli.input) {
            println!("[PDF Converter] Input size: {:.2} MB", to_mb(meta.len()));
        }
        println!("{RULE}");

        let engine = Ghostscript::locate().await?;
        println!("[Ghostscript] Found: {}", engine.binary());
        println!("[Ghostscript] Version: {}", engine.version());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .verify(!cli.no_verify);
    if report {
        let callback: Arc<dyn ConversionProgressCallback> = if cli.progress {
            BarCallback::new()
        } else {
            Arc::new(ReportCallback)
        };
        builder = builder.progress_callback(callback);
    }
    let config = builder.build()?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.input, &cli.output, &config).await?;

    // ── Summary ──────────────────────────────────────────────────────────
    if report {
        print_summary(cli, &output);
    }
    Ok(())
}

fn print_summary(cli: &Cli, output: &ConversionOutput) {
    let stats = &output.stats;

    println!("{RULE}");
    println!("[PDF Converter] Conversion complete");
    println!("{RULE}");
    println!("[PDF Converter] Output PDF: {}", output.output_path.display());
    println!(
        "[PDF Converter] Output PNG images: {}",
        output.images_dir.display()
    );
    println!("[PDF Converter] Pages: {}", stats.total_pages);
    println!("[PDF Converter] Input size:  {:.2} MB", to_mb(stats.input_bytes));
    println!("[PDF Converter] Output size: {:.2} MB", to_mb(stats.output_bytes));
    if stats.input_bytes > 0 {
        let change = (stats.output_bytes as f64 - stats.input_bytes as f64)
            / stats.input_bytes as f64
            * 100.0;
        println!("[PDF Converter] Size change: {:+.1}%", change);
    }
    println!(
        "[PDF Converter] Time: {} ms ({} ms rasterizing)",
        stats.total_ms, stats.rasterize_ms
    );

    if !cli.no_verify {
        println!();
        println!("[PDF Converter] Verifying grayscale conversion...");
        match &output.ink_coverage {
            Some(coverage) if coverage.is_grayscale() => {
                println!("[PDF Converter] VERIFIED: Output is grayscale (no CMY colors detected)");
            }
            Some(coverage) => {
                println!(
                    "[PDF Converter] WARNING: Color detected! C={:.4} M={:.4} Y={:.4}",
                    coverage.cyan, coverage.magenta, coverage.yellow
                );
                println!(
                    "[PDF Converter] The PDF may still contain colors - conversion might have failed"
                );
            }
            // The VerificationFailed warning below explains what went wrong.
            None => {}
        }
    }

    // ColorDetected was already rendered as the verification verdict.
    for warning in output
        .warnings
        .iter()
        .filter(|w| !matches!(w, PipelineWarning::ColorDetected { .. }))
    {
        println!("[PDF Converter] Warning: {}", warning);
    }
    println!("{RULE}");
}

fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
