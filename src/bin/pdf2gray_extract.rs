//! Image-extraction binary for pdf2gray.
//!
//! Prints exactly one JSON object to stdout and nothing else: the success
//! shape with an image array, or the failure shape with an error message.
//! Diagnostics and per-image warnings go to stderr so callers can pipe
//! stdout straight into a JSON parser.

use clap::Parser;
use pdf2gray::{extract_images, ExtractionResponse};
use std::io;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract all embedded images as base64 JSON
  pdf2gray-extract report.pdf ./unused

  # Feed the result to jq
  pdf2gray-extract report.pdf ./unused | jq '.count'

OUTPUT FORMAT:
  {"success": true, "images": [{filename, base64, page, width, height,
   format, mimeType, colorspace, size}, ...], "count": N}
  or, on failure:
  {"success": false, "error": "<message>"}

  Images smaller than 50px in either dimension are skipped. Every image is
  re-encoded as JPEG (transparency flattened onto white); originals that
  cannot be re-encoded are carried as-is with a warning on stderr.

SETUP:
  Requires the pdfium library, loaded from ./, /opt/pdfium/lib/, or the
  system library path.
"#;

/// Extract embedded images from a PDF as base64-encoded JSON.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2gray-extract",
    version,
    about = "Extract embedded PDF images as base64 JSON on stdout",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source PDF file.
    pdf_path: String,

    /// Output directory (accepted for interface compatibility; images are
    /// returned inline as base64, nothing is written here).
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout belongs to the JSON response alone.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    debug!(
        output_dir = %cli.output_dir.display(),
        "output directory accepted for compatibility; images are returned inline"
    );

    match extract_images(&cli.pdf_path).await {
        Ok(output) => {
            emit(&ExtractionResponse::success(output.images));
        }
        Err(e) => {
            emit(&ExtractionResponse::failure(e.to_string()));
            std::process::exit(1);
        }
    }
}

/// Print the response as JSON. Serialization of these shapes cannot fail in
/// practice; if it somehow does, stdout still gets a valid failure object.
fn emit(response: &ExtractionResponse) {
    match response.to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => {
            let fallback = serde_json::json!({
                "success": false,
                "error": format!("response serialization failed: {e}"),
            });
            println!("{fallback}");
            std::process::exit(1);
        }
    }
}
