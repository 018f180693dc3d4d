//! Ghostscript subprocess backend: engine discovery, page rasterization,
//! and ink-coverage verification.
//!
//! ## Why an external engine?
//!
//! Rendering a PDF page to pixels needs a complete PDF interpreter (fonts,
//! transparency, shading, embedded color profiles). Ghostscript's `pnggray`
//! device renders and desaturates in a single pass, so the crate shells out
//! to it instead of linking an interpreter. Every invocation runs with
//! `-dSAFER`, captures stdout/stderr for diagnostics, and enforces a hard
//! timeout with `kill_on_drop` so an abandoned conversion never leaks an
//! engine process.

use crate::error::Pdf2GrayError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Candidate binary names, probed in order. Windows installers ship the
/// console binary as `gswin64c`/`gswin32c`; everywhere else it is `gs`.
const GS_CANDIDATES: [&str; 3] = ["gswin64c", "gswin32c", "gs"];

/// A `-version` probe answers instantly when the binary exists at all.
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Rasterization budget for the whole document.
const RASTERIZE_TIMEOUT: Duration = Duration::from_secs(300);

/// Ink-coverage analysis budget.
const INKCOV_TIMEOUT: Duration = Duration::from_secs(30);

// ─────────────────────────────────────────────────────────────────────────────
// Engine handle
// ─────────────────────────────────────────────────────────────────────────────

/// A located Ghostscript installation.
///
/// Obtain one with [`Ghostscript::locate`]; all subsequent invocations reuse
/// the discovered binary name.
#[derive(Debug, Clone)]
pub struct Ghostscript {
    binary: String,
    version: String,
}

impl Ghostscript {
    /// Probe the well-known binary names and return a handle to the first
    /// one that answers a `-version` query.
    pub async fn locate() -> Result<Self, Pdf2GrayError> {
        for candidate in GS_CANDIDATES {
            let mut cmd = Command::new(candidate);
            cmd.arg("-version")
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            match timeout(VERSION_PROBE_TIMEOUT, cmd.output()).await {
                Ok(Ok(out)) if out.status.success() => {
                    let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
                    debug!(binary = candidate, %version, "Located Ghostscript");
                    return Ok(Self {
                        binary: candidate.to_string(),
                        version,
                    });
                }
                // Not installed under this name, or hung: try the next one.
                _ => continue,
            }
        }
        Err(Pdf2GrayError::GhostscriptNotFound)
    }

    /// The binary name this handle invokes (`gs`, `gswin64c`, ...).
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// The version string the binary reported when probed.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Rasterize every page of `input` into `work_dir` as 8-bit grayscale
    /// PNGs at the requested resolution.
    ///
    /// Returns the rendered files in source page order, sorted by the page
    /// number embedded in the `page_%04d.png` output pattern. An engine run
    /// that exits cleanly but renders nothing is reported as
    /// [`Pdf2GrayError::NoPagesRendered`] rather than an empty list.
    pub async fn rasterize(
        &self,
        input: &Path,
        work_dir: &Path,
        dpi: u32,
    ) -> Result<Vec<PathBuf>, Pdf2GrayError> {
        let pattern = work_dir.join("page_%04d.png");
        let args = rasterize_args(input, &pattern, dpi);
        debug!(binary = %self.binary, ?args, "Rasterizing with Ghostscript");

        let output = self.run(&args, RASTERIZE_TIMEOUT).await?.ok_or(
            Pdf2GrayError::RasterizeTimeout {
                secs: RASTERIZE_TIMEOUT.as_secs(),
            },
        )?;

        if !output.status.success() {
            return Err(Pdf2GrayError::RasterizeFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            });
        }

        let mut pages = Vec::new();
        let mut entries = tokio::fs::read_dir(work_dir).await.map_err(|e| {
            Pdf2GrayError::Internal(format!("Failed to list rendered pages: {}", e))
        })?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Pdf2GrayError::Internal(format!("Failed to list rendered pages: {}", e)))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "png") {
                pages.push(path);
            }
        }
        pages.sort_by_key(|p| page_ordinal(p));

        if pages.is_empty() {
            let listing = String::from_utf8_lossy(&output.stdout).into_owned();
            return Err(Pdf2GrayError::NoPagesRendered { listing });
        }

        debug!(page_count = pages.len(), "Rasterization complete");
        Ok(pages)
    }

    /// Run the `inkcov` device over a finished PDF and report per-channel
    /// coverage for its first page.
    ///
    /// A fully grayscale document reports zero cyan, magenta, and yellow.
    pub async fn ink_coverage(&self, pdf: &Path) -> Result<InkCoverage, Pdf2GrayError> {
        let args = inkcov_args(pdf);
        debug!(binary = %self.binary, ?args, "Measuring ink coverage");

        let output = self
            .run(&args, INKCOV_TIMEOUT)
            .await?
            .ok_or_else(|| Pdf2GrayError::Internal("Ink coverage check timed out".into()))?;

        if !output.status.success() {
            return Err(Pdf2GrayError::Internal(format!(
                "inkcov exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_inkcov(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            Pdf2GrayError::Internal("inkcov produced no parsable coverage line".into())
        })
    }

    /// Spawn the engine with `args` and wait for it, returning `None` on
    /// timeout. `kill_on_drop` reaps the child when the wait is abandoned.
    async fn run(
        &self,
        args: &[OsString],
        budget: Duration,
    ) -> Result<Option<std::process::Output>, Pdf2GrayError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Pdf2GrayError::GhostscriptNotFound,
            _ => Pdf2GrayError::Internal(format!("Failed to launch Ghostscript: {}", e)),
        })?;

        match timeout(budget, child.wait_with_output()).await {
            Ok(result) => result
                .map(Some)
                .map_err(|e| Pdf2GrayError::Internal(format!("Ghostscript I/O failure: {}", e))),
            Err(_) => Ok(None),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Invocation arguments
// ─────────────────────────────────────────────────────────────────────────────

fn rasterize_args(input: &Path, output_pattern: &Path, dpi: u32) -> Vec<OsString> {
    let mut output_file = OsString::from("-sOutputFile=");
    output_file.push(output_pattern);
    vec![
        OsString::from("-sDEVICE=pnggray"),
        OsString::from("-dNOPAUSE"),
        OsString::from("-dBATCH"),
        OsString::from("-dSAFER"),
        OsString::from("-dMaxBitmap=500000000"),
        OsString::from("-dGraphicsAlphaBits=4"),
        OsString::from("-dTextAlphaBits=4"),
        OsString::from(format!("-r{}", dpi)),
        output_file,
        input.as_os_str().to_os_string(),
    ]
}

/// Page ordinal parsed out of a `page_%04d.png` path.
///
/// The engine widens the field past 9999 pages, where zero-padded names no
/// longer sort lexically; parsing the number keeps page order correct.
fn page_ordinal(path: &Path) -> u32 {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit('_').next())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(u32::MAX)
}

fn inkcov_args(pdf: &Path) -> Vec<OsString> {
    let devnull = if cfg!(windows) { "nul" } else { "/dev/null" };
    vec![
        OsString::from("-dNOPAUSE"),
        OsString::from("-dBATCH"),
        OsString::from("-dSAFER"),
        OsString::from("-sDEVICE=inkcov"),
        OsString::from("-o"),
        OsString::from(devnull),
        pdf.as_os_str().to_os_string(),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Ink coverage
// ─────────────────────────────────────────────────────────────────────────────

/// Per-channel ink coverage reported by Ghostscript's `inkcov` device,
/// each in the range `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InkCoverage {
    pub cyan: f32,
    pub magenta: f32,
    pub yellow: f32,
    pub black: f32,
}

impl InkCoverage {
    /// True when the measured page carries no chromatic ink at all.
    pub fn is_grayscale(&self) -> bool {
        self.cyan == 0.0 && self.magenta == 0.0 && self.yellow == 0.0
    }
}

/// Extract coverage from `inkcov` stdout.
///
/// The device prints one line per page, e.g.
/// ` 0.00000  0.00000  0.00000  0.08093 CMYK OK`, interleaved with `%`
/// banner lines. The first parsable line (the first page) decides the
/// verdict.
fn parse_inkcov(stdout: &str) -> Option<InkCoverage> {
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }
        let channel = |i: usize| parts.get(i).and_then(|p| p.parse::<f32>().ok());
        if let (Some(cyan), Some(magenta), Some(yellow)) = (channel(0), channel(1), channel(2)) {
            return Some(InkCoverage {
                cyan,
                magenta,
                yellow,
                black: channel(3).unwrap_or(0.0),
            });
        }
    }
    None
}
