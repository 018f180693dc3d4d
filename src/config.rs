//! Configuration types for the grayscale conversion pipeline.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: validate, don't clamp
//! An out-of-range DPI is a hard, pre-flight error: the run must abort with
//! exit code 1 before the rasterizer is ever probed. Silently clamping to the
//! nearest valid value would hide the mistake and produce output at a
//! resolution the caller never asked for, so [`ConversionConfigBuilder::build`]
//! rejects bad values instead.

use crate::error::Pdf2GrayError;
use crate::progress::ConversionProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Lowest accepted rendering resolution.
pub const MIN_DPI: u32 = 72;

/// Highest accepted rendering resolution.
pub const MAX_DPI: u32 = 2400;

/// Configuration for a grayscale conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2gray::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(600)
///     .verify(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–2400. Default: 300.
    ///
    /// 300 DPI is print quality: text stays crisp when the output is viewed
    /// at 100 % or re-printed, while page images remain a few megabytes each.
    /// 72 is the floor below which text becomes unreadable; 2400 the ceiling
    /// the engine handles without absurd bitmap allocations.
    pub dpi: u32,

    /// Background gray level, 0.0 = black … 1.0 = white. Default: 0.85.
    ///
    /// 0.85 is "15 % gray": dark enough that a page which used to be white
    /// paper is visibly marked as having gone through grayscale conversion,
    /// light enough that text contrast is barely affected. The same level
    /// drives both the page fill colour and the pixel substitution value
    /// (see [`ConversionConfig::gray_value`]).
    pub gray_level: f32,

    /// Run the ink-coverage verification pass on the finished output. Default: true.
    ///
    /// The pass re-opens the output with the rasterizer's coverage device and
    /// warns when any of the C/M/Y channels is non-zero. It can only ever
    /// produce warnings, never errors, so there is little reason to turn it
    /// off outside of benchmarking.
    pub verify: bool,

    /// Optional progress callback receiving per-page events.
    pub progress_callback: Option<Arc<dyn ConversionProgressCallback>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            gray_level: 0.85,
            verify: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("gray_level", &self.gray_level)
            .field("verify", &self.verify)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The 8-bit pixel value of the configured gray level.
    ///
    /// At the default level (0.85) this is exactly 217, the substitution
    /// value near-white pixels are rewritten to.
    pub fn gray_value(&self) -> u8 {
        (self.gray_level * 255.0).round() as u8
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    /// Set the rendering DPI. Validated (not clamped) by [`Self::build`].
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    /// Set the background gray level (0.0–1.0).
    pub fn gray_level(mut self, level: f32) -> Self {
        self.config.gray_level = level;
        self
    }

    /// Enable or disable the ink-coverage verification pass.
    pub fn verify(mut self, v: bool) -> Self {
        self.config.verify = v;
        self
    }

    /// Install a progress callback receiving per-page events.
    pub fn progress_callback(mut self, cb: Arc<dyn ConversionProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2GrayError> {
        let c = &self.config;
        if c.dpi < MIN_DPI || c.dpi > MAX_DPI {
            return Err(Pdf2GrayError::InvalidConfig(format!(
                "DPI must be between {} and {}, got {}",
                MIN_DPI, MAX_DPI, c.dpi
            )));
        }
        if !(0.0..=1.0).contains(&c.gray_level) {
            return Err(Pdf2GrayError::InvalidConfig(format!(
                "gray level must be within 0.0–1.0, got {}",
                c.gray_level
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ConversionConfig::default();
        assert_eq!(c.dpi, 300);
        assert_eq!(c.gray_level, 0.85);
        assert!(c.verify);
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn default_gray_level_yields_217() {
        let c = ConversionConfig::default();
        assert_eq!(c.gray_value(), 217);
    }

    #[test]
    fn dpi_below_range_is_rejected() {
        let err = ConversionConfig::builder().dpi(71).build().unwrap_err();
        assert!(err.to_string().contains("between 72 and 2400"), "{err}");
    }

    #[test]
    fn dpi_above_range_is_rejected() {
        let err = ConversionConfig::builder().dpi(2401).build().unwrap_err();
        assert!(matches!(err, Pdf2GrayError::InvalidConfig(_)));
    }

    #[test]
    fn dpi_boundaries_are_inclusive() {
        assert!(ConversionConfig::builder().dpi(72).build().is_ok());
        assert!(ConversionConfig::builder().dpi(2400).build().is_ok());
    }

    #[test]
    fn gray_level_out_of_bounds_is_rejected() {
        assert!(ConversionConfig::builder().gray_level(1.5).build().is_err());
        assert!(ConversionConfig::builder()
            .gray_level(-0.1)
            .build()
            .is_err());
    }

    #[test]
    fn debug_impl_elides_the_callback() {
        use crate::progress::NoopProgressCallback;

        let c = ConversionConfig::builder()
            .progress_callback(Arc::new(NoopProgressCallback))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn callback>"), "got: {dbg}");
    }
}
