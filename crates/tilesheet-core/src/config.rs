//! Sheet configuration.
//! Key notes:
//!   - `margin` and `max_dimension` drive the layout solver
//!   - `max_tiles`, `max_regions` and the byte caps are admission limits applied before any pixel work
//!   - `key_threshold`, `ratio_tolerance` and `resample` control reconstruction after lossy round-trips

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Resampling filter used when rescaling a composite back to its manifest size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl FromStr for ResampleFilter {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" | "bilinear" => Ok(Self::Triangle),
            "catmullrom" | "bicubic" => Ok(Self::CatmullRom),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            _ => Err(()),
        }
    }
}

impl From<ResampleFilter> for image::imageops::FilterType {
    fn from(f: ResampleFilter) -> Self {
        use image::imageops::FilterType;
        match f {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SheetConfig {
    /// Pixels around and between tiles.
    #[serde(default = "default_margin")]
    pub margin: u32,
    /// Largest canvas side; only exceeded when a single tile needs more room.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// Maximum number of tiles per merge.
    #[serde(default = "default_max_tiles")]
    pub max_tiles: usize,
    /// Maximum number of manifest regions per split.
    #[serde(default = "default_max_regions")]
    pub max_regions: usize,
    /// Encoded size cap per input tile (bytes).
    #[serde(default = "default_max_tile_bytes")]
    pub max_tile_bytes: u64,
    /// Encoded size cap for a composite handed to split (bytes).
    #[serde(default = "default_max_composite_bytes")]
    pub max_composite_bytes: u64,

    /// Pixels with R, G and B all above this value are keyed out as background.
    #[serde(default = "default_key_threshold")]
    pub key_threshold: u8,
    /// Allowed absolute difference between composite and manifest aspect ratios.
    #[serde(default = "default_ratio_tolerance")]
    pub ratio_tolerance: f64,
    #[serde(default = "default_resample")]
    pub resample: ResampleFilter,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            margin: default_margin(),
            max_dimension: default_max_dimension(),
            max_tiles: default_max_tiles(),
            max_regions: default_max_regions(),
            max_tile_bytes: default_max_tile_bytes(),
            max_composite_bytes: default_max_composite_bytes(),
            key_threshold: default_key_threshold(),
            ratio_tolerance: default_ratio_tolerance(),
            resample: default_resample(),
        }
    }
}

impl SheetConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if the canvas cap or an admission limit is zero, or
    /// the ratio tolerance is negative or not finite.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::TileSheetError;

        if self.max_dimension == 0 {
            return Err(TileSheetError::InvalidConfig(
                "max_dimension must be greater than zero".into(),
            ));
        }
        if self.max_tiles == 0 || self.max_regions == 0 {
            return Err(TileSheetError::InvalidConfig(format!(
                "max_tiles ({}) and max_regions ({}) must be greater than zero",
                self.max_tiles, self.max_regions
            )));
        }
        if self.max_tile_bytes == 0 || self.max_composite_bytes == 0 {
            return Err(TileSheetError::InvalidConfig(
                "byte limits must be greater than zero".into(),
            ));
        }
        if !self.ratio_tolerance.is_finite() || self.ratio_tolerance < 0.0 {
            return Err(TileSheetError::InvalidConfig(format!(
                "ratio_tolerance ({}) must be a finite, non-negative number",
                self.ratio_tolerance
            )));
        }
        Ok(())
    }
}

fn default_margin() -> u32 {
    crate::layout::DEFAULT_MARGIN
}
fn default_max_dimension() -> u32 {
    crate::layout::MAX_CANVAS_DIMENSION
}
fn default_max_tiles() -> usize {
    10
}
fn default_max_regions() -> usize {
    20
}
fn default_max_tile_bytes() -> u64 {
    5 * 1024 * 1024
}
fn default_max_composite_bytes() -> u64 {
    10 * 1024 * 1024
}
fn default_key_threshold() -> u8 {
    crate::reconstruct::DEFAULT_KEY_THRESHOLD
}
fn default_ratio_tolerance() -> f64 {
    crate::reconstruct::DEFAULT_RATIO_TOLERANCE
}
fn default_resample() -> ResampleFilter {
    ResampleFilter::Triangle
}

/// Builder for `SheetConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct SheetConfigBuilder {
    cfg: SheetConfig,
}

impl SheetConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: SheetConfig::default(),
        }
    }
    pub fn margin(mut self, v: u32) -> Self {
        self.cfg.margin = v;
        self
    }
    pub fn max_dimension(mut self, v: u32) -> Self {
        self.cfg.max_dimension = v;
        self
    }
    pub fn max_tiles(mut self, v: usize) -> Self {
        self.cfg.max_tiles = v;
        self
    }
    pub fn max_regions(mut self, v: usize) -> Self {
        self.cfg.max_regions = v;
        self
    }
    pub fn max_tile_bytes(mut self, v: u64) -> Self {
        self.cfg.max_tile_bytes = v;
        self
    }
    pub fn max_composite_bytes(mut self, v: u64) -> Self {
        self.cfg.max_composite_bytes = v;
        self
    }
    pub fn key_threshold(mut self, v: u8) -> Self {
        self.cfg.key_threshold = v;
        self
    }
    pub fn ratio_tolerance(mut self, v: f64) -> Self {
        self.cfg.ratio_tolerance = v;
        self
    }
    pub fn resample(mut self, v: ResampleFilter) -> Self {
        self.cfg.resample = v;
        self
    }
    pub fn build(self) -> SheetConfig {
        self.cfg
    }
}

impl SheetConfig {
    /// Create a fluent builder for `SheetConfig`.
    pub fn builder() -> SheetConfigBuilder {
        SheetConfigBuilder::new()
    }
}
