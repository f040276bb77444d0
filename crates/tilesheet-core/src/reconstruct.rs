//! Splits a composite back into tiles using its position manifest.
//!
//! The composite may have gone through lossy re-encoding: its alpha channel is
//! rebuilt by keying near-white pixels out, and it is resampled to the
//! manifest's canvas size before any region is cut.

use image::{DynamicImage, RgbaImage, imageops};
use tracing::{debug, instrument};

use crate::config::{ResampleFilter, SheetConfig};
use crate::error::{Result, TileSheetError};
use crate::manifest::{PositionManifest, Size};
use crate::model::{Rect, Tile};

/// R, G and B must all exceed this for a pixel to count as background.
pub const DEFAULT_KEY_THRESHOLD: u8 = 240;
/// Largest accepted |composite ratio - manifest ratio|.
pub const DEFAULT_RATIO_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructOptions {
    pub key_threshold: u8,
    pub ratio_tolerance: f64,
    pub filter: ResampleFilter,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            key_threshold: DEFAULT_KEY_THRESHOLD,
            ratio_tolerance: DEFAULT_RATIO_TOLERANCE,
            filter: ResampleFilter::Triangle,
        }
    }
}

impl From<&SheetConfig> for ReconstructOptions {
    fn from(cfg: &SheetConfig) -> Self {
        Self {
            key_threshold: cfg.key_threshold,
            ratio_tolerance: cfg.ratio_tolerance,
            filter: cfg.resample,
        }
    }
}

/// Fails with `AspectRatioMismatch` when a `width` x `height` composite was
/// cropped or re-framed relative to the manifest canvas.
pub fn check_aspect_ratio(
    width: u32,
    height: u32,
    manifest: &PositionManifest,
    tolerance: f64,
) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(TileSheetError::InvalidInput(format!(
            "composite has a zero dimension ({width}x{height})"
        )));
    }
    let composite = width as f64 / height as f64;
    let expected = manifest.canvas_ratio();
    if (composite - expected).abs() > tolerance {
        return Err(TileSheetError::AspectRatioMismatch {
            composite,
            manifest: expected,
        });
    }
    Ok(())
}

/// Rebuilds a binary matte: pixels whose R, G and B all exceed `threshold`
/// become fully transparent, every other pixel fully opaque.
///
/// Near-white tile content is indistinguishable from the background and is
/// keyed out along with it.
pub fn key_background(img: &mut RgbaImage, threshold: u8) {
    for px in img.pixels_mut() {
        let [r, g, b, _] = px.0;
        px[3] = if r > threshold && g > threshold && b > threshold {
            0
        } else {
            255
        };
    }
}

/// Resamples `img` to exactly `size`; returned unchanged when it already matches.
pub fn rescale_to_canvas(img: RgbaImage, size: Size, filter: ResampleFilter) -> RgbaImage {
    if img.dimensions() == (size.width, size.height) {
        return img;
    }
    imageops::resize(&img, size.width, size.height, filter.into())
}

/// Copies `rect` out of `img`, or `None` when it does not fit.
pub fn extract_region(img: &RgbaImage, rect: Rect) -> Option<RgbaImage> {
    if rect.is_empty() || !rect.fits_within(img.width(), img.height()) {
        return None;
    }
    Some(imageops::crop_imm(img, rect.x, rect.y, rect.w, rect.h).to_image())
}

/// Splits `composite` with default options.
pub fn reconstruct(composite: &DynamicImage, manifest: &PositionManifest) -> Result<Vec<Tile>> {
    reconstruct_with(composite, manifest, &ReconstructOptions::default())
}

/// Splits `composite` into one tile per manifest entry, in entry order.
/// Any failure discards all work; no partial list is returned.
#[instrument(skip_all, fields(
    width = composite.width(),
    height = composite.height(),
    entries = manifest.images.len()
))]
pub fn reconstruct_with(
    composite: &DynamicImage,
    manifest: &PositionManifest,
    opts: &ReconstructOptions,
) -> Result<Vec<Tile>> {
    manifest.validate_structure()?;
    check_aspect_ratio(
        composite.width(),
        composite.height(),
        manifest,
        opts.ratio_tolerance,
    )?;

    let mut keyed = composite.to_rgba8();
    key_background(&mut keyed, opts.key_threshold);

    let canvas = rescale_to_canvas(keyed, manifest.canvas_size, opts.filter);
    debug!(
        width = canvas.width(),
        height = canvas.height(),
        "composite rescaled to manifest canvas"
    );

    manifest
        .images
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            extract_region(&canvas, entry.rect())
                .map(|image| Tile::new(entry.filename.clone(), image))
                .ok_or_else(|| TileSheetError::OutOfBounds {
                    index,
                    filename: entry.filename.clone(),
                })
        })
        .collect()
}
