//! Position manifest: the canvas size plus one absolute/relative rectangle per
//! tile. It is the only description needed to split a composite back apart.
//!
//! Wire shape (camelCase JSON):
//! `{ canvasSize: {width, height}, images: [{ filename, position: {x, y}, size: {width, height},
//! relativePosition: {x, y}, relativeSize: {width, height} }] }`

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ManifestError, Result, TileSheetError};
use crate::model::{AspectRatio, CanvasPlan, Rect};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

/// Position as a fraction of the canvas size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RelativePosition {
    pub x: f64,
    pub y: f64,
}

/// Size as a fraction of the canvas size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RelativeSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub filename: String,
    pub position: Position,
    pub size: Size,
    pub relative_position: RelativePosition,
    pub relative_size: RelativeSize,
}

impl ManifestEntry {
    /// Builds an entry for `rect` on a `canvas`-sized sheet; relative fields are derived here.
    pub fn new(filename: impl Into<String>, rect: Rect, canvas: Size) -> Self {
        let cw = canvas.width as f64;
        let ch = canvas.height as f64;
        Self {
            filename: filename.into(),
            position: Position {
                x: rect.x,
                y: rect.y,
            },
            size: Size {
                width: rect.w,
                height: rect.h,
            },
            relative_position: RelativePosition {
                x: rect.x as f64 / cw,
                y: rect.y as f64 / ch,
            },
            relative_size: RelativeSize {
                width: rect.w as f64 / cw,
                height: rect.h as f64 / ch,
            },
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.size.width,
            self.size.height,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionManifest {
    pub canvas_size: Size,
    pub images: Vec<ManifestEntry>,
}

impl PositionManifest {
    /// Width / height of the canvas the manifest coordinates refer to.
    pub fn canvas_ratio(&self) -> f64 {
        self.canvas_size.width as f64 / self.canvas_size.height as f64
    }

    /// Checks canvas size, entry count, filenames and region sizes, but not
    /// whether regions lie inside the canvas.
    pub fn validate_structure(&self) -> std::result::Result<(), ManifestError> {
        let Size { width, height } = self.canvas_size;
        if width == 0 || height == 0 {
            return Err(ManifestError::ZeroCanvas { width, height });
        }
        if self.images.is_empty() {
            return Err(ManifestError::NoEntries);
        }
        for (index, e) in self.images.iter().enumerate() {
            if e.filename.is_empty() {
                return Err(ManifestError::EmptyFilename { index });
            }
            if e.rect().is_empty() {
                return Err(ManifestError::EmptyRegion {
                    index,
                    filename: e.filename.clone(),
                });
            }
        }
        Ok(())
    }

    /// Full validation: structure plus every region inside the canvas.
    pub fn validate(&self) -> std::result::Result<(), ManifestError> {
        self.validate_structure()?;
        let Size { width, height } = self.canvas_size;
        for (index, e) in self.images.iter().enumerate() {
            if !e.rect().fits_within(width, height) {
                return Err(ManifestError::OutsideCanvas {
                    index,
                    filename: e.filename.clone(),
                    width,
                    height,
                });
            }
        }
        Ok(())
    }

    /// Largest canvas side a merge of these entries can produce: every tile in
    /// one row or one column with `margin` around each, fitted to the widest
    /// candidate ratio.
    pub fn canvas_side_limit(&self, max_dimension: u32, margin: u32) -> u64 {
        let margin = margin as u64;
        let (sum_w, sum_h) = self.images.iter().fold((margin, margin), |(w, h), e| {
            (
                w + e.size.width as u64 + margin,
                h + e.size.height as u64 + margin,
            )
        });
        let span = sum_w.max(sum_h);
        let fitted = AspectRatio::CANDIDATES
            .iter()
            .map(|r| r.width_for(span) + r.width as u64)
            .max()
            .unwrap_or(span);
        fitted.max(max_dimension as u64)
    }

    /// Rejects a canvas no merge with this `max_dimension` and `margin` could
    /// have produced, before anything is allocated at that size.
    pub fn check_canvas_limit(
        &self,
        max_dimension: u32,
        margin: u32,
    ) -> std::result::Result<(), ManifestError> {
        let limit = self.canvas_side_limit(max_dimension, margin);
        let Size { width, height } = self.canvas_size;
        if width as u64 > limit || height as u64 > limit {
            return Err(ManifestError::CanvasTooLarge {
                width,
                height,
                limit,
            });
        }
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a manifest without validating it; see `validate`.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Builds the manifest for a solved plan. `names[i]` names the tile at input index `i`.
#[instrument(skip_all, fields(entries = plan.placements.len()))]
pub fn build_manifest<S: AsRef<str>>(plan: &CanvasPlan, names: &[S]) -> Result<PositionManifest> {
    if names.len() != plan.placements.len() {
        return Err(TileSheetError::InvalidInput(format!(
            "plan has {} placements but {} names were supplied",
            plan.placements.len(),
            names.len()
        )));
    }
    let canvas = Size {
        width: plan.width,
        height: plan.height,
    };
    let mut images = Vec::with_capacity(plan.placements.len());
    for p in &plan.placements {
        let name = names.get(p.index).ok_or_else(|| {
            TileSheetError::InvalidInput(format!("placement refers to missing tile {}", p.index))
        })?;
        images.push(ManifestEntry::new(name.as_ref(), p.rect, canvas));
    }
    let manifest = PositionManifest {
        canvas_size: canvas,
        images,
    };
    manifest.validate()?;
    Ok(manifest)
}
