//! Core library for merging images into a sprite sheet and splitting it back.
//!
//! - Layout: grid search over column counts, ratio snapping (1:1 / 4:3 / 16:9), size clamp, row-major placement
//! - Rendering: RGBA composite on a transparent canvas plus a black/white occupancy mask
//! - Manifest: serde-serializable position manifest (camelCase JSON) with absolute and relative rects
//! - Reconstruction: background keying, canonical rescale and per-region extraction after lossy round-trips
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use tilesheet_core::{InputTile, SheetConfig, merge_tiles, split_sheet};
//! # fn main() -> anyhow::Result<()> {
//! let a = ImageReader::open("a.png")?.decode()?;
//! let b = ImageReader::open("b.png")?.decode()?;
//! let inputs = vec![
//!   InputTile { name: "a.png".into(), image: a },
//!   InputTile { name: "b.png".into(), image: b },
//! ];
//! let cfg = SheetConfig::default();
//! let out = merge_tiles(inputs, &cfg)?;
//! println!("{}", out.manifest.to_json_pretty()?);
//! let tiles = split_sheet(&out.composite.into(), &out.manifest, &cfg)?;
//! println!("restored {}", tiles.len());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod model;
pub mod pipeline;
pub mod reconstruct;

pub use compositing::{render, render_composite, render_mask, tile_mask};
pub use config::*;
pub use error::*;
pub use layout::{DEFAULT_MARGIN, MAX_CANVAS_DIMENSION, solve, solve_with_limit};
pub use manifest::*;
pub use model::*;
pub use pipeline::*;
pub use reconstruct::{ReconstructOptions, reconstruct, reconstruct_with};

/// Convenience prelude for common types and functions.
/// Importing `tilesheet_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{ResampleFilter, SheetConfig, SheetConfigBuilder};
    pub use crate::error::{ManifestError, TileSheetError};
    pub use crate::manifest::{ManifestEntry, PositionManifest, build_manifest};
    pub use crate::model::{AspectRatio, CanvasPlan, PlacedTile, Rect, SheetStats, Tile};
    pub use crate::reconstruct::{ReconstructOptions, reconstruct, reconstruct_with};
    pub use crate::{
        InputTile, MergeOutput, merge_tiles, plan_layout, render, solve, solve_with_limit,
        split_sheet,
    };
}
