use image::{DynamicImage, RgbaImage};
use tracing::{debug, info, instrument};

use crate::compositing;
use crate::config::SheetConfig;
use crate::error::{Result, TileSheetError};
use crate::layout;
use crate::manifest::{self, PositionManifest};
use crate::model::{CanvasPlan, SheetStats, Tile};
use crate::reconstruct::{self, ReconstructOptions};

/// In-memory tile to merge (name + decoded image).
#[derive(Debug, Clone)]
pub struct InputTile {
    pub name: String,
    pub image: DynamicImage,
}

/// Everything a merge produces. The three artifacts travel together: the
/// manifest is the only key that makes the composite addressable.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub plan: CanvasPlan,
    pub composite: RgbaImage,
    pub mask: RgbaImage,
    pub manifest: PositionManifest,
}

impl MergeOutput {
    /// Convenience method that delegates to `plan.stats()`.
    pub fn stats(&self) -> SheetStats {
        self.plan.stats()
    }
}

fn check_count(count: usize, limit: usize) -> Result<()> {
    if count == 0 {
        return Err(TileSheetError::EmptyInput);
    }
    if count > limit {
        return Err(TileSheetError::TileLimitExceeded { count, limit });
    }
    Ok(())
}

fn check_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<()> {
    for (i, name) in names.enumerate() {
        if name.is_empty() {
            return Err(TileSheetError::InvalidInput(format!(
                "tile {i} has an empty name"
            )));
        }
    }
    Ok(())
}

/// Decodes an encoded image after checking it against `limit` bytes.
pub fn decode_image(name: &str, bytes: &[u8], limit: u64) -> Result<DynamicImage> {
    let len = bytes.len() as u64;
    if len > limit {
        return Err(TileSheetError::InputTooLarge {
            name: name.to_string(),
            bytes: len,
            limit,
        });
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Decodes one input tile, enforcing `max_tile_bytes`.
pub fn decode_tile(name: impl Into<String>, bytes: &[u8], cfg: &SheetConfig) -> Result<InputTile> {
    let name = name.into();
    let image = decode_image(&name, bytes, cfg.max_tile_bytes)?;
    Ok(InputTile { name, image })
}

/// Decodes a composite handed to `split_sheet`, enforcing `max_composite_bytes`.
pub fn decode_composite(name: &str, bytes: &[u8], cfg: &SheetConfig) -> Result<DynamicImage> {
    decode_image(name, bytes, cfg.max_composite_bytes)
}

#[instrument(skip_all, fields(tiles = inputs.len()))]
/// Merges `inputs` into one composite, its mask and its position manifest.
///
/// Notes:
/// - Input order is kept: it drives row-major placement and manifest order.
/// - Admission limits (`max_tiles`) are checked before any pixel is touched.
pub fn merge_tiles(inputs: Vec<InputTile>, cfg: &SheetConfig) -> Result<MergeOutput> {
    cfg.validate()?;
    check_count(inputs.len(), cfg.max_tiles)?;
    check_names(inputs.iter().map(|i| i.name.as_str()))?;

    let tiles: Vec<Tile> = inputs
        .into_iter()
        .map(|i| Tile::new(i.name, i.image.to_rgba8()))
        .collect();
    let sizes: Vec<(u32, u32)> = tiles.iter().map(Tile::dimensions).collect();

    let plan = layout::solve_with_limit(&sizes, cfg.margin, cfg.max_dimension)?;
    let (composite, mask) = compositing::render(&plan, &tiles)?;
    let names: Vec<&str> = tiles.iter().map(|t| t.name.as_str()).collect();
    let manifest = manifest::build_manifest(&plan, &names)?;

    info!(
        width = plan.width,
        height = plan.height,
        ratio = %plan.ratio,
        tiles = tiles.len(),
        "merged sheet"
    );
    Ok(MergeOutput {
        plan,
        composite,
        mask,
        manifest,
    })
}

// ---------------- Layout-only API ----------------

/// Solves placements and builds the manifest without touching pixel data.
/// Inputs are (name, width, height).
pub fn plan_layout<K: AsRef<str>>(
    items: &[(K, u32, u32)],
    cfg: &SheetConfig,
) -> Result<(CanvasPlan, PositionManifest)> {
    cfg.validate()?;
    check_count(items.len(), cfg.max_tiles)?;
    check_names(items.iter().map(|(k, _, _)| k.as_ref()))?;

    let sizes: Vec<(u32, u32)> = items.iter().map(|&(_, w, h)| (w, h)).collect();
    let names: Vec<&str> = items.iter().map(|(k, _, _)| k.as_ref()).collect();
    let plan = layout::solve_with_limit(&sizes, cfg.margin, cfg.max_dimension)?;
    let manifest = manifest::build_manifest(&plan, &names)?;
    Ok((plan, manifest))
}

#[instrument(skip_all, fields(regions = manifest.images.len()))]
/// Splits a (possibly lossy) composite back into named tiles, in manifest order.
///
/// The region count and the manifest canvas size are checked against `cfg`
/// before the composite is rescaled.
pub fn split_sheet(
    composite: &DynamicImage,
    manifest: &PositionManifest,
    cfg: &SheetConfig,
) -> Result<Vec<Tile>> {
    cfg.validate()?;
    if manifest.images.len() > cfg.max_regions {
        return Err(TileSheetError::TileLimitExceeded {
            count: manifest.images.len(),
            limit: cfg.max_regions,
        });
    }
    manifest.check_canvas_limit(cfg.max_dimension, cfg.margin)?;
    let tiles = reconstruct::reconstruct_with(composite, manifest, &ReconstructOptions::from(cfg))?;
    debug!(tiles = tiles.len(), "split sheet");
    Ok(tiles)
}
