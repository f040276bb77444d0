use image::{Rgba, RgbaImage};
use tracing::instrument;

use crate::error::{Result, TileSheetError};
use crate::model::{CanvasPlan, Tile};

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
pub const MASK_OPAQUE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const MASK_TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Copy all of `src` into `canvas` with its top-left at (dx, dy).
/// Pixels falling outside the canvas are dropped; no blending, no resampling.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    for yy in 0..sh {
        let ty = dy as u64 + yy as u64;
        if ty >= ch as u64 {
            break;
        }
        for xx in 0..sw {
            let tx = dx as u64 + xx as u64;
            if tx >= cw as u64 {
                break;
            }
            canvas.put_pixel(tx as u32, ty as u32, *src.get_pixel(xx, yy));
        }
    }
}

/// Same-size scratch mask for one tile: opaque white where alpha > 0, opaque black elsewhere.
pub fn tile_mask(src: &RgbaImage) -> RgbaImage {
    let mut mask = RgbaImage::new(src.width(), src.height());
    for (dst, px) in mask.pixels_mut().zip(src.pixels()) {
        *dst = if px[3] > 0 { MASK_OPAQUE } else { MASK_TRANSPARENT };
    }
    mask
}

/// Checks that `tiles` line up one-to-one with the plan's placements.
fn check_tiles(plan: &CanvasPlan, tiles: &[Tile]) -> Result<()> {
    if tiles.len() != plan.placements.len() {
        return Err(TileSheetError::InvalidInput(format!(
            "plan has {} placements but {} tiles were supplied",
            plan.placements.len(),
            tiles.len()
        )));
    }
    for p in &plan.placements {
        let tile = tiles.get(p.index).ok_or_else(|| {
            TileSheetError::InvalidInput(format!("placement refers to missing tile {}", p.index))
        })?;
        if tile.dimensions() != (p.rect.w, p.rect.h) {
            return Err(TileSheetError::InvalidInput(format!(
                "tile {} is {}x{} but was planned as {}x{}",
                tile.name,
                tile.width(),
                tile.height(),
                p.rect.w,
                p.rect.h
            )));
        }
    }
    Ok(())
}

/// Paints every tile at its placement on a fully transparent canvas.
/// Later placements win where rectangles overlap.
pub fn render_composite(plan: &CanvasPlan, tiles: &[Tile]) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(plan.width, plan.height, TRANSPARENT);
    for p in &plan.placements {
        if let Some(tile) = tiles.get(p.index) {
            blit_rgba(&tile.image, &mut canvas, p.rect.x, p.rect.y);
        }
    }
    canvas
}

/// Paints each tile's scratch mask at its placement on an opaque black canvas.
pub fn render_mask(plan: &CanvasPlan, tiles: &[Tile]) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(plan.width, plan.height, MASK_TRANSPARENT);
    for p in &plan.placements {
        if let Some(tile) = tiles.get(p.index) {
            let scratch = tile_mask(&tile.image);
            blit_rgba(&scratch, &mut canvas, p.rect.x, p.rect.y);
        }
    }
    canvas
}

/// Renders the composite and mask surfaces for `plan`.
/// `tiles` must be in the solver's input order.
#[instrument(skip_all, fields(width = plan.width, height = plan.height, tiles = tiles.len()))]
pub fn render(plan: &CanvasPlan, tiles: &[Tile]) -> Result<(RgbaImage, RgbaImage)> {
    check_tiles(plan, tiles)?;
    Ok((render_composite(plan, tiles), render_mask(plan, tiles)))
}
