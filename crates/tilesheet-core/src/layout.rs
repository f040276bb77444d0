//! Layout solver: maps an ordered list of tile sizes to a ratio-snapped canvas
//! and one row-major placement per tile.
//!
//! The solve runs as a fixed sequence of steps, each a separate function:
//! grid search, the two-tile override, ratio snapping, containment, the
//! maximum-size clamp and final placement.

use std::ops::Range;

use tracing::{debug, instrument, warn};

use crate::error::{Result, TileSheetError};
use crate::model::{AspectRatio, CanvasPlan, PlacedTile, Rect};

/// Pixels around and between tiles unless configured otherwise.
pub const DEFAULT_MARGIN: u32 = 10;
/// Largest canvas side produced unless a single tile needs more.
pub const MAX_CANVAS_DIMENSION: u32 = 4096;

/// Solves a layout with the default canvas cap.
pub fn solve(sizes: &[(u32, u32)], margin: u32) -> Result<CanvasPlan> {
    solve_with_limit(sizes, margin, MAX_CANVAS_DIMENSION)
}

/// Solves a layout for `sizes` (input order is preserved in the placements).
///
/// Identical inputs always produce identical plans.
#[instrument(skip_all, fields(tiles = sizes.len(), margin = margin, max_dimension = max_dimension))]
pub fn solve_with_limit(
    sizes: &[(u32, u32)],
    margin: u32,
    max_dimension: u32,
) -> Result<CanvasPlan> {
    check_sizes(sizes)?;
    if max_dimension == 0 {
        return Err(TileSheetError::InvalidConfig(
            "max_dimension must be greater than zero".into(),
        ));
    }
    let margin64 = margin as u64;

    let grid = two_tile_override(sizes, margin64, grid_search(sizes, margin64));
    debug!(
        cols = grid.cols,
        width = grid.width,
        height = grid.height,
        "grid bounding box"
    );

    let canvas = snap_to_ratio(grid.width, grid.height).contain(grid.width, grid.height);
    let canvas = clamp_to_limit(canvas, largest_tile_box(sizes, margin64), max_dimension as u64);
    debug!(
        ratio = %canvas.ratio,
        width = canvas.width(),
        height = canvas.height(),
        "snapped canvas"
    );

    let slots = place(sizes, margin64, &canvas, grid.cols);
    let (extent_w, extent_h) = extent(&slots);
    let canvas = if canvas.width() < extent_w || canvas.height() < extent_h {
        warn!(
            extent_w,
            extent_h,
            width = canvas.width(),
            height = canvas.height(),
            "placements overflow the clamped canvas; growing it"
        );
        canvas.contain(extent_w, extent_h)
    } else {
        canvas
    };

    let width = to_dimension(canvas.width())?;
    let height = to_dimension(canvas.height())?;
    // every slot lies inside the canvas, so its coordinates fit in u32
    let placements = slots
        .iter()
        .enumerate()
        .map(|(index, s)| PlacedTile {
            index,
            rect: Rect::new(s.x as u32, s.y as u32, s.w as u32, s.h as u32),
        })
        .collect();

    Ok(CanvasPlan {
        width,
        height,
        ratio: canvas.ratio,
        margin,
        placements,
    })
}

fn check_sizes(sizes: &[(u32, u32)]) -> Result<()> {
    if sizes.is_empty() {
        return Err(TileSheetError::EmptyInput);
    }
    if let Some((i, (w, h))) = sizes.iter().enumerate().find(|(_, (w, h))| *w == 0 || *h == 0) {
        return Err(TileSheetError::InvalidInput(format!(
            "tile {i} has a zero dimension ({w}x{h})"
        )));
    }
    Ok(())
}

fn to_dimension(v: u64) -> Result<u32> {
    u32::try_from(v)
        .map_err(|_| TileSheetError::InvalidInput(format!("canvas dimension {v} overflows u32")))
}

// ---------- placement primitives ----------

#[derive(Debug, Clone, Copy)]
struct Slot {
    x: u64,
    y: u64,
    w: u64,
    h: u64,
}

/// Lays tiles out row by row. `rows` partitions `0..sizes.len()` in order.
fn arrange(sizes: &[(u32, u32)], margin: u64, rows: &[Range<usize>]) -> Vec<Slot> {
    let mut slots = Vec::with_capacity(sizes.len());
    let mut y = margin;
    for row in rows {
        let mut x = margin;
        let mut row_h = 0u64;
        for &(w, h) in &sizes[row.clone()] {
            let (w, h) = (w as u64, h as u64);
            slots.push(Slot { x, y, w, h });
            x += w + margin;
            row_h = row_h.max(h);
        }
        y += row_h + margin;
    }
    slots
}

/// Exclusive right/bottom extent of the placed slots.
fn extent(slots: &[Slot]) -> (u64, u64) {
    slots.iter().fold((0, 0), |(w, h), s| {
        (w.max(s.x + s.w), h.max(s.y + s.h))
    })
}

/// `per_row` tiles per row.
fn fixed_rows(n: usize, per_row: usize) -> Vec<Range<usize>> {
    let per_row = per_row.max(1);
    (0..n)
        .step_by(per_row)
        .map(|start| start..(start + per_row).min(n))
        .collect()
}

/// Tiles per row for the final width: the longest prefix of tiles that fits
/// with a margin on both sides and between them (at least one). Two tiles
/// always share a row.
fn items_per_row(sizes: &[(u32, u32)], margin: u64, width: u64) -> usize {
    if sizes.len() == 2 {
        return 2;
    }
    let mut row = margin;
    let mut count = 0;
    for &(w, _) in sizes {
        row += w as u64 + margin;
        if row > width {
            break;
        }
        count += 1;
    }
    count.max(1)
}

// ---------- step 1 + 2: column count ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GridFit {
    cols: usize,
    width: u64,
    height: u64,
}

// u128: products of summed u32 extents can exceed u64
fn tile_area(sizes: &[(u32, u32)]) -> u128 {
    sizes.iter().map(|&(w, h)| w as u128 * h as u128).sum()
}

fn area(w: u64, h: u64) -> u128 {
    w as u128 * h as u128
}

/// Tries every column count and keeps the one wasting the least area (earliest on ties).
fn grid_search(sizes: &[(u32, u32)], margin: u64) -> GridFit {
    let used = tile_area(sizes);
    let mut best: Option<(GridFit, u128)> = None;
    for cols in 1..=sizes.len() {
        let (width, height) = extent(&arrange(sizes, margin, &fixed_rows(sizes.len(), cols)));
        let empty = area(width, height).saturating_sub(used);
        if best.is_none_or(|(_, e)| empty < e) {
            best = Some((GridFit { cols, width, height }, empty));
        }
    }
    match best {
        Some((fit, _)) => fit,
        None => GridFit {
            cols: 1,
            width: margin,
            height: margin,
        },
    }
}

/// Two tiles go side by side whenever that wastes no more space than stacking them.
/// This overrides the grid search, whose metric can prefer stacking for pairs.
fn two_tile_override(sizes: &[(u32, u32)], margin: u64, grid: GridFit) -> GridFit {
    let &[(w1, h1), (w2, h2)] = sizes else {
        return grid;
    };
    let (w1, h1, w2, h2) = (w1 as u64, h1 as u64, w2 as u64, h2 as u64);
    let used = area(w1, h1) + area(w2, h2);

    let side_w = w1 + w2 + margin * 3;
    let side_h = h1.max(h2) + margin * 2;
    let stack_w = w1.max(w2) + margin * 2;
    let stack_h = h1 + h2 + margin * 3;
    let side_empty = area(side_w, side_h).saturating_sub(used);
    let stack_empty = area(stack_w, stack_h).saturating_sub(used);

    if side_empty <= stack_empty {
        GridFit {
            cols: 2,
            width: side_w - margin,
            height: side_h - margin,
        }
    } else {
        grid
    }
}

// ---------- steps 3..6: canvas size ----------

/// Canvas of `units` ratio steps: `units * ratio.width` x `units * ratio.height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SnappedCanvas {
    ratio: AspectRatio,
    units: u64,
}

impl SnappedCanvas {
    fn width(&self) -> u64 {
        self.units * self.ratio.width as u64
    }

    fn height(&self) -> u64 {
        self.ratio.height_for(self.width())
    }

    /// Grows (never shrinks) until the canvas holds a `min_w` x `min_h` box.
    fn contain(self, min_w: u64, min_h: u64) -> Self {
        let by_width = min_w.div_ceil(self.ratio.width as u64);
        let by_height = min_h.div_ceil(self.ratio.height as u64);
        Self {
            units: self.units.max(by_width).max(by_height),
            ..self
        }
    }
}

/// Smallest `ratio` canvas holding `bw` x `bh`, fitting width first or height first.
fn fit_ratio(ratio: AspectRatio, bw: u64, bh: u64) -> (u64, u64) {
    let by_width = {
        let h = ratio.height_for(bw);
        if h < bh { (ratio.width_for(bh), bh) } else { (bw, h) }
    };
    let by_height = {
        let w = ratio.width_for(bh);
        if w < bw { (bw, ratio.height_for(bw)) } else { (w, bh) }
    };
    if area(by_width.0, by_width.1) <= area(by_height.0, by_height.1) {
        by_width
    } else {
        by_height
    }
}

/// Picks the candidate ratio with the smallest fitted area (earliest on ties),
/// then rounds the width up to a whole ratio unit so the height derives exactly.
fn snap_to_ratio(bw: u64, bh: u64) -> SnappedCanvas {
    let mut best_ratio = AspectRatio::CANDIDATES[0];
    let (mut best_w, h) = fit_ratio(best_ratio, bw, bh);
    let mut best_area = area(best_w, h);
    for &ratio in &AspectRatio::CANDIDATES[1..] {
        let (w, h) = fit_ratio(ratio, bw, bh);
        if area(w, h) < best_area {
            best_ratio = ratio;
            best_w = w;
            best_area = area(w, h);
        }
    }
    SnappedCanvas {
        ratio: best_ratio,
        units: best_w.div_ceil(best_ratio.width as u64),
    }
}

/// Box that holds the single widest and the single tallest tile with margins on both sides.
fn largest_tile_box(sizes: &[(u32, u32)], margin: u64) -> (u64, u64) {
    let max_w = sizes.iter().map(|&(w, _)| w as u64).max().unwrap_or(0);
    let max_h = sizes.iter().map(|&(_, h)| h as u64).max().unwrap_or(0);
    (max_w + margin * 2, max_h + margin * 2)
}

/// Shrinks an oversized canvas so its larger side meets `max`, but never below
/// what the largest single tile needs.
fn clamp_to_limit(canvas: SnappedCanvas, largest: (u64, u64), max: u64) -> SnappedCanvas {
    if canvas.width() <= max && canvas.height() <= max {
        return canvas;
    }
    let cap_units = (max / canvas.ratio.width as u64).min(max / canvas.ratio.height as u64);
    let clamped = SnappedCanvas {
        units: canvas.units.min(cap_units),
        ..canvas
    }
    .contain(largest.0, largest.1);
    if clamped.width() > max || clamped.height() > max {
        warn!(
            width = clamped.width(),
            height = clamped.height(),
            max,
            "a single tile forces the canvas past the size cap"
        );
    }
    clamped
}

// ---------- step 7: placement ----------

/// One row length for every row, from the final width; falls back to the
/// grid-search column count when that overflows the canvas. If both overflow
/// the row-length arrangement is returned and the caller grows the canvas.
fn place(sizes: &[(u32, u32)], margin: u64, canvas: &SnappedCanvas, grid_cols: usize) -> Vec<Slot> {
    let fits = |slots: &[Slot]| {
        let (w, h) = extent(slots);
        w <= canvas.width() && h <= canvas.height()
    };
    let per_row = items_per_row(sizes, margin, canvas.width());
    let rows = arrange(sizes, margin, &fixed_rows(sizes.len(), per_row));
    if fits(&rows) {
        return rows;
    }
    let grid = arrange(sizes, margin, &fixed_rows(sizes.len(), grid_cols));
    if fits(&grid) {
        debug!(per_row, cols = grid_cols, "rows overflow the canvas; using grid columns");
        return grid;
    }
    rows
}
