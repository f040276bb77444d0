use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named RGBA tile. Input to rendering, output of reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub name: String,
    pub image: RgbaImage,
}

impl Tile {
    pub fn new(name: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }
    pub fn width(&self) -> u32 {
        self.image.width()
    }
    pub fn height(&self) -> u32 {
        self.image.height()
    }
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`), widened so it cannot overflow.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.w as u64
    }
    /// Exclusive bottom edge (`y + h`), widened so it cannot overflow.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.h as u64
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    /// Returns true if `r` lies fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the interiors of the two rectangles intersect.
    pub fn overlaps(&self, r: &Rect) -> bool {
        !(self.right() <= r.x as u64
            || r.right() <= self.x as u64
            || self.bottom() <= r.y as u64
            || r.bottom() <= self.y as u64)
    }
    /// True when the rectangle fits inside a `width` x `height` surface anchored at the origin.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width as u64 && self.bottom() <= height as u64
    }
}

/// Target canvas aspect ratio expressed in integer units (`width:height`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const SQUARE: Self = Self::new(1, 1);
    pub const STANDARD: Self = Self::new(4, 3);
    pub const WIDE: Self = Self::new(16, 9);
    /// Ratios the solver snaps to, in tie-break order.
    pub const CANDIDATES: [Self; 3] = [Self::SQUARE, Self::STANDARD, Self::WIDE];

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `ceil(width * h / w)`: the height that exactly matches `width`.
    pub fn height_for(&self, width: u64) -> u64 {
        (width * self.height as u64).div_ceil(self.width as u64)
    }

    /// `ceil(height * w / h)`: the width that exactly matches `height`.
    pub fn width_for(&self, height: u64) -> u64 {
        (height * self.width as u64).div_ceil(self.height as u64)
    }

    pub fn as_f64(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// A tile's position inside the canvas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacedTile {
    /// Index of the tile in the solver's input order.
    pub index: usize,
    /// Placed rectangle; `w,h` equal the tile's own size.
    pub rect: Rect,
}

/// Solved canvas: size, snapped ratio and one placement per input tile (input order).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanvasPlan {
    pub width: u32,
    pub height: u32,
    pub ratio: AspectRatio,
    pub margin: u32,
    pub placements: Vec<PlacedTile>,
}

impl CanvasPlan {
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Computes occupancy statistics for this plan.
    pub fn stats(&self) -> SheetStats {
        let canvas_area = self.width as u64 * self.height as u64;
        let used_area: u64 = self.placements.iter().map(|p| p.rect.area()).sum();
        let occupancy = if canvas_area > 0 {
            used_area as f64 / canvas_area as f64
        } else {
            0.0
        };
        SheetStats {
            num_tiles: self.placements.len(),
            canvas_width: self.width,
            canvas_height: self.height,
            canvas_area,
            used_area,
            occupancy,
        }
    }
}

/// Statistics about sheet packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SheetStats {
    /// Number of tiles placed.
    pub num_tiles: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Canvas width * height.
    pub canvas_area: u64,
    /// Sum of tile areas.
    pub used_area: u64,
    /// used_area / canvas_area (0.0 to 1.0). Higher is better.
    pub occupancy: f64,
}

impl SheetStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Tiles: {}, Canvas: {}x{}, Occupancy: {:.2}%, Total Area: {} px², Used Area: {} px²",
            self.num_tiles,
            self.canvas_width,
            self.canvas_height,
            self.occupancy * 100.0,
            self.canvas_area,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.canvas_area.saturating_sub(self.used_area)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.canvas_area > 0 {
            (self.wasted_area() as f64 / self.canvas_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
