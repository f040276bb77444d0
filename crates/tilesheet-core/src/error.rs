use thiserror::Error;

#[derive(Debug, Error)]
pub enum TileSheetError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Nothing to merge")]
    EmptyInput,
    #[error("Too many items: {count} (limit {limit})")]
    TileLimitExceeded { count: usize, limit: usize },
    #[error("Input {name} is {bytes} bytes (limit {limit})")]
    InputTooLarge { name: String, bytes: u64, limit: u64 },
    #[error("Invalid manifest: {0}")]
    InvalidManifest(#[from] ManifestError),
    #[error("Composite aspect ratio {composite:.4} does not match manifest ratio {manifest:.4}")]
    AspectRatioMismatch { composite: f64, manifest: f64 },
    #[error("Region {index} ({filename}) lies outside the composite")]
    OutOfBounds { index: usize, filename: String },
}

/// Reasons a position manifest is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("canvas size {width}x{height} must be non-zero")]
    ZeroCanvas { width: u32, height: u32 },
    #[error("manifest has no images")]
    NoEntries,
    #[error("image {index} has an empty filename")]
    EmptyFilename { index: usize },
    #[error("image {index} ({filename}) has a zero-sized region")]
    EmptyRegion { index: usize, filename: String },
    #[error("canvas size {width}x{height} exceeds the {limit} pixel side limit")]
    CanvasTooLarge { width: u32, height: u32, limit: u64 },
    #[error("image {index} ({filename}) extends past the {width}x{height} canvas")]
    OutsideCanvas {
        index: usize,
        filename: String,
        width: u32,
        height: u32,
    },
}

pub type Result<T> = std::result::Result<T, TileSheetError>;
