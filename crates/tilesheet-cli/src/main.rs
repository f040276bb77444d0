use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::ImageFormat;
use serde::Deserialize;
use tilesheet_core::{
    InputTile, PositionManifest, ResampleFilter, SheetConfig, decode_composite, decode_tile,
    merge_tiles, plan_layout, split_sheet,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "tilesheet",
    about = "Merge images into a sprite sheet and split sheets back into images",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge images into a composite PNG, a mask PNG and a JSON manifest
    Merge(MergeArgs),
    /// Split a composite back into images using its manifest
    Split(SplitArgs),
    /// Layout-only: solve placements from image headers and emit the manifest (no PNGs)
    Layout(LayoutArgs),
}

/// Input selection and layout options shared by `merge` and `layout`.
#[derive(Args, Debug, Clone)]
struct SheetInputArgs {
    /// Input files or directories, merged in the given order (directory contents sorted by path)
    #[arg(required = true, help_heading = "Input/Output")]
    inputs: Vec<PathBuf>,
    /// YAML config file path (values override the flags below)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    /// Pixels around and between tiles
    #[arg(long, default_value_t = tilesheet_core::DEFAULT_MARGIN, help_heading = "Layout")]
    margin: u32,
    /// Largest canvas side (exceeded only when one image needs more)
    #[arg(long, default_value_t = tilesheet_core::MAX_CANVAS_DIMENSION, help_heading = "Layout")]
    max_dimension: u32,
    /// Maximum number of images per sheet
    #[arg(long, default_value_t = 10, help_heading = "Limits")]
    max_tiles: usize,
}

#[derive(Parser, Debug, Clone)]
struct MergeArgs {
    #[command(flatten)]
    input: SheetInputArgs,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Sheet base name (files will be name.png / name_mask.png / name.json)
    #[arg(short, long, default_value = "sheet", help_heading = "Input/Output")]
    name: String,
    /// Maximum encoded size per image (bytes)
    #[arg(long, default_value_t = 5 * 1024 * 1024, help_heading = "Limits")]
    max_tile_bytes: u64,

    /// Export sheet stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct LayoutArgs {
    #[command(flatten)]
    input: SheetInputArgs,
    /// Write the manifest here instead of stdout
    #[arg(short, long, help_heading = "Input/Output")]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
struct SplitArgs {
    /// Composite image (any resolution with the manifest's aspect ratio)
    #[arg(help_heading = "Input/Output")]
    composite: PathBuf,
    /// Position manifest JSON written by `merge`
    #[arg(help_heading = "Input/Output")]
    manifest: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// YAML config file path (values override the flags below)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    // Reconstruction
    /// Pixels with R, G and B all above this are treated as background
    #[arg(long, default_value_t = 240, help_heading = "Reconstruction")]
    key_threshold: u8,
    /// Allowed difference between composite and manifest aspect ratios
    #[arg(long, default_value_t = 0.01, help_heading = "Reconstruction")]
    ratio_tolerance: f64,
    /// Resample filter: nearest|triangle|catmullrom|gaussian|lanczos3
    #[arg(long, default_value = "triangle", help_heading = "Reconstruction")]
    filter: String,

    /// Margin the sheet was merged with (bounds the accepted manifest canvas)
    #[arg(long, default_value_t = tilesheet_core::DEFAULT_MARGIN, help_heading = "Limits")]
    margin: u32,
    /// Canvas side cap the sheet was merged with
    #[arg(long, default_value_t = tilesheet_core::MAX_CANVAS_DIMENSION, help_heading = "Limits")]
    max_dimension: u32,
    /// Maximum number of regions per split
    #[arg(long, default_value_t = 20, help_heading = "Limits")]
    max_regions: usize,
    /// Maximum encoded size of the composite (bytes)
    #[arg(long, default_value_t = 10 * 1024 * 1024, help_heading = "Limits")]
    max_composite_bytes: u64,
    /// Dry run: split in memory but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Merge(args) => run_merge(args, cli.progress && !cli.quiet),
        Commands::Split(args) => run_split(args),
        Commands::Layout(args) => run_layout(args),
    }
}

fn sheet_config(input: &SheetInputArgs, max_tile_bytes: Option<u64>) -> anyhow::Result<SheetConfig> {
    let mut cfg = SheetConfig {
        margin: input.margin,
        max_dimension: input.max_dimension,
        max_tiles: input.max_tiles,
        ..Default::default()
    };
    if let Some(v) = max_tile_bytes {
        cfg.max_tile_bytes = v;
    }
    apply_yaml(cfg, input.config.as_deref())
}

fn split_config(cli: &SplitArgs) -> anyhow::Result<SheetConfig> {
    let resample: ResampleFilter = cli
        .filter
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown resample filter: {}", cli.filter))?;
    let cfg = SheetConfig {
        key_threshold: cli.key_threshold,
        ratio_tolerance: cli.ratio_tolerance,
        resample,
        margin: cli.margin,
        max_dimension: cli.max_dimension,
        max_regions: cli.max_regions,
        max_composite_bytes: cli.max_composite_bytes,
        ..Default::default()
    };
    apply_yaml(cfg, cli.config.as_deref())
}

fn apply_yaml(cfg: SheetConfig, path: Option<&Path>) -> anyhow::Result<SheetConfig> {
    let Some(path) = path else {
        return Ok(cfg);
    };
    let file =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let y: YamlConfig =
        serde_yaml::from_str(&file).with_context(|| format!("parse config {}", path.display()))?;
    y.into_sheet_config(cfg)
}

fn run_merge(cli: &MergeArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = sheet_config(&cli.input, Some(cli.max_tile_bytes))?;
    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let paths = gather_paths(&cli.input)?;
    if paths.len() > cfg.max_tiles {
        anyhow::bail!(
            "{} images found but at most {} can be merged",
            paths.len(),
            cfg.max_tiles
        );
    }
    let inputs = load_images_with_progress(&paths, &cfg, show_progress)?;
    info!(count = inputs.len(), "loaded input images");

    let out = merge_tiles(inputs, &cfg)?;
    let stats = out.stats();
    info!(
        width = stats.canvas_width,
        height = stats.canvas_height,
        used_area = stats.used_area,
        total_area = stats.canvas_area,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );

    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
        let png_path = cli.out_dir.join(format!("{}.png", cli.name));
        out.composite
            .save(&png_path)
            .with_context(|| format!("write {}", png_path.display()))?;
        let mask_path = cli.out_dir.join(format!("{}_mask.png", cli.name));
        out.mask
            .save(&mask_path)
            .with_context(|| format!("write {}", mask_path.display()))?;
        let json_path = cli.out_dir.join(format!("{}.json", cli.name));
        fs::write(&json_path, out.manifest.to_json_pretty()?)
            .with_context(|| format!("write {}", json_path.display()))?;
        info!(?png_path, ?mask_path, ?json_path, "sheet written");
    }

    if let Some(stats_path) = &cli.export_stats {
        let value = serde_json::json!({
            "tiles": stats.num_tiles,
            "width": stats.canvas_width,
            "height": stats.canvas_height,
            "ratio": out.plan.ratio.to_string(),
            "used_area": stats.used_area,
            "total_area": stats.canvas_area,
            "occupancy": stats.occupancy,
        });
        if !cli.dry_run {
            fs::write(stats_path, serde_json::to_string_pretty(&value)?)
                .with_context(|| format!("write {}", stats_path.display()))?;
            info!(?stats_path, "stats exported");
        } else {
            println!("{}", stats.summary());
        }
    }
    Ok(())
}

fn run_layout(cli: &LayoutArgs) -> anyhow::Result<()> {
    let cfg = sheet_config(&cli.input, None)?;
    let paths = gather_paths(&cli.input)?;
    let mut items: Vec<(String, u32, u32)> = Vec::with_capacity(paths.len());
    for p in &paths {
        let (w, h) =
            image::image_dimensions(p).with_context(|| format!("read header {}", p.display()))?;
        items.push((tile_name(p), w, h));
    }
    let (plan, manifest) = plan_layout(&items, &cfg)?;
    info!(
        width = plan.width,
        height = plan.height,
        ratio = %plan.ratio,
        occupancy = format!("{:.2}%", plan.stats().occupancy * 100.0),
        "layout solved"
    );
    let json = manifest.to_json_pretty()?;
    match &cli.output {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("create {}", dir.display()))?;
            }
            fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
            info!(?path, "manifest written (layout-only)");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_split(cli: &SplitArgs) -> anyhow::Result<()> {
    let cfg = split_config(cli)?;

    let manifest_bytes = fs::read(&cli.manifest)
        .with_context(|| format!("read manifest {}", cli.manifest.display()))?;
    let manifest = PositionManifest::from_json_slice(&manifest_bytes)
        .with_context(|| format!("parse manifest {}", cli.manifest.display()))?;

    let composite_bytes = fs::read(&cli.composite)
        .with_context(|| format!("read composite {}", cli.composite.display()))?;
    let composite = decode_composite(
        &cli.composite.to_string_lossy(),
        &composite_bytes,
        &cfg,
    )?;
    info!(
        width = composite.width(),
        height = composite.height(),
        regions = manifest.images.len(),
        "loaded composite"
    );

    let tiles = split_sheet(&composite, &manifest, &cfg)?;
    if cli.dry_run {
        for t in &tiles {
            println!("{} {}x{}", t.name, t.width(), t.height());
        }
        return Ok(());
    }

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    for (i, t) in tiles.iter().enumerate() {
        let path = cli.out_dir.join(output_file_name(&t.name, i));
        t.image
            .save(&path)
            .with_context(|| format!("write {}", path.display()))?;
        info!(?path, "wrote tile");
    }
    Ok(())
}

/// File name for a restored tile: the manifest name's final component, saved as PNG.
fn output_file_name(name: &str, index: usize) -> PathBuf {
    let base = Path::new(name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("cut_{index}")));
    if base
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
    {
        base
    } else {
        base.with_extension("png")
    }
}

fn tile_name(p: &Path) -> String {
    p.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| p.to_string_lossy().replace('\\', "/"))
}

/// Include/exclude glob filter over forward-slash paths. An empty include
/// list accepts everything not excluded.
struct PathFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl PathFilter {
    fn new(include: &[String], exclude: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            include: glob_set(include)?,
            exclude: glob_set(exclude)?,
        })
    }

    fn accepts(&self, p: &Path) -> bool {
        let s = p.to_string_lossy().replace('\\', "/");
        let excluded = self.exclude.as_ref().is_some_and(|g| g.is_match(&s));
        let included = self.include.as_ref().is_none_or(|g| g.is_match(&s));
        included && !excluded && is_readable_image(p)
    }
}

fn glob_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob {pat}"))?);
    }
    Ok(Some(b.build()?))
}

/// Any format the `image` build can decode, judged by extension.
fn is_readable_image(p: &Path) -> bool {
    ImageFormat::from_path(p).is_ok_and(|f| f.reading_enabled())
}

/// Explicit files keep their command-line order; directories are walked sorted by name.
fn gather_paths(input: &SheetInputArgs) -> anyhow::Result<Vec<PathBuf>> {
    let filter = PathFilter::new(&input.include, &input.exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    for path in &input.inputs {
        if path.is_file() {
            if filter.accepts(path) {
                list.push(path.clone());
            }
            continue;
        }
        let walked = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && filter.accepts(e.path()))
            .map(|e| e.into_path());
        list.extend(walked);
    }
    if list.is_empty() {
        warn!("no readable images matched the inputs");
    }
    Ok(list)
}

fn load_images_with_progress(
    paths: &[PathBuf],
    cfg: &SheetConfig,
    progress: bool,
) -> anyhow::Result<Vec<InputTile>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let name = tile_name(p);
        if let Some(b) = &bar {
            b.set_message(name.clone());
        }
        if list.iter().any(|t: &InputTile| t.name == name) {
            warn!(?p, name = %name, "duplicate file name; split output will overwrite");
        }
        let bytes = fs::read(p).with_context(|| format!("read {}", p.display()))?;
        let tile = decode_tile(name, &bytes, cfg).with_context(|| format!("load {}", p.display()))?;
        list.push(tile);
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

/// `RUST_LOG` wins when set; otherwise `-q` / `-v` pick the level.
fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    margin: Option<u32>,
    max_dimension: Option<u32>,
    max_tiles: Option<usize>,
    max_regions: Option<usize>,
    max_tile_bytes: Option<u64>,
    max_composite_bytes: Option<u64>,
    key_threshold: Option<u8>,
    ratio_tolerance: Option<f64>,
    resample: Option<String>,
}

impl YamlConfig {
    fn into_sheet_config(self, mut cfg: SheetConfig) -> anyhow::Result<SheetConfig> {
        if let Some(v) = self.margin {
            cfg.margin = v;
        }
        if let Some(v) = self.max_dimension {
            cfg.max_dimension = v;
        }
        if let Some(v) = self.max_tiles {
            cfg.max_tiles = v;
        }
        if let Some(v) = self.max_regions {
            cfg.max_regions = v;
        }
        if let Some(v) = self.max_tile_bytes {
            cfg.max_tile_bytes = v;
        }
        if let Some(v) = self.max_composite_bytes {
            cfg.max_composite_bytes = v;
        }
        if let Some(v) = self.key_threshold {
            cfg.key_threshold = v;
        }
        if let Some(v) = self.ratio_tolerance {
            cfg.ratio_tolerance = v;
        }
        if let Some(v) = self.resample {
            cfg.resample = v
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown resample filter: {}", v))?;
        }
        Ok(cfg)
    }
}
