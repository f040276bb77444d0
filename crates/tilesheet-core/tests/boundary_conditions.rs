use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use tilesheet_core::prelude::*;
use tilesheet_core::{Size, decode_composite, decode_tile};

fn tile(name: &str) -> InputTile {
    InputTile {
        name: name.into(),
        image: DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([9, 9, 9, 255]))),
    }
}

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    RgbaImage::from_pixel(w, h, Rgba([1, 2, 3, 255]))
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encode");
    buf.into_inner()
}

#[test]
fn empty_input_is_rejected() {
    let err = merge_tiles(Vec::new(), &SheetConfig::default()).unwrap_err();
    assert!(matches!(err, TileSheetError::EmptyInput));
    let err = tilesheet_core::solve(&[], 10).unwrap_err();
    assert!(matches!(err, TileSheetError::EmptyInput));
}

#[test]
fn zero_sized_tile_is_rejected() {
    let err = tilesheet_core::solve(&[(10, 10), (0, 5)], 10).unwrap_err();
    assert!(matches!(err, TileSheetError::InvalidInput(_)));
}

#[test]
fn too_many_tiles_for_merge() {
    let inputs: Vec<InputTile> = (0..11).map(|i| tile(&format!("t{i}.png"))).collect();
    let err = merge_tiles(inputs, &SheetConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        TileSheetError::TileLimitExceeded {
            count: 11,
            limit: 10
        }
    ));

    let inputs: Vec<InputTile> = (0..10).map(|i| tile(&format!("t{i}.png"))).collect();
    let out = merge_tiles(inputs, &SheetConfig::default()).expect("ten tiles merge");
    assert_eq!(out.manifest.images.len(), 10);
}

#[test]
fn too_many_regions_for_split() {
    let canvas = Size {
        width: 100,
        height: 100,
    };
    let manifest = PositionManifest {
        canvas_size: canvas,
        images: (0..21)
            .map(|i| ManifestEntry::new(format!("r{i}.png"), Rect::new(0, 0, 5, 5), canvas))
            .collect(),
    };
    let composite = DynamicImage::ImageRgba8(RgbaImage::new(100, 100));
    let err = split_sheet(&composite, &manifest, &SheetConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        TileSheetError::TileLimitExceeded {
            count: 21,
            limit: 20
        }
    ));
}

#[test]
fn empty_tile_name_is_rejected() {
    let err = merge_tiles(vec![tile("")], &SheetConfig::default()).unwrap_err();
    assert!(matches!(err, TileSheetError::InvalidInput(_)));
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = SheetConfig::builder().max_tiles(0).build();
    assert!(matches!(
        cfg.validate(),
        Err(TileSheetError::InvalidConfig(_))
    ));
    let cfg = SheetConfig::builder().ratio_tolerance(f64::NAN).build();
    assert!(cfg.validate().is_err());
    let cfg = SheetConfig::builder().max_dimension(0).build();
    let err = merge_tiles(vec![tile("a.png")], &cfg).unwrap_err();
    assert!(matches!(err, TileSheetError::InvalidConfig(_)));
    assert!(SheetConfig::default().validate().is_ok());
}

#[test]
fn oversized_encodings_are_rejected_before_decoding() {
    let bytes = png_bytes(16, 16);
    let cfg = SheetConfig::builder()
        .max_tile_bytes(bytes.len() as u64 - 1)
        .build();
    let err = decode_tile("big.png", &bytes, &cfg).err().expect("too large");
    assert!(matches!(err, TileSheetError::InputTooLarge { .. }));

    let ok = decode_tile("small.png", &bytes, &SheetConfig::default()).expect("decode");
    assert_eq!(ok.image.width(), 16);

    let cfg = SheetConfig::builder().max_composite_bytes(8).build();
    let err = decode_composite("sheet.png", &bytes, &cfg).unwrap_err();
    assert!(matches!(err, TileSheetError::InputTooLarge { limit: 8, .. }));
}

#[test]
fn undecodable_bytes_surface_image_error() {
    let err = decode_tile("junk.png", b"not an image", &SheetConfig::default())
        .err()
        .expect("junk");
    assert!(matches!(err, TileSheetError::Image(_)));
}

#[test]
fn resample_filter_parses_aliases() {
    assert_eq!("lanczos3".parse::<ResampleFilter>(), Ok(ResampleFilter::Lanczos3));
    assert_eq!("Nearest".parse::<ResampleFilter>(), Ok(ResampleFilter::Nearest));
    assert!("bogus".parse::<ResampleFilter>().is_err());
}

#[test]
fn huge_dimensions_fail_instead_of_overflowing() {
    let err = tilesheet_core::solve(&[(4_000_000_000, 4_000_000_000); 10], 10).unwrap_err();
    assert!(matches!(err, TileSheetError::InvalidInput(_)));
}

#[test]
fn oversized_manifest_canvas_is_rejected_before_rescale() {
    let canvas = Size {
        width: 60000,
        height: 60000,
    };
    let manifest = PositionManifest {
        canvas_size: canvas,
        images: vec![ManifestEntry::new("a.png", Rect::new(0, 0, 10, 10), canvas)],
    };
    let composite = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
    let err = split_sheet(&composite, &manifest, &SheetConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        TileSheetError::InvalidManifest(ManifestError::CanvasTooLarge { limit: 4096, .. })
    ));
}

#[test]
fn merged_canvases_past_the_cap_stay_splittable() {
    let cfg = SheetConfig::default();
    let wide = [("wide.png", 5000, 100)];
    let tall = [("tall.png", 100, 5000)];
    let grown: Vec<(String, u32, u32)> = (0..10).map(|i| (format!("t{i}.png"), 2000, 2000)).collect();
    for manifest in [
        plan_layout(&wide, &cfg).expect("wide").1,
        plan_layout(&tall, &cfg).expect("tall").1,
        plan_layout(&grown, &cfg).expect("grown").1,
    ] {
        assert!(manifest.canvas_size.width > 4096 || manifest.canvas_size.height > 4096);
        manifest
            .check_canvas_limit(cfg.max_dimension, cfg.margin)
            .expect("within limit");
    }
}
