use image::{DynamicImage, Rgba, RgbaImage, imageops};
use tilesheet_core::prelude::*;
use tilesheet_core::reconstruct::{check_aspect_ratio, extract_region, key_background};
use tilesheet_core::{Size, reconstruct::rescale_to_canvas};

fn solid(name: &str, w: u32, h: u32, px: [u8; 4]) -> InputTile {
    InputTile {
        name: name.into(),
        image: DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba(px))),
    }
}

fn sample_merge() -> (MergeOutput, Vec<RgbaImage>) {
    let mut patterned = RgbaImage::new(30, 20);
    for (x, y, px) in patterned.enumerate_pixels_mut() {
        *px = Rgba([(x * 7) as u8, (y * 11) as u8, 100, 255]);
    }
    let inputs = vec![
        solid("red.png", 40, 30, [220, 20, 20, 255]),
        InputTile {
            name: "pattern.png".into(),
            image: DynamicImage::ImageRgba8(patterned.clone()),
        },
        solid("blue.png", 25, 50, [20, 20, 220, 255]),
    ];
    let expected = vec![
        RgbaImage::from_pixel(40, 30, Rgba([220, 20, 20, 255])),
        patterned,
        RgbaImage::from_pixel(25, 50, Rgba([20, 20, 220, 255])),
    ];
    let out = merge_tiles(inputs, &SheetConfig::default()).expect("merge");
    (out, expected)
}

#[test]
fn lossless_round_trip_restores_tiles() {
    let (out, expected) = sample_merge();
    let composite = DynamicImage::ImageRgba8(out.composite.clone());
    let tiles = reconstruct(&composite, &out.manifest).expect("reconstruct");
    assert_eq!(tiles.len(), 3);
    assert_eq!(tiles[0].name, "red.png");
    assert_eq!(tiles[1].name, "pattern.png");
    assert_eq!(tiles[2].name, "blue.png");
    for (t, want) in tiles.iter().zip(&expected) {
        assert_eq!(&t.image, want, "{} differs", t.name);
    }
}

#[test]
fn upscaled_composite_is_rescaled_to_manifest_canvas() {
    let (out, _) = sample_merge();
    let (w, h) = out.composite.dimensions();
    let big = imageops::resize(&out.composite, w * 2, h * 2, imageops::FilterType::Nearest);
    let tiles = split_sheet(
        &DynamicImage::ImageRgba8(big),
        &out.manifest,
        &SheetConfig::default(),
    )
    .expect("split");
    assert_eq!(tiles[0].image.dimensions(), (40, 30));
    assert_eq!(tiles[2].image.dimensions(), (25, 50));
    let center = tiles[0].image.get_pixel(20, 15);
    for (c, want) in center.0.iter().zip([220u8, 20, 20, 255]) {
        assert!((*c as i16 - want as i16).abs() <= 1, "{center:?}");
    }
}

#[test]
fn near_white_is_keyed_out() {
    let mut img = RgbaImage::new(3, 1);
    img.put_pixel(0, 0, Rgba([250, 250, 250, 255]));
    img.put_pixel(1, 0, Rgba([200, 200, 200, 0]));
    img.put_pixel(2, 0, Rgba([250, 250, 240, 255]));
    key_background(&mut img, 240);
    assert_eq!(img.get_pixel(0, 0)[3], 0);
    assert_eq!(img.get_pixel(1, 0)[3], 255);
    // 240 is not above the threshold
    assert_eq!(img.get_pixel(2, 0)[3], 255);
}

#[test]
fn white_background_after_flattening_becomes_transparent() {
    let (out, _) = sample_merge();
    let (w, h) = out.composite.dimensions();
    let mut flat = RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut flat, &out.composite, 0, 0);
    let tiles = reconstruct(&DynamicImage::ImageRgba8(flat), &out.manifest).expect("reconstruct");
    assert!(tiles.iter().all(|t| t.image.pixels().all(|p| p[3] == 255)));
}

#[test]
fn mismatched_ratio_is_rejected() {
    let (out, _) = sample_merge();
    let Size { width, height } = out.manifest.canvas_size;
    let stretched = DynamicImage::ImageRgba8(RgbaImage::new(width * 2, height));
    let err = reconstruct(&stretched, &out.manifest).unwrap_err();
    assert!(matches!(err, TileSheetError::AspectRatioMismatch { .. }));

    assert!(check_aspect_ratio(width * 3, height * 3, &out.manifest, 0.01).is_ok());
    assert!(matches!(
        check_aspect_ratio(0, 10, &out.manifest, 0.01),
        Err(TileSheetError::InvalidInput(_))
    ));
}

#[test]
fn region_outside_canvas_is_out_of_bounds() {
    let canvas = Size {
        width: 100,
        height: 100,
    };
    let manifest = PositionManifest {
        canvas_size: canvas,
        images: vec![
            ManifestEntry::new("ok.png", Rect::new(0, 0, 10, 10), canvas),
            ManifestEntry::new("bad.png", Rect::new(90, 0, 20, 10), canvas),
        ],
    };
    let composite = DynamicImage::ImageRgba8(RgbaImage::new(100, 100));
    let err = reconstruct(&composite, &manifest).unwrap_err();
    match err {
        TileSheetError::OutOfBounds { index, filename } => {
            assert_eq!(index, 1);
            assert_eq!(filename, "bad.png");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn structurally_invalid_manifest_is_rejected() {
    let manifest = PositionManifest {
        canvas_size: Size {
            width: 10,
            height: 10,
        },
        images: vec![],
    };
    let composite = DynamicImage::ImageRgba8(RgbaImage::new(10, 10));
    let err = reconstruct(&composite, &manifest).unwrap_err();
    assert!(matches!(
        err,
        TileSheetError::InvalidManifest(ManifestError::NoEntries)
    ));
}

#[test]
fn helpers_leave_matching_sizes_alone() {
    let img = RgbaImage::from_pixel(8, 4, Rgba([1, 2, 3, 255]));
    let same = rescale_to_canvas(
        img.clone(),
        Size {
            width: 8,
            height: 4,
        },
        ResampleFilter::Lanczos3,
    );
    assert_eq!(same, img);
    assert!(extract_region(&img, Rect::new(4, 0, 4, 4)).is_some());
    assert!(extract_region(&img, Rect::new(5, 0, 4, 4)).is_none());
    assert!(extract_region(&img, Rect::new(0, 0, 0, 4)).is_none());
}
