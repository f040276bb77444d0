use tilesheet_core::prelude::*;

#[test]
fn pair_goes_side_by_side_on_wide_canvas() {
    let plan = tilesheet_core::solve(&[(100, 50), (80, 60)], 10).expect("solve");
    assert_eq!(plan.ratio, AspectRatio::WIDE);
    assert_eq!((plan.width, plan.height), (208, 117));
    assert_eq!(plan.placements.len(), 2);
    assert_eq!(plan.placements[0].rect, Rect::new(10, 10, 100, 50));
    assert_eq!(plan.placements[1].rect, Rect::new(120, 10, 80, 60));
}

#[test]
fn pair_of_tall_tiles_stays_in_one_row() {
    let plan = tilesheet_core::solve(&[(40, 300), (40, 300)], 10).expect("solve");
    let a = plan.placements[0].rect;
    let b = plan.placements[1].rect;
    assert_eq!(a.y, b.y);
    assert!(b.x as u64 >= a.right() + 10);
}

#[test]
fn single_tile_gets_square_canvas() {
    let plan = tilesheet_core::solve(&[(64, 64)], 10).expect("solve");
    assert_eq!(plan.ratio, AspectRatio::SQUARE);
    assert_eq!((plan.width, plan.height), (74, 74));
    assert_eq!(plan.placements[0].rect, Rect::new(10, 10, 64, 64));
}

#[test]
fn zero_margin_packs_edge_to_edge() {
    let plan = tilesheet_core::solve(&[(32, 32), (32, 32)], 0).expect("solve");
    assert_eq!(plan.placements[0].rect, Rect::new(0, 0, 32, 32));
    assert_eq!(plan.placements[1].rect, Rect::new(32, 0, 32, 32));
    assert!(plan.width >= 64 && plan.height >= 32);
}
