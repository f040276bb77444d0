use tilesheet_core::prelude::*;

#[test]
fn oversized_grid_is_clamped_to_cap() {
    let sizes = vec![(1000, 1000); 10];
    let plan = tilesheet_core::solve(&sizes, 10).expect("solve");
    assert!(plan.width <= 4096 && plan.height <= 4096, "{}x{}", plan.width, plan.height);
    for p in &plan.placements {
        assert!(p.rect.fits_within(plan.width, plan.height));
    }
}

#[test]
fn lower_cap_is_respected_when_tiles_allow() {
    let sizes = vec![(100, 100); 9];
    let plan = tilesheet_core::solve_with_limit(&sizes, 10, 400).expect("solve");
    assert!(plan.width <= 400 && plan.height <= 400, "{}x{}", plan.width, plan.height);
    for p in &plan.placements {
        assert!(p.rect.fits_within(plan.width, plan.height));
    }
}

#[test]
fn single_huge_tile_breaks_the_cap() {
    let plan = tilesheet_core::solve(&[(5000, 100)], 10).expect("solve");
    assert!(plan.width > 4096);
    assert!(plan.width >= 5020);
    assert!(plan.placements[0].rect.fits_within(plan.width, plan.height));
}

#[test]
fn zero_cap_is_rejected() {
    let err = tilesheet_core::solve_with_limit(&[(10, 10)], 10, 0).unwrap_err();
    assert!(matches!(err, TileSheetError::InvalidConfig(_)));
}
