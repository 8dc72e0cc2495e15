use super::*;

fn assert_exact_cover(region: Rect, tiles: &[Tile]) {
    let mut y = region.y1;
    for (i, t) in tiles.iter().enumerate() {
        assert_eq!(t.index, i);
        assert_eq!(t.rect.x1, region.x1);
        assert_eq!(t.rect.x2, region.x2);
        assert_eq!(t.rect.y1, y, "tiles must be contiguous and disjoint");
        assert!(!t.rect.is_empty());
        y = t.rect.y2;
    }
    assert_eq!(y, region.y2);
    let covered: u64 = tiles.iter().map(|t| t.rect.area()).sum();
    assert_eq!(covered, region.area());
}

#[test]
fn empty_region_yields_no_tiles() {
    assert!(partition(Rect::default(), 8, TileGranularity::Auto).is_empty());
    let zero_width = Rect::new(3, 0, 3, 100).unwrap();
    assert!(partition(zero_width, 8, TileGranularity::Auto).is_empty());
}

#[test]
fn single_row_region_is_one_tile() {
    let region = Rect::new(-5, 7, 40, 8).unwrap();
    let tiles = partition(region, 16, TileGranularity::Auto);
    assert_eq!(tiles, vec![Tile { index: 0, rect: region }]);
}

#[test]
fn short_regions_tile_by_scanline() {
    let region = Rect::from_size(10, SCANLINE_TILING_MAX_HEIGHT);
    let tiles = partition(region, 4, TileGranularity::Auto);
    assert_eq!(tiles.len(), SCANLINE_TILING_MAX_HEIGHT as usize);
    assert_exact_cover(region, &tiles);
}

#[test]
fn tall_regions_split_per_worker() {
    let region = Rect::new(0, 10, 3, 10 + 1000).unwrap();
    let tiles = partition(region, 3, TileGranularity::Auto);
    // ceil(1000 / 3) = 334 rows per tile.
    assert_eq!(tiles.len(), 3);
    assert_eq!(tiles[0].rect.height(), 334);
    assert_eq!(tiles[2].rect.height(), 332);
    assert_exact_cover(region, &tiles);
}

#[test]
fn more_workers_than_rows_tiles_by_scanline() {
    let region = Rect::from_size(2, 100);
    let tiles = partition(region, 256, TileGranularity::Auto);
    assert_eq!(tiles.len(), 100);
    assert_exact_cover(region, &tiles);
}

#[test]
fn thousands_of_rows_are_covered_exactly() {
    for height in [65u32, 999, 4096, 4097] {
        for workers in [1usize, 2, 7, 64] {
            let region = Rect::from_size(17, height);
            assert_exact_cover(region, &partition(region, workers, TileGranularity::Auto));
        }
    }
}

#[test]
fn fixed_rows_granularity() {
    let region = Rect::from_size(4, 10);
    let tiles = partition(region, 2, TileGranularity::Rows(4));
    let heights: Vec<u32> = tiles.iter().map(|t| t.rect.height()).collect();
    assert_eq!(heights, vec![4, 4, 2]);
    assert_exact_cover(region, &tiles);

    let tiles = partition(region, 2, TileGranularity::Rows(0));
    assert_eq!(tiles.len(), 10);
}

#[test]
fn granularity_deserializes_from_config() {
    let g: TileGranularity = serde_json::from_str(r#"{"rows":16}"#).unwrap();
    assert_eq!(g, TileGranularity::Rows(16));
    let g: TileGranularity = serde_json::from_str(r#""auto""#).unwrap();
    assert_eq!(g, TileGranularity::Auto);
}
