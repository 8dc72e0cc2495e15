use super::*;
use crate::pixel::types::{Gray, Rgb, Rgba};

fn tile(index: usize, x1: i32, y1: i32, x2: i32, y2: i32) -> Tile {
    Tile {
        index,
        rect: Rect { x1, y1, x2, y2 },
    }
}

#[test]
fn construction_validates_stride_and_length() {
    let data = vec![0u16; 12];
    // Stride not a multiple of the channel size.
    assert!(ImageView::<Rgb<u16>>::new(&data, Rect::from_size(2, 2), 13).is_err());
    // Stride shorter than one row.
    assert!(ImageView::<Rgb<u16>>::new(&data, Rect::from_size(2, 2), 10).is_err());
    // Buffer too short for the last row.
    assert!(ImageView::<Rgb<u16>>::new(&data[..11], Rect::from_size(2, 2), 12).is_err());
    assert!(ImageView::<Rgb<u16>>::new(&data, Rect::from_size(2, 2), 12).is_ok());
}

#[test]
fn empty_bounds_need_no_storage() {
    let view = ImageView::<Rgba<u8>>::new(&[], Rect::from_size(0, 5), 0).unwrap();
    assert_eq!(view.width(), 0);
    assert_eq!(view.pixel(0, 0), None);
}

#[test]
fn padded_rows_are_addressed_through_the_stride() {
    // 2x2 RGB u8 with two bytes of padding per row; the last row carries no padding.
    let data = [1u8, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12];
    let view = ImageView::<Rgb<u8>>::new(&data, Rect::from_size(2, 2), 8).unwrap();
    assert_eq!(view.row_stride_bytes(), 8);
    assert_eq!(view.pixel(1, 0), Some(Rgb::new(4, 5, 6)));
    assert_eq!(view.pixel(0, 1), Some(Rgb::new(7, 8, 9)));
    assert_eq!(view.pixel(2, 1), None);
}

#[test]
fn bounds_origin_offsets_addressing() {
    let data = [1u8, 2, 3, 4];
    let bounds = Rect::new(10, 20, 12, 22).unwrap();
    let view = ImageView::<Gray<u8>>::new(&data, bounds, 2).unwrap();
    assert_eq!(view.pixel(10, 20), Some(Gray::new(1)));
    assert_eq!(view.pixel(11, 21), Some(Gray::new(4)));
    assert_eq!(view.pixel(9, 20), None);
    assert_eq!(view.pixel(0, 0), None);
}

#[test]
fn row_access_stays_inside_bounds() {
    let data: Vec<u8> = (0..12).collect();
    let view = ImageView::<Gray<u8>>::packed(&data, 4, 3).unwrap();
    assert_eq!(view.row_span(1, 1, 3), Some(&data[5..7]));
    assert_eq!(view.row_span(1, 2, 2), Some(&[][..]));
    assert_eq!(view.row_span(1, 3, 5), None);
    assert_eq!(view.row_span(3, 0, 1), None);

    let px: Vec<_> = view.row_pixels(2, 0, 4).unwrap().collect();
    assert_eq!(px, vec![Gray::new(8), Gray::new(9), Gray::new(10), Gray::new(11)]);
}

#[test]
fn tiles_write_only_their_rows() {
    let mut data = vec![0u8; 4 * 4];
    let view = ImageViewMut::<Gray<u8>>::packed(&mut data, 4, 4).unwrap();
    let tiles = view
        .into_tiles(&[tile(0, 0, 0, 4, 1), tile(1, 0, 1, 4, 3), tile(2, 0, 3, 4, 4)])
        .unwrap();
    for mut t in tiles {
        let v = t.index() as u8 + 1;
        t.fill(Gray::new(v));
    }
    assert_eq!(data, vec![1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 3, 3, 3, 3]);
}

#[test]
fn tiles_write_only_their_columns() {
    let mut data = vec![0u8; 4 * 2];
    let view = ImageViewMut::<Gray<u8>>::packed(&mut data, 4, 2).unwrap();
    let mut tiles = view.into_tiles(&[tile(0, 1, 0, 3, 2)]).unwrap();
    tiles[0].fill(Gray::new(9));
    assert!(!tiles[0].put(0, 0, Gray::new(5)));
    assert!(tiles[0].put(2, 1, Gray::new(5)));
    assert_eq!(tiles[0].pixel(2, 1), Some(Gray::new(5)));
    drop(tiles);
    assert_eq!(data, vec![0, 9, 9, 0, 0, 9, 5, 0]);
}

#[test]
fn tiles_may_skip_rows() {
    let mut data = vec![0u8; 5];
    let view = ImageViewMut::<Gray<u8>>::packed(&mut data, 1, 5).unwrap();
    let tiles = view
        .into_tiles(&[tile(0, 0, 1, 1, 2), tile(1, 0, 2, 1, 2), tile(2, 0, 3, 1, 5)])
        .unwrap();
    for mut t in tiles {
        t.fill(Gray::new(7));
    }
    assert_eq!(data, vec![0, 7, 0, 7, 7]);
}

#[test]
fn overlapping_or_outside_tiles_are_rejected() {
    let mut data = vec![0u8; 16];
    let view = ImageViewMut::<Gray<u8>>::packed(&mut data, 4, 4).unwrap();
    assert!(
        view.into_tiles(&[tile(0, 0, 0, 4, 2), tile(1, 0, 1, 4, 3)])
            .is_err()
    );

    let view = ImageViewMut::<Gray<u8>>::packed(&mut data, 4, 4).unwrap();
    assert!(view.into_tiles(&[tile(0, 0, 2, 4, 5)]).is_err());

    let view = ImageViewMut::<Gray<u8>>::packed(&mut data, 4, 4).unwrap();
    assert!(
        view.into_tiles(&[tile(0, 0, 2, 4, 3), tile(1, 0, 0, 4, 1)])
            .is_err()
    );
}

#[test]
fn into_rows_splits_a_tile_top_to_bottom() {
    let mut data = vec![0u8; 3 * 3];
    let view = ImageViewMut::<Gray<u8>>::packed(&mut data, 3, 3).unwrap();
    let mut tiles = view.into_tiles(&[tile(4, 0, 0, 3, 3)]).unwrap();
    let rows = tiles.remove(0).into_rows();
    assert_eq!(rows.len(), 3);
    for (i, mut row) in rows.into_iter().enumerate() {
        assert_eq!(row.index(), 4);
        assert_eq!(row.height(), 1);
        assert_eq!(row.rect().y1, i as i32);
        row.fill(Gray::new(i as u8 + 1));
    }
    assert_eq!(data, vec![1, 1, 1, 2, 2, 2, 3, 3, 3]);
}

#[test]
fn rows_mut_reports_canvas_rows() {
    let mut data = vec![0u16; 2 * 4 * 3];
    let bounds = Rect::new(0, 10, 2, 14).unwrap();
    let view = ImageViewMut::<Rgb<u16>>::new(&mut data, bounds, 12).unwrap();
    let mut tiles = view.into_tiles(&[tile(0, 0, 12, 2, 14)]).unwrap();
    let ys: Vec<i32> = tiles[0].rows_mut().map(|(y, row)| {
        assert_eq!(row.len(), 6);
        y
    }).collect();
    assert_eq!(ys, vec![12, 13]);
}

#[test]
fn mutable_view_reads_back_through_as_view() {
    let mut data = vec![0u8; 2 * 2 * 4];
    let mut view = ImageViewMut::<Rgba<u8>>::packed(&mut data, 2, 2).unwrap();
    view.fill(Rgba::new(1, 2, 3, 4));
    assert_eq!(view.pixel(1, 1), Some(Rgba::new(1, 2, 3, 4)));
    assert_eq!(view.as_view().bounds(), Rect::from_size(2, 2));
}
