use super::*;
use crate::pixel::format::ChannelEncoding;
use crate::pixel::types::{Gray, Rgb, Rgba};

#[test]
fn packed_view_reports_negotiated_format() {
    let data = [0.5f32; 2 * 3 * 4];
    let view = AnyImageView::packed(&data, ColorModel::Rgba, 2, 3).unwrap();
    assert_eq!(
        view.format(),
        PixelFormat::of(ChannelEncoding::F32, ColorModel::Rgba)
    );
    assert_eq!(view.bounds(), Rect::from_size(2, 3));
    assert_eq!(view.row_stride_bytes(), 32);
}

#[test]
fn construction_validates_geometry() {
    let data = [0u8; 5];
    assert!(AnyImageView::packed(&data, ColorModel::Rgb, 2, 1).is_err());
    assert!(AnyImageView::new(ChannelSlice::U8(&data), ColorModel::Gray, Rect::from_size(5, 1), 5).is_ok());
}

#[test]
fn typed_recovers_matching_pixel_type() {
    let data = [1u16, 2, 3, 4, 5, 6];
    let view = AnyImageView::packed(&data, ColorModel::Rgb, 2, 1).unwrap();
    let typed = view.typed::<Rgb<u16>>().unwrap();
    assert_eq!(typed.pixel(1, 0), Some(Rgb::new(4, 5, 6)));
}

#[test]
fn typed_rejects_other_model_or_encoding() {
    let data = [0u8; 4];
    let view = AnyImageView::packed(&data, ColorModel::Gray, 2, 2).unwrap();
    assert!(matches!(
        view.typed::<Gray<u16>>(),
        Err(TileFxError::FormatUnsupported(_))
    ));
    assert!(matches!(
        view.typed::<crate::pixel::types::Alpha<u8>>(),
        Err(TileFxError::FormatUnsupported(_))
    ));
    assert!(view.typed::<Gray<u8>>().is_ok());
}

#[test]
fn mutable_view_writes_through_typed_view() {
    let mut data = [0u8; 2 * 4];
    {
        let view = AnyImageViewMut::packed(&mut data, ColorModel::Rgba, 2, 1).unwrap();
        assert_eq!(
            view.format(),
            PixelFormat::of(ChannelEncoding::U8, ColorModel::Rgba)
        );
        let mut typed = view.typed::<Rgba<u8>>().unwrap();
        typed.fill(Rgba::new(9, 8, 7, 6));
    }
    assert_eq!(data, [9, 8, 7, 6, 9, 8, 7, 6]);
}

#[test]
fn mutable_view_rejects_mismatched_type() {
    let mut data = [0.0f32; 3];
    let view = AnyImageViewMut::packed(&mut data, ColorModel::Rgb, 1, 1).unwrap();
    assert!(matches!(
        view.typed::<Rgb<u8>>(),
        Err(TileFxError::FormatUnsupported(_))
    ));
}
