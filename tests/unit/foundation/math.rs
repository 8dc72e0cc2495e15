use super::*;

#[test]
fn luminance_weights_sum_to_one() {
    assert!((LUMA_R + LUMA_G + LUMA_B - 1.0).abs() < 1e-6);
}

#[test]
fn luminance_of_neutral_color_is_exact() {
    for v in [0.0f32, 0.1, 1.0 / 3.0, 0.5, 0.77, 1.0] {
        assert_eq!(luminance(v, v, v), v);
    }
}

#[test]
fn luminance_weights_green_highest() {
    assert!(luminance(0.0, 1.0, 0.0) > luminance(1.0, 0.0, 0.0));
    assert!(luminance(1.0, 0.0, 0.0) > luminance(0.0, 0.0, 1.0));
    assert!((luminance(1.0, 0.0, 0.0) - 0.30).abs() < 1e-6);
}

#[test]
fn div_ceil_rounds_up() {
    assert_eq!(div_ceil_u32(10, 3), 4);
    assert_eq!(div_ceil_u32(9, 3), 3);
    assert_eq!(div_ceil_u32(0, 3), 0);
}

#[test]
fn mean_divides_by_count() {
    assert_eq!(mean(10.0, 4), 2.5);
}
