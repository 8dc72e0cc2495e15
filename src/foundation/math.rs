/// Red weight of the fixed color-to-gray projection.
pub(crate) const LUMA_R: f32 = 0.30;
/// Green weight of the fixed color-to-gray projection.
pub(crate) const LUMA_G: f32 = 0.59;
/// Blue weight of the fixed color-to-gray projection.
pub(crate) const LUMA_B: f32 = 0.11;

/// Project promoted RGB values onto gray.
///
/// Neutral inputs (`r == g == b`) return the shared value unchanged so gray round-trips are exact.
pub(crate) fn luminance(r: f32, g: f32, b: f32) -> f32 {
    if r == g && g == b {
        return r;
    }
    LUMA_R * r + LUMA_G * g + LUMA_B * b
}

/// `ceil(n / d)` for `d > 0`.
pub(crate) fn div_ceil_u32(n: u32, d: u32) -> u32 {
    debug_assert!(d > 0);
    n.div_ceil(d)
}

/// Divide an f64 sum by a pixel or row count. Callers guarantee `count > 0`.
pub(crate) fn mean(sum: f64, count: u64) -> f64 {
    sum / count as f64
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
