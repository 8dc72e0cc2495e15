//! Overflow-free aggregate statistics over typed views.
//!
//! Channel values are promoted to f32 and summed in f64. The mean is two-stage: every row sum is
//! divided by the row width, and the row means are divided by the row count. Min/max values are
//! kept in the source pixel type.

use crate::foundation::core::Rect;
use crate::foundation::math::mean;
use crate::pixel::channel::Channel;
use crate::pixel::format::ColorModel;
use crate::pixel::types::{Color, Pixel};
use crate::view::image::ImageView;

/// Running statistics over the pixels of one source pixel type.
///
/// Created per invocation (or per tile when statistics run in parallel) and combined with
/// [`AccumulatorState::merge`].
#[derive(Clone, Debug, PartialEq)]
pub struct AccumulatorState<P: Pixel> {
    row_mean_sum: [f64; 4],
    rows: u64,
    pixels: u64,
    channel_min: Option<P>,
    channel_max: Option<P>,
    luminosity_min: Option<(f32, P)>,
    luminosity_max: Option<(f32, P)>,
}

impl<P: Pixel> Default for AccumulatorState<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Pixel> AccumulatorState<P> {
    /// Empty state.
    pub fn new() -> Self {
        Self {
            row_mean_sum: [0.0; 4],
            rows: 0,
            pixels: 0,
            channel_min: None,
            channel_max: None,
            luminosity_min: None,
            luminosity_max: None,
        }
    }

    /// Fold one row of pixels, visited left to right. Empty rows are ignored.
    pub fn accumulate_row(&mut self, row: impl IntoIterator<Item = P>) {
        let mut sum = [0.0f64; 4];
        let mut width = 0u64;

        for px in row {
            for (s, v) in sum.iter_mut().zip(px.channels()) {
                *s += f64::from(v.promote());
            }
            width += 1;

            self.channel_min = Some(match self.channel_min {
                None => px,
                Some(cur) => channel_wise(cur, px, |a, b| b < a),
            });
            self.channel_max = Some(match self.channel_max {
                None => px,
                Some(cur) => channel_wise(cur, px, |a, b| b > a),
            });

            // NaN luminance has no place in the order; such pixels never become extremes.
            let l = px.luminance();
            if l.is_nan() {
                continue;
            }
            if self.luminosity_min.is_none_or(|(cur, _)| l < cur) {
                self.luminosity_min = Some((l, px));
            }
            if self.luminosity_max.is_none_or(|(cur, _)| l > cur) {
                self.luminosity_max = Some((l, px));
            }
        }

        if width == 0 {
            return;
        }
        for (acc, s) in self.row_mean_sum.iter_mut().zip(sum) {
            *acc += mean(s, width);
        }
        self.rows += 1;
        self.pixels += width;
    }

    /// Combine with a state accumulated over rows that come after this one's.
    ///
    /// Sums and counts add, min/max take the extremes, and this state wins luminance ties, so
    /// merging per-tile states in tile order matches a single top-to-bottom pass.
    pub fn merge(mut self, later: Self) -> Self {
        for (acc, s) in self.row_mean_sum.iter_mut().zip(later.row_mean_sum) {
            *acc += s;
        }
        self.rows += later.rows;
        self.pixels += later.pixels;

        self.channel_min = pick(self.channel_min, later.channel_min, |a, b| {
            channel_wise(a, b, |x, y| y < x)
        });
        self.channel_max = pick(self.channel_max, later.channel_max, |a, b| {
            channel_wise(a, b, |x, y| y > x)
        });
        self.luminosity_min = pick(self.luminosity_min, later.luminosity_min, |a, b| {
            if b.0 < a.0 { b } else { a }
        });
        self.luminosity_max = pick(self.luminosity_max, later.luminosity_max, |a, b| {
            if b.0 > a.0 { b } else { a }
        });
        self
    }

    /// Number of accumulated pixels.
    pub fn pixels(&self) -> u64 {
        self.pixels
    }

    /// Number of accumulated (non-empty) rows.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Promoted per-channel mean in storage order; unused trailing entries are zero.
    ///
    /// All zeros when nothing was accumulated.
    pub fn mean(&self) -> [f64; 4] {
        if self.rows == 0 {
            return [0.0; 4];
        }
        self.row_mean_sum.map(|s| mean(s, self.rows))
    }

    /// Mean demoted to the source pixel type.
    pub fn average(&self) -> P {
        let m = self.mean();
        let mut out = P::default();
        for (c, v) in out.channels_mut().iter_mut().zip(m) {
            *c = <P::Channel as Channel>::demote(v as f32);
        }
        out
    }

    /// Per-channel minimum over comparable values, or the default pixel when empty.
    pub fn channel_min(&self) -> P {
        self.channel_min.unwrap_or_default()
    }

    /// Per-channel maximum over comparable values, or the default pixel when empty.
    pub fn channel_max(&self) -> P {
        self.channel_max.unwrap_or_default()
    }

    /// First pixel with the lowest luminance, or the default pixel when no pixel has a
    /// comparable (non-NaN) luminance.
    pub fn luminosity_min(&self) -> P {
        self.luminosity_min.map(|(_, px)| px).unwrap_or_default()
    }

    /// First pixel with the highest luminance, or the default pixel when no pixel has a
    /// comparable (non-NaN) luminance.
    pub fn luminosity_max(&self) -> P {
        self.luminosity_max.map(|(_, px)| px).unwrap_or_default()
    }

    /// Publishable summary with every value promoted to [`Color`].
    pub fn statistics(&self) -> ImageStatistics {
        let m = self.mean();
        ImageStatistics {
            pixels: self.pixels,
            average: promoted_color(P::MODEL, m.map(|v| v as f32)),
            channel_min: self.channel_min().to_color(),
            channel_max: self.channel_max().to_color(),
            luminosity_min: self.luminosity_min().to_color(),
            luminosity_max: self.luminosity_max().to_color(),
        }
    }
}

/// Aggregate statistics of a region, in promoted RGBA.
///
/// Gray values are replicated to RGB with opaque alpha; alpha mattes report black with their
/// alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageStatistics {
    /// Pixels visited.
    pub pixels: u64,
    /// Two-stage mean.
    pub average: Color,
    /// Per-channel minimum.
    pub channel_min: Color,
    /// Per-channel maximum.
    pub channel_max: Color,
    /// Pixel with the lowest luminance.
    pub luminosity_min: Color,
    /// Pixel with the highest luminance.
    pub luminosity_max: Color,
}

/// Accumulate every pixel of `view` inside `region`, top to bottom.
///
/// `region` is clipped to the view bounds; a region with no overlap yields an empty state.
pub fn accumulate_region<P: Pixel>(view: &ImageView<'_, P>, region: Rect) -> AccumulatorState<P> {
    let mut state = AccumulatorState::new();
    let clip = region.intersect(view.bounds());
    if clip.is_empty() {
        return state;
    }
    for y in clip.y1..clip.y2 {
        if let Some(row) = view.row_pixels(y, clip.x1, clip.x2) {
            state.accumulate_row(row);
        }
    }
    state
}

fn channel_wise<P: Pixel>(
    cur: P,
    candidate: P,
    replace: impl Fn(P::Channel, P::Channel) -> bool,
) -> P {
    let mut out = cur;
    for (o, c) in out.channels_mut().iter_mut().zip(candidate.channels()) {
        if is_unordered(*o) || replace(*o, *c) {
            *o = *c;
        }
    }
    out
}

// NaN is the only channel value not comparable with itself.
fn is_unordered<C: PartialOrd>(v: C) -> bool {
    v.partial_cmp(&v).is_none()
}

fn pick<T>(a: Option<T>, b: Option<T>, combine: impl FnOnce(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(combine(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn promoted_color(model: ColorModel, c: [f32; 4]) -> Color {
    match model {
        ColorModel::Gray => Color::new(c[0], c[0], c[0], 1.0),
        ColorModel::Rgb => Color::new(c[0], c[1], c[2], 1.0),
        ColorModel::Rgba => Color::new(c[0], c[1], c[2], c[3]),
        ColorModel::Alpha => Color::new(0.0, 0.0, 0.0, c[0]),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/accumulate.rs"]
mod tests;
