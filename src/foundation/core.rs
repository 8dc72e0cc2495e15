use std::fmt;

use crate::foundation::error::{TileFxError, TileFxResult};

/// Integer pixel rectangle, half-open on `x2`/`y2`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    /// Inclusive left edge.
    pub x1: i32,
    /// Inclusive top edge.
    pub y1: i32,
    /// Exclusive right edge.
    pub x2: i32,
    /// Exclusive bottom edge.
    pub y2: i32,
}

impl Rect {
    /// Create a validated rectangle with `x1 <= x2` and `y1 <= y2`.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> TileFxResult<Self> {
        if x1 > x2 || y1 > y2 {
            return Err(TileFxError::validation(format!(
                "rect ({x1}, {y1}, {x2}, {y2}) must satisfy x1 <= x2 and y1 <= y2"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Rectangle anchored at the origin.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x1: 0,
            y1: 0,
            x2: i32::try_from(width).unwrap_or(i32::MAX),
            y2: i32::try_from(height).unwrap_or(i32::MAX),
        }
    }

    /// Width in pixels (0 for inverted rects).
    pub fn width(self) -> u32 {
        (i64::from(self.x2) - i64::from(self.x1)).max(0) as u32
    }

    /// Height in pixels (0 for inverted rects).
    pub fn height(self) -> u32 {
        (i64::from(self.y2) - i64::from(self.y1)).max(0) as u32
    }

    /// Number of pixels covered.
    pub fn area(self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Return `true` when the rect covers no pixel.
    pub fn is_empty(self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Return `true` when pixel `(x, y)` lies inside the rect.
    pub fn contains(self, x: i32, y: i32) -> bool {
        self.x1 <= x && x < self.x2 && self.y1 <= y && y < self.y2
    }

    /// Return `true` when `other` lies entirely inside `self`. Empty rects are always contained.
    pub fn contains_rect(self, other: Rect) -> bool {
        other.is_empty()
            || (self.x1 <= other.x1
                && self.y1 <= other.y1
                && other.x2 <= self.x2
                && other.y2 <= self.y2)
    }

    /// Intersection of two rects. Disjoint inputs yield an empty rect.
    pub fn intersect(self, other: Rect) -> Rect {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2).max(x1);
        let y2 = self.y2.min(other.y2).max(y1);
        Rect { x1, y1, x2, y2 }
    }

    /// Map a rect from canonical coordinates to pixel coordinates at `scale`.
    ///
    /// Low edges are floored and high edges ceiled so the result covers every pixel touched.
    pub fn scaled(self, scale: RenderScale) -> Rect {
        fn clamp_i32(v: f64) -> i32 {
            v.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
        }

        let x1 = clamp_i32((f64::from(self.x1) * scale.x).floor());
        let y1 = clamp_i32((f64::from(self.y1) * scale.y).floor());
        let x2 = clamp_i32((f64::from(self.x2) * scale.x).ceil()).max(x1);
        let y2 = clamp_i32((f64::from(self.y2) * scale.y).ceil()).max(y1);
        Rect { x1, y1, x2, y2 }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}) x [{}, {})", self.x1, self.x2, self.y1, self.y2)
    }
}

/// Host render scale (1.0 = full resolution, 0.5 = half-resolution proxy).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderScale {
    /// Horizontal scale factor.
    pub x: f64,
    /// Vertical scale factor.
    pub y: f64,
}

impl RenderScale {
    /// Full-resolution rendering.
    pub const FULL: RenderScale = RenderScale { x: 1.0, y: 1.0 };

    /// Create a validated render scale; both factors must be finite and positive.
    pub fn new(x: f64, y: f64) -> TileFxResult<Self> {
        if !x.is_finite() || !y.is_finite() || x <= 0.0 || y <= 0.0 {
            return Err(TileFxError::validation(
                "render scale factors must be finite and > 0",
            ));
        }
        Ok(Self { x, y })
    }
}

impl Default for RenderScale {
    fn default() -> Self {
        Self::FULL
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
