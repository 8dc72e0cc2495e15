use crate::engine::partition::Tile;
use crate::foundation::core::Rect;
use crate::foundation::error::{TileFxError, TileFxResult};
use crate::pixel::format::PixelFormat;
use crate::pixel::types::Pixel;

/// Validate buffer geometry and return the row stride in channel values.
///
/// `bounds.x1/y1` is the origin offset of the buffer in canvas space: canvas pixel `(x, y)` lives
/// at buffer row `y - y1`, column `x - x1`.
pub(crate) fn channel_stride(
    format: PixelFormat,
    data_len: usize,
    bounds: Rect,
    row_stride_bytes: usize,
) -> TileFxResult<usize> {
    let channel_bytes = format.encoding.byte_size();
    if row_stride_bytes % channel_bytes != 0 {
        return Err(TileFxError::validation(format!(
            "row stride {row_stride_bytes} bytes is not a multiple of the {}-byte channel size",
            channel_bytes
        )));
    }
    let stride = row_stride_bytes / channel_bytes;
    if bounds.is_empty() {
        return Ok(stride);
    }

    let row_len = (bounds.width() as usize)
        .checked_mul(format.channel_count())
        .ok_or_else(|| TileFxError::validation("image row size overflow"))?;
    if stride < row_len {
        return Err(TileFxError::validation(format!(
            "row stride {row_stride_bytes} bytes is shorter than one {format} row of {} pixels",
            bounds.width()
        )));
    }
    let required = (bounds.height() as usize - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_len))
        .ok_or_else(|| TileFxError::validation("image buffer size overflow"))?;
    if data_len < required {
        return Err(TileFxError::validation(format!(
            "{format} buffer holds {data_len} channel values, {} x {} image needs {required}",
            bounds.width(),
            bounds.height()
        )));
    }
    Ok(stride)
}

/// Read-only typed view over a host-owned pixel buffer.
///
/// Source views are shared by every worker of a render call; they never own pixel memory and
/// cannot outlive the borrowed buffer.
#[derive(Debug)]
pub struct ImageView<'a, P: Pixel> {
    data: &'a [P::Channel],
    bounds: Rect,
    stride: usize,
}

impl<P: Pixel> Clone for ImageView<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: Pixel> Copy for ImageView<'_, P> {}

impl<'a, P: Pixel> ImageView<'a, P> {
    /// Wrap `data` as an image covering `bounds` with rows `row_stride_bytes` apart.
    pub fn new(data: &'a [P::Channel], bounds: Rect, row_stride_bytes: usize) -> TileFxResult<Self> {
        let stride = channel_stride(P::format(), data.len(), bounds, row_stride_bytes)?;
        Ok(Self {
            data,
            bounds,
            stride,
        })
    }

    /// Wrap a tightly packed `width x height` buffer anchored at the origin.
    pub fn packed(data: &'a [P::Channel], width: u32, height: u32) -> TileFxResult<Self> {
        Self::new(
            data,
            Rect::from_size(width, height),
            width as usize * P::format().bytes_per_pixel(),
        )
    }

    /// Canvas-space bounds of the buffer.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.bounds.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.bounds.height()
    }

    /// Pixel format of the view.
    pub fn format(&self) -> PixelFormat {
        P::format()
    }

    /// Distance between rows in bytes.
    pub fn row_stride_bytes(&self) -> usize {
        self.stride * P::format().encoding.byte_size()
    }

    fn offset(&self, x: i32, y: i32) -> usize {
        (y - self.bounds.y1) as usize * self.stride + (x - self.bounds.x1) as usize * P::CHANNELS
    }

    /// Pixel at canvas position `(x, y)`, or `None` outside the bounds.
    pub fn pixel(&self, x: i32, y: i32) -> Option<P> {
        if !self.bounds.contains(x, y) {
            return None;
        }
        let at = self.offset(x, y);
        Some(P::read(&self.data[at..at + P::CHANNELS]))
    }

    /// Channel values of row `y` between columns `[x1, x2)`, or `None` when the span leaves the
    /// bounds.
    pub fn row_span(&self, y: i32, x1: i32, x2: i32) -> Option<&'a [P::Channel]> {
        if x1 > x2 || !self.bounds.contains_rect(Rect { x1, y1: y, x2, y2: y + 1 }) {
            return None;
        }
        if x1 == x2 {
            return Some(&[]);
        }
        let start = self.offset(x1, y);
        let end = start + (x2 - x1) as usize * P::CHANNELS;
        Some(&self.data[start..end])
    }

    /// Pixels of row `y` between columns `[x1, x2)`, left to right.
    pub fn row_pixels(&self, y: i32, x1: i32, x2: i32) -> Option<impl Iterator<Item = P> + 'a> {
        let span = self.row_span(y, x1, x2)?;
        Some(span.chunks_exact(P::CHANNELS).map(P::read))
    }
}

/// Mutable typed view over the destination buffer of a render call.
///
/// Split into [`TileMut`]s with [`ImageViewMut::into_tiles`] before parallel execution.
#[derive(Debug)]
pub struct ImageViewMut<'a, P: Pixel> {
    data: &'a mut [P::Channel],
    bounds: Rect,
    stride: usize,
}

impl<'a, P: Pixel> ImageViewMut<'a, P> {
    /// Wrap `data` as a writable image covering `bounds` with rows `row_stride_bytes` apart.
    pub fn new(
        data: &'a mut [P::Channel],
        bounds: Rect,
        row_stride_bytes: usize,
    ) -> TileFxResult<Self> {
        let stride = channel_stride(P::format(), data.len(), bounds, row_stride_bytes)?;
        Ok(Self {
            data,
            bounds,
            stride,
        })
    }

    /// Wrap a tightly packed `width x height` buffer anchored at the origin.
    pub fn packed(data: &'a mut [P::Channel], width: u32, height: u32) -> TileFxResult<Self> {
        Self::new(
            data,
            Rect::from_size(width, height),
            width as usize * P::format().bytes_per_pixel(),
        )
    }

    /// Canvas-space bounds of the buffer.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Pixel format of the view.
    pub fn format(&self) -> PixelFormat {
        P::format()
    }

    /// Read-only reborrow.
    pub fn as_view(&self) -> ImageView<'_, P> {
        ImageView {
            data: self.data,
            bounds: self.bounds,
            stride: self.stride,
        }
    }

    /// Pixel at canvas position `(x, y)`, or `None` outside the bounds.
    pub fn pixel(&self, x: i32, y: i32) -> Option<P> {
        self.as_view().pixel(x, y)
    }

    /// Fill every pixel inside the bounds with `px`.
    pub fn fill(&mut self, px: P) {
        let width = self.bounds.width() as usize;
        for row in self.data.chunks_mut(self.stride.max(1)).take(self.bounds.height() as usize) {
            for dst in row[..width * P::CHANNELS].chunks_exact_mut(P::CHANNELS) {
                px.write(dst);
            }
        }
    }

    /// Split the view into disjoint mutable tiles.
    ///
    /// Tiles must lie inside the bounds and be ordered top to bottom without overlapping rows;
    /// otherwise nothing is split and a validation error is returned.
    pub fn into_tiles(self, tiles: &[Tile]) -> TileFxResult<Vec<TileMut<'a, P>>> {
        let mut prev_y2 = self.bounds.y1;
        for tile in tiles {
            if !self.bounds.contains_rect(tile.rect) {
                return Err(TileFxError::validation(format!(
                    "tile {} lies outside destination bounds {}",
                    tile.rect, self.bounds
                )));
            }
            if tile.rect.is_empty() {
                continue;
            }
            if tile.rect.y1 < prev_y2 {
                return Err(TileFxError::validation(format!(
                    "tile {} overlaps a previous tile or is out of top-to-bottom order",
                    tile.rect
                )));
            }
            prev_y2 = tile.rect.y2;
        }

        let ImageViewMut {
            data,
            bounds,
            stride,
        } = self;
        let mut rest: &'a mut [P::Channel] = data;
        let mut cursor = bounds.y1;
        let mut out = Vec::with_capacity(tiles.len());
        for tile in tiles {
            let rect = tile.rect;
            if rect.is_empty() {
                out.push(TileMut {
                    index: tile.index,
                    rect,
                    data: &mut [],
                    stride,
                    origin_x: bounds.x1,
                });
                continue;
            }

            let skip = ((rect.y1 - cursor) as usize * stride).min(rest.len());
            let (_, tail) = std::mem::take(&mut rest).split_at_mut(skip);
            let take = (rect.height() as usize * stride).min(tail.len());
            let (rows, tail) = tail.split_at_mut(take);
            rest = tail;
            cursor = rect.y2;

            out.push(TileMut {
                index: tile.index,
                rect,
                data: rows,
                stride,
                origin_x: bounds.x1,
            });
        }
        Ok(out)
    }
}

/// Exclusive borrow of one tile of the destination buffer.
///
/// Only pixels inside [`TileMut::rect`] are reachable, which is what makes concurrent tile
/// execution lock-free.
#[derive(Debug)]
pub struct TileMut<'a, P: Pixel> {
    index: usize,
    rect: Rect,
    // Buffer rows `rect.y1..rect.y2`, full buffer width.
    data: &'a mut [P::Channel],
    stride: usize,
    origin_x: i32,
}

impl<'a, P: Pixel> TileMut<'a, P> {
    /// Position of the tile in its partition.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Canvas-space rect covered by the tile.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Number of rows in the tile.
    pub fn height(&self) -> u32 {
        self.rect.height()
    }

    fn column_range(&self) -> std::ops::Range<usize> {
        let start = (self.rect.x1 - self.origin_x) as usize * P::CHANNELS;
        start..start + self.rect.width() as usize * P::CHANNELS
    }

    /// Rows of the tile, top to bottom, as `(y, channels)` restricted to the tile columns.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (i32, &mut [P::Channel])> + '_ {
        let cols = self.column_range();
        let y1 = self.rect.y1;
        let rows = if self.rect.is_empty() {
            0
        } else {
            self.rect.height() as usize
        };
        self.data
            .chunks_mut(self.stride.max(1))
            .take(rows)
            .enumerate()
            .map(move |(i, row)| (y1 + i as i32, &mut row[cols.clone()]))
    }

    /// Pixel at canvas position `(x, y)` if it lies inside the tile.
    pub fn pixel(&self, x: i32, y: i32) -> Option<P> {
        if !self.rect.contains(x, y) {
            return None;
        }
        let at = (y - self.rect.y1) as usize * self.stride
            + (x - self.origin_x) as usize * P::CHANNELS;
        Some(P::read(&self.data[at..at + P::CHANNELS]))
    }

    /// Write `px` at `(x, y)`. Returns `false` (and writes nothing) outside the tile.
    pub fn put(&mut self, x: i32, y: i32, px: P) -> bool {
        if !self.rect.contains(x, y) {
            return false;
        }
        let at = (y - self.rect.y1) as usize * self.stride
            + (x - self.origin_x) as usize * P::CHANNELS;
        px.write(&mut self.data[at..at + P::CHANNELS]);
        true
    }

    /// Fill the whole tile with `px`.
    pub fn fill(&mut self, px: P) {
        for (_, row) in self.rows_mut() {
            for dst in row.chunks_exact_mut(P::CHANNELS) {
                px.write(dst);
            }
        }
    }

    /// Split into single-row tiles, top to bottom. Each keeps this tile's index.
    pub fn into_rows(self) -> Vec<TileMut<'a, P>> {
        let TileMut {
            index,
            rect,
            data,
            stride,
            origin_x,
        } = self;
        if rect.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(rect.height() as usize);
        let mut rest: &'a mut [P::Channel] = data;
        for y in rect.y1..rect.y2 {
            let take = stride.min(rest.len());
            let (row, tail) = std::mem::take(&mut rest).split_at_mut(take);
            rest = tail;
            out.push(TileMut {
                index,
                rect: Rect {
                    x1: rect.x1,
                    y1: y,
                    x2: rect.x2,
                    y2: y + 1,
                },
                data: row,
                stride,
                origin_x,
            });
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/image.rs"]
mod tests;
