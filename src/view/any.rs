use crate::foundation::core::Rect;
use crate::foundation::error::{TileFxError, TileFxResult};
use crate::pixel::channel::{Channel, ChannelSlice, ChannelSliceMut};
use crate::pixel::format::{ColorModel, PixelFormat};
use crate::pixel::types::Pixel;
use crate::view::image::{ImageView, ImageViewMut, channel_stride};

/// Format-erased read-only view, as handed over by the host for a source clip.
///
/// The concrete pixel type is recovered once per render call by the format dispatcher.
#[derive(Clone, Copy, Debug)]
pub struct AnyImageView<'a> {
    data: ChannelSlice<'a>,
    model: ColorModel,
    bounds: Rect,
    row_stride_bytes: usize,
}

impl<'a> AnyImageView<'a> {
    /// Wrap host memory with its negotiated color model, bounds and row stride.
    pub fn new(
        data: ChannelSlice<'a>,
        model: ColorModel,
        bounds: Rect,
        row_stride_bytes: usize,
    ) -> TileFxResult<Self> {
        let format = PixelFormat::of(data.encoding(), model);
        channel_stride(format, data.len(), bounds, row_stride_bytes)?;
        Ok(Self {
            data,
            model,
            bounds,
            row_stride_bytes,
        })
    }

    /// Wrap a tightly packed `width x height` buffer anchored at the origin.
    pub fn packed<C: Channel>(
        data: &'a [C],
        model: ColorModel,
        width: u32,
        height: u32,
    ) -> TileFxResult<Self> {
        let format = PixelFormat::of(C::ENCODING, model);
        Self::new(
            C::erase(data),
            model,
            Rect::from_size(width, height),
            width as usize * format.bytes_per_pixel(),
        )
    }

    /// Negotiated pixel format.
    pub fn format(&self) -> PixelFormat {
        PixelFormat::of(self.data.encoding(), self.model)
    }

    /// Canvas-space bounds of the buffer.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Distance between rows in bytes.
    pub fn row_stride_bytes(&self) -> usize {
        self.row_stride_bytes
    }

    /// Recover the typed view for pixel type `P`.
    pub fn typed<P: Pixel>(&self) -> TileFxResult<ImageView<'a, P>> {
        if self.model != P::MODEL {
            return Err(mismatch(self.format(), P::format()));
        }
        let data = <P::Channel as Channel>::cast_slice(self.data)
            .ok_or_else(|| mismatch(self.format(), P::format()))?;
        ImageView::new(data, self.bounds, self.row_stride_bytes)
    }
}

/// Format-erased writable view, as handed over by the host for the output clip.
#[derive(Debug)]
pub struct AnyImageViewMut<'a> {
    data: ChannelSliceMut<'a>,
    model: ColorModel,
    bounds: Rect,
    row_stride_bytes: usize,
}

impl<'a> AnyImageViewMut<'a> {
    /// Wrap host memory with its negotiated color model, bounds and row stride.
    pub fn new(
        data: ChannelSliceMut<'a>,
        model: ColorModel,
        bounds: Rect,
        row_stride_bytes: usize,
    ) -> TileFxResult<Self> {
        let len = match &data {
            ChannelSliceMut::U8(s) => s.len(),
            ChannelSliceMut::U16(s) => s.len(),
            ChannelSliceMut::F32(s) => s.len(),
        };
        let format = PixelFormat::of(data.encoding(), model);
        channel_stride(format, len, bounds, row_stride_bytes)?;
        Ok(Self {
            data,
            model,
            bounds,
            row_stride_bytes,
        })
    }

    /// Wrap a tightly packed `width x height` buffer anchored at the origin.
    pub fn packed<C: Channel>(
        data: &'a mut [C],
        model: ColorModel,
        width: u32,
        height: u32,
    ) -> TileFxResult<Self> {
        let format = PixelFormat::of(C::ENCODING, model);
        Self::new(
            C::erase_mut(data),
            model,
            Rect::from_size(width, height),
            width as usize * format.bytes_per_pixel(),
        )
    }

    /// Negotiated pixel format.
    pub fn format(&self) -> PixelFormat {
        PixelFormat::of(self.data.encoding(), self.model)
    }

    /// Canvas-space bounds of the buffer.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Recover the typed writable view for pixel type `P`.
    pub fn typed<P: Pixel>(self) -> TileFxResult<ImageViewMut<'a, P>> {
        let format = self.format();
        if self.model != P::MODEL {
            return Err(mismatch(format, P::format()));
        }
        let data = <P::Channel as Channel>::cast_slice_mut(self.data)
            .ok_or_else(|| mismatch(format, P::format()))?;
        ImageViewMut::new(data, self.bounds, self.row_stride_bytes)
    }
}

fn mismatch(actual: PixelFormat, requested: PixelFormat) -> TileFxError {
    TileFxError::format_unsupported(format!(
        "view holds {actual} pixels, {requested} was requested"
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/view/any.rs"]
mod tests;
