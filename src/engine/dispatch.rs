//! Once-per-invocation resolution of the concrete pixel types of a render call.
//!
//! The host negotiates formats at run time; engine code is generic over [`Pixel`]. Dispatch is a
//! single `match` over the closed set of format variants that calls a generic function
//! instantiated for the resolved pair, so per-pixel loops never look at formats again.

use crate::foundation::error::{TileFxError, TileFxResult};
use crate::pixel::format::{ChannelEncoding, ColorModel, FormatSupport, PixelFormat};
use crate::pixel::types::{Alpha, Gray, Pixel, Rgb, Rgba};
use crate::view::any::{AnyImageView, AnyImageViewMut};
use crate::view::image::{ImageView, ImageViewMut};

/// Code path selected for a resolved source/destination pixel-type pair.
pub trait FormatVisitor {
    /// Value produced by the selected code path.
    type Output;

    /// Run with concrete pixel types. `src` is `None` for generator-style calls.
    fn visit<S: Pixel, D: Pixel>(
        self,
        src: Option<ImageView<'_, S>>,
        dst: ImageViewMut<'_, D>,
    ) -> TileFxResult<Self::Output>;
}

/// Code path selected for a resolved source pixel type (no destination).
pub trait SourceVisitor {
    /// Value produced by the selected code path.
    type Output;

    /// Run with the concrete source pixel type.
    fn visit<S: Pixel>(self, src: ImageView<'_, S>) -> TileFxResult<Self::Output>;
}

/// Check that a source/destination format pairing has a code path.
///
/// Encodings may differ between clips; color models must match and both formats must be in
/// `support`.
pub fn resolve(
    src: Option<PixelFormat>,
    dst: PixelFormat,
    support: FormatSupport,
) -> TileFxResult<()> {
    if !support.contains(dst) {
        return Err(TileFxError::format_unsupported(format!(
            "destination format {dst} is not supported by this effect"
        )));
    }
    if let Some(src) = src {
        if !support.contains(src) {
            return Err(TileFxError::format_unsupported(format!(
                "source format {src} is not supported by this effect"
            )));
        }
        if src.model != dst.model {
            return Err(TileFxError::format_unsupported(format!(
                "source {src} and destination {dst} have different color models"
            )));
        }
    }
    Ok(())
}

macro_rules! encoding_pairs {
    ($px:ident, $key:expr, $src:expr, $dst:expr, $visitor:expr) => {
        match $key {
            (ChannelEncoding::U8, ChannelEncoding::U8) => {
                visit_typed::<$px<u8>, $px<u8>, _>($src, $dst, $visitor)
            }
            (ChannelEncoding::U8, ChannelEncoding::U16) => {
                visit_typed::<$px<u8>, $px<u16>, _>($src, $dst, $visitor)
            }
            (ChannelEncoding::U8, ChannelEncoding::F32) => {
                visit_typed::<$px<u8>, $px<f32>, _>($src, $dst, $visitor)
            }
            (ChannelEncoding::U16, ChannelEncoding::U8) => {
                visit_typed::<$px<u16>, $px<u8>, _>($src, $dst, $visitor)
            }
            (ChannelEncoding::U16, ChannelEncoding::U16) => {
                visit_typed::<$px<u16>, $px<u16>, _>($src, $dst, $visitor)
            }
            (ChannelEncoding::U16, ChannelEncoding::F32) => {
                visit_typed::<$px<u16>, $px<f32>, _>($src, $dst, $visitor)
            }
            (ChannelEncoding::F32, ChannelEncoding::U8) => {
                visit_typed::<$px<f32>, $px<u8>, _>($src, $dst, $visitor)
            }
            (ChannelEncoding::F32, ChannelEncoding::U16) => {
                visit_typed::<$px<f32>, $px<u16>, _>($src, $dst, $visitor)
            }
            (ChannelEncoding::F32, ChannelEncoding::F32) => {
                visit_typed::<$px<f32>, $px<f32>, _>($src, $dst, $visitor)
            }
        }
    };
}

macro_rules! encodings {
    ($px:ident, $encoding:expr, $src:expr, $visitor:expr) => {
        match $encoding {
            ChannelEncoding::U8 => visit_source::<$px<u8>, _>($src, $visitor),
            ChannelEncoding::U16 => visit_source::<$px<u16>, _>($src, $visitor),
            ChannelEncoding::F32 => visit_source::<$px<f32>, _>($src, $visitor),
        }
    };
}

/// Resolve the formats of a render call and run `visitor` with the matching pixel types.
///
/// Fails with [`TileFxError::FormatUnsupported`] before the visitor runs when the pairing has no
/// code path.
pub fn dispatch<V: FormatVisitor>(
    src: Option<&AnyImageView<'_>>,
    dst: AnyImageViewMut<'_>,
    support: FormatSupport,
    visitor: V,
) -> TileFxResult<V::Output> {
    let src_format = src.map(AnyImageView::format);
    let dst_format = dst.format();
    resolve(src_format, dst_format, support)?;

    // Generators have no source; instantiate with the destination type for the unused slot.
    let src_encoding = src_format.map_or(dst_format.encoding, |f| f.encoding);
    tracing::debug!(
        src = %src_format.map_or_else(|| "none".to_string(), |f| f.to_string()),
        dst = %dst_format,
        "resolved pixel formats"
    );

    let key = (src_encoding, dst_format.encoding);
    match dst_format.model {
        ColorModel::Gray => encoding_pairs!(Gray, key, src, dst, visitor),
        ColorModel::Rgb => encoding_pairs!(Rgb, key, src, dst, visitor),
        ColorModel::Rgba => encoding_pairs!(Rgba, key, src, dst, visitor),
        ColorModel::Alpha => encoding_pairs!(Alpha, key, src, dst, visitor),
    }
}

/// Resolve the format of a single source view and run `visitor` with its pixel type.
pub fn dispatch_source<V: SourceVisitor>(
    src: &AnyImageView<'_>,
    support: FormatSupport,
    visitor: V,
) -> TileFxResult<V::Output> {
    let format = src.format();
    if !support.contains(format) {
        return Err(TileFxError::format_unsupported(format!(
            "source format {format} is not supported"
        )));
    }
    match format.model {
        ColorModel::Gray => encodings!(Gray, format.encoding, src, visitor),
        ColorModel::Rgb => encodings!(Rgb, format.encoding, src, visitor),
        ColorModel::Rgba => encodings!(Rgba, format.encoding, src, visitor),
        ColorModel::Alpha => encodings!(Alpha, format.encoding, src, visitor),
    }
}

fn visit_typed<S: Pixel, D: Pixel, V: FormatVisitor>(
    src: Option<&AnyImageView<'_>>,
    dst: AnyImageViewMut<'_>,
    visitor: V,
) -> TileFxResult<V::Output> {
    let src = src.map(|v| v.typed::<S>()).transpose()?;
    let dst = dst.typed::<D>()?;
    visitor.visit(src, dst)
}

fn visit_source<S: Pixel, V: SourceVisitor>(
    src: &AnyImageView<'_>,
    visitor: V,
) -> TileFxResult<V::Output> {
    visitor.visit(src.typed::<S>()?)
}

#[cfg(test)]
#[path = "../../tests/unit/engine/dispatch.rs"]
mod tests;
