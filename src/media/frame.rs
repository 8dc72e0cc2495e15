use std::path::Path;

use anyhow::Context;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};

use crate::foundation::core::Rect;
use crate::foundation::error::{TileFxError, TileFxResult};
use crate::pixel::channel::{ChannelSlice, ChannelSliceMut};
use crate::pixel::format::{ChannelEncoding, ColorModel, PixelFormat};
use crate::view::any::{AnyImageView, AnyImageViewMut};

/// Owned channel storage of a [`Frame`].
#[derive(Clone, Debug, PartialEq)]
pub enum FrameData {
    /// 8-bit channels.
    U8(Vec<u8>),
    /// 16-bit channels.
    U16(Vec<u16>),
    /// Float channels.
    F32(Vec<f32>),
}

impl FrameData {
    fn zeroed(encoding: ChannelEncoding, len: usize) -> Self {
        match encoding {
            ChannelEncoding::U8 => FrameData::U8(vec![0; len]),
            ChannelEncoding::U16 => FrameData::U16(vec![0; len]),
            ChannelEncoding::F32 => FrameData::F32(vec![0.0; len]),
        }
    }

    fn encoding(&self) -> ChannelEncoding {
        match self {
            FrameData::U8(_) => ChannelEncoding::U8,
            FrameData::U16(_) => ChannelEncoding::U16,
            FrameData::F32(_) => ChannelEncoding::F32,
        }
    }
}

/// Tightly packed, owned image used by the CLI and tests.
///
/// Frames hand out the same format-erased views a host would.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    model: ColorModel,
    data: FrameData,
}

impl Frame {
    /// All-zero frame of the given size and format.
    pub fn blank(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.channel_count();
        Self {
            width,
            height,
            model: format.model,
            data: FrameData::zeroed(format.encoding, len),
        }
    }

    /// Wrap packed channel data. Fails when `data` does not hold exactly `width x height` pixels.
    pub fn from_data(
        width: u32,
        height: u32,
        model: ColorModel,
        data: FrameData,
    ) -> TileFxResult<Self> {
        let expected = width as usize * height as usize * model.channel_count();
        let len = match &data {
            FrameData::U8(v) => v.len(),
            FrameData::U16(v) => v.len(),
            FrameData::F32(v) => v.len(),
        };
        if len != expected {
            return Err(TileFxError::validation(format!(
                "{width}x{height} {} frame needs {expected} channel values, got {len}",
                PixelFormat::of(data.encoding(), model)
            )));
        }
        Ok(Self {
            width,
            height,
            model,
            data,
        })
    }

    /// Map a decoded image onto the closest pixel format.
    ///
    /// Luma-alpha inputs have no matching color model and are expanded to RGBA.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let (model, data) = match img {
            DynamicImage::ImageLuma8(b) => (ColorModel::Gray, FrameData::U8(b.into_raw())),
            DynamicImage::ImageRgb8(b) => (ColorModel::Rgb, FrameData::U8(b.into_raw())),
            DynamicImage::ImageRgba8(b) => (ColorModel::Rgba, FrameData::U8(b.into_raw())),
            DynamicImage::ImageLumaA8(_) => {
                (ColorModel::Rgba, FrameData::U8(img.to_rgba8().into_raw()))
            }
            DynamicImage::ImageLuma16(b) => (ColorModel::Gray, FrameData::U16(b.into_raw())),
            DynamicImage::ImageRgb16(b) => (ColorModel::Rgb, FrameData::U16(b.into_raw())),
            DynamicImage::ImageRgba16(b) => (ColorModel::Rgba, FrameData::U16(b.into_raw())),
            DynamicImage::ImageLumaA16(_) => {
                (ColorModel::Rgba, FrameData::U16(img.to_rgba16().into_raw()))
            }
            DynamicImage::ImageRgb32F(b) => (ColorModel::Rgb, FrameData::F32(b.into_raw())),
            DynamicImage::ImageRgba32F(b) => (ColorModel::Rgba, FrameData::F32(b.into_raw())),
            other => (
                ColorModel::Rgba,
                FrameData::F32(other.to_rgba32f().into_raw()),
            ),
        };
        Self {
            width,
            height,
            model,
            data,
        }
    }

    /// Decode an encoded image held in memory.
    pub fn decode(bytes: &[u8]) -> TileFxResult<Self> {
        let img = image::load_from_memory(bytes).context("decode image from memory")?;
        Ok(Self::from_dynamic(img))
    }

    /// Read and decode an image file.
    pub fn open(path: impl AsRef<Path>) -> TileFxResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).with_context(|| format!("open image '{}'", path.display()))?;
        Ok(Self::from_dynamic(img))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format of the stored data.
    pub fn format(&self) -> PixelFormat {
        PixelFormat::of(self.data.encoding(), self.model)
    }

    /// Stored channels.
    pub fn data(&self) -> &FrameData {
        &self.data
    }

    fn row_stride_bytes(&self) -> usize {
        self.width as usize * self.format().bytes_per_pixel()
    }

    /// Read-only view anchored at the origin.
    pub fn view(&self) -> TileFxResult<AnyImageView<'_>> {
        let data = match &self.data {
            FrameData::U8(v) => ChannelSlice::U8(v),
            FrameData::U16(v) => ChannelSlice::U16(v),
            FrameData::F32(v) => ChannelSlice::F32(v),
        };
        AnyImageView::new(
            data,
            self.model,
            Rect::from_size(self.width, self.height),
            self.row_stride_bytes(),
        )
    }

    /// Writable view anchored at the origin.
    pub fn view_mut(&mut self) -> TileFxResult<AnyImageViewMut<'_>> {
        let stride = self.row_stride_bytes();
        let bounds = Rect::from_size(self.width, self.height);
        let data = match &mut self.data {
            FrameData::U8(v) => ChannelSliceMut::U8(v),
            FrameData::U16(v) => ChannelSliceMut::U16(v),
            FrameData::F32(v) => ChannelSliceMut::F32(v),
        };
        AnyImageViewMut::new(data, self.model, bounds, stride)
    }

    /// Convert to an `image` buffer.
    ///
    /// Alpha mattes become gray images of their alpha. Single-channel float frames are
    /// replicated to RGB because there is no gray float buffer type.
    pub fn to_dynamic(&self) -> TileFxResult<DynamicImage> {
        let (w, h) = (self.width, self.height);
        let img = match (&self.data, self.model) {
            (FrameData::U8(v), ColorModel::Gray | ColorModel::Alpha) => {
                ImageBuffer::<Luma<u8>, _>::from_raw(w, h, v.clone()).map(DynamicImage::ImageLuma8)
            }
            (FrameData::U8(v), ColorModel::Rgb) => {
                ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgb8)
            }
            (FrameData::U8(v), ColorModel::Rgba) => {
                ImageBuffer::<Rgba<u8>, _>::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgba8)
            }
            (FrameData::U16(v), ColorModel::Gray | ColorModel::Alpha) => {
                ImageBuffer::<Luma<u16>, _>::from_raw(w, h, v.clone())
                    .map(DynamicImage::ImageLuma16)
            }
            (FrameData::U16(v), ColorModel::Rgb) => {
                ImageBuffer::<Rgb<u16>, _>::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgb16)
            }
            (FrameData::U16(v), ColorModel::Rgba) => {
                ImageBuffer::<Rgba<u16>, _>::from_raw(w, h, v.clone())
                    .map(DynamicImage::ImageRgba16)
            }
            (FrameData::F32(v), ColorModel::Gray | ColorModel::Alpha) => {
                let rgb = v.iter().flat_map(|&g| [g, g, g]).collect();
                ImageBuffer::<Rgb<f32>, _>::from_raw(w, h, rgb).map(DynamicImage::ImageRgb32F)
            }
            (FrameData::F32(v), ColorModel::Rgb) => {
                ImageBuffer::<Rgb<f32>, _>::from_raw(w, h, v.clone())
                    .map(DynamicImage::ImageRgb32F)
            }
            (FrameData::F32(v), ColorModel::Rgba) => {
                ImageBuffer::<Rgba<f32>, _>::from_raw(w, h, v.clone())
                    .map(DynamicImage::ImageRgba32F)
            }
        };
        img.ok_or_else(|| {
            TileFxError::validation(format!(
                "{w}x{h} {} frame has an inconsistent buffer length",
                self.format()
            ))
        })
    }

    /// Encode to `path`, choosing the file format from its extension.
    ///
    /// Float frames are written as 16-bit unless the format stores floats.
    pub fn save(&self, path: impl AsRef<Path>) -> TileFxResult<()> {
        let path = path.as_ref();
        let mut img = self.to_dynamic()?;
        let float_format = matches!(
            image::ImageFormat::from_path(path),
            Ok(image::ImageFormat::OpenExr | image::ImageFormat::Hdr | image::ImageFormat::Tiff)
        );
        if self.data.encoding() == ChannelEncoding::F32 && !float_format {
            img = if img.color().has_alpha() {
                DynamicImage::ImageRgba16(img.to_rgba16())
            } else {
                DynamicImage::ImageRgb16(img.to_rgb16())
            };
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        img.save(path)
            .with_context(|| format!("write image '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/frame.rs"]
mod tests;
