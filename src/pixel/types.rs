use std::fmt;

use crate::foundation::math::luminance;
use crate::pixel::channel::Channel;
use crate::pixel::format::{ColorModel, PixelFormat};

/// Promoted, model-independent RGBA color.
///
/// This is the exchange form between pixel types of different color models and the published
/// form of statistics. Channels are promoted values (nominally `[0, 1]`).
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Build a color from its channels.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Fixed gray projection of the color channels (alpha ignored).
    pub fn luminance(self) -> f32 {
        luminance(self.r, self.g, self.b)
    }

    /// Channels as `[r, g, b, a]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A pixel of a concrete [`PixelFormat`].
///
/// Implemented by [`Gray`], [`Rgb`], [`Rgba`] and [`Alpha`] over each [`Channel`] type; the
/// format dispatcher instantiates engine code once per implementation.
pub trait Pixel:
    sealed::Sealed + Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Channel value type.
    type Channel: Channel;
    /// Color model tag.
    const MODEL: ColorModel;
    /// Channel count (matches [`ColorModel::channel_count`]).
    const CHANNELS: usize;

    /// Runtime format descriptor of this pixel type.
    fn format() -> PixelFormat {
        PixelFormat::of(<Self::Channel as Channel>::ENCODING, Self::MODEL)
    }

    /// Channel values in storage order.
    fn channels(&self) -> &[Self::Channel];

    /// Mutable channel values in storage order.
    fn channels_mut(&mut self) -> &mut [Self::Channel];

    /// Read one pixel from the start of `src` (`src.len() >= CHANNELS`).
    fn read(src: &[Self::Channel]) -> Self;

    /// Write one pixel to the start of `dst` (`dst.len() >= CHANNELS`).
    fn write(self, dst: &mut [Self::Channel]);

    /// Pixel with every channel set to `v`.
    fn splat(v: Self::Channel) -> Self;

    /// Convert to the promoted RGBA exchange form.
    fn to_color(self) -> Color;

    /// Convert from the promoted RGBA exchange form.
    fn from_color(color: Color) -> Self;

    /// Gray projection used for luminance-extremal statistics.
    fn luminance(self) -> f32;

    /// Convert a pixel of another format.
    ///
    /// Same color model: channel-wise promotion/demotion (exact for equal encodings).
    /// Different models: through [`Color`].
    fn convert<S: Pixel>(src: S) -> Self {
        if S::MODEL != Self::MODEL {
            return Self::from_color(src.to_color());
        }
        let mut out = Self::default();
        for (d, s) in out.channels_mut().iter_mut().zip(src.channels()) {
            *d = <Self::Channel as Channel>::demote(s.promote());
        }
        out
    }
}

macro_rules! pixel_storage {
    ($n:expr) => {
        const CHANNELS: usize = $n;

        fn channels(&self) -> &[C] {
            &self.0
        }

        fn channels_mut(&mut self) -> &mut [C] {
            &mut self.0
        }

        fn read(src: &[C]) -> Self {
            let mut px = [C::ZERO; $n];
            px.copy_from_slice(&src[..$n]);
            Self(px)
        }

        fn write(self, dst: &mut [C]) {
            dst[..$n].copy_from_slice(&self.0);
        }

        fn splat(v: C) -> Self {
            Self([v; $n])
        }
    };
}

/// Single-channel gray pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Gray<C>(pub [C; 1]);

/// Three-channel RGB pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb<C>(pub [C; 3]);

/// Four-channel RGBA pixel (straight alpha).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgba<C>(pub [C; 4]);

/// Single-channel alpha (matte) pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Alpha<C>(pub [C; 1]);

impl<C: Channel> Gray<C> {
    /// Gray pixel from its value.
    pub fn new(v: C) -> Self {
        Self([v])
    }
}

impl<C: Channel> Rgb<C> {
    /// RGB pixel from its channels.
    pub fn new(r: C, g: C, b: C) -> Self {
        Self([r, g, b])
    }
}

impl<C: Channel> Rgba<C> {
    /// RGBA pixel from its channels.
    pub fn new(r: C, g: C, b: C, a: C) -> Self {
        Self([r, g, b, a])
    }
}

impl<C: Channel> Alpha<C> {
    /// Alpha pixel from its value.
    pub fn new(a: C) -> Self {
        Self([a])
    }
}

impl<C: Channel> sealed::Sealed for Gray<C> {}
impl<C: Channel> sealed::Sealed for Rgb<C> {}
impl<C: Channel> sealed::Sealed for Rgba<C> {}
impl<C: Channel> sealed::Sealed for Alpha<C> {}

impl<C: Channel> Pixel for Gray<C> {
    type Channel = C;
    const MODEL: ColorModel = ColorModel::Gray;
    pixel_storage!(1);

    fn to_color(self) -> Color {
        let v = self.0[0].promote();
        Color::new(v, v, v, 1.0)
    }

    fn from_color(color: Color) -> Self {
        Self([C::demote(color.luminance())])
    }

    fn luminance(self) -> f32 {
        self.0[0].promote()
    }
}

impl<C: Channel> Pixel for Rgb<C> {
    type Channel = C;
    const MODEL: ColorModel = ColorModel::Rgb;
    pixel_storage!(3);

    fn to_color(self) -> Color {
        let [r, g, b] = self.0;
        Color::new(r.promote(), g.promote(), b.promote(), 1.0)
    }

    fn from_color(color: Color) -> Self {
        Self([C::demote(color.r), C::demote(color.g), C::demote(color.b)])
    }

    fn luminance(self) -> f32 {
        let [r, g, b] = self.0;
        luminance(r.promote(), g.promote(), b.promote())
    }
}

impl<C: Channel> Pixel for Rgba<C> {
    type Channel = C;
    const MODEL: ColorModel = ColorModel::Rgba;
    pixel_storage!(4);

    fn to_color(self) -> Color {
        let [r, g, b, a] = self.0;
        Color::new(r.promote(), g.promote(), b.promote(), a.promote())
    }

    fn from_color(color: Color) -> Self {
        Self([
            C::demote(color.r),
            C::demote(color.g),
            C::demote(color.b),
            C::demote(color.a),
        ])
    }

    fn luminance(self) -> f32 {
        let [r, g, b, _] = self.0;
        luminance(r.promote(), g.promote(), b.promote())
    }
}

impl<C: Channel> Pixel for Alpha<C> {
    type Channel = C;
    const MODEL: ColorModel = ColorModel::Alpha;
    pixel_storage!(1);

    fn to_color(self) -> Color {
        Color::new(0.0, 0.0, 0.0, self.0[0].promote())
    }

    fn from_color(color: Color) -> Self {
        Self([C::demote(color.a)])
    }

    // A matte has no color; its only channel is its gray projection.
    fn luminance(self) -> f32 {
        self.0[0].promote()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/types.rs"]
mod tests;
