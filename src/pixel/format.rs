use std::fmt;

use crate::foundation::error::{TileFxError, TileFxResult};

/// Per-channel numeric representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelEncoding {
    /// 8-bit unsigned, normalized to `[0, 1]` by 255.
    U8,
    /// 16-bit unsigned, normalized to `[0, 1]` by 65535.
    U16,
    /// 32-bit float, used as-is.
    F32,
}

impl ChannelEncoding {
    /// All encodings, in dispatch order.
    pub const ALL: [ChannelEncoding; 3] =
        [ChannelEncoding::U8, ChannelEncoding::U16, ChannelEncoding::F32];

    /// Bytes per channel value.
    pub fn byte_size(self) -> usize {
        match self {
            ChannelEncoding::U8 => 1,
            ChannelEncoding::U16 => 2,
            ChannelEncoding::F32 => 4,
        }
    }

    fn bit(self) -> u8 {
        match self {
            ChannelEncoding::U8 => 1,
            ChannelEncoding::U16 => 1 << 1,
            ChannelEncoding::F32 => 1 << 2,
        }
    }
}

impl fmt::Display for ChannelEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelEncoding::U8 => "u8",
            ChannelEncoding::U16 => "u16",
            ChannelEncoding::F32 => "f32",
        })
    }
}

/// Color model tag of a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorModel {
    /// Single luminance channel.
    Gray,
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
    /// Single alpha (matte) channel.
    Alpha,
}

impl ColorModel {
    /// All color models, in dispatch order.
    pub const ALL: [ColorModel; 4] =
        [ColorModel::Gray, ColorModel::Rgb, ColorModel::Rgba, ColorModel::Alpha];

    /// Channel cardinality of the model.
    pub fn channel_count(self) -> usize {
        match self {
            ColorModel::Gray | ColorModel::Alpha => 1,
            ColorModel::Rgb => 3,
            ColorModel::Rgba => 4,
        }
    }

    fn bit(self) -> u8 {
        match self {
            ColorModel::Gray => 1,
            ColorModel::Rgb => 1 << 1,
            ColorModel::Rgba => 1 << 2,
            ColorModel::Alpha => 1 << 3,
        }
    }
}

impl fmt::Display for ColorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorModel::Gray => "gray",
            ColorModel::Rgb => "rgb",
            ColorModel::Rgba => "rgba",
            ColorModel::Alpha => "alpha",
        })
    }
}

/// Concrete pixel encoding: channel encoding plus color model.
///
/// The channel count is derived from the color model, so a constructed format always satisfies
/// the channel-cardinality invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelFormat {
    /// Per-channel numeric representation.
    pub encoding: ChannelEncoding,
    /// Color model tag.
    pub model: ColorModel,
}

impl PixelFormat {
    /// Create a format from a negotiated channel count, rejecting counts that do not match the
    /// color model.
    pub fn new(
        channel_count: usize,
        encoding: ChannelEncoding,
        model: ColorModel,
    ) -> TileFxResult<Self> {
        if channel_count != model.channel_count() {
            return Err(TileFxError::validation(format!(
                "color model {model} has {} channels, got {channel_count}",
                model.channel_count()
            )));
        }
        Ok(Self { encoding, model })
    }

    /// Format from its parts.
    pub const fn of(encoding: ChannelEncoding, model: ColorModel) -> Self {
        Self { encoding, model }
    }

    /// Number of channels per pixel.
    pub fn channel_count(self) -> usize {
        self.model.channel_count()
    }

    /// Bytes per pixel for tightly packed rows.
    pub fn bytes_per_pixel(self) -> usize {
        self.channel_count() * self.encoding.byte_size()
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.model, self.encoding)
    }
}

/// Set of pixel formats an effect accepts, mirroring a plugin descriptor's supported bit depths
/// and components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatSupport {
    encodings: u8,
    models: u8,
}

impl FormatSupport {
    /// Every encoding and every color model.
    pub fn all() -> Self {
        Self::only(&ChannelEncoding::ALL, &ColorModel::ALL)
    }

    /// Exactly the listed encodings and color models (cross product).
    pub fn only(encodings: &[ChannelEncoding], models: &[ColorModel]) -> Self {
        Self {
            encodings: encodings.iter().fold(0, |acc, e| acc | e.bit()),
            models: models.iter().fold(0, |acc, m| acc | m.bit()),
        }
    }

    /// Return `true` when `format` is accepted.
    pub fn contains(self, format: PixelFormat) -> bool {
        self.encodings & format.encoding.bit() != 0 && self.models & format.model.bit() != 0
    }
}

impl Default for FormatSupport {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/format.rs"]
mod tests;
