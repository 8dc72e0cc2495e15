//! Channel value types and the promotion table.
//!
//! | source | promoted (f32)   | demoted back                        |
//! |--------|------------------|-------------------------------------|
//! | `u8`   | `v / 255`        | `round(clamp(p, 0, 1) * 255)`       |
//! | `u16`  | `v / 65535`      | `round(clamp(p, 0, 1) * 65535)`     |
//! | `f32`  | `v`              | `p`                                 |
//!
//! Arithmetic over channel values always happens on promoted values; sums are further widened to
//! f64 by the accumulator.

use std::fmt;

use crate::pixel::format::ChannelEncoding;

/// Promote an 8-bit normalized channel value.
pub fn promote_u8(v: u8) -> f32 {
    f32::from(v) / 255.0
}

/// Promote a 16-bit normalized channel value.
pub fn promote_u16(v: u16) -> f32 {
    f32::from(v) / 65535.0
}

/// Promote a float channel value (identity).
pub fn promote_f32(v: f32) -> f32 {
    v
}

/// Demote a promoted value to 8 bits. Out-of-range values saturate; NaN maps to 0.
pub fn demote_u8(p: f32) -> u8 {
    (p.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Demote a promoted value to 16 bits. Out-of-range values saturate; NaN maps to 0.
pub fn demote_u16(p: f32) -> u16 {
    (p.clamp(0.0, 1.0) * 65535.0).round() as u16
}

/// Demote a promoted value to float (identity, no clamping).
pub fn demote_f32(p: f32) -> f32 {
    p
}

/// Borrowed channel storage of a format-erased buffer.
#[derive(Clone, Copy, Debug)]
pub enum ChannelSlice<'a> {
    /// 8-bit channels.
    U8(&'a [u8]),
    /// 16-bit channels.
    U16(&'a [u16]),
    /// Float channels.
    F32(&'a [f32]),
}

impl ChannelSlice<'_> {
    /// Encoding of the stored channels.
    pub fn encoding(&self) -> ChannelEncoding {
        match self {
            ChannelSlice::U8(_) => ChannelEncoding::U8,
            ChannelSlice::U16(_) => ChannelEncoding::U16,
            ChannelSlice::F32(_) => ChannelEncoding::F32,
        }
    }

    /// Number of channel values.
    pub fn len(&self) -> usize {
        match self {
            ChannelSlice::U8(s) => s.len(),
            ChannelSlice::U16(s) => s.len(),
            ChannelSlice::F32(s) => s.len(),
        }
    }

    /// Return `true` when no channel value is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mutably borrowed channel storage of a format-erased buffer.
#[derive(Debug)]
pub enum ChannelSliceMut<'a> {
    /// 8-bit channels.
    U8(&'a mut [u8]),
    /// 16-bit channels.
    U16(&'a mut [u16]),
    /// Float channels.
    F32(&'a mut [f32]),
}

impl ChannelSliceMut<'_> {
    /// Encoding of the stored channels.
    pub fn encoding(&self) -> ChannelEncoding {
        match self {
            ChannelSliceMut::U8(_) => ChannelEncoding::U8,
            ChannelSliceMut::U16(_) => ChannelEncoding::U16,
            ChannelSliceMut::F32(_) => ChannelEncoding::F32,
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for f32 {}
}

/// A channel value type. Implemented for `u8`, `u16` and `f32` only.
pub trait Channel:
    sealed::Sealed + Copy + Default + PartialOrd + fmt::Debug + Send + Sync + 'static
{
    /// Encoding tag of this channel type.
    const ENCODING: ChannelEncoding;
    /// Normalized zero (black / transparent).
    const ZERO: Self;
    /// Normalized one (full intensity / opaque).
    const FULL: Self;

    /// Widen to the promoted f32 representation.
    fn promote(self) -> f32;

    /// Narrow a promoted value back to this channel type.
    fn demote(p: f32) -> Self;

    /// Recover typed channels from format-erased storage.
    fn cast_slice(data: ChannelSlice<'_>) -> Option<&'_ [Self]>;

    /// Recover typed mutable channels from format-erased storage.
    fn cast_slice_mut(data: ChannelSliceMut<'_>) -> Option<&'_ mut [Self]>;

    /// Erase the channel type of a slice.
    fn erase(data: &[Self]) -> ChannelSlice<'_>;

    /// Erase the channel type of a mutable slice.
    fn erase_mut(data: &mut [Self]) -> ChannelSliceMut<'_>;
}

impl Channel for u8 {
    const ENCODING: ChannelEncoding = ChannelEncoding::U8;
    const ZERO: Self = 0;
    const FULL: Self = u8::MAX;

    fn promote(self) -> f32 {
        promote_u8(self)
    }

    fn demote(p: f32) -> Self {
        demote_u8(p)
    }

    fn cast_slice(data: ChannelSlice<'_>) -> Option<&'_ [Self]> {
        match data {
            ChannelSlice::U8(s) => Some(s),
            _ => None,
        }
    }

    fn cast_slice_mut(data: ChannelSliceMut<'_>) -> Option<&'_ mut [Self]> {
        match data {
            ChannelSliceMut::U8(s) => Some(s),
            _ => None,
        }
    }

    fn erase(data: &[Self]) -> ChannelSlice<'_> {
        ChannelSlice::U8(data)
    }

    fn erase_mut(data: &mut [Self]) -> ChannelSliceMut<'_> {
        ChannelSliceMut::U8(data)
    }
}

impl Channel for u16 {
    const ENCODING: ChannelEncoding = ChannelEncoding::U16;
    const ZERO: Self = 0;
    const FULL: Self = u16::MAX;

    fn promote(self) -> f32 {
        promote_u16(self)
    }

    fn demote(p: f32) -> Self {
        demote_u16(p)
    }

    fn cast_slice(data: ChannelSlice<'_>) -> Option<&'_ [Self]> {
        match data {
            ChannelSlice::U16(s) => Some(s),
            _ => None,
        }
    }

    fn cast_slice_mut(data: ChannelSliceMut<'_>) -> Option<&'_ mut [Self]> {
        match data {
            ChannelSliceMut::U16(s) => Some(s),
            _ => None,
        }
    }

    fn erase(data: &[Self]) -> ChannelSlice<'_> {
        ChannelSlice::U16(data)
    }

    fn erase_mut(data: &mut [Self]) -> ChannelSliceMut<'_> {
        ChannelSliceMut::U16(data)
    }
}

impl Channel for f32 {
    const ENCODING: ChannelEncoding = ChannelEncoding::F32;
    const ZERO: Self = 0.0;
    const FULL: Self = 1.0;

    fn promote(self) -> f32 {
        promote_f32(self)
    }

    fn demote(p: f32) -> Self {
        demote_f32(p)
    }

    fn cast_slice(data: ChannelSlice<'_>) -> Option<&'_ [Self]> {
        match data {
            ChannelSlice::F32(s) => Some(s),
            _ => None,
        }
    }

    fn cast_slice_mut(data: ChannelSliceMut<'_>) -> Option<&'_ mut [Self]> {
        match data {
            ChannelSliceMut::F32(s) => Some(s),
            _ => None,
        }
    }

    fn erase(data: &[Self]) -> ChannelSlice<'_> {
        ChannelSlice::F32(data)
    }

    fn erase_mut(data: &mut [Self]) -> ChannelSliceMut<'_> {
        ChannelSliceMut::F32(data)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/channel.rs"]
mod tests;
