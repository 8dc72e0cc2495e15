//! tilefx is a tiled, format-generic, parallel per-frame pixel-processing engine.
//!
//! Effects describe a transform once, generically over [`Pixel`]; the [`Engine`] applies it:
//!
//! - resolve the negotiated clip formats once per render call ([`dispatch`])
//! - run the effect's single-threaded setup (statistics via [`AccumulatorState`])
//! - split the render window into disjoint row tiles ([`partition`])
//! - execute tiles on a rayon pool, polling host cancellation between tiles
//!
//! Destination tiles are disjoint mutable borrows of the output buffer, so tile execution needs
//! no locks and no unsafe code.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod effects;
mod engine;
mod foundation;
mod media;
mod pixel;
mod view;

/// Process-wide shared worker pool lifecycle.
pub mod runtime;

pub use crate::foundation::core::{Rect, RenderScale};
pub use crate::foundation::error::{TileFxError, TileFxResult};

pub use crate::pixel::channel::{
    Channel, ChannelSlice, ChannelSliceMut, demote_f32, demote_u8, demote_u16, promote_f32,
    promote_u8, promote_u16,
};
pub use crate::pixel::format::{ChannelEncoding, ColorModel, FormatSupport, PixelFormat};
pub use crate::pixel::types::{Alpha, Color, Gray, Pixel, Rgb, Rgba};

pub use crate::view::any::{AnyImageView, AnyImageViewMut};
pub use crate::view::image::{ImageView, ImageViewMut, TileMut};

pub use crate::engine::accumulate::{AccumulatorState, ImageStatistics, accumulate_region};
pub use crate::engine::cancel::{CancelCheck, CancelFlag, NeverCancel};
pub use crate::engine::dispatch::{
    FormatVisitor, SourceVisitor, dispatch, dispatch_source, resolve,
};
pub use crate::engine::executor::{Concurrency, RenderOutcome};
pub use crate::engine::invocation::{Effect, RenderArgs, RenderInvocation, SetupContext};
pub use crate::engine::partition::{SCANLINE_TILING_MAX_HEIGHT, Tile, TileGranularity, partition};
pub use crate::engine::session::{
    DEFAULT_ROW_POLL_THRESHOLD, Engine, EngineOpts, RenderReport,
};

pub use crate::effects::expression::{
    ExpressionEngine, ExpressionGenerator, ExpressionSource, GeneratorSetup,
};
pub use crate::effects::statistics::{ImageStatisticsEffect, StatisticsOutput, StatisticsSetup};

pub use crate::media::frame::{Frame, FrameData};
