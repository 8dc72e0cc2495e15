use crate::engine::accumulate::AccumulatorState;
use crate::engine::executor::Concurrency;
use crate::engine::session::Engine;
use crate::foundation::core::{Rect, RenderScale};
use crate::foundation::error::TileFxResult;
use crate::pixel::format::FormatSupport;
use crate::pixel::types::Pixel;
use crate::view::any::{AnyImageView, AnyImageViewMut};
use crate::view::image::{ImageView, TileMut};

/// Host-provided arguments of one render call.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderArgs {
    /// Timeline position of the frame being rendered.
    pub time: f64,
    /// Proxy scale of the clips.
    pub render_scale: RenderScale,
    /// Requested output rectangle in pixel coordinates; clipped to the destination bounds.
    pub render_window: Rect,
}

impl RenderArgs {
    /// Full-resolution arguments at time 0.
    pub fn new(render_window: Rect) -> Self {
        Self {
            time: 0.0,
            render_scale: RenderScale::FULL,
            render_window,
        }
    }

    /// Set the frame time.
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    /// Set the render scale.
    pub fn with_render_scale(mut self, render_scale: RenderScale) -> Self {
        self.render_scale = render_scale;
        self
    }
}

/// Everything a render call operates on: arguments plus the format-erased clip views.
#[derive(Debug)]
pub struct RenderInvocation<'a> {
    /// Per-call arguments.
    pub args: RenderArgs,
    /// Source clip; `None` for generators.
    pub src: Option<AnyImageView<'a>>,
    /// Destination clip.
    pub dst: AnyImageViewMut<'a>,
}

impl<'a> RenderInvocation<'a> {
    /// Invocation writing to `dst` with no source clip.
    pub fn new(args: RenderArgs, dst: AnyImageViewMut<'a>) -> Self {
        Self {
            args,
            src: None,
            dst,
        }
    }

    /// Attach a source clip.
    pub fn with_source(mut self, src: AnyImageView<'a>) -> Self {
        self.src = Some(src);
        self
    }
}

/// Context of the single-threaded setup phase.
pub struct SetupContext<'e> {
    args: RenderArgs,
    engine: &'e Engine,
}

impl<'e> SetupContext<'e> {
    pub(crate) fn new(args: RenderArgs, engine: &'e Engine) -> Self {
        Self { args, engine }
    }

    /// Arguments of the current render call.
    pub fn args(&self) -> &RenderArgs {
        &self.args
    }

    /// Accumulate statistics over `region` of `src` using the engine's configuration.
    pub fn statistics<S: Pixel>(
        &self,
        src: &ImageView<'_, S>,
        region: Rect,
    ) -> TileFxResult<AccumulatorState<S>> {
        self.engine.accumulate(src, region)
    }
}

/// A pixel transform executed by the [`Engine`].
///
/// `setup` runs once per render call before any tile; its result is shared read-only by every
/// `process_tile` call, which may run concurrently on disjoint tiles.
pub trait Effect: Sync {
    /// Invocation-wide values computed by [`Effect::setup`].
    type Setup: Send + Sync;

    /// Pixel formats the effect accepts on its clips.
    fn supported_formats(&self) -> FormatSupport {
        FormatSupport::all()
    }

    /// Whether tiles may be processed concurrently.
    fn concurrency(&self) -> Concurrency {
        Concurrency::Parallel
    }

    /// Compute invocation-wide values.
    fn setup<S: Pixel>(
        &self,
        ctx: &SetupContext<'_>,
        src: Option<&ImageView<'_, S>>,
    ) -> TileFxResult<Self::Setup>;

    /// Write every destination pixel of `tile`.
    fn process_tile<S: Pixel, D: Pixel>(
        &self,
        setup: &Self::Setup,
        src: Option<&ImageView<'_, S>>,
        tile: &mut TileMut<'_, D>,
    ) -> TileFxResult<()>;
}
