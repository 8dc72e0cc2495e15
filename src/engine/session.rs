use std::sync::Arc;

use rayon::prelude::*;

use crate::engine::accumulate::{AccumulatorState, accumulate_region};
use crate::engine::cancel::CancelCheck;
use crate::engine::dispatch::{FormatVisitor, dispatch};
use crate::engine::executor::{Concurrency, RenderOutcome, TileExecutor};
use crate::engine::invocation::{Effect, RenderArgs, RenderInvocation, SetupContext};
use crate::engine::partition::{TileGranularity, partition};
use crate::foundation::core::Rect;
use crate::foundation::error::{TileFxError, TileFxResult};
use crate::pixel::types::Pixel;
use crate::view::image::{ImageView, ImageViewMut, TileMut};

/// Tiles taller than this many rows poll cancellation after every row by default.
pub const DEFAULT_ROW_POLL_THRESHOLD: u32 = 64;

/// Options controlling how an [`Engine`] partitions and schedules work.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOpts {
    /// Execute tiles on a rayon pool. `false` runs every tile on the calling thread.
    pub parallel: bool,
    /// Size of a dedicated worker pool. `None` uses the shared runtime pool when initialized,
    /// otherwise rayon's global pool.
    pub threads: Option<usize>,
    /// Rows per tile.
    pub granularity: TileGranularity,
    /// Tiles taller than this are executed row by row with a cancellation poll after each row.
    pub row_poll_threshold: u32,
    /// Accumulate setup statistics per tile on the pool and merge in tile order.
    pub parallel_statistics: bool,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
            granularity: TileGranularity::Auto,
            row_poll_threshold: DEFAULT_ROW_POLL_THRESHOLD,
            parallel_statistics: false,
        }
    }
}

impl EngineOpts {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> TileFxResult<Self> {
        let opts: Self =
            serde_json::from_str(s).map_err(|e| TileFxError::serde(format!("engine options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Reject option values no engine can honor.
    pub fn validate(&self) -> TileFxResult<()> {
        if self.threads == Some(0) {
            return Err(TileFxError::validation(
                "engine option 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

/// Result of a full render call.
#[derive(Debug)]
pub struct RenderReport<T> {
    /// How tile execution ended.
    pub outcome: RenderOutcome,
    /// Value computed by the effect's setup phase.
    pub setup: T,
}

enum WorkerPool {
    Dedicated(rayon::ThreadPool),
    Shared(Arc<rayon::ThreadPool>),
    Global,
}

/// Tiled parallel executor for [`Effect`]s.
///
/// An engine owns its configuration and (optionally) a dedicated worker pool; it holds no
/// per-render state and may serve any number of sequential render calls.
pub struct Engine {
    opts: EngineOpts,
    pool: WorkerPool,
}

impl Engine {
    /// Build an engine. A dedicated pool is created only when `opts.threads` is set.
    pub fn new(opts: EngineOpts) -> TileFxResult<Self> {
        opts.validate()?;
        let pool = match (opts.parallel, opts.threads) {
            (true, Some(n)) => WorkerPool::Dedicated(build_thread_pool(Some(n))?),
            (true, None) => match crate::runtime::shared_pool() {
                Some(pool) => WorkerPool::Shared(pool),
                None => WorkerPool::Global,
            },
            (false, _) => WorkerPool::Global,
        };
        Ok(Self { opts, pool })
    }

    /// Options the engine was built with.
    pub fn opts(&self) -> &EngineOpts {
        &self.opts
    }

    fn pool(&self) -> Option<&rayon::ThreadPool> {
        match &self.pool {
            WorkerPool::Dedicated(pool) => Some(pool),
            WorkerPool::Shared(pool) => Some(pool.as_ref()),
            WorkerPool::Global => None,
        }
    }

    /// Number of workers tiles are spread over (1 when parallelism is disabled).
    pub fn worker_count(&self) -> usize {
        if !self.opts.parallel {
            return 1;
        }
        self.pool()
            .map_or_else(rayon::current_num_threads, rayon::ThreadPool::current_num_threads)
            .max(1)
    }

    fn executor(&self, concurrency: Concurrency) -> TileExecutor<'_> {
        let workers = match concurrency {
            Concurrency::Parallel => self.worker_count(),
            Concurrency::Serial => 1,
        };
        TileExecutor {
            pool: self.pool(),
            workers,
            row_poll_threshold: self.opts.row_poll_threshold,
        }
    }

    /// Accumulate statistics over `region` of `src`, clipped to its bounds.
    ///
    /// Single pass on the calling thread unless `parallel_statistics` is enabled, in which case
    /// per-tile states are computed on the pool and merged in tile order.
    pub fn accumulate<S: Pixel>(
        &self,
        src: &ImageView<'_, S>,
        region: Rect,
    ) -> TileFxResult<AccumulatorState<S>> {
        let workers = self.worker_count();
        if !self.opts.parallel_statistics || workers <= 1 {
            return Ok(accumulate_region(src, region));
        }

        let tiles = partition(
            region.intersect(src.bounds()),
            workers,
            self.opts.granularity,
        );
        let collect = || -> Vec<AccumulatorState<S>> {
            tiles
                .par_iter()
                .map(|tile| accumulate_region(src, tile.rect))
                .collect()
        };
        let states = match self.pool() {
            Some(pool) => pool.install(collect),
            None => collect(),
        };
        Ok(states
            .into_iter()
            .fold(AccumulatorState::new(), AccumulatorState::merge))
    }

    /// Run the single-threaded setup phase of `effect`.
    #[tracing::instrument(skip_all, fields(time = args.time))]
    pub fn setup<E: Effect, S: Pixel>(
        &self,
        effect: &E,
        args: RenderArgs,
        src: Option<&ImageView<'_, S>>,
    ) -> TileFxResult<E::Setup> {
        let ctx = SetupContext::new(args, self);
        effect.setup(&ctx, src)
    }

    /// Partition `window` (clipped to the destination bounds) and run `op` on every tile.
    pub fn render_region<D, F>(
        &self,
        dst: ImageViewMut<'_, D>,
        window: Rect,
        concurrency: Concurrency,
        op: F,
        cancel: &dyn CancelCheck,
    ) -> TileFxResult<RenderOutcome>
    where
        D: Pixel,
        F: Fn(&mut TileMut<'_, D>) -> TileFxResult<()> + Sync,
    {
        let window = window.intersect(dst.bounds());
        if window.is_empty() {
            return Ok(RenderOutcome::Completed { tiles: 0 });
        }

        let executor = self.executor(concurrency);
        let tiles = partition(window, executor.workers, self.opts.granularity);
        tracing::debug!(
            window = %window,
            tiles = tiles.len(),
            workers = executor.workers,
            "partitioned render window"
        );
        let tiles = dst.into_tiles(&tiles)?;
        executor.run(tiles, op, cancel)
    }

    /// Resolve formats, run setup, then process every tile of the render window.
    ///
    /// Unsupported format combinations fail before setup; nothing is written.
    #[tracing::instrument(skip_all, fields(window = %invocation.args.render_window))]
    pub fn render<E: Effect>(
        &self,
        effect: &E,
        invocation: RenderInvocation<'_>,
        cancel: &dyn CancelCheck,
    ) -> TileFxResult<RenderReport<E::Setup>> {
        let RenderInvocation { args, src, dst } = invocation;
        dispatch(
            src.as_ref(),
            dst,
            effect.supported_formats(),
            RenderVisitor {
                engine: self,
                effect,
                args,
                cancel,
            },
        )
    }
}

struct RenderVisitor<'r, E> {
    engine: &'r Engine,
    effect: &'r E,
    args: RenderArgs,
    cancel: &'r dyn CancelCheck,
}

impl<E: Effect> FormatVisitor for RenderVisitor<'_, E> {
    type Output = RenderReport<E::Setup>;

    fn visit<S: Pixel, D: Pixel>(
        self,
        src: Option<ImageView<'_, S>>,
        dst: ImageViewMut<'_, D>,
    ) -> TileFxResult<Self::Output> {
        let effect = self.effect;
        let setup = self.engine.setup(effect, self.args, src.as_ref())?;
        let outcome = self.engine.render_region(
            dst,
            self.args.render_window,
            effect.concurrency(),
            |tile: &mut TileMut<'_, D>| effect.process_tile(&setup, src.as_ref(), tile),
            self.cancel,
        )?;
        Ok(RenderReport { outcome, setup })
    }
}

pub(crate) fn build_thread_pool(threads: Option<usize>) -> TileFxResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(TileFxError::validation(
            "worker pool 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("tilefx-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| anyhow::Error::new(e).context("failed to build rayon thread pool").into())
}

#[cfg(test)]
#[path = "../../tests/unit/engine/session.rs"]
mod tests;
