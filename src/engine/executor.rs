use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::engine::cancel::CancelCheck;
use crate::foundation::error::{TileFxError, TileFxResult};
use crate::pixel::types::Pixel;
use crate::view::image::TileMut;

/// Non-failing result of tile execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderOutcome {
    /// Every tile ran to completion.
    Completed {
        /// Number of tiles executed.
        tiles: usize,
    },
    /// Cancellation was observed; completed tiles stay in the destination.
    Aborted {
        /// Tiles fully written before dispatch stopped.
        tiles_completed: usize,
        /// Tiles in the partition.
        tiles_total: usize,
    },
}

impl RenderOutcome {
    /// Return `true` for [`RenderOutcome::Completed`].
    pub fn is_completed(self) -> bool {
        matches!(self, RenderOutcome::Completed { .. })
    }
}

/// Whether an operation tolerates concurrent execution of disjoint tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Concurrency {
    /// Tiles may run on any number of workers.
    #[default]
    Parallel,
    /// Tiles must run one at a time (e.g. a non-reentrant collaborator); collapses the executor
    /// to a single worker.
    Serial,
}

/// Runs a per-tile closure over a partition, sequentially or on a rayon pool.
pub(crate) struct TileExecutor<'p> {
    /// Pool to install parallel work on; `None` uses rayon's global pool.
    pub(crate) pool: Option<&'p rayon::ThreadPool>,
    /// Effective worker count. `<= 1` runs tiles in order on the calling thread.
    pub(crate) workers: usize,
    /// Tiles taller than this are executed row by row, polling cancellation after each row.
    pub(crate) row_poll_threshold: u32,
}

impl TileExecutor<'_> {
    pub(crate) fn run<P, F>(
        &self,
        tiles: Vec<TileMut<'_, P>>,
        op: F,
        cancel: &dyn CancelCheck,
    ) -> TileFxResult<RenderOutcome>
    where
        P: Pixel,
        F: Fn(&mut TileMut<'_, P>) -> TileFxResult<()> + Sync,
    {
        let total = tiles.len();
        let stop = AtomicBool::new(false);
        let cancelled = AtomicBool::new(false);
        let completed = AtomicUsize::new(0);

        let observe_cancel = || {
            if cancel.is_cancelled() {
                cancelled.store(true, Ordering::Release);
                stop.store(true, Ordering::Release);
                true
            } else {
                false
            }
        };

        let run_one = |mut tile: TileMut<'_, P>| -> TileFxResult<()> {
            if stop.load(Ordering::Acquire) || observe_cancel() {
                return Ok(());
            }
            if tile.height() > self.row_poll_threshold {
                let rows = tile.into_rows();
                let last = rows.len().saturating_sub(1);
                for (i, mut row) in rows.into_iter().enumerate() {
                    if stop.load(Ordering::Acquire) {
                        return Ok(());
                    }
                    guarded(&op, &mut row, &stop)?;
                    if i < last && observe_cancel() {
                        return Ok(());
                    }
                }
            } else {
                guarded(&op, &mut tile, &stop)?;
            }
            completed.fetch_add(1, Ordering::AcqRel);
            observe_cancel();
            Ok(())
        };

        if self.workers <= 1 || total <= 1 {
            for tile in tiles {
                run_one(tile)?;
                if stop.load(Ordering::Acquire) {
                    break;
                }
            }
        } else {
            let dispatch = || tiles.into_par_iter().try_for_each(|tile| run_one(tile));
            match self.pool {
                Some(pool) => pool.install(dispatch)?,
                None => dispatch()?,
            }
        }

        let tiles_completed = completed.load(Ordering::Acquire);
        if cancelled.load(Ordering::Acquire) && tiles_completed < total {
            tracing::warn!(tiles_completed, tiles_total = total, "render aborted by host");
            return Ok(RenderOutcome::Aborted {
                tiles_completed,
                tiles_total: total,
            });
        }
        Ok(RenderOutcome::Completed { tiles: total })
    }
}

/// Run `op` on one tile, turning errors and panics into [`TileFxError::TileProcessingFailed`]
/// and stopping further dispatch.
fn guarded<P, F>(op: &F, tile: &mut TileMut<'_, P>, stop: &AtomicBool) -> TileFxResult<()>
where
    P: Pixel,
    F: Fn(&mut TileMut<'_, P>) -> TileFxResult<()>,
{
    let rect = tile.rect();
    let err = match catch_unwind(AssertUnwindSafe(|| op(tile))) {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(e @ TileFxError::TileProcessingFailed { .. })) => e,
        Ok(Err(e)) => TileFxError::tile_failed(rect, e.to_string()),
        Err(payload) => TileFxError::tile_failed(rect, panic_message(payload.as_ref())),
    };
    stop.store(true, Ordering::Release);
    tracing::warn!(tile = %rect, error = %err, "tile processing failed");
    Err(err)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/executor.rs"]
mod tests;
