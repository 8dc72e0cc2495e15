//! Process-wide worker pool shared by engines built without an explicit thread count.
//!
//! Hosts call [`init`] once when the plugin bundle loads and [`shutdown`] once when it unloads.
//! Render calls never initialize global state themselves.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::engine::session::build_thread_pool;
use crate::foundation::error::TileFxResult;

static SHARED_POOL: Mutex<Option<Arc<rayon::ThreadPool>>> = Mutex::new(None);

/// Options for the shared runtime pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuntimeOpts {
    /// Worker count. `None` uses rayon's default (one per logical CPU).
    pub threads: Option<usize>,
}

fn slot() -> MutexGuard<'static, Option<Arc<rayon::ThreadPool>>> {
    SHARED_POOL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build the shared pool. Returns `false` (and changes nothing) when it already exists.
pub fn init(opts: &RuntimeOpts) -> TileFxResult<bool> {
    let mut slot = slot();
    if slot.is_some() {
        return Ok(false);
    }
    let pool = build_thread_pool(opts.threads)?;
    tracing::debug!(threads = pool.current_num_threads(), "shared worker pool started");
    *slot = Some(Arc::new(pool));
    Ok(true)
}

/// Release the shared pool. Returns `false` when it was not initialized.
///
/// Engines created earlier keep their handle alive until they are dropped.
pub fn shutdown() -> bool {
    let released = slot().take().is_some();
    if released {
        tracing::debug!("shared worker pool released");
    }
    released
}

/// The shared pool, if initialized.
pub fn shared_pool() -> Option<Arc<rayon::ThreadPool>> {
    slot().clone()
}

/// Return `true` while the shared pool exists.
pub fn is_initialized() -> bool {
    slot().is_some()
}
