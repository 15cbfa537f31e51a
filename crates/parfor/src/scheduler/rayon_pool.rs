use crate::{Capabilities, Error, Placement, Result, Scheduler, available_parallelism};
use rayon::prelude::*;
use rayon::{BroadcastContext, ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, OnceLock};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pool behind every [`RayonScheduler::global`], built on first use.
/// `None` if the threads could not be spawned.
static SHARED_POOL: OnceLock<Option<Arc<ThreadPool>>> = OnceLock::new();

fn shared_pool() -> Option<&'static Arc<ThreadPool>> {
    SHARED_POOL
        .get_or_init(|| match build_pool(available_parallelism(), "parfor-global") {
            Ok(pool) => Some(Arc::new(pool)),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("failed to build the shared rayon pool, running inline: {_e}");
                None
            }
        })
        .as_ref()
}

fn build_pool(num_threads: usize, prefix: &'static str) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(move |i| format!("{prefix}-{i}"))
        .build()
        .map_err(|e| Error::SchedulerBuild {
            reason: e.to_string(),
        })
}

/// A scheduler backed by a [`rayon`](https://docs.rs/rayon) work-stealing
/// thread pool.
///
/// Dynamic submissions become a parallel iterator over the unit indices, so
/// rayon splits and steals them across the pool. Static submissions are
/// broadcast: pool thread `t` runs units `t, t + n, ...`, which also means
/// repeated submissions of the same shape keep hitting the same threads.
/// That is why this substrate advertises the affinity capability.
///
/// Work always runs on the scheduler's own pool, even when submitted from a
/// thread of some other rayon pool. Rayon's blocking joins keep executing
/// queued work, so units may submit nested work into the same pool. A static
/// submission made from inside the pool is run dynamically instead of being
/// broadcast.
///
/// ## Features
/// - ✅ Work stealing
/// - ✅ Static placement and affinity
/// - ✅ One lazily built pool shared by every [`RayonScheduler::global`]
///
/// ## See Also
/// - [`ThreadScheduler`]
/// - [`Sequential`]
///
/// [`ThreadScheduler`]: crate::ThreadScheduler
/// [`Sequential`]: crate::Sequential
#[derive(Clone, Debug, Default)]
pub struct RayonScheduler {
    pool: Option<Arc<ThreadPool>>,
}

impl RayonScheduler {
    /// Uses the process-wide pool shared by all global schedulers, sized by
    /// [`available_parallelism`] and built on first use.
    ///
    /// This pool is distinct from rayon's own global pool, so a submission
    /// can always tell whether it is already running inside it.
    pub const fn global() -> Self {
        Self { pool: None }
    }

    /// Builds a dedicated pool with `num_threads` workers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchedulerBuild`] if rayon fails to spawn the pool.
    pub fn with_threads(num_threads: usize) -> Result<Self> {
        let pool = build_pool(num_threads, "parfor-rayon")?;
        Ok(Self::from_pool(Arc::new(pool)))
    }

    /// Schedules onto an existing pool.
    pub const fn from_pool(pool: Arc<ThreadPool>) -> Self {
        Self { pool: Some(pool) }
    }

    fn pool(&self) -> Option<&ThreadPool> {
        match &self.pool {
            Some(pool) => Some(pool.as_ref()),
            None => shared_pool().map(Arc::as_ref),
        }
    }
}

impl Scheduler for RayonScheduler {
    fn parallelism(&self) -> usize {
        self.pool().map_or(1, ThreadPool::current_num_threads)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            static_partition: true,
            affinity: true,
        }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, task)))]
    fn submit(&self, units: usize, placement: Placement, task: &(dyn Fn(usize) + Sync)) {
        if units == 0 {
            return;
        }
        let Some(pool) = self.pool() else {
            (0..units).for_each(task);
            return;
        };

        if placement == Placement::Static && pool.current_thread_index().is_none() {
            pool.broadcast(|ctx: BroadcastContext<'_>| {
                (ctx.index()..units)
                    .step_by(ctx.num_threads())
                    .for_each(task);
            });
            return;
        }

        pool.install(|| (0..units).into_par_iter().for_each(task));
    }
}
