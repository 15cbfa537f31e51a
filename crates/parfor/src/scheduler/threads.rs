use crate::{Capabilities, Placement, Scheduler, available_parallelism};
use core::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[cfg(feature = "cache-padded")]
type Cursor = crossbeam_utils::CachePadded<AtomicUsize>;
#[cfg(not(feature = "cache-padded"))]
type Cursor = AtomicUsize;

#[inline]
fn new_cursor() -> Cursor {
    #[cfg(feature = "cache-padded")]
    {
        crossbeam_utils::CachePadded::new(AtomicUsize::new(0))
    }
    #[cfg(not(feature = "cache-padded"))]
    {
        AtomicUsize::new(0)
    }
}

/// A scheduler backed by scoped OS threads.
///
/// Each submission spawns up to `num_threads - 1` scoped threads and uses the
/// calling thread as the first worker, then joins them all before returning.
/// Because every submission owns its threads, a unit may submit nested work
/// without ever waiting on a shared pool.
///
/// - [`Placement::Dynamic`]: workers claim units from a shared cursor, so
///   fast workers pick up the slack of slow ones.
/// - [`Placement::Static`]: unit `k` always runs on worker `k % workers`.
///
/// If the OS refuses to spawn a thread, that worker's share runs on the
/// calling thread instead.
///
/// ## Features
/// - ✅ No global state
/// - ✅ Nesting safe by construction
/// - ✅ Static placement
///
/// ## Recommended When
/// - You want parallelism without a dependency on a pool runtime
/// - Submissions are coarse enough to amortize thread spawn cost
///
/// ## See Also
/// - [`Sequential`]
/// - `RayonScheduler` (feature `rayon`)
///
/// [`Sequential`]: crate::Sequential
#[derive(Clone, Debug)]
pub struct ThreadScheduler {
    num_threads: usize,
    thread_name: Option<String>,
}

impl ThreadScheduler {
    /// Creates a scheduler sized by [`available_parallelism`].
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a scheduler with exactly `num_threads` workers (at least one).
    pub fn with_threads(num_threads: usize) -> Self {
        Self::builder().num_threads(num_threads).build()
    }

    pub fn builder() -> ThreadSchedulerBuilder {
        ThreadSchedulerBuilder::default()
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn parallelism(&self) -> usize {
        self.num_threads
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            static_partition: true,
            affinity: false,
        }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, task)))]
    fn submit(&self, units: usize, placement: Placement, task: &(dyn Fn(usize) + Sync)) {
        let workers = self.num_threads.min(units);
        if workers <= 1 {
            (0..units).for_each(task);
            return;
        }

        let cursor = new_cursor();
        let cursor = &cursor;
        let work = move |worker: usize| match placement {
            Placement::Dynamic => loop {
                let k = cursor.fetch_add(1, Ordering::Relaxed);
                if k >= units {
                    break;
                }
                task(k);
            },
            Placement::Static => (worker..units).step_by(workers).for_each(task),
        };

        thread::scope(|scope| {
            let mut orphaned = Vec::new();
            for worker in 1..workers {
                let builder = match &self.thread_name {
                    Some(prefix) => thread::Builder::new().name(format!("{prefix}-{worker}")),
                    None => thread::Builder::new(),
                };
                if let Err(_e) = builder.spawn_scoped(scope, move || work(worker)) {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("failed to spawn worker {worker}, running inline: {_e}");
                    orphaned.push(worker);
                }
            }

            work(0);
            for worker in orphaned {
                work(worker);
            }
        });
    }
}

/// Builder for [`ThreadScheduler`].
#[derive(Clone, Debug, Default)]
pub struct ThreadSchedulerBuilder {
    num_threads: Option<usize>,
    thread_name: Option<String>,
}

impl ThreadSchedulerBuilder {
    /// Number of workers per submission, including the calling thread.
    ///
    /// Defaults to [`available_parallelism`]. Zero is treated as one.
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Prefix for spawned thread names; workers are named `{prefix}-{n}`.
    pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = Some(prefix.into());
        self
    }

    pub fn build(self) -> ThreadScheduler {
        ThreadScheduler {
            num_threads: self
                .num_threads
                .unwrap_or_else(available_parallelism)
                .max(1),
            thread_name: self.thread_name,
        }
    }
}
