use crate::config::{Mode, RunConfig, SchedulerKind};
use anyhow::{Context, bail};
use parfor::{AffinityState, Dispatcher, RayonScheduler, Scheduler, Sequential, ThreadScheduler};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub type DynScheduler = Box<dyn Scheduler + Send + Sync>;

/// Builds the substrate selected on the command line.
pub fn build_scheduler(config: &RunConfig) -> anyhow::Result<DynScheduler> {
    Ok(match config.scheduler {
        SchedulerKind::Sequential => Box::new(Sequential),
        SchedulerKind::Threads => Box::new(
            ThreadScheduler::builder()
                .num_threads(config.threads)
                .thread_name("parfor-worker")
                .build(),
        ),
        SchedulerKind::Rayon => Box::new(
            RayonScheduler::with_threads(config.threads)
                .context("failed to start the rayon pool")?,
        ),
    })
}

/// Runs the workload `config.repeat` times and checks every checksum
/// against the closed form.
pub fn run(config: &RunConfig) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::new(build_scheduler(config)?);
    let expected = expected_sum_of_squares(config.count);
    let mut state = AffinityState::new();

    for round in 0..config.repeat {
        let start = Instant::now();
        let checksum = sum_of_squares(&dispatcher, config, &mut state)
            .with_context(|| format!("round {round} was cancelled"))?;
        let elapsed = start.elapsed();

        tracing::info!(
            round,
            checksum,
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            "workload completed"
        );

        if checksum != expected {
            bail!("checksum mismatch: got {checksum}, expected {expected}");
        }
    }

    if config.mode == Mode::Affinity {
        tracing::info!(
            replays = state.replays(),
            contexts = ?state.contexts(),
            "affinity layout"
        );
    }

    Ok(())
}

/// Sums `i * i` over `[0, config.count)` with wrapping arithmetic, through
/// the dispatch entry point selected by `config.mode`.
pub fn sum_of_squares<S: Scheduler>(
    dispatcher: &Dispatcher<S>,
    config: &RunConfig,
    state: &mut AffinityState,
) -> parfor::Result<u64> {
    let total = AtomicU64::new(0);
    let visit = |i: u64| {
        if config.fail_at == Some(i) {
            panic!("injected failure at index {i}");
        }
        i.wrapping_mul(i)
    };
    let add = |value: u64| {
        total.fetch_add(value, Ordering::Relaxed);
    };

    match config.mode {
        Mode::Index => dispatcher.for_each_index(config.count, |i| add(visit(i)))?,
        Mode::Range => {
            dispatcher.for_each_range_with_step(0, config.count, config.min_step, |chunk| {
                add(chunk
                    .iter()
                    .fold(0u64, |acc, i| acc.wrapping_add(visit(i))));
            })?
        }
        Mode::Static => dispatcher.for_each_index_static(config.count, |i| add(visit(i)))?,
        Mode::Affinity => {
            dispatcher.for_each_index_affinity(config.count, |i| add(visit(i)), state)?
        }
    }

    Ok(total.into_inner())
}

/// `sum(i^2) for i in [0, n)` modulo 2^64.
pub fn expected_sum_of_squares(count: u64) -> u64 {
    let n = u128::from(count);
    if n == 0 {
        return 0;
    }
    // Divide n(n-1)(2n-1) by 6 before multiplying; the product is then exact mod 2^64.
    let (mut a, mut b, mut c) = (n, n - 1, 2 * n - 1);
    for divisor in [2u128, 3] {
        if a % divisor == 0 {
            a /= divisor;
        } else if b % divisor == 0 {
            b /= divisor;
        } else {
            c /= divisor;
        }
    }
    let wrap = |x: u128| x as u64;
    wrap(a).wrapping_mul(wrap(b)).wrapping_mul(wrap(c))
}
