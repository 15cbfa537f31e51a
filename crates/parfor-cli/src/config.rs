use anyhow::bail;
use clap::{Parser, ValueEnum};

/// Scheduling substrate the workload is dispatched onto.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    /// Runs every chunk on the calling thread.
    Sequential,
    /// Spawns scoped OS threads per dispatch.
    Threads,
    /// Dispatches onto a dedicated rayon pool.
    Rayon,
}

/// Dispatch entry point exercised by the workload.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `for_each_index`: one call per index.
    Index,
    /// `for_each_range_with_step`: one call per chunk.
    Range,
    /// `for_each_index_static`: one chunk per execution context.
    Static,
    /// `for_each_index_affinity`: static layout replayed across repeats.
    Affinity,
}

/// Runtime configuration for the `parfor` binary.
///
/// Every flag can also be supplied through the environment (or a `.env`
/// file in the working directory).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "parfor",
    version,
    about = "Runs a sum-of-squares workload through parallel range dispatch"
)]
pub struct CliArgs {
    /// Scheduling substrate.
    ///
    /// Environment variable: `PARFOR_SCHEDULER`
    #[arg(long, env = "PARFOR_SCHEDULER", value_enum, default_value_t = SchedulerKind::Rayon)]
    pub scheduler: SchedulerKind,

    /// Number of worker threads for the `threads` and `rayon` schedulers.
    ///
    /// Defaults to the detected parallelism. Ignored by `sequential`.
    ///
    /// Environment variable: `PARFOR_NUM_THREADS`
    #[arg(long, env = "PARFOR_NUM_THREADS")]
    pub threads: Option<usize>,

    /// Number of indices to visit, starting at zero.
    ///
    /// Environment variable: `PARFOR_COUNT`
    #[arg(long, env = "PARFOR_COUNT", default_value_t = 10_000_000)]
    pub count: u64,

    /// Minimum chunk size for the `range` mode.
    ///
    /// Environment variable: `PARFOR_MIN_STEP`
    #[arg(long, env = "PARFOR_MIN_STEP", default_value_t = 1)]
    pub min_step: usize,

    /// Dispatch entry point to exercise.
    ///
    /// Environment variable: `PARFOR_MODE`
    #[arg(long, env = "PARFOR_MODE", value_enum, default_value_t = Mode::Range)]
    pub mode: Mode,

    /// Number of times the workload is run.
    ///
    /// Environment variable: `PARFOR_REPEAT`
    #[arg(long, env = "PARFOR_REPEAT", default_value_t = 5)]
    pub repeat: usize,

    /// Make the worker panic when it reaches this index, cancelling the run.
    ///
    /// Environment variable: `PARFOR_FAIL_AT`
    #[arg(long, env = "PARFOR_FAIL_AT")]
    pub fail_at: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub scheduler: SchedulerKind,
    pub threads: usize,
    pub count: u64,
    pub min_step: usize,
    pub mode: Mode,
    pub repeat: usize,
    pub fail_at: Option<u64>,
}

impl TryFrom<CliArgs> for RunConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.threads == Some(0) {
            bail!("PARFOR_NUM_THREADS must be greater than 0");
        }

        if args.min_step == 0 {
            bail!("PARFOR_MIN_STEP must be greater than 0");
        }

        if args.repeat == 0 {
            bail!("PARFOR_REPEAT must be greater than 0");
        }

        if let Some(fail_at) = args.fail_at.filter(|&i| i >= args.count) {
            bail!(
                "PARFOR_FAIL_AT ({}) is outside of the iterated range [0, {})",
                fail_at,
                args.count
            );
        }

        let threads = match args.scheduler {
            SchedulerKind::Sequential => 1,
            SchedulerKind::Threads | SchedulerKind::Rayon => args
                .threads
                .unwrap_or_else(parfor::available_parallelism),
        };

        Ok(Self {
            scheduler: args.scheduler,
            threads,
            count: args.count,
            min_step: args.min_step,
            mode: args.mode,
            repeat: args.repeat,
            fail_at: args.fail_at,
        })
    }
}
