/// Environment variable that overrides the detected parallelism.
pub const NUM_THREADS_ENV: &str = "PARFOR_NUM_THREADS";

/// Returns the number of execution contexts to size parallel work for.
///
/// Reads [`NUM_THREADS_ENV`] when it holds a positive integer and falls back
/// to the logical CPU count otherwise. Never returns zero.
///
/// This is only a hint for partitioning and for sizing
/// [`crate::ThreadScheduler`]; nothing is allocated from it.
pub fn available_parallelism() -> usize {
    parse_override(std::env::var(NUM_THREADS_ENV).ok().as_deref())
        .unwrap_or_else(num_cpus::get)
        .max(1)
}

fn parse_override(raw: Option<&str>) -> Option<usize> {
    raw?.trim().parse::<usize>().ok().filter(|&n| n > 0)
}
