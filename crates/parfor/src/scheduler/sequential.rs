use crate::{Placement, Scheduler};

/// A scheduler that runs every unit on the calling thread, in order.
///
/// Always available. Useful as a baseline, for debugging worker functions,
/// and on targets without threads. Advertises no optional capabilities, so
/// the static and affinity entry points degrade to plain dynamic dispatch.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sequential;

impl Scheduler for Sequential {
    fn parallelism(&self) -> usize {
        1
    }

    fn submit(&self, units: usize, _placement: Placement, task: &(dyn Fn(usize) + Sync)) {
        (0..units).for_each(task);
    }
}
