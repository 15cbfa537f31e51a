use std::sync::Arc;

/// How the units of one submission should be placed onto execution contexts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Placement {
    /// Units may run on any context; the substrate balances the load.
    #[default]
    Dynamic,
    /// Unit `k` is bound to execution context `k % parallelism()` and is never
    /// migrated. Only requested when [`Capabilities::static_partition`] is
    /// advertised.
    Static,
}

/// Optional features a [`Scheduler`] may advertise.
///
/// Both capabilities are hints: a substrate without them still has to honour
/// every guarantee of [`Scheduler::submit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Capabilities {
    /// The substrate honours [`Placement::Static`].
    pub static_partition: bool,
    /// Repeated static submissions of the same shape land on the same
    /// execution contexts, so an [`crate::AffinityState`] is worth keeping.
    pub affinity: bool,
}

impl Capabilities {
    /// No optional capabilities.
    pub const NONE: Self = Self {
        static_partition: false,
        affinity: false,
    };
}

/// A scheduling substrate that executes units of work, possibly in parallel.
///
/// This is the only seam between the dispatch façade and the concurrency
/// engine, so swapping substrates never changes caller-visible behaviour.
///
/// # Contract
///
/// - [`Scheduler::submit`] runs `task(k)` exactly once for every `k` in
///   `0..units` and returns only after every one of those calls has returned.
/// - Calls may run concurrently with each other and in any order.
/// - `task` never unwinds; failures are captured by the caller's
///   [`crate::TaskGroup`] before they reach the substrate.
/// - Submission must be reentrant: a running unit may itself call `submit` on
///   the same scheduler without deadlocking.
pub trait Scheduler {
    /// Number of execution contexts available to one submission. Used only to
    /// size partition plans, never to allocate resources.
    fn parallelism(&self) -> usize;

    /// Optional capabilities of this substrate.
    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    /// Runs `task` for every unit in `0..units` and blocks until all of them
    /// have finished.
    fn submit(&self, units: usize, placement: Placement, task: &(dyn Fn(usize) + Sync));
}

impl<S: Scheduler + ?Sized> Scheduler for &S {
    fn parallelism(&self) -> usize {
        (**self).parallelism()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn submit(&self, units: usize, placement: Placement, task: &(dyn Fn(usize) + Sync)) {
        (**self).submit(units, placement, task);
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Box<S> {
    fn parallelism(&self) -> usize {
        (**self).parallelism()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn submit(&self, units: usize, placement: Placement, task: &(dyn Fn(usize) + Sync)) {
        (**self).submit(units, placement, task);
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn parallelism(&self) -> usize {
        (**self).parallelism()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn submit(&self, units: usize, placement: Placement, task: &(dyn Fn(usize) + Sync)) {
        (**self).submit(units, placement, task);
    }
}
