use crate::{
    AffinityState, CancelToken, DefaultScheduler, Error, Index, PartitionPlan, Placement, Range,
    Result, Scheduler, TaskGroup,
};
use core::convert::Infallible;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// The synchronous entry points for parallel loops over a [`Scheduler`].
///
/// Every method partitions its interval with [`PartitionPlan`], submits one
/// unit of work per chunk and blocks until all of them have stopped. The
/// outcome is all or nothing:
///
/// - `Ok(())`: every index (or chunk) was visited exactly once. This is also
///   the result for an empty interval, which never reaches the scheduler.
/// - `Err(Error::Cancelled { .. })`: a worker panicked or failed, or the
///   attached [`CancelToken`] fired. Reported once, after the last running
///   unit has returned. Units that had not started yet were skipped.
///
/// No ordering is guaranteed between indices or chunks, and the worker may
/// run on several threads at once, hence the `Sync` bound.
///
/// # Example
///
/// ```
/// use parfor::{Dispatcher, Sequential};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let dispatcher = Dispatcher::new(Sequential);
/// let visits = AtomicUsize::new(0);
/// dispatcher
///     .for_each_index(100u32, |_| {
///         visits.fetch_add(1, Ordering::Relaxed);
///     })
///     .unwrap();
/// assert_eq!(visits.into_inner(), 100);
///
/// let err = dispatcher
///     .for_each_index(100u32, |i| assert!(i < 50, "index {i} out of budget"))
///     .unwrap_err();
/// assert!(err.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Dispatcher<S = DefaultScheduler> {
    scheduler: S,
    token: Option<CancelToken>,
}

impl<S: Scheduler> Dispatcher<S> {
    /// Creates a dispatcher over `scheduler`.
    pub const fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            token: None,
        }
    }

    /// Attaches a [`CancelToken`] observed by every subsequent dispatch.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.token = Some(token);
        self
    }

    pub const fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub const fn cancel_token(&self) -> Option<&CancelToken> {
        self.token.as_ref()
    }

    /// Calls `f(i)` exactly once for every `i` in `[0, count)`.
    ///
    /// Adjacent indices are batched into chunks internally; the batching is
    /// invisible to `f`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `f` panicked or the token fired.
    ///
    /// # Panics
    ///
    /// Panics if `count` is negative.
    pub fn for_each_index<I, F>(&self, count: I, f: F) -> Result<()>
    where
        I: Index,
        F: Fn(I) + Sync,
    {
        self.try_for_each_index(count, |i| {
            f(i);
            Ok(())
        })
    }

    /// Fallible form of [`Self::for_each_index`].
    ///
    /// The first `Err` returned by `f` cancels the dispatch and is carried in
    /// [`Error::Cancelled`] as [`crate::WorkerFailure::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `f` failed or panicked, or the token
    /// fired.
    pub fn try_for_each_index<I, E, F>(&self, count: I, f: F) -> Result<(), Error<E>>
    where
        I: Index,
        E: Send,
        F: Fn(I) -> core::result::Result<(), E> + Sync,
    {
        let plan = PartitionPlan::new(I::ZERO, count, 1, self.scheduler.parallelism());
        self.dispatch(&plan, Placement::Dynamic, |chunk| chunk.iter().try_for_each(&f))
    }

    /// Calls `f` exactly once for every chunk of `[first, last)`, with chunks
    /// of at least one element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `f` panicked or the token fired.
    ///
    /// # Panics
    ///
    /// Panics if `first > last`.
    pub fn for_each_range<I, F>(&self, first: I, last: I, f: F) -> Result<()>
    where
        I: Index,
        F: Fn(Range<I>) + Sync,
    {
        self.for_each_range_with_step(first, last, 1, f)
    }

    /// Calls `f` exactly once for every chunk of `[first, last)`.
    ///
    /// Every chunk but possibly the last holds at least `min_step_size`
    /// elements; see [`PartitionPlan::new`] for the exact sizing. `f` is
    /// responsible for iterating the chunk's interior.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `f` panicked or the token fired.
    ///
    /// # Panics
    ///
    /// Panics if `first > last` or `min_step_size == 0`.
    pub fn for_each_range_with_step<I, F>(
        &self,
        first: I,
        last: I,
        min_step_size: usize,
        f: F,
    ) -> Result<()>
    where
        I: Index,
        F: Fn(Range<I>) + Sync,
    {
        self.try_for_each_range_with_step(first, last, min_step_size, |chunk| {
            f(chunk);
            Ok(())
        })
    }

    /// Fallible form of [`Self::for_each_range_with_step`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `f` failed or panicked, or the token
    /// fired.
    pub fn try_for_each_range_with_step<I, E, F>(
        &self,
        first: I,
        last: I,
        min_step_size: usize,
        f: F,
    ) -> Result<(), Error<E>>
    where
        I: Index,
        E: Send,
        F: Fn(Range<I>) -> core::result::Result<(), E> + Sync,
    {
        let plan = PartitionPlan::new(first, last, min_step_size, self.scheduler.parallelism());
        self.dispatch(&plan, Placement::Dynamic, f)
    }

    /// Like [`Self::for_each_index`], but requests one chunk per execution
    /// context with a fixed chunk-to-context assignment and no load
    /// balancing. This trims scheduling overhead for uniform-cost work.
    ///
    /// Identical to [`Self::for_each_index`] when the scheduler does not
    /// advertise [`crate::Capabilities::static_partition`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `f` panicked or the token fired.
    pub fn for_each_index_static<I, F>(&self, count: I, f: F) -> Result<()>
    where
        I: Index,
        F: Fn(I) + Sync,
    {
        if !self.scheduler.capabilities().static_partition {
            return self.for_each_index(count, f);
        }
        let plan = PartitionPlan::fixed(I::ZERO, count, self.scheduler.parallelism());
        self.dispatch(&plan, Placement::Static, per_index(&f))
    }

    /// Like [`Self::for_each_index_static`], but keeps the chunk-to-context
    /// layout recorded in `state` stable across calls for cache locality.
    ///
    /// Identical to [`Self::for_each_index`] when the scheduler does not
    /// advertise [`crate::Capabilities::affinity`]; `state` is then left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `f` panicked or the token fired.
    pub fn for_each_index_affinity<I, F>(
        &self,
        count: I,
        f: F,
        state: &mut AffinityState,
    ) -> Result<()>
    where
        I: Index,
        F: Fn(I) + Sync,
    {
        let caps = self.scheduler.capabilities();
        if !(caps.affinity && caps.static_partition) {
            return self.for_each_index(count, f);
        }
        assert!(I::ZERO <= count, "invalid count: {count} is negative");
        let length = I::ZERO.distance(count);
        if length == 0 {
            return Ok(());
        }
        let contexts = state.contexts_for(length, self.scheduler.parallelism());
        let plan = PartitionPlan::fixed(I::ZERO, count, contexts);
        self.dispatch(&plan, Placement::Static, per_index(&f))
    }

    /// Idle -> Partitioning (done by the caller) -> Dispatched ->
    /// AllCompleted | Cancelled.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "trace",
            skip_all,
            fields(chunks = plan.len(), block_size = plan.block_size(), ?placement)
        )
    )]
    fn dispatch<I, E, F>(
        &self,
        plan: &PartitionPlan<I>,
        placement: Placement,
        f: F,
    ) -> Result<(), Error<E>>
    where
        I: Index,
        E: Send,
        F: Fn(Range<I>) -> core::result::Result<(), E> + Sync,
    {
        if plan.is_empty() {
            return Ok(());
        }

        let group = TaskGroup::new(self.token.as_ref());
        self.scheduler
            .submit(plan.len(), placement, &|k| group.run(|| f(plan.chunk(k))));

        let result = group.wait().into_result();
        #[cfg(feature = "tracing")]
        match &result {
            Ok(()) => tracing::trace!("all {} chunks completed", plan.len()),
            Err(_) => tracing::debug!("dispatch of {} chunks cancelled", plan.len()),
        }
        result
    }
}

fn per_index<I, F>(f: &F) -> impl Fn(Range<I>) -> core::result::Result<(), Infallible> + Sync + '_
where
    I: Index,
    F: Fn(I) + Sync,
{
    move |chunk| {
        chunk.iter().for_each(f);
        Ok(())
    }
}

/// [`Dispatcher::for_each_index`] on the [`DefaultScheduler`].
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if `f` panicked.
pub fn for_each_index<I, F>(count: I, f: F) -> Result<()>
where
    I: Index,
    F: Fn(I) + Sync,
{
    Dispatcher::<DefaultScheduler>::default().for_each_index(count, f)
}

/// [`Dispatcher::for_each_range`] on the [`DefaultScheduler`].
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if `f` panicked.
pub fn for_each_range<I, F>(first: I, last: I, f: F) -> Result<()>
where
    I: Index,
    F: Fn(Range<I>) + Sync,
{
    Dispatcher::<DefaultScheduler>::default().for_each_range(first, last, f)
}

/// [`Dispatcher::for_each_range_with_step`] on the [`DefaultScheduler`].
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if `f` panicked.
pub fn for_each_range_with_step<I, F>(first: I, last: I, min_step_size: usize, f: F) -> Result<()>
where
    I: Index,
    F: Fn(Range<I>) + Sync,
{
    Dispatcher::<DefaultScheduler>::default().for_each_range_with_step(first, last, min_step_size, f)
}

/// [`Dispatcher::for_each_index_static`] on the [`DefaultScheduler`].
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if `f` panicked.
pub fn for_each_index_static<I, F>(count: I, f: F) -> Result<()>
where
    I: Index,
    F: Fn(I) + Sync,
{
    Dispatcher::<DefaultScheduler>::default().for_each_index_static(count, f)
}

/// [`Dispatcher::for_each_index_affinity`] on the [`DefaultScheduler`].
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if `f` panicked.
pub fn for_each_index_affinity<I, F>(count: I, f: F, state: &mut AffinityState) -> Result<()>
where
    I: Index,
    F: Fn(I) + Sync,
{
    Dispatcher::<DefaultScheduler>::default().for_each_index_affinity(count, f, state)
}
