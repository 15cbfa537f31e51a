use crate::{Error, WorkerFailure};
use core::convert::Infallible;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

/// A handle for requesting cancellation of in-flight dispatches from outside.
///
/// Attach a token with [`crate::Dispatcher::with_cancel_token`]. Once
/// [`CancelToken::cancel`] is called, units of work that have not started yet
/// are skipped and the dispatch reports [`Error::Cancelled`] with no failure.
/// Units that are already running are not interrupted.
///
/// Tokens are cheap to clone; all clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every dispatch observing this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Clears a previous request so the token can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// The outcome of waiting on a [`TaskGroup`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion<E = Infallible> {
    /// Every unit ran to completion.
    Completed,
    /// At least one unit failed, or the group's token fired. Holds the first
    /// worker failure, if there was one.
    Cancelled(Option<WorkerFailure<E>>),
}

impl<E> Completion<E> {
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Converts the outcome into the crate's error convention.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] for [`Completion::Cancelled`].
    pub fn into_result(self) -> Result<(), Error<E>> {
        match self {
            Self::Completed => Ok(()),
            Self::Cancelled(failure) => Err(Error::Cancelled { failure }),
        }
    }
}

/// Per-dispatch bookkeeping shared by every unit of one submission.
///
/// The façade creates a group, wraps each unit in [`TaskGroup::run`], hands
/// the units to a [`crate::Scheduler`] and calls [`TaskGroup::wait`] once the
/// submission has returned. The group catches panics and errors raised by the
/// units, keeps the first one, and skips every unit that has not started yet
/// once a failure or an external cancellation has been observed.
///
/// A group is scoped to a single submission, so concurrent or nested
/// dispatches never observe each other's cancellation.
#[derive(Debug)]
pub struct TaskGroup<'t, E = Infallible> {
    cancelled: AtomicBool,
    failure: Mutex<Option<WorkerFailure<E>>>,
    token: Option<&'t CancelToken>,
}

impl<'t, E> TaskGroup<'t, E> {
    /// Creates a group, optionally observing an external [`CancelToken`].
    pub const fn new(token: Option<&'t CancelToken>) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            failure: Mutex::new(None),
            token,
        }
    }

    /// Returns `true` once any unit has failed or the external token fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire) || self.token.is_some_and(CancelToken::is_cancelled)
    }

    /// Cancels the group without recording a failure.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Runs one unit of work unless the group is already cancelled.
    ///
    /// A panic or `Err` raised by `f` is recorded (first one wins) and
    /// cancels the group. This method never unwinds.
    pub fn run<F>(&self, f: F)
    where
        F: FnOnce() -> Result<(), E>,
    {
        if self.is_cancelled() {
            return;
        }
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.fail(WorkerFailure::Failed(e)),
            Err(payload) => self.fail(WorkerFailure::from_panic(payload.as_ref())),
        }
    }

    fn fail(&self, failure: WorkerFailure<E>) {
        {
            let mut slot = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                #[cfg(feature = "tracing")]
                tracing::debug!(kind = failure_kind(&failure), "first worker failure, cancelling group");
                *slot = Some(failure);
            }
        }
        self.cancelled.store(true, Ordering::Release);
    }

    /// Consumes the group and reports how the submission ended.
    ///
    /// Must only be called after the scheduler's `submit` has returned, at
    /// which point no unit of the group is running anymore.
    pub fn wait(self) -> Completion<E> {
        let token_fired = self.token.is_some_and(CancelToken::is_cancelled);
        let cancelled = self.cancelled.into_inner();
        let failure = self
            .failure
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);

        if cancelled || token_fired || failure.is_some() {
            Completion::Cancelled(failure)
        } else {
            Completion::Completed
        }
    }
}

#[cfg(feature = "tracing")]
const fn failure_kind<E>(failure: &WorkerFailure<E>) -> &'static str {
    match failure {
        WorkerFailure::Panicked { .. } => "panic",
        WorkerFailure::Failed(_) => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn completes_when_every_unit_succeeds() {
        let group = TaskGroup::<Infallible>::new(None);
        let ran = AtomicUsize::new(0);
        for _ in 0..4 {
            group.run(|| {
                ran.fetch_add(1, Ordering::Relaxed);
                Ok(())
            });
        }
        assert_eq!(ran.into_inner(), 4);
        assert!(group.wait().is_completed());
    }

    #[test]
    fn explicit_cancel_skips_pending_units() {
        let group = TaskGroup::<Infallible>::new(None);
        group.cancel();
        assert!(group.is_cancelled());

        let ran = AtomicUsize::new(0);
        group.run(|| {
            ran.fetch_add(1, Ordering::Relaxed);
            Ok(())
        });

        assert_eq!(ran.into_inner(), 0);
        let completion = group.wait();
        assert!(!completion.is_completed());
        assert_eq!(completion, Completion::Cancelled(None));
    }

    #[test]
    fn first_failure_wins_and_skips_the_rest() {
        let group = TaskGroup::<&str>::new(None);
        let ran = AtomicUsize::new(0);

        group.run(|| Err("first"));
        group.run(|| {
            ran.fetch_add(1, Ordering::Relaxed);
            Err("second")
        });

        assert_eq!(ran.into_inner(), 0);
        assert_eq!(
            group.wait(),
            Completion::Cancelled(Some(WorkerFailure::Failed("first")))
        );
    }

    #[test]
    fn panics_are_captured() {
        let group = TaskGroup::<Infallible>::new(None);
        group.run(|| panic!("unit exploded"));
        match group.wait() {
            Completion::Cancelled(Some(failure)) => {
                assert_eq!(failure.panic_message(), Some("unit exploded"));
            }
            other => panic!("unexpected completion: {other:?}"),
        }
    }

    #[test]
    fn external_token_cancels_without_failure() {
        let token = CancelToken::new();
        let group = TaskGroup::<Infallible>::new(Some(&token));
        group.run(|| Ok(()));
        token.cancel();
        let ran = AtomicUsize::new(0);
        group.run(|| {
            ran.fetch_add(1, Ordering::Relaxed);
            Ok(())
        });

        assert_eq!(ran.into_inner(), 0);
        assert_eq!(group.wait(), Completion::Cancelled(None));

        token.reset();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn completion_maps_onto_error() {
        assert!(Completion::<Infallible>::Completed.into_result().is_ok());
        let err = Completion::<Infallible>::Cancelled(None)
            .into_result()
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
