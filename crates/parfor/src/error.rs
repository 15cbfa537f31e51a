use core::convert::Infallible;

/// A result type whose error defaults to an infallible [`Error`].
///
/// The plain entry points (`for_each_*`) only ever fail with
/// [`Error::Cancelled`]. The fallible `try_for_each_*` entry points carry the
/// worker's own error type `E` inside the cancellation.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `parfor` can produce.
///
/// The generic parameter `E` is the error type returned by a fallible worker
/// (see [`crate::Dispatcher::try_for_each_index`]). For infallible workers it
/// stays [`Infallible`] and [`WorkerFailure::Failed`] can never be observed.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error<E = Infallible> {
    /// The dispatch did not complete normally.
    ///
    /// Raised at most once per dispatch, and only after every unit of work
    /// submitted by that dispatch has stopped. `failure` holds the first
    /// failure raised by a worker, or `None` when the dispatch was stopped
    /// through a [`crate::CancelToken`].
    #[error("parallel dispatch cancelled")]
    Cancelled {
        /// The first worker failure observed by the dispatch.
        #[source]
        failure: Option<WorkerFailure<E>>,
    },

    /// A scheduling substrate could not be constructed.
    #[error("failed to build scheduler: {reason}")]
    SchedulerBuild {
        /// Human readable description from the underlying substrate.
        reason: String,
    },
}

impl<E> Error<E> {
    /// Returns `true` if this error reports a cancelled dispatch.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns the first worker failure, if the dispatch was cancelled by one.
    pub const fn failure(&self) -> Option<&WorkerFailure<E>> {
        match self {
            Self::Cancelled { failure } => failure.as_ref(),
            Self::SchedulerBuild { .. } => None,
        }
    }

    /// Consumes the error and returns the first worker failure, if any.
    pub fn into_failure(self) -> Option<WorkerFailure<E>> {
        match self {
            Self::Cancelled { failure } => failure,
            Self::SchedulerBuild { .. } => None,
        }
    }
}

/// The failure raised by a single unit of work.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkerFailure<E = Infallible> {
    /// The worker panicked. The panic payload is reduced to its message.
    #[error("worker panicked: {message}")]
    Panicked {
        /// The panic message, or a placeholder for non-string payloads.
        message: String,
    },

    /// A fallible worker returned an error.
    #[error("worker failed: {0:?}")]
    Failed(E),
}

impl<E> WorkerFailure<E> {
    /// Builds a [`WorkerFailure::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: &(dyn core::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            String::from("<non-string panic payload>")
        };
        Self::Panicked { message }
    }

    /// Returns the panic message if the worker panicked.
    pub fn panic_message(&self) -> Option<&str> {
        match self {
            Self::Panicked { message } => Some(message),
            Self::Failed(_) => None,
        }
    }
}
