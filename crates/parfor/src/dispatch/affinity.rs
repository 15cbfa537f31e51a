/// A reusable, caller-owned locality hint for
/// [`crate::Dispatcher::for_each_index_affinity`].
///
/// On a substrate that advertises [`crate::Capabilities::affinity`], the first
/// dispatch through a state records the layout it used (element count and
/// number of execution contexts). Later dispatches of the same length replay
/// that layout, so chunk `k` keeps landing on execution context `k` and can
/// reuse whatever that context left in its caches.
///
/// On substrates without the capability the state is never touched, and an
/// empty state is always a valid argument.
///
/// # Example
///
/// ```
/// use parfor::{AffinityState, Dispatcher, Sequential};
///
/// let dispatcher = Dispatcher::new(Sequential);
/// let mut state = AffinityState::new();
/// for _ in 0..3 {
///     dispatcher.for_each_index_affinity(64u32, |_| {}, &mut state).unwrap();
/// }
/// // `Sequential` has no affinity capability.
/// assert!(state.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AffinityState {
    layout: Option<Layout>,
    replays: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Layout {
    length: usize,
    contexts: usize,
}

impl AffinityState {
    pub const fn new() -> Self {
        Self {
            layout: None,
            replays: 0,
        }
    }

    /// Returns `true` if no layout has been recorded yet.
    pub const fn is_empty(&self) -> bool {
        self.layout.is_none()
    }

    /// Number of dispatches that reused the recorded layout.
    pub const fn replays(&self) -> u64 {
        self.replays
    }

    /// Number of execution contexts of the recorded layout, if any.
    pub fn contexts(&self) -> Option<usize> {
        self.layout.map(|layout| layout.contexts)
    }

    /// Forgets the recorded layout.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Returns the number of contexts to partition `length` elements over,
    /// recording `parallelism` if the length has not been seen before.
    pub(crate) fn contexts_for(&mut self, length: usize, parallelism: usize) -> usize {
        match self.layout {
            Some(layout) if layout.length == length => {
                self.replays += 1;
                layout.contexts
            }
            _ => {
                let contexts = parallelism.max(1);
                self.layout = Some(Layout { length, contexts });
                self.replays = 0;
                contexts
            }
        }
    }
}
