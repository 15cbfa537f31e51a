use crate::{Index, Range};

/// Number of blocks scheduled per execution context when more than one is
/// available. The slack lets the substrate rebalance chunks of uneven cost.
pub const OVERSUBSCRIPTION: usize = 4;

/// Block sizes are rounded up to a multiple of this value so that the
/// remainder of vectorizable per-element work stays regular.
pub const BLOCK_ALIGNMENT: usize = 4;

/// The chunk boundaries computed for one dispatch.
///
/// A plan tiles `[first, last)` with `len()` contiguous, non-overlapping
/// chunks of `block_size()` elements; only the last chunk may be shorter.
/// Plans are stateless and deterministic: identical inputs always produce
/// identical boundaries.
///
/// # Example
///
/// ```
/// use parfor::{PartitionPlan, Range};
///
/// // Four contexts ask for 16 blocks of 7, but the minimum step of 8 wins.
/// let plan = PartitionPlan::new(0u32, 100, 8, 4);
/// assert_eq!(plan.block_size(), 8);
/// assert_eq!(plan.len(), 13);
/// assert_eq!(plan.chunk(12), Range::new(96, 100));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartitionPlan<I: Index> {
    first: I,
    length: usize,
    block_size: usize,
    num_chunks: usize,
}

impl<I: Index> PartitionPlan<I> {
    /// Partitions `[first, last)` into load-balanced chunks.
    ///
    /// The baseline block count is `OVERSUBSCRIPTION * parallelism` when more
    /// than one execution context is available, otherwise a single block.
    /// Each block holds at least `min_step_size` elements and is rounded up
    /// to a multiple of [`BLOCK_ALIGNMENT`], capped at the range length so
    /// any `min_step_size >= length` (up to `usize::MAX`) gives one chunk. A
    /// `parallelism` of zero is treated as one.
    ///
    /// # Panics
    ///
    /// Panics if `first > last` or `min_step_size == 0`.
    pub fn new(first: I, last: I, min_step_size: usize, parallelism: usize) -> Self {
        assert!(first <= last, "invalid range: first {first} > last {last}");
        assert!(min_step_size >= 1, "min_step_size must be at least 1");

        let length = first.distance(last);
        if length == 0 {
            return Self::empty(first);
        }

        let baseline = if parallelism > 1 {
            parallelism.saturating_mul(OVERSUBSCRIPTION)
        } else {
            1
        };
        let by_contexts = length.div_ceil(baseline);
        // A block of `length` already yields a single chunk, so capping there
        // keeps huge minimum steps from overflowing the alignment.
        let block_size = align_up(min_step_size.max(by_contexts).min(length), length);

        Self {
            first,
            length,
            block_size,
            num_chunks: length.div_ceil(block_size),
        }
    }

    /// Partitions `[first, last)` into one contiguous chunk per execution
    /// context, for substrates that bind chunk `k` to context `k`.
    ///
    /// No oversubscription or alignment is applied; when there are fewer
    /// elements than contexts every chunk holds a single element.
    ///
    /// # Panics
    ///
    /// Panics if `first > last`.
    pub fn fixed(first: I, last: I, contexts: usize) -> Self {
        assert!(first <= last, "invalid range: first {first} > last {last}");

        let length = first.distance(last);
        if length == 0 {
            return Self::empty(first);
        }

        let block_size = length.div_ceil(contexts.max(1));
        Self {
            first,
            length,
            block_size,
            num_chunks: length.div_ceil(block_size),
        }
    }

    const fn empty(first: I) -> Self {
        Self {
            first,
            length: 0,
            block_size: 0,
            num_chunks: 0,
        }
    }

    /// Number of chunks in the plan.
    #[inline]
    pub const fn len(&self) -> usize {
        self.num_chunks
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.num_chunks == 0
    }

    /// Elements per chunk (the last chunk may hold fewer).
    #[inline]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Total number of elements covered by the plan.
    #[inline]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Returns the `k`-th chunk.
    ///
    /// # Panics
    ///
    /// Panics if `k >= self.len()`.
    #[inline]
    pub fn chunk(&self, k: usize) -> Range<I> {
        assert!(k < self.num_chunks, "chunk {k} out of {}", self.num_chunks);
        let start = k * self.block_size;
        let end = start + self.block_size.min(self.length - start);
        Range::new(self.first.offset(start), self.first.offset(end))
    }

    /// Iterates all chunks in ascending order.
    pub fn chunks(&self) -> impl ExactSizeIterator<Item = Range<I>> + '_ {
        (0..self.num_chunks).map(|k| self.chunk(k))
    }
}

/// Rounds `n` up to a multiple of [`BLOCK_ALIGNMENT`], never past `length`.
#[inline]
const fn align_up(n: usize, length: usize) -> usize {
    match n.checked_next_multiple_of(BLOCK_ALIGNMENT) {
        Some(aligned) if aligned < length => aligned,
        _ => length,
    }
}
