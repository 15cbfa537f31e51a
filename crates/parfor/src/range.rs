use crate::Index;
use core::fmt;

/// An immutable half-open interval `[begin, end)` of indices.
///
/// Every chunk handed to a worker by [`crate::Dispatcher::for_each_range`] is
/// a `Range`. The worker is responsible for iterating its interior, either
/// with [`Range::iter`] or by converting it into a [`core::ops::Range`].
///
/// # Example
///
/// ```
/// use parfor::Range;
///
/// let r = Range::new(2u32, 6);
/// assert_eq!(r.size(), 4);
/// assert_eq!(r.iter().collect::<Vec<_>>(), [2, 3, 4, 5]);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range<I: Index> {
    begin: I,
    end: I,
}

impl<I: Index> Range<I> {
    /// Creates the interval `[begin, end)`.
    ///
    /// # Panics
    ///
    /// Panics if `begin > end`.
    #[inline]
    pub fn new(begin: I, end: I) -> Self {
        assert!(begin <= end, "invalid range: begin {begin} > end {end}");
        Self { begin, end }
    }

    /// The first index in the interval.
    #[inline]
    pub const fn begin(&self) -> I {
        self.begin
    }

    /// One past the last index in the interval.
    #[inline]
    pub const fn end(&self) -> I {
        self.end
    }

    /// Number of indices in the interval.
    #[inline]
    pub fn size(&self) -> usize {
        self.begin.distance(self.end)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Iterates the indices of the interval in ascending order.
    #[inline]
    pub fn iter(&self) -> RangeIter<I> {
        RangeIter {
            next: self.begin,
            end: self.end,
        }
    }
}

impl<I: Index> fmt::Debug for Range<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, {:?})", self.begin, self.end)
    }
}

impl<I: Index> fmt::Display for Range<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

impl<I: Index> From<Range<I>> for core::ops::Range<I> {
    fn from(r: Range<I>) -> Self {
        r.begin..r.end
    }
}

impl<I: Index> IntoIterator for Range<I> {
    type Item = I;
    type IntoIter = RangeIter<I>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<I: Index> IntoIterator for &Range<I> {
    type Item = I;
    type IntoIter = RangeIter<I>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over the indices of a [`Range`].
#[derive(Clone, Debug)]
pub struct RangeIter<I: Index> {
    next: I,
    end: I,
}

impl<I: Index> Iterator for RangeIter<I> {
    type Item = I;

    #[inline]
    fn next(&mut self) -> Option<I> {
        if self.next < self.end {
            let i = self.next;
            self.next = i.step();
            Some(i)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = if self.next < self.end {
            self.next.distance(self.end)
        } else {
            0
        };
        (n, Some(n))
    }
}

impl<I: Index> ExactSizeIterator for RangeIter<I> {}

impl<I: Index> core::iter::FusedIterator for RangeIter<I> {}
