use core::fmt;
use core::hash::Hash;

/// A trait for the integer positions a parallel loop iterates over.
///
/// Types implementing `Index` must be totally ordered and support the three
/// operations the partitioner needs: measuring the element count between two
/// positions, advancing a position by an element count, and stepping by one.
///
/// Implemented for every primitive integer up to 64 bits wide.
pub trait Index: Copy + fmt::Debug + fmt::Display + Ord + Hash + Send + Sync + 'static {
    /// Zero value (the implicit start of `for_each_index`)
    const ZERO: Self;

    /// One value (the smallest step)
    const ONE: Self;

    /// Number of elements in `[self, end)`.
    ///
    /// Callers guarantee `self <= end` and that the count fits in a `usize`.
    fn distance(self, end: Self) -> usize;

    /// Returns `self + n`.
    ///
    /// Callers guarantee the result is representable.
    fn offset(self, n: usize) -> Self;

    /// Returns `self + 1`.
    #[inline]
    fn step(self) -> Self {
        self.offset(1)
    }
}

macro_rules! impl_index {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Index for $ty {
                const ZERO: Self = 0;
                const ONE: Self = 1;

                #[inline]
                fn distance(self, end: Self) -> usize {
                    debug_assert!(self <= end, "distance from {self} to {end} is negative");
                    end.abs_diff(self) as usize
                }

                #[inline]
                fn offset(self, n: usize) -> Self {
                    // i128 holds every `u64`/`i64` value plus any `usize`
                    // offset, so the sum never wraps before the narrowing.
                    let raw = self as i128 + n as i128;
                    debug_assert!(
                        raw <= <$ty>::MAX as i128,
                        "offset {n} from {self} overflows {}",
                        stringify!($ty)
                    );
                    raw as $ty
                }

                #[inline]
                fn step(self) -> Self {
                    self + 1
                }
            }
        )*
    };
}

impl_index!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_counts_elements() {
        assert_eq!(3u32.distance(10), 7);
        assert_eq!((-5i32).distance(5), 10);
        assert_eq!(i8::MIN.distance(i8::MAX), 255);
        assert_eq!(7usize.distance(7), 0);
    }

    #[test]
    fn offset_spans_the_signed_range() {
        assert_eq!(i8::MIN.offset(255), i8::MAX);
        assert_eq!((-3i64).offset(5), 2);
        assert_eq!(u64::MAX.offset(0), u64::MAX);
        assert_eq!(10u16.step(), 11);
    }
}
