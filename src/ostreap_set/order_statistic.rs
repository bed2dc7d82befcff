use core::borrow::Borrow;
use core::ops::{Bound, Index, RangeBounds};

use smallvec::SmallVec;

use super::OSTreapSet;
use crate::Rank;
use crate::raw::Handle;

impl<T, R> OSTreapSet<T, R> {
    /// Returns the value at position `rank` in sorted order.
    ///
    /// This is an order-statistic extension and is not part of the standard
    /// `BTreeSet` API.
    ///
    /// The rank is zero-based. Returns `None` if `rank` is out of bounds.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([10, 20, 30]);
    /// assert_eq!(set.get_by_rank(1), Some(&20));
    /// assert!(set.get_by_rank(3).is_none());
    /// ```
    #[must_use]
    pub fn get_by_rank(&self, rank: usize) -> Option<&T> {
        self.raw.nth(rank).map(|handle| &self.raw.node(handle).key)
    }

    /// Returns the zero-based rank of the first element equal to `value`, or
    /// `None` if no element is equal to it.
    ///
    /// This is an order-statistic extension and is not part of the standard
    /// `BTreeSet` API.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([10, 20]);
    ///
    /// assert_eq!(set.rank_of(&20), Some(1));
    /// assert_eq!(set.rank_of(&15), None);
    /// ```
    #[must_use]
    pub fn rank_of<Q>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.find(value).map(|handle| self.raw.rank_of_handle(handle))
    }

    /// Removes and returns the value at position `rank` in sorted order, or
    /// `None` if `rank` is out of bounds.
    ///
    /// This is an order-statistic extension and is not part of the standard
    /// `BTreeSet` API.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set = OSTreapSet::from([10, 20, 30]);
    ///
    /// assert_eq!(set.remove_by_rank(1), Some(20));
    /// assert_eq!(set.remove_by_rank(2), None);
    /// assert!(set.iter().eq([10, 30].iter()));
    /// ```
    pub fn remove_by_rank(&mut self, rank: usize) -> Option<T> {
        self.raw.nth(rank).map(|handle| self.raw.erase(handle))
    }

    /// Removes every element whose rank falls in the given range, returning
    /// how many were removed. Ranks past the end of the set are clamped.
    ///
    /// This is an order-statistic extension and is not part of the standard
    /// `BTreeSet` API.
    ///
    /// # Panics
    ///
    /// Panics if the range's start is greater than its end.
    ///
    /// # Complexity
    ///
    /// O(k log n) for k removed elements
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set = OSTreapSet::from([1, 3, 5, 7, 9]);
    ///
    /// assert_eq!(set.remove_rank_range(1..3), 2);
    /// assert!(set.iter().eq([1, 7, 9].iter()));
    ///
    /// assert_eq!(set.remove_rank_range(1..), 2);
    /// assert!(set.iter().eq([1].iter()));
    /// ```
    pub fn remove_rank_range<B>(&mut self, range: B) -> usize
    where
        B: RangeBounds<usize>,
    {
        let start = match range.start_bound() {
            Bound::Unbounded => 0,
            Bound::Included(&rank) => rank,
            Bound::Excluded(&rank) => rank + 1,
        };
        let end = match range.end_bound() {
            Bound::Unbounded => self.len(),
            Bound::Included(&rank) => rank + 1,
            Bound::Excluded(&rank) => rank,
        };
        assert!(start <= end, "rank range start is greater than rank range end");

        let end = end.min(self.len());
        if start >= end {
            return 0;
        }

        // Collect first, erase second: the erases relink nodes but leave
        // every collected handle alive until its own turn.
        let mut doomed: SmallVec<[Handle; 16]> = SmallVec::new();
        let mut cur = self.raw.nth(start);
        for _ in start..end {
            let handle = cur.expect("rank range ended before its clamped end");
            doomed.push(handle);
            cur = self.raw.successor(handle);
        }

        let removed = doomed.len();
        for handle in doomed {
            self.raw.erase(handle);
        }
        removed
    }
}

/// Indexes into the set by rank.
///
/// # Panics
///
/// Panics if `rank` is out of bounds.
///
/// # Examples
///
/// ```
/// use ostreap::OSTreapSet;
/// use ostreap::Rank;
///
/// let set = OSTreapSet::from([10, 20, 30]);
/// assert_eq!(set[Rank(1)], 20);
/// ```
impl<T, R> Index<Rank> for OSTreapSet<T, R> {
    type Output = T;

    fn index(&self, rank: Rank) -> &Self::Output {
        self.get_by_rank(rank.0).expect("rank out of bounds")
    }
}
