//! An indexed ordered set built on a treap.

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;
use core::ops::{Bound, RangeBounds};

use smallvec::SmallVec;

use crate::raw::{Handle, RawTreap};
use crate::rng::{PriorityRng, XorShiftRng};

mod cursor;
mod order_statistic;

pub use cursor::{Cursor, CursorMut, NodeRef};

/// An ordered set with O(log n) positional queries.
///
/// `OSTreapSet` stores unique keys in sorted order, like `BTreeSet`, and
/// additionally answers *order-statistic* queries in O(log n): "what is the
/// n-th smallest element?" ([`get_by_rank`](OSTreapSet::get_by_rank)) and
/// "what is this element's sorted position?"
/// ([`rank_of`](OSTreapSet::rank_of)).
///
/// It is a logic error for an item to be modified in such a way that the
/// item's ordering relative to any other item, as determined by the [`Ord`]
/// trait, changes while it is in the set. The behavior resulting from such a
/// logic error is not specified (it could include panics, incorrect results,
/// or non-termination) but is memory-safe.
///
/// Internally the set is a treap: each element is assigned a random priority
/// at insertion, and the tree is kept a max-heap on priorities, which bounds
/// the expected height logarithmically regardless of insertion order. The
/// priorities come from the set's [`PriorityRng`]; the default
/// [`XorShiftRng`] is deterministic, so identical operation sequences produce
/// identical tree shapes.
///
/// An element keeps its storage slot from insertion to removal: tree
/// restructuring relinks nodes but does not move them between slots.
/// [Cursors](OSTreapSet::lower_bound) therefore stay valid across inserts and
/// across removals of *other* elements.
///
/// # Examples
///
/// ```
/// use ostreap::OSTreapSet;
///
/// let mut ladder = OSTreapSet::new();
///
/// // Add some scores.
/// ladder.insert(1400);
/// ladder.insert(2350);
/// ladder.insert(1825);
///
/// // Check for a specific one.
/// assert!(ladder.contains(&1825));
///
/// // How many players are below 2000?
/// assert_eq!(ladder.lower_bound(&2000).rank(), 2);
///
/// // Who is the median player?
/// assert_eq!(ladder.get_by_rank(1), Some(&1825));
///
/// // Remove a score.
/// ladder.remove(&1400);
///
/// // Iterate over everything in order.
/// for score in &ladder {
///     println!("{score}");
/// }
/// ```
///
/// An `OSTreapSet` with a known list of items can be initialized from an
/// array:
///
/// ```
/// use ostreap::OSTreapSet;
///
/// let set = OSTreapSet::from([1, 2, 3]);
/// ```
pub struct OSTreapSet<T, R = XorShiftRng> {
    pub(crate) raw: RawTreap<T>,
    pub(crate) rng: R,
}

/// An iterator over the items of an `OSTreapSet`.
///
/// This `struct` is created by the [`iter`] method on [`OSTreapSet`].
/// See its documentation for more.
///
/// # Examples
///
/// ```
/// use ostreap::OSTreapSet;
///
/// let set = OSTreapSet::from([3, 1, 2]);
/// let mut iter = set.iter();
/// assert_eq!(iter.next(), Some(&1));
/// assert_eq!(iter.next_back(), Some(&3));
/// assert_eq!(iter.next(), Some(&2));
/// ```
///
/// [`iter`]: OSTreapSet::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, T: 'a> {
    raw: &'a RawTreap<T>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

/// An owning iterator over the items of an `OSTreapSet` in ascending order.
///
/// This `struct` is created by the [`into_iter`] method on [`OSTreapSet`]
/// (provided by the [`IntoIterator`] trait). See its documentation for more.
///
/// [`into_iter`]: OSTreapSet#method.into_iter
pub struct IntoIter<T> {
    inner: alloc::vec::IntoIter<T>,
}

/// An iterator over a sub-range of items in an `OSTreapSet`.
///
/// This `struct` is created by the [`range`] method on [`OSTreapSet`].
/// See its documentation for more.
///
/// # Examples
///
/// ```
/// use ostreap::OSTreapSet;
///
/// let set = OSTreapSet::from([1, 2, 3, 4]);
/// let mut range = set.range(2..=3);
/// assert_eq!(range.next(), Some(&2));
/// assert_eq!(range.next_back(), Some(&3));
/// assert_eq!(range.next(), None);
/// ```
///
/// [`range`]: OSTreapSet::range
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, T: 'a> {
    raw: &'a RawTreap<T>,
    // Inclusive span of what is left to yield; both `None` when exhausted.
    front: Option<Handle>,
    back: Option<Handle>,
}

impl<T> OSTreapSet<T> {
    /// Makes a new, empty `OSTreapSet` using the default [`XorShiftRng`]
    /// priority source.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set: OSTreapSet<i32> = OSTreapSet::new();
    /// set.insert(1);
    /// ```
    #[must_use]
    pub const fn new() -> OSTreapSet<T> {
        OSTreapSet {
            raw: RawTreap::new(),
            rng: XorShiftRng::new(),
        }
    }
}

impl<T, R> OSTreapSet<T, R> {
    /// Makes a new, empty `OSTreapSet` drawing priorities from `rng`.
    ///
    /// Any [`PriorityRng`] works; the generator is consulted once per
    /// successful or attempted insert and travels with the set on move and
    /// swap.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::{OSTreapSet, XorShiftRng};
    ///
    /// let mut set = OSTreapSet::with_rng(XorShiftRng::from_seed(42));
    /// set.insert("a");
    /// ```
    #[must_use]
    pub const fn with_rng(rng: R) -> OSTreapSet<T, R> {
        OSTreapSet {
            raw: RawTreap::new(),
            rng,
        }
    }

    /// Returns a copy of this set's contents that draws future priorities
    /// from `rng` instead of a copy of this set's generator.
    ///
    /// Existing elements keep their priorities, so the copy starts with the
    /// exact same tree shape as `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::{OSTreapSet, XorShiftRng};
    ///
    /// let set = OSTreapSet::from([1, 2, 3]);
    /// let copy = set.clone_with_rng(XorShiftRng::from_seed(7));
    /// assert!(set.iter().eq(copy.iter()));
    /// ```
    pub fn clone_with_rng<S>(&self, rng: S) -> OSTreapSet<T, S>
    where
        T: Clone,
    {
        OSTreapSet {
            raw: self.raw.clone(),
            rng,
        }
    }

    /// Returns the number of elements in the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut a = OSTreapSet::new();
    /// assert_eq!(a.len(), 0);
    /// a.insert(1);
    /// assert_eq!(a.len(), 1);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the set contains no elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut a = OSTreapSet::new();
    /// assert!(a.is_empty());
    /// a.insert(1);
    /// assert!(!a.is_empty());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the set, removing all elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut v = OSTreapSet::from([1, 2, 3]);
    /// v.clear();
    /// assert!(v.is_empty());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Gets an iterator that visits the elements in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([3, 1, 2]);
    /// let values: Vec<_> = set.iter().copied().collect();
    /// assert_eq!(values, [1, 2, 3]);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1) to create the iterator; O(log n) amortized per step.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            raw: &self.raw,
            front: self.raw.first(),
            back: self.raw.last(),
            remaining: self.raw.len(),
        }
    }

    /// Returns a reference to the first (smallest) element, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([2, 1, 3]);
    /// assert_eq!(set.first(), Some(&1));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.raw.first().map(|handle| &self.raw.node(handle).key)
    }

    /// Returns a reference to the last (largest) element, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([2, 1, 3]);
    /// assert_eq!(set.last(), Some(&3));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.raw.last().map(|handle| &self.raw.node(handle).key)
    }

    /// Removes and returns the first (smallest) element, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set = OSTreapSet::from([2, 1, 3]);
    /// assert_eq!(set.pop_first(), Some(1));
    /// assert_eq!(set.pop_first(), Some(2));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn pop_first(&mut self) -> Option<T> {
        self.raw.first().map(|handle| self.raw.erase(handle))
    }

    /// Removes and returns the last (largest) element, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set = OSTreapSet::from([2, 1, 3]);
    /// assert_eq!(set.pop_last(), Some(3));
    /// assert_eq!(set.pop_last(), Some(2));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn pop_last(&mut self) -> Option<T> {
        self.raw.last().map(|handle| self.raw.erase(handle))
    }

    /// Returns a read-only view of the tree's root node, if the set is
    /// non-empty.
    ///
    /// Together with [`NodeRef`]'s link accessors this exposes the whole
    /// tree structure (key, priority, subtree count, children and parent of
    /// every node) to tests and external checkers. The view is stable: it
    /// is part of the public API, not a debugging hook.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([1, 2, 3]);
    /// let root = set.root().unwrap();
    /// assert_eq!(root.count(), 3);
    /// assert!(root.parent().is_none());
    /// ```
    #[must_use]
    pub fn root(&self) -> Option<NodeRef<'_, T>> {
        self.raw.root().map(|handle| NodeRef::new(&self.raw, handle))
    }
}

impl<T, R> OSTreapSet<T, R> {
    /// Adds a value to the set.
    ///
    /// Returns whether the value was newly inserted. That is:
    ///
    /// - If the set did not previously contain an equal value, `true` is
    ///   returned.
    /// - If the set already contained an equal value, `false` is returned,
    ///   and the set is not modified: the original value is not replaced,
    ///   and the value passed as argument is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set = OSTreapSet::new();
    ///
    /// assert_eq!(set.insert(2), true);
    /// assert_eq!(set.insert(2), false);
    /// assert_eq!(set.len(), 1);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n) expected
    pub fn insert(&mut self, value: T) -> bool
    where
        T: Ord,
        R: PriorityRng,
    {
        let priority = self.rng.next_priority();
        self.raw.insert(value, priority).1
    }

    /// Adds a value to the set, returning its rank along with whether it was
    /// newly inserted.
    ///
    /// On a collision the rank is that of the already-present equal value.
    ///
    /// This is an order-statistic extension and is not part of the standard
    /// `BTreeSet` API.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set = OSTreapSet::from([10, 30]);
    ///
    /// assert_eq!(set.insert_full(20), (1, true));
    /// assert_eq!(set.insert_full(30), (2, false));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n) expected
    pub fn insert_full(&mut self, value: T) -> (usize, bool)
    where
        T: Ord,
        R: PriorityRng,
    {
        let priority = self.rng.next_priority();
        let (handle, inserted) = self.raw.insert(value, priority);
        (self.raw.rank_of_handle(handle), inserted)
    }

    /// Returns `true` if the set contains an element equal to the value.
    ///
    /// The value may be any borrowed form of the set's element type, but the
    /// ordering on the borrowed form *must* match the ordering on the
    /// element type.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([1, 2, 3]);
    /// assert_eq!(set.contains(&1), true);
    /// assert_eq!(set.contains(&4), false);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.find(value).is_some()
    }

    /// Returns a reference to the element in the set, if any, that is equal
    /// to the value.
    ///
    /// If a projecting borrowed form makes several elements equal to
    /// `value`, the first of them in sorted order is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([1, 2, 3]);
    /// assert_eq!(set.get(&2), Some(&2));
    /// assert_eq!(set.get(&4), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.find(value).map(|handle| &self.raw.node(handle).key)
    }

    /// Removes every element equal to the value and returns how many were
    /// removed.
    ///
    /// With an ordinary borrowed form this is 0 or 1. A projecting borrowed
    /// form can make a whole run of elements equal to `value`; the entire
    /// run is removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set = OSTreapSet::from([1, 2, 3]);
    ///
    /// assert_eq!(set.remove(&2), 1);
    /// assert_eq!(set.remove(&2), 0);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n) per removed element
    pub fn remove<Q>(&mut self, value: &Q) -> usize
    where
        T: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        let upper = self.raw.upper_bound(value);
        let mut cur = self.raw.lower_bound(value);

        let mut doomed: SmallVec<[Handle; 8]> = SmallVec::new();
        while cur != upper {
            let handle = cur.expect("equivalence run ended before its upper bound");
            doomed.push(handle);
            cur = self.raw.successor(handle);
        }

        let removed = doomed.len();
        for handle in doomed {
            self.raw.erase(handle);
        }
        removed
    }

    /// Removes and returns the first element equal to the value, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set = OSTreapSet::from([1, 2, 3]);
    /// assert_eq!(set.take(&2), Some(2));
    /// assert_eq!(set.take(&2), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.find(value).map(|handle| self.raw.erase(handle))
    }

    /// Returns the number of elements equal to the value.
    ///
    /// Computed as the rank difference between the value's two bounds, so a
    /// projected equivalence run of any length still costs only two
    /// descents.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([1, 3, 5]);
    /// assert_eq!(set.count(&3), 1);
    /// assert_eq!(set.count(&4), 0);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn count<Q>(&self, value: &Q) -> usize
    where
        T: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        let Some(lower) = self.raw.lower_bound(value) else {
            return 0;
        };
        let below_upper = self
            .raw
            .upper_bound(value)
            .map_or(self.len(), |handle| self.raw.rank_of_handle(handle));
        below_upper - self.raw.rank_of_handle(lower)
    }

    /// Returns a cursor at the first element equal to the value, or at the
    /// end if there is none.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([10, 20, 30]);
    ///
    /// assert_eq!(set.find(&20).get(), Some(&20));
    /// assert!(set.find(&25).get().is_none());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn find<Q>(&self, value: &Q) -> Cursor<'_, T>
    where
        T: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        Cursor::new(&self.raw, self.raw.find(value))
    }

    /// Returns a cursor at the first element that is not less than the
    /// value, or at the end if there is none.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([10, 20, 30]);
    ///
    /// assert_eq!(set.lower_bound(&20).get(), Some(&20));
    /// assert_eq!(set.lower_bound(&25).get(), Some(&30));
    /// assert!(set.lower_bound(&31).get().is_none());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn lower_bound<Q>(&self, value: &Q) -> Cursor<'_, T>
    where
        T: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        Cursor::new(&self.raw, self.raw.lower_bound(value))
    }

    /// Returns a cursor at the first element strictly greater than the
    /// value, or at the end if there is none.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([10, 20, 30]);
    ///
    /// assert_eq!(set.upper_bound(&20).get(), Some(&30));
    /// assert!(set.upper_bound(&30).get().is_none());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn upper_bound<Q>(&self, value: &Q) -> Cursor<'_, T>
    where
        T: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        Cursor::new(&self.raw, self.raw.upper_bound(value))
    }

    /// Returns the pair `(lower_bound, upper_bound)` for the value: the
    /// cursors delimit the run of elements equal to it.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([10, 20, 30]);
    ///
    /// let (low, high) = set.equal_range(&20);
    /// assert_eq!(high.rank() - low.rank(), 1);
    ///
    /// let (low, high) = set.equal_range(&25);
    /// assert_eq!(low, high);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn equal_range<Q>(&self, value: &Q) -> (Cursor<'_, T>, Cursor<'_, T>)
    where
        T: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        (self.lower_bound(value), self.upper_bound(value))
    }

    /// Returns a cursor at the element with the given rank, or at the end if
    /// `rank >= len`.
    ///
    /// This is an order-statistic extension and is not part of the standard
    /// `BTreeSet` API.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([10, 20, 30]);
    /// assert_eq!(set.cursor_at_rank(1).get(), Some(&20));
    /// assert!(set.cursor_at_rank(3).get().is_none());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn cursor_at_rank(&self, rank: usize) -> Cursor<'_, T> {
        Cursor::new(&self.raw, self.raw.nth(rank))
    }

    /// Returns a mutable cursor at the first element that is not less than
    /// the value, or at the end if there is none.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set = OSTreapSet::from([10, 20, 30]);
    ///
    /// let mut cursor = set.lower_bound_mut(&15);
    /// assert_eq!(cursor.remove_current(), Some(20));
    /// assert_eq!(cursor.get(), Some(&30));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn lower_bound_mut<Q>(&mut self, value: &Q) -> CursorMut<'_, T, R>
    where
        T: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        let node = self.raw.lower_bound(value);
        CursorMut::new(self, node)
    }

    /// Returns a mutable cursor at the element with the given rank, or at
    /// the end if `rank >= len`.
    ///
    /// This is an order-statistic extension and is not part of the standard
    /// `BTreeSet` API.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set = OSTreapSet::from([10, 20, 30]);
    /// assert_eq!(set.cursor_at_rank_mut(0).remove_current(), Some(10));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn cursor_at_rank_mut(&mut self, rank: usize) -> CursorMut<'_, T, R> {
        let node = self.raw.nth(rank);
        CursorMut::new(self, node)
    }

    /// Constructs a double-ended iterator over a sub-range of elements in
    /// the set.
    ///
    /// The simplest way is to use the range syntax `min..max`, thus
    /// `range(min..max)` will yield elements from min (inclusive) to max
    /// (exclusive).
    ///
    /// # Panics
    ///
    /// Panics if range `start > end`, or if range `start == end` and both
    /// bounds are `Excluded`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([3, 5, 8]);
    /// let in_range: Vec<_> = set.range(4..=8).copied().collect();
    /// assert_eq!(in_range, [5, 8]);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n) to create the iterator; O(log n) amortized per step.
    pub fn range<Q, B>(&self, bounds: B) -> Range<'_, T>
    where
        T: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
        B: RangeBounds<Q>,
    {
        match (bounds.start_bound(), bounds.end_bound()) {
            (Bound::Included(start) | Bound::Excluded(start), Bound::Included(end) | Bound::Excluded(end))
                if start > end =>
            {
                panic!("range start is greater than range end in OSTreapSet")
            }
            (Bound::Excluded(start), Bound::Excluded(end)) if start == end => {
                panic!("range start and end are equal and excluded in OSTreapSet")
            }
            _ => {}
        }

        let front = match bounds.start_bound() {
            Bound::Unbounded => self.raw.first(),
            Bound::Included(q) => self.raw.lower_bound(q),
            Bound::Excluded(q) => self.raw.upper_bound(q),
        };
        let back = match bounds.end_bound() {
            Bound::Unbounded => self.raw.last(),
            Bound::Included(q) => match self.raw.upper_bound(q) {
                Some(handle) => self.raw.predecessor(handle),
                None => self.raw.last(),
            },
            Bound::Excluded(q) => match self.raw.lower_bound(q) {
                Some(handle) => self.raw.predecessor(handle),
                None => self.raw.last(),
            },
        };

        match (front, back) {
            (Some(f), Some(b)) if self.raw.node(f).key <= self.raw.node(b).key => Range {
                raw: &self.raw,
                front,
                back,
            },
            _ => Range {
                raw: &self.raw,
                front: None,
                back: None,
            },
        }
    }

    /// Retains only the elements specified by the predicate.
    ///
    /// In other words, removes all elements `e` for which `f(&e)` returns
    /// `false`. The elements are visited in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set = OSTreapSet::from([1, 2, 3, 4, 5, 6]);
    /// set.retain(|&v| v % 2 == 0);
    /// assert!(set.iter().eq([2, 4, 6].iter()));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n log n)
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        let mut cur = self.raw.first();
        while let Some(handle) = cur {
            // The successor outlives the erase: removal relinks other nodes
            // but never moves or frees them.
            cur = self.raw.successor(handle);
            if !f(&self.raw.node(handle).key) {
                self.raw.erase(handle);
            }
        }
    }
}

impl<T: Hash, R> Hash for OSTreapSet<T, R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for value in self {
            value.hash(state);
        }
    }
}

impl<T: PartialEq, R> PartialEq for OSTreapSet<T, R> {
    fn eq(&self, other: &OSTreapSet<T, R>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, R> Eq for OSTreapSet<T, R> {}

impl<T: PartialOrd, R> PartialOrd for OSTreapSet<T, R> {
    fn partial_cmp(&self, other: &OSTreapSet<T, R>) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord, R> Ord for OSTreapSet<T, R> {
    fn cmp(&self, other: &OSTreapSet<T, R>) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Clone, R: Clone> Clone for OSTreapSet<T, R> {
    /// Clones the set, preserving the exact tree shape.
    ///
    /// Cloned elements keep their priorities, so the copy is structurally
    /// identical to the original while owning its own storage. The priority
    /// generator's state is cloned along with the tree.
    fn clone(&self) -> Self {
        OSTreapSet {
            raw: self.raw.clone(),
            rng: self.rng.clone(),
        }
    }
}

impl<T: fmt::Debug, R> fmt::Debug for OSTreapSet<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, R: Default> Default for OSTreapSet<T, R> {
    fn default() -> Self {
        OSTreapSet::with_rng(R::default())
    }
}

impl<T: Ord, R: PriorityRng + Default> FromIterator<T> for OSTreapSet<T, R> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = OSTreapSet::default();
        set.extend(iter);
        set
    }
}

impl<T: Ord, R: PriorityRng> Extend<T> for OSTreapSet<T, R> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T: 'a + Ord + Copy, R: PriorityRng> Extend<&'a T> for OSTreapSet<T, R> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for &value in iter {
            self.insert(value);
        }
    }
}

impl<T: Ord, const N: usize> From<[T; N]> for OSTreapSet<T> {
    /// Converts a `[T; N]` into an `OSTreapSet<T>`.
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set1 = OSTreapSet::from([1, 2, 3, 4]);
    /// let set2: OSTreapSet<_> = [1, 2, 3, 4].into();
    /// assert_eq!(set1, set2);
    /// ```
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<T, R> IntoIterator for OSTreapSet<T, R> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    /// Gets an owning iterator over the elements in ascending order.
    fn into_iter(mut self) -> IntoIter<T> {
        IntoIter {
            inner: self.raw.drain_in_order().into_iter(),
        }
    }
}

impl<'a, T, R> IntoIterator for &'a OSTreapSet<T, R> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let handle = self.front.expect("unfinished iterator lost its front handle");

        self.front = self.raw.successor(handle);
        self.remaining -= 1;
        Some(&self.raw.node(handle).key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }

    fn last(mut self) -> Option<&'a T> {
        self.next_back()
    }

    fn min(mut self) -> Option<&'a T>
    where
        &'a T: Ord,
    {
        self.next()
    }

    fn max(mut self) -> Option<&'a T>
    where
        &'a T: Ord,
    {
        self.next_back()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let handle = self.back.expect("unfinished iterator lost its back handle");

        self.back = self.raw.predecessor(handle);
        self.remaining -= 1;
        Some(&self.raw.node(handle).key)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            raw: self.raw,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<T> FusedIterator for IntoIter<T> {}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.as_slice()).finish()
    }
}

impl<'a, T> Iterator for Range<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let handle = self.front?;

        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.front = self.raw.successor(handle);
        }
        Some(&self.raw.node(handle).key)
    }
}

impl<'a, T> DoubleEndedIterator for Range<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        let handle = self.back?;

        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.back = self.raw.predecessor(handle);
        }
        Some(&self.raw.node(handle).key)
    }
}

impl<T> FusedIterator for Range<'_, T> {}

impl<T> Clone for Range<'_, T> {
    fn clone(&self) -> Self {
        Range {
            raw: self.raw,
            front: self.front,
            back: self.back,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Range<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
