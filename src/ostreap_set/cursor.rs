use core::fmt;

use crate::raw::{Handle, RawTreap};
use crate::rng::PriorityRng;

use super::OSTreapSet;

/// A read-only cursor over an [`OSTreapSet`].
///
/// A cursor rests either on an element or on the *end* position past the
/// last element. It can step in both directions; stepping at the end
/// position is absorbing. [`rank`](Cursor::rank) reports the cursor's sorted
/// position in O(log n).
///
/// Cursors are cheap handles, not borrows of individual elements: a cursor
/// obtained before an insert or an unrelated removal is still valid after
/// it, because a node keeps its storage slot for its whole lifetime.
/// Removing the element a cursor rests on invalidates that cursor.
///
/// This `struct` is created by [`OSTreapSet::find`],
/// [`OSTreapSet::lower_bound`], [`OSTreapSet::upper_bound`] and
/// [`OSTreapSet::cursor_at_rank`].
pub struct Cursor<'a, T: 'a> {
    raw: &'a RawTreap<T>,
    node: Option<Handle>,
}

impl<'a, T> Cursor<'a, T> {
    pub(crate) fn new(raw: &'a RawTreap<T>, node: Option<Handle>) -> Self {
        Cursor { raw, node }
    }

    /// Returns a reference to the element under the cursor, or `None` at the
    /// end position.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([1, 2, 3]);
    /// assert_eq!(set.lower_bound(&2).get(), Some(&2));
    /// assert_eq!(set.lower_bound(&4).get(), None);
    /// ```
    #[must_use]
    pub fn get(&self) -> Option<&'a T> {
        self.node.map(|handle| &self.raw.node(handle).key)
    }

    /// Returns the cursor's zero-based sorted position; the end position
    /// reports the set's length.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let set = OSTreapSet::from([10, 20, 30]);
    /// assert_eq!(set.lower_bound(&20).rank(), 1);
    /// assert_eq!(set.lower_bound(&99).rank(), 3);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn rank(&self) -> usize {
        self.node.map_or(self.raw.len(), |handle| self.raw.rank_of_handle(handle))
    }

    /// Steps to the next element in sorted order; past the last element the
    /// cursor rests at the end position, where stepping is a no-op.
    pub fn move_next(&mut self) {
        if let Some(handle) = self.node {
            self.node = self.raw.successor(handle);
        }
    }

    /// Steps to the previous element in sorted order; from the first element
    /// the cursor falls off to the end position, where stepping is a no-op.
    pub fn move_prev(&mut self) {
        if let Some(handle) = self.node {
            self.node = self.raw.predecessor(handle);
        }
    }
}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<'_, T> {}

impl<T> PartialEq for Cursor<'_, T> {
    /// Cursors compare by position identity, not by element value.
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<T> Eq for Cursor<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

/// A cursor over an [`OSTreapSet`] with editing operations.
///
/// Works like [`Cursor`], but additionally supports removing the element
/// under it and inserting new elements. Created by
/// [`OSTreapSet::lower_bound_mut`] and [`OSTreapSet::cursor_at_rank_mut`].
pub struct CursorMut<'a, T: 'a, R = crate::XorShiftRng> {
    set: &'a mut OSTreapSet<T, R>,
    node: Option<Handle>,
}

impl<'a, T, R> CursorMut<'a, T, R> {
    pub(crate) fn new(set: &'a mut OSTreapSet<T, R>, node: Option<Handle>) -> Self {
        CursorMut { set, node }
    }

    /// Returns a reference to the element under the cursor, or `None` at the
    /// end position.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.node.map(|handle| &self.set.raw.node(handle).key)
    }

    /// Returns the cursor's zero-based sorted position; the end position
    /// reports the set's length.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn rank(&self) -> usize {
        self.node
            .map_or(self.set.raw.len(), |handle| self.set.raw.rank_of_handle(handle))
    }

    /// Steps to the next element in sorted order; absorbing at the end
    /// position.
    pub fn move_next(&mut self) {
        if let Some(handle) = self.node {
            self.node = self.set.raw.successor(handle);
        }
    }

    /// Steps to the previous element in sorted order; from the first element
    /// the cursor falls off to the end position, where stepping is a no-op.
    pub fn move_prev(&mut self) {
        if let Some(handle) = self.node {
            self.node = self.set.raw.predecessor(handle);
        }
    }

    /// Removes the element under the cursor and returns it; the cursor moves
    /// to the removed element's successor. Returns `None` at the end
    /// position.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set = OSTreapSet::from([1, 2, 3]);
    ///
    /// let mut cursor = set.lower_bound_mut(&2);
    /// assert_eq!(cursor.remove_current(), Some(2));
    /// assert_eq!(cursor.get(), Some(&3));
    /// assert_eq!(cursor.remove_current(), Some(3));
    /// assert_eq!(cursor.remove_current(), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove_current(&mut self) -> Option<T> {
        let handle = self.node?;
        self.node = self.set.raw.successor(handle);
        Some(self.set.raw.erase(handle))
    }

    /// Inserts a value, treating the cursor position only as a hint: the
    /// value always ends up at its correct sorted position, wherever the
    /// cursor rests. Afterwards the cursor rests on the inserted element, or
    /// on the equal element already present.
    ///
    /// Returns whether the value was newly inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostreap::OSTreapSet;
    ///
    /// let mut set = OSTreapSet::from([10, 30]);
    ///
    /// let mut cursor = set.cursor_at_rank_mut(0);
    /// assert!(cursor.insert(20));
    /// assert_eq!(cursor.get(), Some(&20));
    /// assert!(!cursor.insert(30));
    /// assert_eq!(cursor.rank(), 2);
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
        let priority = self.set.rng.next_priority();
        let (handle, inserted) = self.set.raw.insert(value, priority);
        self.node = Some(handle);
        inserted
    }
}

impl<T: fmt::Debug, R> fmt::Debug for CursorMut<'_, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.get()).finish()
    }
}

/// A read-only view of one tree node: its key, priority, subtree count and
/// links.
///
/// Obtained from [`OSTreapSet::root`] and by following
/// [`left`](NodeRef::left)/[`right`](NodeRef::right)/[`parent`](NodeRef::parent)
/// links. This is the inspection surface used by the crate's own structural
/// tests; external test harnesses can rely on it too.
///
/// # Examples
///
/// ```
/// use ostreap::OSTreapSet;
///
/// let set = OSTreapSet::from([2, 1, 3]);
///
/// // The heap rule: a child never outranks its parent.
/// let root = set.root().unwrap();
/// for child in [root.left(), root.right()].into_iter().flatten() {
///     assert!(root.priority() >= child.priority());
///     assert_eq!(child.parent().unwrap().key(), root.key());
/// }
/// ```
pub struct NodeRef<'a, T: 'a> {
    raw: &'a RawTreap<T>,
    handle: Handle,
}

impl<'a, T> NodeRef<'a, T> {
    pub(crate) fn new(raw: &'a RawTreap<T>, handle: Handle) -> Self {
        NodeRef { raw, handle }
    }

    /// The node's key.
    #[must_use]
    pub fn key(&self) -> &'a T {
        &self.raw.node(self.handle).key
    }

    /// The balancing priority drawn when the node was created.
    #[must_use]
    pub fn priority(&self) -> u64 {
        self.raw.node(self.handle).priority
    }

    /// The number of nodes in the subtree rooted here, itself included.
    #[must_use]
    pub fn count(&self) -> usize {
        self.raw.node(self.handle).count
    }

    /// The left child, holding every smaller key of this subtree.
    #[must_use]
    pub fn left(&self) -> Option<NodeRef<'a, T>> {
        self.raw.node(self.handle).left.map(|handle| NodeRef::new(self.raw, handle))
    }

    /// The right child, holding every larger key of this subtree.
    #[must_use]
    pub fn right(&self) -> Option<NodeRef<'a, T>> {
        self.raw.node(self.handle).right.map(|handle| NodeRef::new(self.raw, handle))
    }

    /// The parent node; `None` at the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeRef<'a, T>> {
        self.raw.node(self.handle).parent.map(|handle| NodeRef::new(self.raw, handle))
    }

    /// The node's zero-based position in sorted order.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn rank(&self) -> usize {
        self.raw.rank_of_handle(self.handle)
    }
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<T> PartialEq for NodeRef<'_, T> {
    /// Node views compare by node identity, not by key value.
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T> Eq for NodeRef<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for NodeRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", self.key())
            .field("priority", &self.priority())
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}
