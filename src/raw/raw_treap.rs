use alloc::vec::Vec;
use core::borrow::Borrow;
use core::cmp::Ordering::{Equal, Greater, Less};

use super::arena::Arena;
use super::handle::Handle;
use super::node::Node;

/// The core treap implementation backing `OSTreapSet`.
///
/// A binary search tree on keys that is simultaneously a max-heap on node
/// priorities, with per-node subtree counts and parent back-links. All
/// restructuring happens by relinking handles; a node stays in its arena slot
/// from insertion until erasure.
#[derive(Clone)]
pub(crate) struct RawTreap<K> {
    /// Arena storing all tree nodes.
    arena: Arena<Node<K>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
}

/// Result of partitioning a subtree around a probe key.
enum Split {
    /// A node equivalent to the probe key is already present; the tree is
    /// left exactly as it was.
    Conflict(Handle),
    /// The subtree was partitioned into keys below and above the probe.
    Parts(Option<Handle>, Option<Handle>),
}

/// Result of a subtree insertion attempt.
enum Inserted {
    /// The subtree now contains the new node; the handle is the subtree's
    /// (possibly new) root.
    Done(Handle),
    /// An equivalent key is already present at the returned handle.
    Conflict(Handle),
}

impl<K> RawTreap<K> {
    pub(crate) const fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Returns the number of keys in the tree.
    pub(crate) fn len(&self) -> usize {
        self.root.map_or(0, |root| self.node(root).count)
    }

    /// Returns the number of live arena slots; always equals `len()` unless
    /// a node has leaked.
    pub(crate) fn live_slots(&self) -> usize {
        self.arena.len()
    }

    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<K> {
        self.arena.get(handle)
    }

    #[inline]
    fn node_mut(&mut self, handle: Handle) -> &mut Node<K> {
        self.arena.get_mut(handle)
    }

    #[inline]
    pub(crate) fn count_of(&self, link: Option<Handle>) -> usize {
        link.map_or(0, |handle| self.node(handle).count)
    }

    /// Removes every node. Afterwards the arena holds no live slots.
    pub(crate) fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
    }

    // ─── Navigation ──────────────────────────────────────────────────────────

    /// Descends to the smallest key in the subtree rooted at `handle`.
    pub(crate) fn leftmost(&self, handle: Handle) -> Handle {
        let mut cur = handle;
        while let Some(left) = self.node(cur).left {
            cur = left;
        }
        cur
    }

    /// Descends to the largest key in the subtree rooted at `handle`.
    pub(crate) fn rightmost(&self, handle: Handle) -> Handle {
        let mut cur = handle;
        while let Some(right) = self.node(cur).right {
            cur = right;
        }
        cur
    }

    pub(crate) fn first(&self) -> Option<Handle> {
        self.root.map(|root| self.leftmost(root))
    }

    pub(crate) fn last(&self) -> Option<Handle> {
        self.root.map(|root| self.rightmost(root))
    }

    /// Returns the in-order successor: the least key of the right subtree,
    /// or else the nearest ancestor reached from a left child.
    pub(crate) fn successor(&self, handle: Handle) -> Option<Handle> {
        if let Some(right) = self.node(handle).right {
            return Some(self.leftmost(right));
        }

        let mut cur = handle;
        while let Some(parent) = self.node(cur).parent {
            if self.node(parent).left == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }
        None
    }

    /// Returns the in-order predecessor; mirror image of [`Self::successor`].
    pub(crate) fn predecessor(&self, handle: Handle) -> Option<Handle> {
        if let Some(left) = self.node(handle).left {
            return Some(self.rightmost(left));
        }

        let mut cur = handle;
        while let Some(parent) = self.node(cur).parent {
            if self.node(parent).right == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }
        None
    }

    /// Returns the zero-based in-order position of a live node.
    ///
    /// The node's own left count, plus one extra step for every ancestor the
    /// walk leaves through a right child.
    pub(crate) fn rank_of_handle(&self, handle: Handle) -> usize {
        let mut total = self.count_of(self.node(handle).left);

        let mut cur = handle;
        while let Some(parent) = self.node(cur).parent {
            if self.node(parent).right == Some(cur) {
                total += self.count_of(self.node(parent).left) + 1;
            }
            cur = parent;
        }
        total
    }

    /// Returns the node at in-order position `n`, or `None` if `n >= len`.
    pub(crate) fn nth(&self, mut n: usize) -> Option<Handle> {
        if n >= self.len() {
            return None;
        }

        let mut cur = self.root?;
        loop {
            let left = self.node(cur).left;
            let on_left = self.count_of(left);

            match n.cmp(&on_left) {
                Less => cur = left.expect("n below left count but left subtree missing"),
                Equal => return Some(cur),
                Greater => {
                    n -= on_left + 1;
                    cur = self
                        .node(cur)
                        .right
                        .expect("n within subtree count but right subtree missing");
                }
            }
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    /// Ordinary BST descent. On a match, slides down the left spine while the
    /// left child is still equivalent, so a projected query that matches a
    /// run of keys lands on the run's first node.
    pub(crate) fn find<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut cur = self.root;
        while let Some(handle) = cur {
            match key.cmp(self.node(handle).key.borrow()) {
                Less => cur = self.node(handle).left,
                Greater => cur = self.node(handle).right,
                Equal => {
                    let mut first = handle;
                    while let Some(left) = self.node(first).left {
                        if key.cmp(self.node(left).key.borrow()) == Greater {
                            break;
                        }
                        first = left;
                    }
                    return Some(first);
                }
            }
        }
        None
    }

    /// Shared descent for both bounds: returns the first node whose key is
    /// greater than `key`, or greater-or-equal when `inclusive` is set.
    pub(crate) fn bound<Q>(&self, key: &Q, inclusive: bool) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut candidate = None;

        let mut cur = self.root;
        while let Some(handle) = cur {
            let node = self.node(handle);
            let above = match key.cmp(node.key.borrow()) {
                Less => true,
                Equal => inclusive,
                Greater => false,
            };

            if above {
                candidate = Some(handle);
                cur = node.left;
            } else {
                cur = node.right;
            }
        }
        candidate
    }

    /// First node not less than `key`.
    pub(crate) fn lower_bound<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.bound(key, true)
    }

    /// First node strictly greater than `key`.
    pub(crate) fn upper_bound<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.bound(key, false)
    }

    // ─── Mutation ────────────────────────────────────────────────────────────

    /// Inserts `key` with the given priority. Returns the node's handle and
    /// whether a new node was created; on a conflict the existing node is
    /// returned and the tree is untouched.
    pub(crate) fn insert(&mut self, key: K, priority: u64) -> (Handle, bool)
    where
        K: Ord,
    {
        let staged = self.arena.alloc(Node::new(key, priority));

        match self.insert_into(self.root, staged) {
            Inserted::Done(new_root) => {
                self.root = Some(new_root);
                self.node_mut(new_root).parent = None;
                (staged, true)
            }
            Inserted::Conflict(existing) => {
                self.arena.take(staged);
                (existing, false)
            }
        }
    }

    /// Erases a live node and returns its key. The vacated position is filled
    /// by merging the node's subtrees; every ancestor's count drops by one.
    pub(crate) fn erase(&mut self, handle: Handle) -> K {
        let (left, right, parent) = {
            let node = self.node(handle);
            (node.left, node.right, node.parent)
        };

        let merged = self.merge(left, right);
        match parent {
            None => {
                self.root = merged;
                if let Some(m) = merged {
                    self.node_mut(m).parent = None;
                }
            }
            Some(parent) => {
                let was_left = self.node(parent).left == Some(handle);
                self.node_mut(parent).set_child(!was_left, merged);
                if let Some(m) = merged {
                    self.node_mut(m).parent = Some(parent);
                }

                let mut walk = Some(parent);
                while let Some(ancestor) = walk {
                    let node = self.node_mut(ancestor);
                    node.count -= 1;
                    walk = node.parent;
                }
            }
        }

        self.arena.take(handle).key
    }

    /// Empties the tree, returning all keys in ascending order.
    pub(crate) fn drain_in_order(&mut self) -> Vec<K> {
        let mut handles = Vec::with_capacity(self.len());
        let mut cur = self.first();
        while let Some(handle) = cur {
            handles.push(handle);
            cur = self.successor(handle);
        }

        self.root = None;
        let arena = &mut self.arena;
        let keys = handles.into_iter().map(|handle| arena.take(handle).key).collect();
        self.arena.clear();
        keys
    }

    /// Joins two subtrees whose key ranges are disjoint and ordered; the
    /// higher-priority root wins, keeping the heap shape.
    fn merge(&mut self, left: Option<Handle>, right: Option<Handle>) -> Option<Handle> {
        let (l, r) = match (left, right) {
            (None, right) => return right,
            (left, None) => return left,
            (Some(l), Some(r)) => (l, r),
        };

        if self.node(l).priority > self.node(r).priority {
            let absorbed = self.node(r).count;
            let l_right = self.node(l).right;
            let merged = self.merge(l_right, Some(r));

            let node = self.node_mut(l);
            node.count += absorbed;
            node.right = merged;
            if let Some(m) = merged {
                self.node_mut(m).parent = Some(l);
            }
            Some(l)
        } else {
            let absorbed = self.node(l).count;
            let r_left = self.node(r).left;
            let merged = self.merge(Some(l), r_left);

            let node = self.node_mut(r);
            node.count += absorbed;
            node.left = merged;
            if let Some(m) = merged {
                self.node_mut(m).parent = Some(r);
            }
            Some(r)
        }
    }

    /// Partitions `link` around the key of the detached node `at`. Counts are
    /// adjusted only along the descent path; if an equivalent key turns up
    /// the partition is abandoned with nothing modified.
    fn split(&mut self, link: Option<Handle>, at: Handle) -> Split
    where
        K: Ord,
    {
        let Some(root) = link else {
            return Split::Parts(None, None);
        };

        match self.node(at).key.cmp(&self.node(root).key) {
            Less => {
                let left_link = self.node(root).left;
                let detached = self.count_of(left_link);

                match self.split(left_link, at) {
                    Split::Conflict(existing) => Split::Conflict(existing),
                    Split::Parts(low, high) => {
                        let reattached = self.count_of(high);
                        let node = self.node_mut(root);
                        node.count -= detached;
                        node.count += reattached;
                        node.left = high;
                        if let Some(h) = high {
                            self.node_mut(h).parent = Some(root);
                        }
                        Split::Parts(low, Some(root))
                    }
                }
            }
            Greater => {
                let right_link = self.node(root).right;
                let detached = self.count_of(right_link);

                match self.split(right_link, at) {
                    Split::Conflict(existing) => Split::Conflict(existing),
                    Split::Parts(low, high) => {
                        let reattached = self.count_of(low);
                        let node = self.node_mut(root);
                        node.count -= detached;
                        node.count += reattached;
                        node.right = low;
                        if let Some(l) = low {
                            self.node_mut(l).parent = Some(root);
                        }
                        Split::Parts(Some(root), high)
                    }
                }
            }
            Equal => Split::Conflict(root),
        }
    }

    /// Inserts the detached node `staged` into the subtree at `link`.
    ///
    /// A staged node with a dominating priority takes over the subtree root
    /// by splitting it; otherwise the insert recurses into a child and bumps
    /// counts on the way back. A conflict anywhere leaves every subtree as it
    /// was.
    fn insert_into(&mut self, link: Option<Handle>, staged: Handle) -> Inserted
    where
        K: Ord,
    {
        let Some(root) = link else {
            return Inserted::Done(staged);
        };

        if self.node(staged).priority > self.node(root).priority {
            return match self.split(Some(root), staged) {
                Split::Conflict(existing) => Inserted::Conflict(existing),
                Split::Parts(low, high) => {
                    let low_count = self.count_of(low);
                    let high_count = self.count_of(high);

                    let node = self.node_mut(staged);
                    node.left = low;
                    node.right = high;
                    node.count += low_count + high_count;
                    if let Some(l) = low {
                        self.node_mut(l).parent = Some(staged);
                    }
                    if let Some(h) = high {
                        self.node_mut(h).parent = Some(staged);
                    }
                    Inserted::Done(staged)
                }
            };
        }

        let descend_left = match self.node(staged).key.cmp(&self.node(root).key) {
            Less => true,
            Greater => false,
            Equal => return Inserted::Conflict(root),
        };

        let child_link = self.node(root).child(!descend_left);
        match self.insert_into(child_link, staged) {
            Inserted::Conflict(existing) => Inserted::Conflict(existing),
            Inserted::Done(child) => {
                let node = self.node_mut(root);
                node.set_child(!descend_left, Some(child));
                node.count += 1;
                self.node_mut(child).parent = Some(root);
                Inserted::Done(root)
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec;

    impl<K: Ord> RawTreap<K> {
        /// Walks the whole tree asserting every structural invariant.
        fn check_invariants(&self) {
            assert_eq!(self.live_slots(), self.len(), "arena slots out of step with tree size");
            if let Some(root) = self.root {
                assert_eq!(self.node(root).parent, None, "root has a parent");
                self.check_subtree(root);
            }
        }

        fn check_subtree(&self, handle: Handle) -> usize {
            let node = self.node(handle);
            let mut count = 1;

            for (child, is_right) in [(node.left, false), (node.right, true)] {
                let Some(child) = child else { continue };
                let child_node = self.node(child);

                assert!(node.priority >= child_node.priority, "heap order violated");
                assert_eq!(child_node.parent, Some(handle), "child parent link broken");
                if is_right {
                    assert!(child_node.key > node.key, "right child out of order");
                } else {
                    assert!(child_node.key < node.key, "left child out of order");
                }

                count += self.check_subtree(child);
            }

            assert_eq!(node.count, count, "subtree count out of step");
            count
        }

        fn in_order(&self) -> Vec<&K> {
            let mut keys = Vec::new();
            let mut cur = self.first();
            while let Some(handle) = cur {
                keys.push(&self.node(handle).key);
                cur = self.successor(handle);
            }
            keys
        }
    }

    /// Priorities chosen by hand so tests cover both insert strategies:
    /// dominating priorities that split, and dominated ones that recurse.
    fn build(entries: &[(i32, u64)]) -> RawTreap<i32> {
        let mut tree = RawTreap::new();
        for &(key, priority) in entries {
            tree.insert(key, priority);
            tree.check_invariants();
        }
        tree
    }

    #[test]
    fn insert_splits_and_recurses() {
        let tree = build(&[(5, 10), (2, 30), (8, 20), (1, 5), (3, 40), (9, 1)]);
        assert_eq!(tree.in_order(), vec![&1, &2, &3, &5, &8, &9]);
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn insert_conflict_leaves_tree_untouched() {
        let mut tree = build(&[(5, 10), (2, 30), (8, 20)]);

        // Conflict through the recursive path (low priority)...
        let (existing, inserted) = tree.insert(8, 15);
        assert!(!inserted);
        assert_eq!(tree.node(existing).key, 8);

        // ...and through the split path (dominating priority).
        let (existing, inserted) = tree.insert(5, u64::MAX);
        assert!(!inserted);
        assert_eq!(tree.node(existing).key, 5);

        tree.check_invariants();
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn erase_every_order() {
        let entries = [(4, 9), (1, 22), (6, 14), (2, 3), (9, 17)];
        let keys: Vec<i32> = entries.iter().map(|&(k, _)| k).collect();

        // Erase in every single-element order; shape differs each time.
        for &victim in &keys {
            let mut tree = build(&entries);
            let handle = tree.find(&victim).unwrap();
            assert_eq!(tree.erase(handle), victim);
            tree.check_invariants();

            let mut expected: Vec<i32> = keys.iter().copied().filter(|&k| k != victim).collect();
            expected.sort_unstable();
            assert_eq!(tree.in_order().into_iter().copied().collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn erase_root_until_empty() {
        let mut tree = build(&[(4, 9), (1, 22), (6, 14), (2, 3), (9, 17)]);
        while let Some(root) = tree.root() {
            tree.erase(root);
            tree.check_invariants();
        }
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.live_slots(), 0);
    }

    #[test]
    fn bounds_and_nth() {
        let tree = build(&[(10, 4), (30, 19), (50, 11), (70, 23)]);

        assert_eq!(tree.nth(0).map(|h| tree.node(h).key), Some(10));
        assert_eq!(tree.nth(3).map(|h| tree.node(h).key), Some(70));
        assert_eq!(tree.nth(4), None);

        let lb = tree.lower_bound(&30).unwrap();
        assert_eq!(tree.node(lb).key, 30);
        let ub = tree.upper_bound(&30).unwrap();
        assert_eq!(tree.node(ub).key, 50);
        assert_eq!(tree.lower_bound(&71), None);

        for rank in 0..4 {
            let handle = tree.nth(rank).unwrap();
            assert_eq!(tree.rank_of_handle(handle), rank);
        }
    }

    #[test]
    fn drain_returns_sorted_keys() {
        let mut tree = build(&[(3, 7), (1, 2), (2, 9), (5, 1), (4, 4)]);
        assert_eq!(tree.drain_in_order(), vec![1, 2, 3, 4, 5]);
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.live_slots(), 0);
    }

    #[test]
    fn clone_preserves_shape_and_priorities() {
        let tree = build(&[(5, 10), (2, 30), (8, 20), (1, 5), (3, 40)]);
        let copy = tree.clone();

        copy.check_invariants();
        let mut cur = tree.first();
        while let Some(handle) = cur {
            // Same handle resolves to the same key and priority in the copy.
            assert_eq!(copy.node(handle).key, tree.node(handle).key);
            assert_eq!(copy.node(handle).priority, tree.node(handle).priority);
            cur = tree.successor(handle);
        }
    }
}
