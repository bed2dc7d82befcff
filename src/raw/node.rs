use super::handle::Handle;

/// One element of the tree.
///
/// The key and priority are written at construction and never reassigned;
/// `count` and the three links are maintained by the tree algorithms. `count`
/// is the size of the subtree rooted here, including the node itself, so it
/// is always at least 1 while the node is live.
#[derive(Clone)]
pub(crate) struct Node<K> {
    pub(crate) key: K,
    pub(crate) priority: u64,
    pub(crate) count: usize,
    pub(crate) parent: Option<Handle>,
    pub(crate) left: Option<Handle>,
    pub(crate) right: Option<Handle>,
}

impl<K> Node<K> {
    /// Creates a detached node: no links, a subtree of one.
    pub(crate) const fn new(key: K, priority: u64) -> Self {
        Self {
            key,
            priority,
            count: 1,
            parent: None,
            left: None,
            right: None,
        }
    }

    /// Returns the child link on the given side: `false` = left, `true` = right.
    #[inline]
    pub(crate) fn child(&self, right: bool) -> Option<Handle> {
        if right { self.right } else { self.left }
    }

    #[inline]
    pub(crate) fn set_child(&mut self, right: bool, child: Option<Handle>) {
        if right {
            self.right = child;
        } else {
            self.left = child;
        }
    }
}
