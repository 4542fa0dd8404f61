//! Insertion: upsert with node splitting, and bulk load.

use std::mem;
use std::sync::Arc;

use crate::ksearch::PathHint;
use crate::node::Node;
use crate::ordering::Less;
use crate::tracing_helpers::{debug_log, trace_log};

use super::{BTree, Ctx};

/// Outcome of inserting into one subtree.
pub(super) enum SetOutcome<T> {
    /// A new item was added.
    Inserted,

    /// An equal item was replaced; carries the old one.
    Replaced(T),

    /// The node was full. The item is handed back so the parent can split
    /// this node and retry.
    Split(T),
}

impl<T: Clone, C: Less<T>> Ctx<T, C> {
    /// Insert `item` into the subtree at `slot`.
    pub(super) fn node_set(
        &self,
        slot: &mut Arc<Node<T>>,
        item: T,
        mut hint: Option<&mut PathHint>,
        depth: usize,
    ) -> SetOutcome<T> {
        let n: &mut Node<T> = self.iso_load(slot);
        let pos = self.find(n, &item, hint.as_deref_mut(), depth);
        if pos.found {
            return SetOutcome::Replaced(mem::replace(&mut n.items[pos.index], item));
        }

        let i: usize = pos.index;
        let Some(children) = n.children.as_mut() else {
            if n.items.len() == self.max {
                return SetOutcome::Split(item);
            }
            n.items.insert(i, item);
            n.count += 1;
            return SetOutcome::Inserted;
        };

        match self.node_set(&mut children[i], item, hint.as_deref_mut(), depth + 1) {
            SetOutcome::Inserted => {
                n.count += 1;
                SetOutcome::Inserted
            }

            SetOutcome::Replaced(prev) => SetOutcome::Replaced(prev),

            SetOutcome::Split(item) => {
                if n.items.len() == self.max {
                    return SetOutcome::Split(item);
                }

                // The child was loaded for writing by the recursive call.
                let (median, right) = self.iso_load(&mut children[i]).split(self.isoid, self.max);
                children.insert(i + 1, Arc::new(right));
                n.items.insert(i, median);
                trace_log!(depth, index = i, "split child");

                // Retry: `item` now has room on one side of the new separator.
                self.node_set(slot, item, hint, depth)
            }
        }
    }
}

impl<T: Clone, C: Less<T>> BTree<T, C> {
    /// Insert `item`, replacing and returning any equal item.
    ///
    /// Returns `None` if the item is new, in which case `len()` grows by
    /// one.
    ///
    /// ```rust
    /// use isobtree::BTree;
    ///
    /// let mut tree = BTree::with_less(|a: &(u32, char), b: &(u32, char)| a.0 < b.0);
    /// assert_eq!(tree.insert((1, 'a')), None);
    /// assert_eq!(tree.insert((1, 'b')), Some((1, 'a')));
    /// assert_eq!(tree.len(), 1);
    /// ```
    pub fn insert(&mut self, item: T) -> Option<T> {
        self.set_inner(item, None)
    }

    /// [`insert`](Self::insert) with a path hint.
    pub fn insert_hint(&mut self, item: T, hint: &mut PathHint) -> Option<T> {
        self.set_inner(item, Some(hint))
    }

    fn set_inner(&mut self, item: T, mut hint: Option<&mut PathHint>) -> Option<T> {
        let Some(root) = self.root.as_mut() else {
            let mut leaf: Node<T> = Node::new_leaf(self.ctx.isoid);
            leaf.items.push(item);
            leaf.count = 1;
            self.root = Some(Arc::new(leaf));
            self.count = 1;
            return None;
        };

        match self.ctx.node_set(root, item, hint.as_deref_mut(), 0) {
            SetOutcome::Inserted => {
                self.count += 1;
                None
            }

            SetOutcome::Replaced(prev) => Some(prev),

            SetOutcome::Split(item) => {
                self.split_root();
                self.set_inner(item, hint)
            }
        }
    }

    /// Split a full root under a new root, growing the tree by one level.
    fn split_root(&mut self) {
        let Some(mut left) = self.root.take() else {
            return;
        };

        let (median, right) = self.ctx.iso_load(&mut left).split(self.ctx.isoid, self.ctx.max);

        let mut root: Node<T> = Node::new_internal(self.ctx.isoid);
        root.items.push(median);
        if let Some(children) = root.children.as_mut() {
            children.push(left);
            children.push(Arc::new(right));
        }
        root.update_count();
        self.root = Some(Arc::new(root));

        debug_log!(height = self.height(), len = self.count, "root split");
    }

    /// Append an item that sorts after everything in the tree.
    ///
    /// This is a fast path for loading presorted data: the item is pushed
    /// onto the rightmost leaf without a search. If it does not sort after
    /// the current maximum, or that leaf is full, it falls back to
    /// [`insert`](Self::insert), so the result is always correct.
    ///
    /// ```rust
    /// use isobtree::BTree;
    ///
    /// let mut tree: BTree<u32> = BTree::new();
    /// for i in 0..10_000 {
    ///     tree.load(i);
    /// }
    /// assert_eq!(tree.len(), 10_000);
    /// assert_eq!(tree.last(), Some(&9_999));
    /// ```
    pub fn load(&mut self, item: T) -> Option<T> {
        let ctx: &Ctx<T, C> = &self.ctx;
        let Some(root) = self.root.as_mut() else {
            return self.set_inner(item, None);
        };

        let mut n: &mut Node<T> = ctx.iso_load(root);
        loop {
            // optimistic
            n.count += 1;
            if n.is_leaf() {
                break;
            }
            let last: usize = n.items.len();
            n = ctx.iso_load(n.child_slot(last));
        }

        let appendable: bool = n.items.len() < ctx.max
            && n.items.last().is_some_and(|tail| ctx.less.less(tail, &item));
        if appendable {
            n.items.push(item);
            self.count += 1;
            return None;
        }

        // Revert the counts along the right spine.
        let mut n: &mut Node<T> = ctx.iso_load(root);
        loop {
            n.count -= 1;
            if n.is_leaf() {
                break;
            }
            let last: usize = n.items.len();
            n = ctx.iso_load(n.child_slot(last));
        }

        trace_log!("load fell back to insert");
        self.set_inner(item, None)
    }
}
