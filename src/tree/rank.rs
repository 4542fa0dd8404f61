//! Access by sorted position.
//!
//! Every node caches the size of its subtree, so the item of rank `i` is
//! found in one root-to-leaf descent without visiting siblings.

use std::sync::Arc;

use crate::ksearch::{HINT_DEPTH, PathHint};
use crate::node::{Node, RankStep};
use crate::ordering::Less;
use crate::tracing_helpers::trace_log;

use super::{BTree, Ctx};

impl<T, C> BTree<T, C> {
    /// The item at sorted position `index`, or `None` if `index >= len()`.
    ///
    /// ```rust
    /// use isobtree::BTree;
    ///
    /// let tree: BTree<u32> = (0..100).map(|i| i * 10).collect();
    /// assert_eq!(tree.get_at(3), Some(&30));
    /// assert_eq!(tree.get_at(100), None);
    /// ```
    #[must_use]
    pub fn get_at(&self, index: usize) -> Option<&T> {
        if index >= self.count {
            return None;
        }

        let mut n: &Node<T> = self.root.as_deref()?;
        let mut rank: usize = index;
        loop {
            match n.rank_step(rank) {
                RankStep::Item(i) => return n.items.get(i),
                RankStep::Child(i, rest) => {
                    n = n.children().get(i).map(Arc::as_ref)?;
                    rank = rest;
                }
            }
        }
    }
}

impl<T: Clone, C> BTree<T, C> {
    /// Mutable access to the item at sorted position `index`.
    ///
    /// The item's ordering must not be changed through the returned
    /// reference.
    pub fn get_at_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.count {
            return None;
        }

        let ctx: &Ctx<T, C> = &self.ctx;
        let mut n: &mut Node<T> = ctx.iso_load(self.root.as_mut()?);
        let mut rank: usize = index;
        loop {
            match n.rank_step(rank) {
                RankStep::Item(i) => return n.items.get_mut(i),
                RankStep::Child(i, rest) => {
                    n = ctx.iso_load(n.child_slot(i));
                    rank = rest;
                }
            }
        }
    }
}

impl<T: Clone, C: Less<T>> BTree<T, C> {
    /// Remove and return the item at sorted position `index`.
    ///
    /// A leaf item that can go without underflowing its leaf is removed in
    /// a single descent. Otherwise the descent is undone and the item is
    /// removed by key, seeded with the path just taken.
    ///
    /// ```rust
    /// use isobtree::BTree;
    ///
    /// let mut tree: BTree<char> = "abcdef".chars().collect();
    /// assert_eq!(tree.remove_at(2), Some('c'));
    /// assert_eq!(tree.values(), vec!['a', 'b', 'd', 'e', 'f']);
    /// ```
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.count {
            return None;
        }

        let ctx: &Ctx<T, C> = &self.ctx;
        let root: &mut Arc<Node<T>> = self.root.as_mut()?;

        let mut path: Vec<usize> = Vec::with_capacity(HINT_DEPTH);
        let mut rank: usize = index;
        let mut n: &mut Node<T> = ctx.iso_load(root);
        let key: T = loop {
            // optimistic
            n.count -= 1;
            match n.rank_step(rank) {
                RankStep::Item(i) => {
                    if n.is_leaf() && n.items.len() != ctx.min {
                        let item: T = n.items.remove(i);
                        self.count -= 1;
                        if self.count == 0 {
                            self.root = None;
                        }
                        return Some(item);
                    }
                    path.push(i);
                    break n.items[i].clone();
                }
                RankStep::Child(i, rest) => {
                    path.push(i);
                    n = ctx.iso_load(n.child_slot(i));
                    rank = rest;
                }
            }
        };

        // Undo the counts on every node the descent touched.
        let mut n: &mut Node<T> = ctx.iso_load(root);
        n.count += 1;
        for &i in &path[..path.len() - 1] {
            n = ctx.iso_load(n.child_slot(i));
            n.count += 1;
        }

        trace_log!(index, depth = path.len(), "remove_at fell back to remove");
        let mut hint: PathHint = PathHint::from_path(&path);
        self.remove_inner(&key, Some(&mut hint))
    }
}
