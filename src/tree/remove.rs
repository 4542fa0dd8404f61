//! Deletion with rebalancing.
//!
//! An internal item that is deleted is replaced by its predecessor, the
//! maximum of the subtree to its left. After every removal below a node,
//! a child that fell under `min` items is fixed up by merging it with a
//! sibling, or by rotating one item through the parent from the larger
//! sibling.

use std::mem;
use std::sync::Arc;

use crate::ksearch::PathHint;
use crate::node::Node;
use crate::ordering::Less;
use crate::tracing_helpers::{debug_log, trace_log};

use super::{BTree, Ctx};

impl<T: Clone, C: Less<T>> Ctx<T, C> {
    /// Remove the item equal to `key` from the subtree at `slot`, or its
    /// maximum when `key` is `None`.
    pub(super) fn node_delete(
        &self,
        slot: &mut Arc<Node<T>>,
        key: Option<&T>,
        mut hint: Option<&mut PathHint>,
        depth: usize,
    ) -> Option<T> {
        let n: &mut Node<T> = self.iso_load(slot);
        let (mut i, found) = match key {
            None => (n.items.len() - 1, true),
            Some(key) => {
                let pos = self.find(n, key, hint.as_deref_mut(), depth);
                (pos.index, pos.found)
            }
        };

        let Some(children) = n.children.as_mut() else {
            if !found {
                return None;
            }
            n.count -= 1;
            return Some(n.items.remove(i));
        };

        let prev: T = if !found {
            self.node_delete(&mut children[i], key, hint, depth + 1)?
        } else if key.is_none() {
            // The maximum of an internal node lives in its last subtree.
            i += 1;
            self.node_delete(&mut children[i], None, None, 0)?
        } else {
            let Some(pred) = self.node_delete(&mut children[i], None, None, 0) else {
                unreachable!("non-empty subtree has no maximum");
            };
            mem::replace(&mut n.items[i], pred)
        };

        n.count -= 1;
        if children[i].items.len() < self.min {
            self.rebalance(n, i);
        }
        Some(prev)
    }

    /// Restore the minimum-occupancy invariant of child `i` of `n`.
    fn rebalance(&self, n: &mut Node<T>, mut i: usize) {
        if i == n.items.len() {
            i -= 1;
        }

        let Some(children) = n.children.as_mut() else {
            unreachable!("rebalance on a leaf");
        };
        let (lo, hi) = children.split_at_mut(i + 1);
        let left: &mut Node<T> = self.iso_load(&mut lo[i]);
        let right: &mut Node<T> = self.iso_load(&mut hi[0]);

        if left.items.len() + right.items.len() < self.max {
            // merge (left, separator, right) into left
            left.items.push(n.items.remove(i));
            left.items.append(&mut right.items);
            if let (Some(lc), Some(rc)) = (left.children.as_mut(), right.children.as_mut()) {
                lc.append(rc);
            }
            left.count += right.count + 1;
            trace_log!(index = i, len = left.items.len(), "merge children");

            children.remove(i + 1);
        } else if left.items.len() > right.items.len() {
            // rotate left -> right
            let Some(moved) = left.items.pop() else {
                unreachable!("rotation from an empty sibling");
            };
            right.items.insert(0, mem::replace(&mut n.items[i], moved));
            left.count -= 1;
            right.count += 1;

            if let (Some(lc), Some(rc)) = (left.children.as_mut(), right.children.as_mut()) {
                let Some(child) = lc.pop() else {
                    unreachable!("rotation from a childless sibling");
                };
                left.count -= child.count;
                right.count += child.count;
                rc.insert(0, child);
            }
            trace_log!(index = i, "rotate right");
        } else {
            // rotate left <- right
            if right.items.is_empty() {
                unreachable!("rotation from an empty sibling");
            }
            left.items.push(mem::replace(&mut n.items[i], right.items.remove(0)));
            left.count += 1;
            right.count -= 1;

            if let (Some(lc), Some(rc)) = (left.children.as_mut(), right.children.as_mut()) {
                let child: Arc<Node<T>> = rc.remove(0);
                left.count += child.count;
                right.count -= child.count;
                lc.push(child);
            }
            trace_log!(index = i, "rotate left");
        }
    }
}

impl<T: Clone, C: Less<T>> BTree<T, C> {
    /// Remove and return the item equal to `key`.
    ///
    /// ```rust
    /// use isobtree::BTree;
    ///
    /// let mut tree: BTree<u32> = (0..10).collect();
    /// assert_eq!(tree.remove(&3), Some(3));
    /// assert_eq!(tree.remove(&3), None);
    /// assert_eq!(tree.len(), 9);
    /// ```
    pub fn remove(&mut self, key: &T) -> Option<T> {
        self.remove_inner(key, None)
    }

    /// [`remove`](Self::remove) with a path hint.
    pub fn remove_hint(&mut self, key: &T, hint: &mut PathHint) -> Option<T> {
        self.remove_inner(key, Some(hint))
    }

    pub(super) fn remove_inner(&mut self, key: &T, hint: Option<&mut PathHint>) -> Option<T> {
        let root: &mut Arc<Node<T>> = self.root.as_mut()?;
        let prev: T = self.ctx.node_delete(root, Some(key), hint, 0)?;

        if root.items.is_empty() && !root.is_leaf() {
            let child = self.ctx.iso_load(root).children.as_mut().and_then(Vec::pop);
            if let Some(child) = child {
                *root = child;
                debug_log!(height = self.height(), "root collapse");
            }
        }

        self.count -= 1;
        if self.count == 0 {
            self.root = None;
        }
        Some(prev)
    }

    /// Remove and return the minimum item.
    pub fn pop_first(&mut self) -> Option<T> {
        self.pop_edge(Edge::First)
    }

    /// Remove and return the maximum item.
    pub fn pop_last(&mut self) -> Option<T> {
        self.pop_edge(Edge::Last)
    }

    /// Remove an end item, taking it straight from its leaf when that
    /// cannot underflow, and through [`remove`](Self::remove) otherwise.
    fn pop_edge(&mut self, edge: Edge) -> Option<T> {
        let ctx: &Ctx<T, C> = &self.ctx;
        let root: &mut Arc<Node<T>> = self.root.as_mut()?;

        let mut n: &mut Node<T> = ctx.iso_load(root);
        loop {
            // optimistic
            n.count -= 1;
            if n.is_leaf() {
                break;
            }
            let i: usize = edge.child(n);
            n = ctx.iso_load(n.child_slot(i));
        }

        let i: usize = edge.item(n);
        if n.items.len() != ctx.min {
            let item: T = n.items.remove(i);
            self.count -= 1;
            if self.count == 0 {
                self.root = None;
            }
            return Some(item);
        }
        let key: T = n.items[i].clone();

        // Revert the counts and take the rebalancing path.
        let mut n: &mut Node<T> = ctx.iso_load(root);
        loop {
            n.count += 1;
            if n.is_leaf() {
                break;
            }
            let i: usize = edge.child(n);
            n = ctx.iso_load(n.child_slot(i));
        }

        trace_log!("pop fell back to remove");
        self.remove_inner(&key, None)
    }
}

/// Which end of the tree `pop_edge` works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    First,
    Last,
}

impl Edge {
    #[inline(always)]
    fn child<T>(self, n: &Node<T>) -> usize {
        match self {
            Self::First => 0,
            Self::Last => n.items.len(),
        }
    }

    #[inline(always)]
    fn item<T>(self, n: &Node<T>) -> usize {
        match self {
            Self::First => 0,
            Self::Last => n.items.len() - 1,
        }
    }
}
