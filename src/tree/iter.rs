//! Borrowing in-order iterator.

use std::fmt as StdFmt;
use std::iter::FusedIterator;

use crate::node::Node;

use super::BTree;

/// Ascending iterator over a [`BTree`], created by [`BTree::iter`].
///
/// Holds the path from the root to the next item: each entry is a node and
/// the index of its next unvisited item.
pub struct Iter<'a, T> {
    stack: Vec<(&'a Node<T>, usize)>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    fn new(root: Option<&'a Node<T>>, len: usize) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            remaining: len,
        };
        if let Some(root) = root {
            iter.push_left(root);
        }
        iter
    }

    /// Push `n` and its leftmost descendants.
    fn push_left(&mut self, mut n: &'a Node<T>) {
        loop {
            self.stack.push((n, 0));
            match n.children().first() {
                Some(child) => n = child,
                None => break,
            }
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            let (node, next) = self.stack.last_mut()?;
            let node: &'a Node<T> = *node;
            if *next < node.items.len() {
                let i: usize = *next;
                *next += 1;
                if let Some(child) = node.children().get(i + 1) {
                    self.push_left(child);
                }
                self.remaining -= 1;
                return Some(&node.items[i]);
            }
            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

impl<T> StdFmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("Iter")
            .field("depth", &self.stack.len())
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<T, C> BTree<T, C> {
    /// Iterate over the items in ascending order.
    ///
    /// ```rust
    /// use isobtree::BTree;
    ///
    /// let tree: BTree<u32> = [3, 1, 2].into_iter().collect();
    /// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.root.as_deref(), self.count)
    }
}

impl<'a, T, C> IntoIterator for &'a BTree<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
