//! Filepath: src/tree/traverse.rs
//!
//! In-order traversals.
//!
//! Every visitor returns `true` to keep going. Returning `false` stops the
//! walk immediately; nothing after that item is visited.
//!
//! The read-only traversals borrow the tree. The `_mut` variants load each
//! visited node for writing first, so they copy shared nodes exactly like
//! an insert would, and never expose another snapshot's items.

use std::slice;
use std::sync::Arc;

use crate::ksearch;
use crate::node::Node;
use crate::ordering::Less;

use super::{BTree, Ctx};

// ============================================================================
//  Read-only node walks
// ============================================================================

fn scan_node<T, F>(n: &Node<T>, f: &mut F) -> bool
where
    F: FnMut(&T) -> bool,
{
    let Some((last, rest)) = n.children().split_last() else {
        return n.items.iter().all(|item| f(item));
    };
    for (item, child) in n.items.iter().zip(rest) {
        if !scan_node(child, f) || !f(item) {
            return false;
        }
    }
    scan_node(last, f)
}

fn reverse_node<T, F>(n: &Node<T>, f: &mut F) -> bool
where
    F: FnMut(&T) -> bool,
{
    let Some((last, rest)) = n.children().split_last() else {
        return n.items.iter().rev().all(|item| f(item));
    };
    if !reverse_node(last, f) {
        return false;
    }
    for (item, child) in n.items.iter().zip(rest).rev() {
        if !f(item) || !reverse_node(child, f) {
            return false;
        }
    }
    true
}

fn walk_node<T, F>(n: &Node<T>, f: &mut F) -> bool
where
    F: FnMut(&[T]) -> bool,
{
    let Some((last, rest)) = n.children().split_last() else {
        return f(&n.items);
    };
    for (item, child) in n.items.iter().zip(rest) {
        if !walk_node(child, f) || !f(slice::from_ref(item)) {
            return false;
        }
    }
    walk_node(last, f)
}

impl<T, C: Less<T>> Ctx<T, C> {
    /// Visit items `>= pivot` in ascending order.
    fn ascend_node<F>(&self, n: &Node<T>, pivot: &T, f: &mut F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        let pos = ksearch::bsearch(&self.less, &n.items, pivot);
        let Some((_, rest)) = n.children().split_first() else {
            return n.items[pos.index..].iter().all(|item| f(item));
        };

        // Everything in the child left of an exact match sorts below it.
        if !pos.found && !self.ascend_node(&n.children()[pos.index], pivot, f) {
            return false;
        }
        for (item, child) in n.items[pos.index..].iter().zip(&rest[pos.index..]) {
            if !f(item) || !scan_node(child, f) {
                return false;
            }
        }
        true
    }

    /// Visit items `<= pivot` in descending order.
    fn descend_node<F>(&self, n: &Node<T>, pivot: &T, f: &mut F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        let pos = ksearch::bsearch(&self.less, &n.items, pivot);
        let end: usize = pos.index + usize::from(pos.found);
        let children: &[Arc<Node<T>>] = n.children();
        if children.is_empty() {
            return n.items[..end].iter().rev().all(|item| f(item));
        }

        if !pos.found && !self.descend_node(&children[pos.index], pivot, f) {
            return false;
        }
        for (item, child) in n.items[..end].iter().zip(&children[..end]).rev() {
            if !f(item) || !reverse_node(child, f) {
                return false;
            }
        }
        true
    }
}

// ============================================================================
//  Copy-on-write node walks
// ============================================================================

impl<T: Clone, C> Ctx<T, C> {
    fn scan_mut_node<F>(&self, slot: &mut Arc<Node<T>>, f: &mut F) -> bool
    where
        F: FnMut(&mut T) -> bool,
    {
        let n: &mut Node<T> = self.iso_load(slot);
        let Some((last, rest)) = n.children.as_mut().and_then(|c| c.split_last_mut()) else {
            return n.items.iter_mut().all(|item| f(item));
        };
        for (item, child) in n.items.iter_mut().zip(rest) {
            if !self.scan_mut_node(child, f) || !f(item) {
                return false;
            }
        }
        self.scan_mut_node(last, f)
    }

    fn reverse_mut_node<F>(&self, slot: &mut Arc<Node<T>>, f: &mut F) -> bool
    where
        F: FnMut(&mut T) -> bool,
    {
        let n: &mut Node<T> = self.iso_load(slot);
        let Some((last, rest)) = n.children.as_mut().and_then(|c| c.split_last_mut()) else {
            return n.items.iter_mut().rev().all(|item| f(item));
        };
        if !self.reverse_mut_node(last, f) {
            return false;
        }
        for (item, child) in n.items.iter_mut().zip(rest).rev() {
            if !f(item) || !self.reverse_mut_node(child, f) {
                return false;
            }
        }
        true
    }

    fn walk_mut_node<F>(&self, slot: &mut Arc<Node<T>>, f: &mut F) -> bool
    where
        F: FnMut(&mut [T]) -> bool,
    {
        let n: &mut Node<T> = self.iso_load(slot);
        let Some((last, rest)) = n.children.as_mut().and_then(|c| c.split_last_mut()) else {
            return f(&mut n.items);
        };
        for (item, child) in n.items.iter_mut().zip(rest) {
            if !self.walk_mut_node(child, f) || !f(slice::from_mut(item)) {
                return false;
            }
        }
        self.walk_mut_node(last, f)
    }

    fn collect_mut_node<'a>(&self, slot: &'a mut Arc<Node<T>>, out: &mut Vec<&'a mut T>) {
        let n: &'a mut Node<T> = self.iso_load(slot);
        let Some((last, rest)) = n.children.as_mut().and_then(|c| c.split_last_mut()) else {
            out.extend(n.items.iter_mut());
            return;
        };
        for (item, child) in n.items.iter_mut().zip(rest) {
            self.collect_mut_node(child, out);
            out.push(item);
        }
        self.collect_mut_node(last, out);
    }
}

impl<T: Clone, C: Less<T>> Ctx<T, C> {
    fn ascend_mut_node<F>(&self, slot: &mut Arc<Node<T>>, pivot: &T, f: &mut F) -> bool
    where
        F: FnMut(&mut T) -> bool,
    {
        let n: &mut Node<T> = self.iso_load(slot);
        let pos = ksearch::bsearch(&self.less, &n.items, pivot);
        let Some(children) = n.children.as_mut() else {
            return n.items[pos.index..].iter_mut().all(|item| f(item));
        };

        if !pos.found && !self.ascend_mut_node(&mut children[pos.index], pivot, f) {
            return false;
        }
        let rest = &mut children[pos.index + 1..];
        for (item, child) in n.items[pos.index..].iter_mut().zip(rest) {
            if !f(item) || !self.scan_mut_node(child, f) {
                return false;
            }
        }
        true
    }

    fn descend_mut_node<F>(&self, slot: &mut Arc<Node<T>>, pivot: &T, f: &mut F) -> bool
    where
        F: FnMut(&mut T) -> bool,
    {
        let n: &mut Node<T> = self.iso_load(slot);
        let pos = ksearch::bsearch(&self.less, &n.items, pivot);
        let end: usize = pos.index + usize::from(pos.found);
        let Some(children) = n.children.as_mut() else {
            return n.items[..end].iter_mut().rev().all(|item| f(item));
        };

        if !pos.found && !self.descend_mut_node(&mut children[pos.index], pivot, f) {
            return false;
        }
        for (item, child) in n.items[..end].iter_mut().zip(&mut children[..end]).rev() {
            if !f(item) || !self.reverse_mut_node(child, f) {
                return false;
            }
        }
        true
    }
}

// ============================================================================
//  BTree: read-only traversals
// ============================================================================

impl<T, C> BTree<T, C> {
    /// Visit every item in ascending order.
    pub fn scan<F>(&self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        if let Some(root) = self.root.as_deref() {
            scan_node(root, &mut f);
        }
    }

    /// Visit every item in descending order.
    pub fn reverse_scan<F>(&self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        if let Some(root) = self.root.as_deref() {
            reverse_node(root, &mut f);
        }
    }

    /// Visit items a node at a time, in ascending order.
    ///
    /// Each call receives either a whole leaf's items or a single
    /// separator from an internal node.
    pub fn walk<F>(&self, mut f: F)
    where
        F: FnMut(&[T]) -> bool,
    {
        if let Some(root) = self.root.as_deref() {
            walk_node(root, &mut f);
        }
    }

    /// The minimum item.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        let mut n: &Node<T> = self.root.as_deref()?;
        while let Some(child) = n.children().first() {
            n = child;
        }
        n.items.first()
    }

    /// The maximum item.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        let mut n: &Node<T> = self.root.as_deref()?;
        while let Some(child) = n.children().last() {
            n = child;
        }
        n.items.last()
    }

    /// All items in ascending order.
    #[must_use]
    pub fn values(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut out: Vec<T> = Vec::with_capacity(self.count);
        self.scan(|item| {
            out.push(item.clone());
            true
        });
        out
    }
}

impl<T, C: Less<T>> BTree<T, C> {
    /// Visit items `>= pivot` in ascending order; every item if `pivot` is
    /// `None`.
    ///
    /// ```rust
    /// use isobtree::BTree;
    ///
    /// let tree: BTree<u32> = (0..10).collect();
    /// let mut seen = Vec::new();
    /// tree.ascend(Some(&7), |x| {
    ///     seen.push(*x);
    ///     true
    /// });
    /// assert_eq!(seen, [7, 8, 9]);
    /// ```
    pub fn ascend<F>(&self, pivot: Option<&T>, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        let Some(root) = self.root.as_deref() else {
            return;
        };
        match pivot {
            None => {
                scan_node(root, &mut f);
            }
            Some(pivot) => {
                self.ctx.ascend_node(root, pivot, &mut f);
            }
        }
    }

    /// Visit items `<= pivot` in descending order; every item if `pivot`
    /// is `None`.
    pub fn descend<F>(&self, pivot: Option<&T>, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        let Some(root) = self.root.as_deref() else {
            return;
        };
        match pivot {
            None => {
                reverse_node(root, &mut f);
            }
            Some(pivot) => {
                self.ctx.descend_node(root, pivot, &mut f);
            }
        }
    }

    /// Visit items in `[start, end)` in ascending order.
    ///
    /// ```rust
    /// use isobtree::BTree;
    ///
    /// let tree: BTree<&str> = ["a", "ab", "aba", "abc", "ac", "b"].into_iter().collect();
    /// let mut seen = Vec::new();
    /// tree.ascend_range(&"ab", &"ac", |s| {
    ///     seen.push(*s);
    ///     true
    /// });
    /// assert_eq!(seen, ["ab", "aba", "abc"]);
    /// ```
    pub fn ascend_range<F>(&self, start: &T, end: &T, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        let less: &C = &self.ctx.less;
        self.ascend(Some(start), |item| less.less(item, end) && f(item));
    }
}

// ============================================================================
//  BTree: copy-on-write traversals
// ============================================================================

impl<T: Clone, C> BTree<T, C> {
    /// [`scan`](Self::scan) with mutable access to each item.
    ///
    /// Visited nodes become exclusive to this tree. The visitor must not
    /// change an item's ordering.
    pub fn scan_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        if let Some(root) = self.root.as_mut() {
            self.ctx.scan_mut_node(root, &mut f);
        }
    }

    /// [`reverse_scan`](Self::reverse_scan) with mutable access to each
    /// item.
    pub fn reverse_scan_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        if let Some(root) = self.root.as_mut() {
            self.ctx.reverse_mut_node(root, &mut f);
        }
    }

    /// [`walk`](Self::walk) with mutable access to each run.
    pub fn walk_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut [T]) -> bool,
    {
        if let Some(root) = self.root.as_mut() {
            self.ctx.walk_mut_node(root, &mut f);
        }
    }

    /// Mutable access to the minimum item.
    pub fn first_mut(&mut self) -> Option<&mut T> {
        let ctx: &Ctx<T, C> = &self.ctx;
        let mut n: &mut Node<T> = ctx.iso_load(self.root.as_mut()?);
        while !n.is_leaf() {
            n = ctx.iso_load(n.child_slot(0));
        }
        n.items.first_mut()
    }

    /// Mutable access to the maximum item.
    pub fn last_mut(&mut self) -> Option<&mut T> {
        let ctx: &Ctx<T, C> = &self.ctx;
        let mut n: &mut Node<T> = ctx.iso_load(self.root.as_mut()?);
        while !n.is_leaf() {
            let last: usize = n.items.len();
            n = ctx.iso_load(n.child_slot(last));
        }
        n.items.last_mut()
    }

    /// Mutable references to every item, in ascending order.
    ///
    /// Makes the whole tree exclusive to this snapshot.
    pub fn values_mut(&mut self) -> Vec<&mut T> {
        let mut out: Vec<&mut T> = Vec::with_capacity(self.count);
        if let Some(root) = self.root.as_mut() {
            self.ctx.collect_mut_node(root, &mut out);
        }
        out
    }
}

impl<T: Clone, C: Less<T>> BTree<T, C> {
    /// [`ascend`](Self::ascend) with mutable access to each item.
    pub fn ascend_mut<F>(&mut self, pivot: Option<&T>, mut f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        let Some(root) = self.root.as_mut() else {
            return;
        };
        match pivot {
            None => {
                self.ctx.scan_mut_node(root, &mut f);
            }
            Some(pivot) => {
                self.ctx.ascend_mut_node(root, pivot, &mut f);
            }
        }
    }

    /// [`descend`](Self::descend) with mutable access to each item.
    pub fn descend_mut<F>(&mut self, pivot: Option<&T>, mut f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        let Some(root) = self.root.as_mut() else {
            return;
        };
        match pivot {
            None => {
                self.ctx.reverse_mut_node(root, &mut f);
            }
            Some(pivot) => {
                self.ctx.descend_mut_node(root, pivot, &mut f);
            }
        }
    }
}
