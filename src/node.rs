//! Tree nodes.
//!
//! A node is a sorted run of at most `max` items. Internal nodes carry one
//! more child than items; leaves carry none. Every node caches the number
//! of items in its subtree, which makes rank access logarithmic.
//!
//! Children are held in [`Arc`] so that trees produced by
//! [`BTree::iso_copy`](crate::BTree::iso_copy) can share subtrees. Whether
//! a node may be written in place is decided by its [`IsoId`], not by the
//! reference count: see [`crate::isoid`].

use std::fmt as StdFmt;
use std::sync::Arc;

use crate::isoid::IsoId;

// ============================================================================
//  CopyHook
// ============================================================================

/// How items are copied when a shared node is duplicated.
pub enum CopyHook<T> {
    /// Copy items with `Clone`.
    Shallow,

    /// Copy items with the given function, typically
    /// [`IsoCopy::iso_copy`](crate::IsoCopy::iso_copy).
    Isolating(fn(&T) -> T),
}

impl<T> CopyHook<T> {
    /// Copy one item.
    #[inline]
    pub fn copy(&self, item: &T) -> T
    where
        T: Clone,
    {
        match self {
            Self::Shallow => item.clone(),
            Self::Isolating(copy) => copy(item),
        }
    }
}

impl<T> Clone for CopyHook<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CopyHook<T> {}

impl<T> Default for CopyHook<T> {
    fn default() -> Self {
        Self::Shallow
    }
}

impl<T> StdFmt::Debug for CopyHook<T> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        match self {
            Self::Shallow => write!(f, "Shallow"),
            Self::Isolating(_) => write!(f, "Isolating"),
        }
    }
}

// ============================================================================
//  Node
// ============================================================================

/// A B-tree node.
pub struct Node<T> {
    /// Tree that owns this node exclusively.
    pub(crate) isoid: IsoId,

    /// Items in this subtree.
    pub(crate) count: usize,

    /// Sorted items.
    pub(crate) items: Vec<T>,

    /// `None` for a leaf, otherwise `items.len() + 1` children.
    pub(crate) children: Option<Vec<Arc<Node<T>>>>,
}

/// Where a rank lands within one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RankStep {
    /// The item at this position of the current node.
    Item(usize),

    /// Descend into child `.0` with remaining rank `.1`.
    Child(usize, usize),
}

impl<T> Node<T> {
    /// Create an empty leaf owned by `isoid`.
    #[must_use]
    pub(crate) const fn new_leaf(isoid: IsoId) -> Self {
        Self {
            isoid,
            count: 0,
            items: Vec::new(),
            children: None,
        }
    }

    /// Create an empty internal node owned by `isoid`.
    #[must_use]
    pub(crate) const fn new_internal(isoid: IsoId) -> Self {
        Self {
            isoid,
            count: 0,
            items: Vec::new(),
            children: Some(Vec::new()),
        }
    }

    /// Tree id this node is stamped with.
    #[must_use]
    #[inline(always)]
    pub const fn isoid(&self) -> IsoId {
        self.isoid
    }

    /// Number of items in this subtree.
    #[must_use]
    #[inline(always)]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// This node's own items.
    #[must_use]
    #[inline(always)]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Child nodes; empty for a leaf.
    #[must_use]
    #[inline(always)]
    pub fn children(&self) -> &[Arc<Self>] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Whether this node has no children.
    #[must_use]
    #[inline(always)]
    pub const fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Mutable access to child slot `i`.
    ///
    /// # Panics
    ///
    /// Panics if called on a leaf.
    #[inline]
    pub(crate) fn child_slot(&mut self, i: usize) -> &mut Arc<Self> {
        match &mut self.children {
            Some(children) => &mut children[i],
            None => unreachable!("child_slot on a leaf"),
        }
    }

    /// Recompute the cached subtree count from items and children.
    pub(crate) fn update_count(&mut self) {
        self.count = self.items.len() + self.children().iter().map(|c| c.count).sum::<usize>();
    }

    /// Split at `max / 2`.
    ///
    /// The median is removed and returned along with a new right sibling
    /// holding everything after it. `self` keeps everything before it.
    pub(crate) fn split(&mut self, isoid: IsoId, max: usize) -> (T, Self) {
        let i: usize = max / 2;

        let right_items: Vec<T> = self.items.drain(i + 1..).collect();
        let right_children: Option<Vec<Arc<Self>>> = self
            .children
            .as_mut()
            .map(|children| children.drain(i + 1..).collect());

        let Some(median) = self.items.pop() else {
            unreachable!("split of an empty node");
        };

        let mut right = Self {
            isoid,
            count: 0,
            items: right_items,
            children: right_children,
        };
        right.update_count();
        self.update_count();

        (median, right)
    }

    /// Locate the item of rank `index` within this subtree, one level at
    /// a time.
    ///
    /// `index` must be below `self.count`.
    pub(crate) fn rank_step(&self, mut index: usize) -> RankStep {
        let Some(children) = &self.children else {
            return RankStep::Item(index);
        };

        for (i, child) in children.iter().enumerate().take(self.items.len()) {
            if index < child.count {
                return RankStep::Child(i, index);
            }
            if index == child.count {
                return RankStep::Item(i);
            }
            index -= child.count + 1;
        }

        RankStep::Child(self.items.len(), index)
    }
}

impl<T: Clone> Node<T> {
    /// Duplicate this node for the tree identified by `isoid`.
    ///
    /// Items are copied through `hook`; children are shared, not copied.
    #[must_use]
    pub(crate) fn duplicate(&self, isoid: IsoId, hook: CopyHook<T>) -> Self {
        let items: Vec<T> = self.items.iter().map(|item| hook.copy(item)).collect();
        let children: Option<Vec<Arc<Self>>> = self.children.clone();

        Self {
            isoid,
            count: self.count,
            items,
            children,
        }
    }
}

/// Plain structural clone, keeping the owner tag.
///
/// Only reached through `Arc::make_mut` on a node that is stamped with the
/// mutating tree's id yet is still referenced elsewhere.
impl<T: Clone> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self {
            isoid: self.isoid,
            count: self.count,
            items: self.items.clone(),
            children: self.children.clone(),
        }
    }
}

impl<T: StdFmt::Debug> StdFmt::Debug for Node<T> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("Node")
            .field("isoid", &self.isoid)
            .field("count", &self.count)
            .field("items", &self.items)
            .field("children", &self.children().len())
            .finish()
    }
}
