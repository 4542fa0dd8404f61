//! Filepath: src/tree.rs
//! `BTree` - an in-memory B-tree with copy-on-write snapshots.
//!
//! This module provides the tree engine [`BTree`] and its lock-guarded
//! counterpart [`SyncBTree`]. Operations are split across submodules:
//!
//! - `insert`: upsert with split, bulk load
//! - `remove`: delete with rebalance, pop first/last
//! - `rank`: access and removal by sorted position
//! - `traverse`: scans, pivoted ascend/descend, walk, min/max
//! - `iter`: borrowing in-order iterator
//! - `validate`: structural invariant checks
//! - `locked`: reader/writer-lock wrapper

use std::fmt as StdFmt;
use std::sync::Arc;

use crate::isoid::{IsoCopy, IsoId};
use crate::ksearch::{self, PathHint, SearchPosition};
use crate::node::{CopyHook, Node};
use crate::ordering::{Less, Natural};
use crate::tracing_helpers::{debug_log, trace_log};

mod insert;
mod iter;
mod locked;
mod rank;
mod remove;
mod traverse;
mod validate;

pub use iter::Iter;
pub use locked::SyncBTree;

/// Degree used when none (or zero) is given.
pub const DEFAULT_DEGREE: usize = 32;

/// Largest accepted degree; larger values are clamped to it.
pub const MAX_DEGREE: usize = usize::MAX / 4;

// ============================================================================
//  Options
// ============================================================================

/// Construction options for [`BTree`] and [`SyncBTree`].
///
/// The locking strategy is not an option but a type: use [`BTree`] for
/// unsynchronised access and [`SyncBTree`] for a reader/writer lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Branching factor. Nodes hold `degree - 1 ..= 2 * degree - 1` items
    /// (the root may hold fewer). `0` selects [`DEFAULT_DEGREE`]; `1` is
    /// raised to `2` and anything above [`MAX_DEGREE`] is clamped.
    pub degree: usize,
}

impl Options {
    /// Options with [`DEFAULT_DEGREE`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            degree: DEFAULT_DEGREE,
        }
    }

    /// Set the branching factor.
    #[must_use]
    pub const fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    /// `(min, max)` items per non-root node.
    #[must_use]
    pub const fn min_max(&self) -> (usize, usize) {
        let degree: usize = match self.degree {
            0 => DEFAULT_DEGREE,
            1 => 2,
            d if d > MAX_DEGREE => MAX_DEGREE,
            d => d,
        };
        let max: usize = degree * 2 - 1;
        (max / 2, max)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
//  Ctx
// ============================================================================

/// Everything a recursive descent needs besides the node it is on.
///
/// Kept apart from `root` so a descent can borrow both at once.
pub(crate) struct Ctx<T, C> {
    pub(crate) less: C,
    pub(crate) min: usize,
    pub(crate) max: usize,
    pub(crate) isoid: IsoId,
    pub(crate) copy_hook: CopyHook<T>,
}

impl<T, C: Clone> Clone for Ctx<T, C> {
    fn clone(&self) -> Self {
        Self {
            less: self.less.clone(),
            min: self.min,
            max: self.max,
            isoid: self.isoid,
            copy_hook: self.copy_hook,
        }
    }
}

impl<T, C: Less<T>> Ctx<T, C> {
    #[inline(always)]
    pub(crate) fn find(
        &self,
        n: &Node<T>,
        key: &T,
        hint: Option<&mut PathHint>,
        depth: usize,
    ) -> SearchPosition {
        ksearch::find(&self.less, &n.items, n.is_leaf(), key, hint, depth)
    }
}

impl<T: Clone, C> Ctx<T, C> {
    /// Load a node for writing, duplicating it first if another tree may
    /// still see it.
    #[inline]
    pub(crate) fn iso_load<'a>(&self, slot: &'a mut Arc<Node<T>>) -> &'a mut Node<T> {
        if slot.isoid != self.isoid {
            trace_log!(
                from = slot.isoid.get(),
                to = self.isoid.get(),
                items = slot.items.len(),
                "copy-on-write node"
            );
            let copy: Node<T> = slot.duplicate(self.isoid, self.copy_hook);
            *slot = Arc::new(copy);
        }
        Arc::make_mut(slot)
    }
}

// ============================================================================
//  BTree
// ============================================================================

/// An ordered collection of items kept in a B-tree.
///
/// Items are ordered by `C`, a [`Less`] relation. For `T: Ord` the default
/// [`Natural`] order is used by [`BTree::new`].
///
/// Reads take `&self`. Anything that may write a node takes `&mut self`,
/// including the `_mut` traversals and [`iso_copy`](Self::iso_copy).
///
/// # Example
///
/// ```rust
/// use isobtree::BTree;
///
/// let mut tree: BTree<&str> = BTree::new();
/// tree.insert("b");
/// tree.insert("a");
/// tree.insert("c");
///
/// let mut seen = Vec::new();
/// tree.scan(|item| {
///     seen.push(*item);
///     true
/// });
/// assert_eq!(seen, ["a", "b", "c"]);
/// ```
pub struct BTree<T, C = Natural> {
    /// `None` iff the tree is empty.
    pub(crate) root: Option<Arc<Node<T>>>,

    /// Total number of items.
    pub(crate) count: usize,

    pub(crate) ctx: Ctx<T, C>,
}

impl<T: Ord> BTree<T, Natural> {
    /// Create an empty tree in the natural order of `T`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(Natural, Options::default())
    }
}

impl<T: Ord> Default for BTree<T, Natural> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Less<T>> BTree<T, C> {
    /// Create an empty tree ordered by `less`.
    #[must_use]
    pub fn with_less(less: C) -> Self {
        Self::with_options(less, Options::default())
    }

    /// Create an empty tree ordered by `less` with the given options.
    #[must_use]
    pub fn with_options(less: C, options: Options) -> Self {
        let (min, max) = options.min_max();
        Self {
            root: None,
            count: 0,
            ctx: Ctx {
                less,
                min,
                max,
                isoid: IsoId::next(),
                copy_hook: CopyHook::Shallow,
            },
        }
    }

    /// Use `hook` to copy items when a shared node is duplicated.
    #[must_use]
    pub fn with_copy_hook(mut self, hook: CopyHook<T>) -> Self {
        self.ctx.copy_hook = hook;
        self
    }

    /// Copy items with [`IsoCopy::iso_copy`] when a shared node is
    /// duplicated.
    #[must_use]
    pub fn with_iso_copy_items(self) -> Self
    where
        T: IsoCopy,
    {
        self.with_copy_hook(CopyHook::Isolating(<T as IsoCopy>::iso_copy))
    }

    /// Look up the item equal to `key`.
    #[must_use]
    pub fn get(&self, key: &T) -> Option<&T> {
        self.get_inner(key, None)
    }

    /// Look up the item equal to `key`, using and updating `hint`.
    pub fn get_hint(&self, key: &T, hint: &mut PathHint) -> Option<&T> {
        self.get_inner(key, Some(hint))
    }

    /// Whether an item equal to `key` is present.
    #[must_use]
    pub fn contains(&self, key: &T) -> bool {
        self.get(key).is_some()
    }

    fn get_inner(&self, key: &T, mut hint: Option<&mut PathHint>) -> Option<&T> {
        let mut n: &Node<T> = self.root.as_deref()?;
        let mut depth: usize = 0;
        loop {
            let pos = self.ctx.find(n, key, hint.as_deref_mut(), depth);
            if pos.found {
                return Some(&n.items[pos.index]);
            }
            n = n.children().get(pos.index).map(Arc::as_ref)?;
            depth += 1;
        }
    }
}

impl<T: Clone, C: Less<T>> BTree<T, C> {
    /// Look up the item equal to `key` for in-place modification.
    ///
    /// Nodes on the path are made exclusive to this tree first, so other
    /// snapshots never see the change. The item's ordering must not be
    /// changed through the returned reference.
    pub fn get_mut(&mut self, key: &T) -> Option<&mut T> {
        self.get_mut_inner(key, None)
    }

    /// [`get_mut`](Self::get_mut) with a path hint.
    pub fn get_mut_hint(&mut self, key: &T, hint: &mut PathHint) -> Option<&mut T> {
        self.get_mut_inner(key, Some(hint))
    }

    fn get_mut_inner(&mut self, key: &T, mut hint: Option<&mut PathHint>) -> Option<&mut T> {
        let ctx = &self.ctx;
        let mut n: &mut Node<T> = ctx.iso_load(self.root.as_mut()?);
        let mut depth: usize = 0;
        loop {
            let pos = ctx.find(n, key, hint.as_deref_mut(), depth);
            if pos.found {
                return Some(&mut n.items[pos.index]);
            }
            if n.is_leaf() {
                return None;
            }
            n = ctx.iso_load(n.child_slot(pos.index));
            depth += 1;
        }
    }
}

impl<T, C> BTree<T, C> {
    /// Number of items.
    #[must_use]
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Whether the tree holds no items.
    #[must_use]
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of levels; zero for an empty tree.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height: usize = 0;
        let mut n: Option<&Node<T>> = self.root.as_deref();
        while let Some(node) = n {
            height += 1;
            n = node.children().first().map(Arc::as_ref);
        }
        height
    }

    /// Remove every item.
    ///
    /// Nodes still shared with other trees stay alive in those trees.
    pub fn clear(&mut self) {
        self.root = None;
        self.count = 0;
    }

    /// Normalised branching factor.
    #[must_use]
    #[inline(always)]
    pub const fn degree(&self) -> usize {
        (self.ctx.max + 1) / 2
    }

    /// Minimum items per non-root node.
    #[must_use]
    #[inline(always)]
    pub const fn min_items(&self) -> usize {
        self.ctx.min
    }

    /// Maximum items per node.
    #[must_use]
    #[inline(always)]
    pub const fn max_items(&self) -> usize {
        self.ctx.max
    }

    /// This tree's isolation id.
    #[must_use]
    #[inline(always)]
    pub const fn isoid(&self) -> IsoId {
        self.ctx.isoid
    }

    /// Root node, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Node<T>> {
        self.root.as_deref()
    }

    /// Wrap this tree in a reader/writer lock.
    #[must_use]
    pub fn into_sync(self) -> SyncBTree<T, C> {
        SyncBTree::from(self)
    }

    /// Take an O(1) snapshot.
    ///
    /// Both trees get fresh isolation ids and share every existing node.
    /// Each duplicates only the nodes it later writes, so neither ever
    /// observes the other's changes.
    ///
    /// ```rust
    /// use isobtree::BTree;
    ///
    /// let mut a: BTree<u32> = (0..1_000).collect();
    /// let mut b = a.iso_copy();
    ///
    /// b.remove(&7);
    /// a.insert(5_000);
    ///
    /// assert!(a.contains(&7));
    /// assert!(!b.contains(&5_000));
    /// ```
    #[must_use]
    pub fn iso_copy(&mut self) -> Self
    where
        C: Clone,
    {
        // Re-tag the source too: nodes it owned so far are now shared.
        self.ctx.isoid = IsoId::next();

        let mut ctx: Ctx<T, C> = self.ctx.clone();
        ctx.isoid = IsoId::next();

        debug_log!(
            source = self.ctx.isoid.get(),
            copy = ctx.isoid.get(),
            len = self.count,
            "iso copy"
        );

        Self {
            root: self.root.clone(),
            count: self.count,
            ctx,
        }
    }
}

impl<T, C> StdFmt::Debug for BTree<T, C> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("BTree")
            .field("len", &self.count)
            .field("height", &self.height())
            .field("max_items", &self.ctx.max)
            .field("isoid", &self.ctx.isoid)
            .field("copy_hook", &self.ctx.copy_hook)
            .finish_non_exhaustive()
    }
}

impl<T: Ord + Clone> FromIterator<T> for BTree<T, Natural> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree: Self = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<T: Clone, C: Less<T>> Extend<T> for BTree<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

// ============================================================================
//  Tests
// ============================================================================

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Fail fast in tests")]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn small<T: Ord>() -> BTree<T> {
        BTree::with_options(Natural, Options::new().with_degree(2))
    }

    #[test]
    fn test_new_tree_is_empty() {
        let tree: BTree<u64> = BTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert!(tree.root().is_none());
    }

    #[test]
    fn test_get_on_empty_tree() {
        let tree: BTree<u64> = BTree::new();
        assert_eq!(tree.get(&1), None);
        assert!(!tree.contains(&1));
    }

    #[test]
    fn test_default_trait() {
        let tree: BTree<u64> = BTree::default();
        assert!(tree.is_empty());
        assert_eq!(tree.degree(), 32);
        assert_eq!(tree.max_items(), 63);
        assert_eq!(tree.min_items(), 31);
    }

    #[test]
    fn test_degree_normalisation() {
        assert_eq!(Options::new().with_degree(0).min_max(), (31, 63));
        assert_eq!(Options::new().with_degree(1).min_max(), (1, 3));
        assert_eq!(Options::new().with_degree(2).min_max(), (1, 3));
        assert_eq!(Options::new().with_degree(4).min_max(), (3, 7));
    }

    #[test]
    fn test_degree_is_clamped() {
        assert_eq!(
            Options::new().with_degree(usize::MAX).min_max(),
            (MAX_DEGREE - 1, MAX_DEGREE * 2 - 1)
        );
        let tree: BTree<u8> = BTree::with_options(Natural, Options::new().with_degree(usize::MAX));
        assert_eq!(tree.degree(), MAX_DEGREE);
    }

    #[test]
    fn test_huge_degree_allocates_on_demand() {
        let mut tree = BTree::with_options(Natural, Options::new().with_degree(1 << 40));
        for i in (0..1_000u32).rev() {
            tree.insert(i);
        }

        assert_eq!(tree.degree(), 1 << 40);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.get_at(999), Some(&999));

        let mut snap = tree.iso_copy();
        snap.remove(&500);
        assert_eq!(tree.len(), 1_000);
        assert_eq!(snap.len(), 999);
        tree.validate().unwrap();
        snap.validate().unwrap();
    }

    #[test]
    fn test_get_after_insert() {
        let mut tree = small();
        for i in 0..100u64 {
            tree.insert(i * 3);
        }

        for i in 0..100u64 {
            assert_eq!(tree.get(&(i * 3)), Some(&(i * 3)));
            assert_eq!(tree.get(&(i * 3 + 1)), None);
        }
    }

    #[test]
    fn test_get_hint_matches_get() {
        let mut tree = small();
        for i in 0..500u64 {
            tree.insert(i);
        }

        let mut hint = PathHint::new();
        for i in (0..600u64).rev() {
            assert_eq!(tree.get_hint(&i, &mut hint), tree.get(&i), "key {i}");
        }
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut tree = BTree::with_less(|a: &(u32, u32), b: &(u32, u32)| a.0 < b.0);
        for i in 0..50 {
            tree.insert((i, 0));
        }

        tree.get_mut(&(17, 0)).unwrap().1 = 99;

        assert_eq!(tree.get(&(17, 0)), Some(&(17, 99)));
        assert!(tree.get_mut(&(70, 0)).is_none());
    }

    #[test]
    fn test_get_mut_hint_on_snapshot() {
        let less = |a: &(u32, u32), b: &(u32, u32)| a.0 < b.0;
        let mut a = BTree::with_options(less, Options::new().with_degree(2));
        for i in 0..300 {
            a.insert((i, 0));
        }

        let mut b = a.iso_copy();
        let mut hint = PathHint::new();
        for i in (0..300).step_by(7) {
            b.get_mut_hint(&(i, 0), &mut hint).unwrap().1 = i + 1;
        }
        assert!(b.get_mut_hint(&(300, 0), &mut hint).is_none());

        a.scan(|x| {
            assert_eq!(x.1, 0);
            true
        });
        b.scan(|x| {
            let expected = if x.0 % 7 == 0 { x.0 + 1 } else { 0 };
            assert_eq!(x.1, expected, "item {}", x.0);
            true
        });
        a.validate().unwrap();
        b.validate().unwrap();
    }

    #[test]
    fn test_height_grows_with_splits() {
        let mut tree = small();
        tree.insert(1u32);
        assert_eq!(tree.height(), 1);

        for i in 2..=4u32 {
            tree.insert(i);
        }
        assert_eq!(tree.height(), 2);

        for i in 5..1_000u32 {
            tree.insert(i);
        }
        assert!(tree.height() > 3);
        tree.validate().unwrap();
    }

    #[test]
    fn test_clear() {
        let mut tree: BTree<u32> = (0..100).collect();
        tree.clear();

        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.get(&5), None);

        tree.insert(5);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_iso_copy_retags_both_trees() {
        let mut a: BTree<u32> = (0..10).collect();
        let before = a.isoid();

        let b = a.iso_copy();

        assert_ne!(a.isoid(), before);
        assert_ne!(b.isoid(), before);
        assert_ne!(a.isoid(), b.isoid());
        assert!(Arc::ptr_eq(a.root.as_ref().unwrap(), b.root.as_ref().unwrap()));
    }

    #[test]
    fn test_iso_copy_isolates_writes() {
        let mut a = small();
        for i in 0..200u32 {
            a.insert(i);
        }

        let mut b = a.iso_copy();
        b.remove(&50);
        b.insert(1_000);
        a.insert(2_000);

        assert!(a.contains(&50));
        assert!(!a.contains(&1_000));
        assert!(!b.contains(&50));
        assert!(!b.contains(&2_000));
        assert_eq!(a.len(), 201);
        assert_eq!(b.len(), 200);
        a.validate().unwrap();
        b.validate().unwrap();
    }

    #[test]
    fn test_iso_copy_shares_untouched_subtrees() {
        let mut a = small();
        for i in 0..200u32 {
            a.insert(i);
        }

        let mut b = a.iso_copy();
        b.insert(10_000);

        let ra = a.root().unwrap();
        let rb = b.root().unwrap();
        assert!(!std::ptr::eq(ra, rb), "written root must be duplicated");
        assert!(Arc::ptr_eq(&ra.children()[0], &rb.children()[0]));
    }

    #[derive(Debug)]
    struct Cell(u32, Arc<Mutex<u32>>);

    impl Clone for Cell {
        fn clone(&self) -> Self {
            Self(self.0, Arc::clone(&self.1))
        }
    }

    impl IsoCopy for Cell {
        fn iso_copy(&self) -> Self {
            Self(self.0, Arc::new(Mutex::new(*self.1.lock().unwrap())))
        }
    }

    #[test]
    fn test_iso_copy_items_hook() {
        let less = |a: &Cell, b: &Cell| a.0 < b.0;
        let mut a = BTree::with_less(less).with_iso_copy_items();
        for i in 0..20 {
            a.insert(Cell(i, Arc::new(Mutex::new(i))));
        }

        let mut b = a.iso_copy();
        let key = Cell(3, Arc::new(Mutex::new(0)));
        *b.get_mut(&key).unwrap().1.lock().unwrap() = 300;

        assert_eq!(*a.get(&key).unwrap().1.lock().unwrap(), 3);
        assert_eq!(*b.get(&key).unwrap().1.lock().unwrap(), 300);
    }

    #[test]
    fn test_shallow_hook_shares_item_state() {
        let less = |a: &Cell, b: &Cell| a.0 < b.0;
        let mut a = BTree::with_less(less);
        a.insert(Cell(1, Arc::new(Mutex::new(1))));

        let mut b = a.iso_copy();
        let key = Cell(1, Arc::new(Mutex::new(0)));
        *b.get_mut(&key).unwrap().1.lock().unwrap() = 100;

        // Clone is shallow: the node was copied, the mutex was not.
        assert_eq!(*a.get(&key).unwrap().1.lock().unwrap(), 100);
    }

    #[test]
    fn test_custom_copy_hook_runs_on_duplication() {
        let less = |a: &(u32, u32), b: &(u32, u32)| a.0 < b.0;
        let bump: fn(&(u32, u32)) -> (u32, u32) = |x| (x.0, x.1 + 1);
        let mut a = BTree::with_less(less).with_copy_hook(CopyHook::Isolating(bump));
        for i in 0..10 {
            a.insert((i, 0));
        }

        // The single leaf is shared, so the first write copies every item.
        let mut b = a.iso_copy();
        b.get_mut(&(3, 0)).unwrap().1 += 10;

        assert_eq!(a.values(), (0..10).map(|i| (i, 0)).collect::<Vec<_>>());
        let expected: Vec<(u32, u32)> =
            (0..10).map(|i| (i, if i == 3 { 11 } else { 1 })).collect();
        assert_eq!(b.values(), expected);

        // Already owned: no further copies.
        b.get_mut(&(4, 0)).unwrap().1 += 10;
        assert_eq!(b.get(&(4, 0)), Some(&(4, 11)));
    }

    #[test]
    fn test_debug_output() {
        let tree: BTree<u32> = (0..5).collect();
        let debug = format!("{tree:?}");
        assert!(debug.contains("BTree"));
        assert!(debug.contains("len: 5"));
    }

    #[test]
    fn test_from_iter_and_extend() {
        let mut tree: BTree<u32> = [5, 1, 3].into_iter().collect();
        tree.extend([4, 2]);
        assert_eq!(tree.values(), vec![1, 2, 3, 4, 5]);
    }
}
