//! Filepath: src/tree/locked.rs
//!
//! [`SyncBTree`]: a [`BTree`] behind a reader/writer lock.
//!
//! # Locking
//!
//! ```text
//! read lock   get, contains, get_at, first, last, len, height, scan,
//!             reverse_scan, ascend, descend, ascend_range, walk, values,
//!             validate
//! write lock  insert, load, remove, pop_first, pop_last, remove_at,
//!             update, update_at, every _mut traversal, clear, iso_copy
//! ```
//!
//! `iso_copy` takes the write lock because it re-tags the source tree.
//! Results are cloned out so no reference outlives its guard; in-place
//! access goes through closures that run under the write lock.

use std::fmt as StdFmt;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::InvariantError;
use crate::ksearch::PathHint;
use crate::ordering::{Less, Natural};

use super::{BTree, Options};

/// A thread-safe [`BTree`].
///
/// Every operation takes `&self`, so the tree can be shared through an
/// `Arc` and used from many threads. Reads run in parallel; writes are
/// exclusive.
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
///
/// use isobtree::SyncBTree;
///
/// let tree: Arc<SyncBTree<u32>> = Arc::new(SyncBTree::new());
/// let handles: Vec<_> = (0..4)
///     .map(|t| {
///         let tree = Arc::clone(&tree);
///         thread::spawn(move || {
///             for i in 0..100 {
///                 tree.insert(t * 100 + i);
///             }
///         })
///     })
///     .collect();
/// for h in handles {
///     h.join().unwrap();
/// }
/// assert_eq!(tree.len(), 400);
/// ```
pub struct SyncBTree<T, C = Natural> {
    inner: RwLock<BTree<T, C>>,
}

impl<T: Ord> SyncBTree<T, Natural> {
    /// Create an empty tree in the natural order of `T`.
    #[must_use]
    pub fn new() -> Self {
        Self::from(BTree::new())
    }
}

impl<T: Ord> Default for SyncBTree<T, Natural> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> From<BTree<T, C>> for SyncBTree<T, C> {
    fn from(tree: BTree<T, C>) -> Self {
        Self {
            inner: RwLock::new(tree),
        }
    }
}

impl<T, C: Less<T>> SyncBTree<T, C> {
    /// Create an empty tree ordered by `less`.
    #[must_use]
    pub fn with_less(less: C) -> Self {
        Self::from(BTree::with_less(less))
    }

    /// Create an empty tree ordered by `less` with the given options.
    #[must_use]
    pub fn with_options(less: C, options: Options) -> Self {
        Self::from(BTree::with_options(less, options))
    }

    /// Whether an item equal to `key` is present.
    #[must_use]
    pub fn contains(&self, key: &T) -> bool {
        self.inner.read().contains(key)
    }

    /// Visit items `>= pivot` in ascending order under the read lock.
    pub fn ascend<F>(&self, pivot: Option<&T>, f: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.read().ascend(pivot, f);
    }

    /// Visit items `<= pivot` in descending order under the read lock.
    pub fn descend<F>(&self, pivot: Option<&T>, f: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.read().descend(pivot, f);
    }

    /// Visit items in `[start, end)` under the read lock.
    pub fn ascend_range<F>(&self, start: &T, end: &T, f: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.read().ascend_range(start, end, f);
    }

    /// See [`BTree::validate`].
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), InvariantError> {
        self.inner.read().validate()
    }
}

impl<T: Clone, C: Less<T>> SyncBTree<T, C> {
    /// See [`BTree::insert`].
    pub fn insert(&self, item: T) -> Option<T> {
        self.inner.write().insert(item)
    }

    /// See [`BTree::insert_hint`].
    pub fn insert_hint(&self, item: T, hint: &mut PathHint) -> Option<T> {
        self.inner.write().insert_hint(item, hint)
    }

    /// See [`BTree::load`].
    pub fn load(&self, item: T) -> Option<T> {
        self.inner.write().load(item)
    }

    /// A copy of the item equal to `key`.
    #[must_use]
    pub fn get(&self, key: &T) -> Option<T> {
        self.inner.read().get(key).cloned()
    }

    /// [`get`](Self::get) with a path hint.
    pub fn get_hint(&self, key: &T, hint: &mut PathHint) -> Option<T> {
        self.inner.read().get_hint(key, hint).cloned()
    }

    /// Run `f` on the item equal to `key` under the write lock.
    ///
    /// `f` must not change the item's ordering.
    pub fn update<R, F>(&self, key: &T, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.write().get_mut(key).map(f)
    }

    /// [`update`](Self::update) with a path hint.
    pub fn update_hint<R, F>(&self, key: &T, hint: &mut PathHint, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.write().get_mut_hint(key, hint).map(f)
    }

    /// Run `f` on the minimum item under the write lock.
    pub fn update_first<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.write().first_mut().map(f)
    }

    /// Run `f` on the maximum item under the write lock.
    pub fn update_last<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.write().last_mut().map(f)
    }

    /// See [`BTree::remove`].
    pub fn remove(&self, key: &T) -> Option<T> {
        self.inner.write().remove(key)
    }

    /// See [`BTree::remove_hint`].
    pub fn remove_hint(&self, key: &T, hint: &mut PathHint) -> Option<T> {
        self.inner.write().remove_hint(key, hint)
    }

    /// See [`BTree::pop_first`].
    pub fn pop_first(&self) -> Option<T> {
        self.inner.write().pop_first()
    }

    /// See [`BTree::pop_last`].
    pub fn pop_last(&self) -> Option<T> {
        self.inner.write().pop_last()
    }

    /// See [`BTree::remove_at`].
    pub fn remove_at(&self, index: usize) -> Option<T> {
        self.inner.write().remove_at(index)
    }

    /// [`BTree::ascend_mut`] under the write lock.
    pub fn ascend_mut<F>(&self, pivot: Option<&T>, f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        self.inner.write().ascend_mut(pivot, f);
    }

    /// [`BTree::descend_mut`] under the write lock.
    pub fn descend_mut<F>(&self, pivot: Option<&T>, f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        self.inner.write().descend_mut(pivot, f);
    }
}

impl<T: Clone, C> SyncBTree<T, C> {
    /// A copy of the minimum item.
    #[must_use]
    pub fn first(&self) -> Option<T> {
        self.inner.read().first().cloned()
    }

    /// A copy of the maximum item.
    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.inner.read().last().cloned()
    }

    /// A copy of the item at sorted position `index`.
    #[must_use]
    pub fn get_at(&self, index: usize) -> Option<T> {
        self.inner.read().get_at(index).cloned()
    }

    /// Run `f` on the item at sorted position `index` under the write lock.
    pub fn update_at<R, F>(&self, index: usize, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.write().get_at_mut(index).map(f)
    }

    /// All items in ascending order.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.inner.read().values()
    }

    /// [`BTree::scan_mut`] under the write lock.
    pub fn scan_mut<F>(&self, f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        self.inner.write().scan_mut(f);
    }

    /// [`BTree::reverse_scan_mut`] under the write lock.
    pub fn reverse_scan_mut<F>(&self, f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        self.inner.write().reverse_scan_mut(f);
    }

    /// [`BTree::walk_mut`] under the write lock.
    pub fn walk_mut<F>(&self, f: F)
    where
        F: FnMut(&mut [T]) -> bool,
    {
        self.inner.write().walk_mut(f);
    }
}

impl<T, C> SyncBTree<T, C> {
    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the tree holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Number of levels; zero for an empty tree.
    #[must_use]
    pub fn height(&self) -> usize {
        self.inner.read().height()
    }

    /// Remove every item.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Visit every item in ascending order under the read lock.
    pub fn scan<F>(&self, f: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.read().scan(f);
    }

    /// Visit every item in descending order under the read lock.
    pub fn reverse_scan<F>(&self, f: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.read().reverse_scan(f);
    }

    /// [`BTree::walk`] under the read lock.
    pub fn walk<F>(&self, f: F)
    where
        F: FnMut(&[T]) -> bool,
    {
        self.inner.read().walk(f);
    }

    /// Take an O(1) snapshot as a new, independently locked tree.
    ///
    /// Holds the write lock for the duration of the copy.
    #[must_use]
    pub fn iso_copy(&self) -> Self
    where
        C: Clone,
    {
        Self::from(self.inner.write().iso_copy())
    }

    /// Take an O(1) snapshot as an unsynchronised tree.
    #[must_use]
    pub fn iso_copy_unsync(&self) -> BTree<T, C>
    where
        C: Clone,
    {
        self.inner.write().iso_copy()
    }

    /// Hold the read lock for a batch of reads.
    pub fn read(&self) -> RwLockReadGuard<'_, BTree<T, C>> {
        self.inner.read()
    }

    /// Hold the write lock for a batch of writes.
    pub fn write(&self) -> RwLockWriteGuard<'_, BTree<T, C>> {
        self.inner.write()
    }

    /// Unwrap the tree.
    #[must_use]
    pub fn into_inner(self) -> BTree<T, C> {
        self.inner.into_inner()
    }
}

impl<T, C> StdFmt::Debug for SyncBTree<T, C> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        match self.inner.try_read() {
            Some(tree) => f.debug_struct("SyncBTree").field("tree", &*tree).finish(),
            None => f.debug_struct("SyncBTree").finish_non_exhaustive(),
        }
    }
}
