//! Key search within a node.
//!
//! Provides:
//! - [`bsearch`]: binary search lower bound driven only by `less`
//! - [`hint_search`]: the same search seeded from a [`PathHint`]
//!
//! Both return the same [`SearchPosition`] for the same input; a hint only
//! changes how many comparisons are made.

use crate::ordering::Less;

/// Number of tree levels a [`PathHint`] remembers.
pub const HINT_DEPTH: usize = 8;

// ============================================================================
//  SearchPosition
// ============================================================================

/// Result of searching a node's items for a key.
///
/// If `found`, `items[index]` is equal to the key. Otherwise `index` is
/// where the key would be inserted, which for an internal node is also the
/// child to descend into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPosition {
    /// Position of the match or insertion point.
    pub index: usize,

    /// Whether `items[index]` equals the key.
    pub found: bool,
}

impl SearchPosition {
    /// Position of an exact match.
    #[must_use]
    #[inline(always)]
    pub const fn found(index: usize) -> Self {
        Self { index, found: true }
    }

    /// Insertion point for a missing key.
    #[must_use]
    #[inline(always)]
    pub const fn not_found(index: usize) -> Self {
        Self {
            index,
            found: false,
        }
    }
}

// ============================================================================
//  PathHint
// ============================================================================

/// Per-level cache of recent search positions.
///
/// Pass the same hint to consecutive `*_hint` calls on keys that are close
/// together and each level's search starts from the previous position
/// instead of a full binary search. A hint is advisory: a stale or foreign
/// hint never changes a result, it only makes the search slower. Levels
/// deeper than [`HINT_DEPTH`] are never hinted.
///
/// ```rust
/// use isobtree::{BTree, PathHint};
///
/// let mut tree: BTree<u32> = BTree::new();
/// let mut hint = PathHint::new();
/// for i in 0..1_000 {
///     tree.insert_hint(i, &mut hint);
/// }
/// assert_eq!(tree.get_hint(&999, &mut hint), Some(&999));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathHint {
    used: [bool; HINT_DEPTH],
    path: [u8; HINT_DEPTH],
}

impl PathHint {
    /// An empty hint.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            used: [false; HINT_DEPTH],
            path: [0; HINT_DEPTH],
        }
    }

    /// Forget every remembered position.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Remembered index at `depth`, if any.
    #[must_use]
    #[inline]
    pub fn get(&self, depth: usize) -> Option<usize> {
        (depth < HINT_DEPTH && self.used[depth]).then(|| usize::from(self.path[depth]))
    }

    /// Remember `index` at `depth`.
    ///
    /// Deeper levels are invalidated when the index changes, since they
    /// described a different subtree.
    #[inline]
    pub(crate) fn record(&mut self, depth: usize, index: usize) {
        if depth >= HINT_DEPTH {
            return;
        }

        self.used[depth] = true;
        // Wide nodes can overflow a byte; a clamped hint is merely slower.
        let index: u8 = u8::try_from(index).unwrap_or(u8::MAX);
        if index != self.path[depth] {
            self.path[depth] = index;
            self.used[depth + 1..].fill(false);
        }
    }

    /// Build a hint that follows an explicit child-index path.
    pub(crate) fn from_path(path: &[usize]) -> Self {
        let mut hint = Self::new();
        for (depth, &index) in path.iter().enumerate().take(HINT_DEPTH) {
            hint.used[depth] = true;
            hint.path[depth] = u8::try_from(index).unwrap_or(u8::MAX);
        }
        hint
    }
}

// ============================================================================
//  Binary Search
// ============================================================================

/// Binary search for `key` in sorted `items`.
///
/// Uses only `less`: the search finds the first item greater than `key`,
/// then checks whether the item before it is equal.
#[inline]
pub fn bsearch<T, C>(less: &C, items: &[T], key: &T) -> SearchPosition
where
    C: Less<T> + ?Sized,
{
    let mut low: usize = 0;
    let mut high: usize = items.len();

    while low < high {
        let mid: usize = (low + high) >> 1;
        if less.less(key, &items[mid]) {
            high = mid;
        } else {
            low = mid + 1;
        }
    }

    if low > 0 && !less.less(&items[low - 1], key) {
        SearchPosition::found(low - 1)
    } else {
        SearchPosition::not_found(low)
    }
}

/// Binary search seeded with the position remembered in `hint` at `depth`.
///
/// The remembered index is tried first. If it is exact, or the key falls
/// just before it, no further comparisons are needed; otherwise it narrows
/// the range for the binary search. The hint is updated with the result.
///
/// For a key found in a leaf the hint records `index + 1`, the position a
/// following ascending key will land on.
pub fn hint_search<T, C>(
    less: &C,
    items: &[T],
    is_leaf: bool,
    key: &T,
    hint: &mut PathHint,
    depth: usize,
) -> SearchPosition
where
    C: Less<T> + ?Sized,
{
    let len: usize = items.len();
    if len == 0 {
        return SearchPosition::not_found(0);
    }

    let pos: SearchPosition = 'search: {
        let mut low: usize = 0;
        let mut high: usize = len;

        if let Some(cached) = hint.get(depth) {
            let mut index: usize = cached;
            if index >= len {
                // tail position
                if less.less(&items[len - 1], key) {
                    break 'search SearchPosition::not_found(len);
                }
                index = len - 1;
            }

            if less.less(key, &items[index]) {
                if index == 0 || less.less(&items[index - 1], key) {
                    break 'search SearchPosition::not_found(index);
                }
                high = index;
            } else if less.less(&items[index], key) {
                low = index + 1;
            } else {
                break 'search SearchPosition::found(index);
            }
        }

        // Invariant: every item below `low` is <= key, every item at or
        // above `high` is > key.
        while low < high {
            let mid: usize = low + ((high - low) >> 1);
            if less.less(key, &items[mid]) {
                high = mid;
            } else {
                low = mid + 1;
            }
        }

        if low > 0 && !less.less(&items[low - 1], key) {
            SearchPosition::found(low - 1)
        } else {
            SearchPosition::not_found(low)
        }
    };

    let path_index: usize = if is_leaf && pos.found {
        pos.index + 1
    } else {
        pos.index
    };
    hint.record(depth, path_index);

    pos
}

/// Search with or without a hint.
#[inline]
pub fn find<T, C>(
    less: &C,
    items: &[T],
    is_leaf: bool,
    key: &T,
    hint: Option<&mut PathHint>,
    depth: usize,
) -> SearchPosition
where
    C: Less<T> + ?Sized,
{
    match hint {
        None => bsearch(less, items, key),
        Some(hint) => hint_search(less, items, is_leaf, key, hint, depth),
    }
}
