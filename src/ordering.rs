//! Item ordering for the tree.
//!
//! Every structural decision in the tree derives from a single strict
//! "less than" relation over items. Equality is never asked for directly:
//! two items are equal when neither sorts below the other.

use std::cmp::Ordering;

// ============================================================================
//  Less
// ============================================================================

/// A strict total order over `T`.
///
/// Implementations must be irreflexive, transitive and total over the
/// items stored in a tree. Behaviour is unspecified (but memory safe) if
/// they are not.
///
/// Any `Fn(&T, &T) -> bool` is a `Less<T>`, so ad-hoc orderings can be
/// passed as closures:
///
/// ```rust
/// use isobtree::BTree;
///
/// // Order pairs by their first element only.
/// let mut tree = BTree::with_less(|a: &(u32, &str), b: &(u32, &str)| a.0 < b.0);
/// tree.insert((2, "two"));
/// tree.insert((1, "one"));
/// assert_eq!(tree.get(&(2, "")), Some(&(2, "two")));
/// ```
pub trait Less<T: ?Sized> {
    /// Returns `true` if `a` sorts strictly before `b`.
    fn less(&self, a: &T, b: &T) -> bool;

    /// Three-way comparison derived from [`less`](Self::less).
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        if self.less(a, b) {
            Ordering::Less
        } else if self.less(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// Returns `true` if neither item sorts before the other.
    #[inline]
    fn equal(&self, a: &T, b: &T) -> bool {
        !self.less(a, b) && !self.less(b, a)
    }
}

impl<T: ?Sized, F> Less<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    #[inline(always)]
    fn less(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

// ============================================================================
//  Natural
// ============================================================================

/// The natural order of `T: Ord`.
///
/// This is the comparator used by [`BTree::new`](crate::BTree::new).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Natural;

impl<T: Ord + ?Sized> Less<T> for Natural {
    #[inline(always)]
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }

    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_less() {
        assert!(Natural.less(&1, &2));
        assert!(!Natural.less(&2, &1));
        assert!(!Natural.less(&2, &2));
    }

    #[test]
    fn test_natural_unsized() {
        assert!(Less::<str>::less(&Natural, "a", "b"));
        assert_eq!(Less::<str>::compare(&Natural, "b", "a"), Ordering::Greater);
    }

    #[test]
    fn test_closure_is_less() {
        let by_len = |a: &&str, b: &&str| a.len() < b.len();

        assert!(by_len.less(&"a", &"bb"));
        assert!(by_len.equal(&"ab", &"cd"));
        assert_eq!(by_len.compare(&"abc", &"d"), Ordering::Greater);
    }

    #[test]
    fn test_derived_compare_matches_ord() {
        let rev = |a: &i32, b: &i32| b < a;

        for a in -3..3 {
            for b in -3..3 {
                assert_eq!(rev.compare(&a, &b), b.cmp(&a), "a={a} b={b}");
            }
        }
    }
}
