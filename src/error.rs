//! Errors reported by structural validation.
//!
//! Ordinary operations never fail: absence is reported with `Option`.
//! The only error type is [`InvariantError`], returned by
//! [`BTree::validate`](crate::BTree::validate) when the tree's structure
//! is broken.

use std::fmt as StdFmt;

// ============================================================================
//  InvariantError
// ============================================================================

/// A violated structural invariant.
///
/// Depths are counted from the root (depth 0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    /// `len()` disagrees with the number of items reachable from the root.
    CountMismatch {
        /// Value of the tree's item counter.
        recorded: usize,
        /// Items actually reachable.
        actual: usize,
    },

    /// A node's cached subtree count is wrong.
    NodeCountMismatch {
        /// Depth of the node.
        depth: usize,
        /// Count cached in the node.
        cached: usize,
        /// Count computed from its items and children.
        actual: usize,
    },

    /// Items are not strictly increasing, within a node or across a
    /// separator.
    Unordered {
        /// Depth of the offending node.
        depth: usize,
    },

    /// A non-root node holds fewer than the minimum number of items.
    Underfull {
        /// Depth of the node.
        depth: usize,
        /// Items held.
        len: usize,
        /// Minimum allowed.
        min: usize,
    },

    /// A node holds more than the maximum number of items.
    Overfull {
        /// Depth of the node.
        depth: usize,
        /// Items held.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// An internal node does not have exactly one more child than items.
    ChildArity {
        /// Depth of the node.
        depth: usize,
        /// Items held.
        items: usize,
        /// Children held.
        children: usize,
    },

    /// Leaves occur at different depths.
    UnevenLeaves {
        /// Depth of the first leaf found.
        expected: usize,
        /// Depth of the offending leaf.
        found: usize,
    },

    /// The root exists but holds no items.
    EmptyRoot,
}

impl StdFmt::Display for InvariantError {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        match self {
            Self::CountMismatch { recorded, actual } => {
                write!(f, "tree length is {recorded} but {actual} items are reachable")
            }

            Self::NodeCountMismatch {
                depth,
                cached,
                actual,
            } => write!(
                f,
                "node at depth {depth} caches count {cached} but holds {actual}"
            ),

            Self::Unordered { depth } => write!(f, "items out of order at depth {depth}"),

            Self::Underfull { depth, len, min } => {
                write!(f, "node at depth {depth} has {len} items (min {min})")
            }

            Self::Overfull { depth, len, max } => {
                write!(f, "node at depth {depth} has {len} items (max {max})")
            }

            Self::ChildArity {
                depth,
                items,
                children,
            } => write!(
                f,
                "internal node at depth {depth} has {items} items but {children} children"
            ),

            Self::UnevenLeaves { expected, found } => {
                write!(f, "leaf at depth {found}, expected all leaves at depth {expected}")
            }

            Self::EmptyRoot => write!(f, "root node holds no items"),
        }
    }
}

impl std::error::Error for InvariantError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = InvariantError::Underfull {
            depth: 2,
            len: 1,
            min: 15,
        };
        assert_eq!(err.to_string(), "node at depth 2 has 1 items (min 15)");

        let err = InvariantError::CountMismatch {
            recorded: 3,
            actual: 4,
        };
        assert_eq!(err.to_string(), "tree length is 3 but 4 items are reachable");
    }

    #[test]
    fn test_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&InvariantError::EmptyRoot);
    }
}
