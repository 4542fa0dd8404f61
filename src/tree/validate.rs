//! Structural invariant checks.

use crate::error::InvariantError;
use crate::node::Node;
use crate::ordering::Less;

use super::BTree;

impl<T, C: Less<T>> BTree<T, C> {
    /// Check every structural invariant of the tree.
    ///
    /// Walks the whole tree, so this is `O(n)`. Intended for tests and
    /// debugging; a tree only mutated through its public API always
    /// validates.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in pre-order.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let Some(root) = self.root.as_deref() else {
            if self.count != 0 {
                return Err(InvariantError::CountMismatch {
                    recorded: self.count,
                    actual: 0,
                });
            }
            return Ok(());
        };

        if root.items.is_empty() {
            return Err(InvariantError::EmptyRoot);
        }

        let mut leaf_depth: Option<usize> = None;
        let actual: usize = self.validate_node(root, 0, (None, None), &mut leaf_depth)?;
        if actual != self.count {
            return Err(InvariantError::CountMismatch {
                recorded: self.count,
                actual,
            });
        }
        Ok(())
    }

    /// Validate the subtree at `n`, whose items must lie strictly within
    /// `bounds`. Returns the number of items it holds.
    fn validate_node(
        &self,
        n: &Node<T>,
        depth: usize,
        bounds: (Option<&T>, Option<&T>),
        leaf_depth: &mut Option<usize>,
    ) -> Result<usize, InvariantError> {
        let less: &C = &self.ctx.less;
        let len: usize = n.items.len();

        if len > self.ctx.max {
            return Err(InvariantError::Overfull {
                depth,
                len,
                max: self.ctx.max,
            });
        }
        if depth > 0 && len < self.ctx.min {
            return Err(InvariantError::Underfull {
                depth,
                len,
                min: self.ctx.min,
            });
        }

        let in_order: bool = n.items.windows(2).all(|w| less.less(&w[0], &w[1]));
        let above_low: bool = match (bounds.0, n.items.first()) {
            (Some(low), Some(first)) => less.less(low, first),
            _ => true,
        };
        let below_high: bool = match (bounds.1, n.items.last()) {
            (Some(high), Some(last)) => less.less(last, high),
            _ => true,
        };
        if !(in_order && above_low && below_high) {
            return Err(InvariantError::Unordered { depth });
        }

        let mut actual: usize = len;
        match &n.children {
            None => match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(InvariantError::UnevenLeaves {
                        expected,
                        found: depth,
                    });
                }
                Some(_) => {}
            },

            Some(children) => {
                if children.len() != len + 1 {
                    return Err(InvariantError::ChildArity {
                        depth,
                        items: len,
                        children: children.len(),
                    });
                }
                for (i, child) in children.iter().enumerate() {
                    let low: Option<&T> = if i == 0 { bounds.0 } else { n.items.get(i - 1) };
                    let high: Option<&T> = n.items.get(i).or(bounds.1);
                    actual += self.validate_node(child, depth + 1, (low, high), leaf_depth)?;
                }
            }
        }

        if n.count != actual {
            return Err(InvariantError::NodeCountMismatch {
                depth,
                cached: n.count,
                actual,
            });
        }
        Ok(actual)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Fail fast in tests")]
mod tests {
    use std::sync::Arc;

    use crate::error::InvariantError;
    use crate::ordering::Natural;
    use crate::tree::{BTree, Options};

    fn tree(n: u32) -> BTree<u32> {
        let mut t = BTree::with_options(Natural, Options::new().with_degree(2));
        for i in 0..n {
            t.insert(i);
        }
        t
    }

    #[test]
    fn test_valid_trees() {
        BTree::<u32>::new().validate().unwrap();
        tree(1).validate().unwrap();
        tree(1_000).validate().unwrap();
    }

    #[test]
    fn test_detects_count_mismatch() {
        let mut t = tree(10);
        t.count = 11;
        assert_eq!(
            t.validate(),
            Err(InvariantError::CountMismatch {
                recorded: 11,
                actual: 10
            })
        );
    }

    #[test]
    fn test_detects_node_count_mismatch() {
        let mut t = tree(10);
        Arc::make_mut(t.root.as_mut().unwrap()).count += 1;
        assert!(matches!(
            t.validate(),
            Err(InvariantError::NodeCountMismatch { depth: 0, .. })
        ));
    }

    #[test]
    fn test_detects_disorder() {
        let mut t = tree(3);
        Arc::make_mut(t.root.as_mut().unwrap()).items.swap(0, 2);
        assert_eq!(t.validate(), Err(InvariantError::Unordered { depth: 0 }));
    }

    #[test]
    fn test_detects_separator_violation() {
        let mut t = tree(20);
        let root = Arc::make_mut(t.root.as_mut().unwrap());
        root.items[0] = 1_000;
        assert!(matches!(t.validate(), Err(InvariantError::Unordered { .. })));
    }

    #[test]
    fn test_detects_empty_root() {
        let mut t = tree(1);
        Arc::make_mut(t.root.as_mut().unwrap()).items.clear();
        assert_eq!(t.validate(), Err(InvariantError::EmptyRoot));
    }
}
