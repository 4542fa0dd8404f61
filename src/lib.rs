//! # `isobtree`
//!
//! An in-memory B-tree with rank indexing, path hints and O(1)
//! copy-on-write snapshots.
//!
//! The tree stores opaque items ordered by a caller-supplied `less`
//! relation. It is the engine ordered maps and sets are layered on: items
//! can be `(key, value)` pairs ordered on the key, or bare keys.
//!
//! | Feature | Cost |
//! |---------|------|
//! | Lookup / insert / remove | O(log n) |
//! | Rank access (`get_at`, `remove_at`) | O(log n) via cached subtree counts |
//! | Snapshot (`iso_copy`) | O(1), nodes are shared until written |
//! | Nearby repeated lookups | ~O(1) per level with a [`PathHint`] |
//!
//! ## Example
//!
//! ```rust
//! use isobtree::BTree;
//!
//! let mut tree: BTree<u64> = BTree::new();
//! for i in 0..100 {
//!     tree.insert(i);
//! }
//!
//! let mut snapshot = tree.iso_copy();
//! snapshot.remove(&42);
//!
//! assert_eq!(tree.get(&42), Some(&42));
//! assert_eq!(snapshot.get(&42), None);
//! assert_eq!(tree.get_at(10), Some(&10));
//! ```
//!
//! ## Isolation
//!
//! Every tree carries an [`IsoId`] drawn from a process-wide counter, and
//! every node is stamped with the id of the tree that created it. A
//! mutating descent duplicates any node whose stamp differs from its own
//! id before touching it, so two trees that share nodes after
//! [`BTree::iso_copy`] never observe each other's writes. Only the nodes on
//! the written path are duplicated.
//!
//! ## Thread Safety
//!
//! [`BTree`] has no internal lock: reads borrow `&self` and writes borrow
//! `&mut self`. [`SyncBTree`] wraps it in a reader/writer lock for sharing
//! one tree between threads.
//!
//! ## Tracing
//!
//! Structural events (splits, merges, copy-on-write duplication) are logged
//! through `tracing` when the `tracing` feature is enabled.

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
// Node accessors and search loops are inlined on purpose; see benches/tree.rs.
#![allow(clippy::inline_always)]

mod tracing_helpers;

pub mod error;
pub mod isoid;
pub mod ksearch;
pub mod node;
pub mod ordering;
pub mod tree;

// Re-export main types for convenience
pub use error::InvariantError;
pub use isoid::{IsoCopy, IsoId};
pub use ksearch::PathHint;
pub use ordering::{Less, Natural};
pub use node::{CopyHook, Node};
pub use tree::{BTree, Iter, Options, SyncBTree};
