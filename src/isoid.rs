//! Isolation ids and item copy hooks.
//!
//! An [`IsoId`] identifies the tree that exclusively owns a node. Ids come
//! from a single process-wide counter so that no two trees, on any thread,
//! ever hold the same id. A node whose id differs from the mutating tree's
//! id is shared and must be duplicated before it is written.

use std::fmt as StdFmt;

#[cfg(not(all(test, loom)))]
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(all(test, loom))]
use loom::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
//  IsoId
// ============================================================================

#[cfg(not(all(test, loom)))]
static NEXT_ISOID: AtomicU64 = AtomicU64::new(1);

#[cfg(all(test, loom))]
loom::lazy_static! {
    static ref NEXT_ISOID: AtomicU64 = AtomicU64::new(1);
}

/// Owner tag stamped on trees and the nodes they own.
///
/// Zero is never handed out.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoId(u64);

impl IsoId {
    /// Allocate a fresh, globally unique id.
    ///
    /// Ids increase monotonically. Safe to call from any thread.
    #[must_use]
    #[inline]
    pub fn next() -> Self {
        // Relaxed: uniqueness only needs the RMW to be atomic.
        Self(NEXT_ISOID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value of the id.
    #[must_use]
    #[inline(always)]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl StdFmt::Debug for IsoId {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        write!(f, "IsoId({})", self.0)
    }
}

impl StdFmt::Display for IsoId {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
//  IsoCopy
// ============================================================================

/// Isolating copy for items that share mutable state through `Clone`.
///
/// A node duplicated during copy-on-write clones its items. For items like
/// `Arc<Mutex<_>>` that clone is shallow, and both trees would still see
/// each other's in-place updates. Items implementing `IsoCopy` can be
/// copied deeply instead by building the tree with
/// [`BTree::with_iso_copy_items`](crate::BTree::with_iso_copy_items).
pub trait IsoCopy {
    /// Produce a copy that shares no mutable state with `self`.
    #[must_use]
    fn iso_copy(&self) -> Self;
}
